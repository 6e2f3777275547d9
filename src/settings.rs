//! Typed per-family settings and the enabled set.
//!
//! Every family deserializes from a partial JSON record: missing fields take
//! their defaults. Lengths are [`NonZero`], so a zero length is rejected
//! while parsing; cross-field constraints are checked by `validate`.

use std::{collections::BTreeSet, fmt::Display, num::NonZero, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    Error, PriceSource, Result,
    pivots::PivotType,
    snapshot::{Action, Level, Regime},
};

const fn nz(n: usize) -> NonZero<usize> {
    match NonZero::new(n) {
        Some(n) => n,
        None => panic!("length must be positive"),
    }
}

/// Every indicator family the calculator knows, keyed in camelCase.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndicatorKind {
    Rsi,
    Stochastic,
    Cci,
    Adx,
    Ao,
    Momentum,
    Macd,
    Ema,
    Sma,
    BollingerBands,
    Atr,
    Mfi,
    StochRsi,
    WilliamsR,
    Choppiness,
    Vwap,
    Ichimoku,
    ParabolicSar,
    SuperTrend,
    AtrTrailingStop,
    Obv,
    Pivots,
    Divergences,
    Confluence,
}

impl IndicatorKind {
    pub const ALL: [Self; 24] = [
        Self::Rsi,
        Self::Stochastic,
        Self::Cci,
        Self::Adx,
        Self::Ao,
        Self::Momentum,
        Self::Macd,
        Self::Ema,
        Self::Sma,
        Self::BollingerBands,
        Self::Atr,
        Self::Mfi,
        Self::StochRsi,
        Self::WilliamsR,
        Self::Choppiness,
        Self::Vwap,
        Self::Ichimoku,
        Self::ParabolicSar,
        Self::SuperTrend,
        Self::AtrTrailingStop,
        Self::Obv,
        Self::Pivots,
        Self::Divergences,
        Self::Confluence,
    ];

    /// The wire key, e.g. `"bollingerBands"`.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Rsi => "rsi",
            Self::Stochastic => "stochastic",
            Self::Cci => "cci",
            Self::Adx => "adx",
            Self::Ao => "ao",
            Self::Momentum => "momentum",
            Self::Macd => "macd",
            Self::Ema => "ema",
            Self::Sma => "sma",
            Self::BollingerBands => "bollingerBands",
            Self::Atr => "atr",
            Self::Mfi => "mfi",
            Self::StochRsi => "stochRsi",
            Self::WilliamsR => "williamsR",
            Self::Choppiness => "choppiness",
            Self::Vwap => "vwap",
            Self::Ichimoku => "ichimoku",
            Self::ParabolicSar => "parabolicSar",
            Self::SuperTrend => "superTrend",
            Self::AtrTrailingStop => "atrTrailingStop",
            Self::Obv => "obv",
            Self::Pivots => "pivots",
            Self::Divergences => "divergences",
            Self::Confluence => "confluence",
        }
    }
}

impl Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for IndicatorKind {
    type Err = Error;

    fn from_str(key: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.key() == key)
            .ok_or_else(|| Error::UnknownIndicator(key.to_owned()))
    }
}

/// Indicator families to compute. Families outside the set are skipped
/// before any work is done for them.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EnabledSet(BTreeSet<IndicatorKind>);

impl EnabledSet {
    #[must_use]
    pub fn all() -> Self {
        Self(IndicatorKind::ALL.into_iter().collect())
    }

    #[must_use]
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    /// Starts from everything enabled and switches off each key mapped to
    /// `false`.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownIndicator`] for a key that names no family.
    pub fn from_flags<K: AsRef<str>>(flags: impl IntoIterator<Item = (K, bool)>) -> Result<Self> {
        let mut enabled = Self::all();
        for (key, on) in flags {
            let kind = key.as_ref().parse()?;
            if !on {
                enabled.0.remove(&kind);
            }
        }
        Ok(enabled)
    }

    #[must_use]
    pub fn with(mut self, kind: IndicatorKind) -> Self {
        self.0.insert(kind);
        self
    }

    #[must_use]
    pub fn without(mut self, kind: IndicatorKind) -> Self {
        self.0.remove(&kind);
        self
    }

    #[must_use]
    #[inline]
    pub fn contains(&self, kind: IndicatorKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = IndicatorKind> + '_ {
        self.0.iter().copied()
    }
}

impl Default for EnabledSet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<IndicatorKind> for EnabledSet {
    fn from_iter<I: IntoIterator<Item = IndicatorKind>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Oscillator zone rule: at or above `overbought` sells, at or below
/// `oversold` buys.
#[inline]
fn zone_action(value: f64, overbought: f64, oversold: f64) -> Action {
    Action::from_conditions(value <= oversold, value >= overbought)
}

/// %K/%D crossing rule inside the extreme zones.
#[inline]
fn crossing_action(k: f64, d: f64, overbought: f64, oversold: f64) -> Action {
    Action::from_conditions(
        k < oversold && d < oversold && k > d,
        k > overbought && d > overbought && k < d,
    )
}

#[inline]
fn sign_action(value: f64) -> Action {
    Action::from_conditions(value > 0.0, value < 0.0)
}

fn require_positive(kind: IndicatorKind, name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(kind, format!("{name} must be a positive number, got {value}")))
    }
}

fn require_zones(kind: IndicatorKind, overbought: f64, oversold: f64) -> Result<()> {
    if oversold < overbought {
        Ok(())
    } else {
        Err(Error::invalid(
            kind,
            format!("oversold {oversold} must be below overbought {overbought}"),
        ))
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RsiSettings {
    pub length: NonZero<usize>,
    pub source: PriceSource,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for RsiSettings {
    fn default() -> Self {
        Self {
            length: nz(14),
            source: PriceSource::Close,
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

impl RsiSettings {
    /// # Errors
    ///
    /// Overlapping zones.
    pub fn validate(&self) -> Result<()> {
        require_zones(IndicatorKind::Rsi, self.overbought, self.oversold)
    }

    #[must_use]
    pub fn action(&self, value: f64) -> Action {
        zone_action(value, self.overbought, self.oversold)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StochasticSettings {
    pub k_period: NonZero<usize>,
    pub k_smoothing: NonZero<usize>,
    pub d_period: NonZero<usize>,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for StochasticSettings {
    fn default() -> Self {
        Self {
            k_period: nz(14),
            k_smoothing: nz(1),
            d_period: nz(3),
            overbought: 80.0,
            oversold: 20.0,
        }
    }
}

impl StochasticSettings {
    /// # Errors
    ///
    /// Overlapping zones.
    pub fn validate(&self) -> Result<()> {
        require_zones(IndicatorKind::Stochastic, self.overbought, self.oversold)
    }

    #[must_use]
    pub fn action(&self, k: f64, d: f64) -> Action {
        crossing_action(k, d, self.overbought, self.oversold)
    }
}

/// Moving average applied on top of another indicator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaType {
    #[default]
    Sma,
    Ema,
}

impl Display for MaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Sma => "SMA",
            Self::Ema => "EMA",
        })
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CciSettings {
    pub length: NonZero<usize>,
    pub source: PriceSource,
    pub smoothing_length: NonZero<usize>,
    pub smoothing_type: MaType,
    pub threshold: f64,
}

impl Default for CciSettings {
    fn default() -> Self {
        Self {
            length: nz(20),
            source: PriceSource::HLC3,
            smoothing_length: nz(1),
            smoothing_type: MaType::Sma,
            threshold: 100.0,
        }
    }
}

impl CciSettings {
    /// # Errors
    ///
    /// A non-positive threshold.
    pub fn validate(&self) -> Result<()> {
        require_positive(IndicatorKind::Cci, "threshold", self.threshold)
    }

    #[must_use]
    pub fn action(&self, value: f64) -> Action {
        Action::from_conditions(value < -self.threshold, value > self.threshold)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdxSettings {
    pub adx_smoothing: NonZero<usize>,
    pub threshold: f64,
}

impl Default for AdxSettings {
    fn default() -> Self {
        Self {
            adx_smoothing: nz(14),
            threshold: 25.0,
        }
    }
}

impl AdxSettings {
    /// # Errors
    ///
    /// A non-positive threshold.
    pub fn validate(&self) -> Result<()> {
        require_positive(IndicatorKind::Adx, "threshold", self.threshold)
    }

    /// A strong trend follows the direction of the last close.
    #[must_use]
    pub fn action(&self, adx: f64, close: f64, prev_close: Option<f64>) -> Action {
        match prev_close {
            Some(prev) if adx > self.threshold => {
                Action::from_conditions(close > prev, close <= prev)
            }
            _ => Action::Neutral,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AoSettings {
    pub fast_length: NonZero<usize>,
    pub slow_length: NonZero<usize>,
}

impl Default for AoSettings {
    fn default() -> Self {
        Self {
            fast_length: nz(5),
            slow_length: nz(34),
        }
    }
}

impl AoSettings {
    /// # Errors
    ///
    /// A fast length not below the slow length.
    pub fn validate(&self) -> Result<()> {
        if self.fast_length < self.slow_length {
            Ok(())
        } else {
            Err(Error::invalid(
                IndicatorKind::Ao,
                "fast length must be below slow length",
            ))
        }
    }

    #[must_use]
    pub fn action(&self, value: f64) -> Action {
        sign_action(value)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MomentumSettings {
    pub length: NonZero<usize>,
    pub source: PriceSource,
}

impl Default for MomentumSettings {
    fn default() -> Self {
        Self {
            length: nz(10),
            source: PriceSource::Close,
        }
    }
}

impl MomentumSettings {
    #[must_use]
    pub fn action(&self, value: f64) -> Action {
        sign_action(value)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MacdSettings {
    pub fast_length: NonZero<usize>,
    pub slow_length: NonZero<usize>,
    pub signal_length: NonZero<usize>,
    pub source: PriceSource,
}

impl Default for MacdSettings {
    fn default() -> Self {
        Self {
            fast_length: nz(12),
            slow_length: nz(26),
            signal_length: nz(9),
            source: PriceSource::Close,
        }
    }
}

impl MacdSettings {
    /// # Errors
    ///
    /// A fast length not below the slow length.
    pub fn validate(&self) -> Result<()> {
        if self.fast_length < self.slow_length {
            Ok(())
        } else {
            Err(Error::invalid(
                IndicatorKind::Macd,
                "fast length must be below slow length",
            ))
        }
    }

    #[must_use]
    pub fn action(&self, line: f64, signal: f64) -> Action {
        Action::from_conditions(line > signal, line < signal)
    }
}

/// Price above the average buys, at or below sells.
#[must_use]
pub fn moving_average_action(price: f64, average: f64) -> Action {
    if price.is_nan() || average.is_nan() {
        Action::Neutral
    } else if price > average {
        Action::Buy
    } else {
        Action::Sell
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmaSettings {
    pub ema1: NonZero<usize>,
    pub ema2: NonZero<usize>,
    pub ema3: NonZero<usize>,
    pub source: PriceSource,
}

impl Default for EmaSettings {
    fn default() -> Self {
        Self {
            ema1: nz(20),
            ema2: nz(50),
            ema3: nz(200),
            source: PriceSource::Close,
        }
    }
}

impl EmaSettings {
    #[must_use]
    pub fn lengths(&self) -> [NonZero<usize>; 3] {
        [self.ema1, self.ema2, self.ema3]
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SmaSettings {
    pub sma1: NonZero<usize>,
    pub sma2: NonZero<usize>,
    pub sma3: NonZero<usize>,
    pub source: PriceSource,
}

impl Default for SmaSettings {
    fn default() -> Self {
        Self {
            sma1: nz(20),
            sma2: nz(50),
            sma3: nz(200),
            source: PriceSource::Close,
        }
    }
}

impl SmaSettings {
    #[must_use]
    pub fn lengths(&self) -> [NonZero<usize>; 3] {
        [self.sma1, self.sma2, self.sma3]
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BollingerSettings {
    pub length: NonZero<usize>,
    pub std_dev: f64,
    pub source: PriceSource,
}

impl Default for BollingerSettings {
    fn default() -> Self {
        Self {
            length: nz(20),
            std_dev: 2.0,
            source: PriceSource::Close,
        }
    }
}

impl BollingerSettings {
    /// # Errors
    ///
    /// A non-positive deviation multiplier.
    pub fn validate(&self) -> Result<()> {
        require_positive(IndicatorKind::BollingerBands, "stdDev", self.std_dev)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AtrSettings {
    pub length: NonZero<usize>,
}

impl Default for AtrSettings {
    fn default() -> Self {
        Self { length: nz(14) }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MfiSettings {
    pub length: NonZero<usize>,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for MfiSettings {
    fn default() -> Self {
        Self {
            length: nz(14),
            overbought: 80.0,
            oversold: 20.0,
        }
    }
}

impl MfiSettings {
    /// # Errors
    ///
    /// Overlapping zones.
    pub fn validate(&self) -> Result<()> {
        require_zones(IndicatorKind::Mfi, self.overbought, self.oversold)
    }

    #[must_use]
    pub fn action(&self, value: f64) -> Action {
        zone_action(value, self.overbought, self.oversold)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StochRsiSettings {
    pub rsi_length: NonZero<usize>,
    pub stoch_length: NonZero<usize>,
    pub k_smoothing: NonZero<usize>,
    pub d_smoothing: NonZero<usize>,
    pub source: PriceSource,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for StochRsiSettings {
    fn default() -> Self {
        Self {
            rsi_length: nz(14),
            stoch_length: nz(14),
            k_smoothing: nz(3),
            d_smoothing: nz(3),
            source: PriceSource::Close,
            overbought: 80.0,
            oversold: 20.0,
        }
    }
}

impl StochRsiSettings {
    /// # Errors
    ///
    /// Overlapping zones.
    pub fn validate(&self) -> Result<()> {
        require_zones(IndicatorKind::StochRsi, self.overbought, self.oversold)
    }

    #[must_use]
    pub fn action(&self, k: f64, d: f64) -> Action {
        crossing_action(k, d, self.overbought, self.oversold)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WilliamsRSettings {
    pub length: NonZero<usize>,
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for WilliamsRSettings {
    fn default() -> Self {
        Self {
            length: nz(14),
            overbought: -20.0,
            oversold: -80.0,
        }
    }
}

impl WilliamsRSettings {
    /// # Errors
    ///
    /// Overlapping zones.
    pub fn validate(&self) -> Result<()> {
        require_zones(IndicatorKind::WilliamsR, self.overbought, self.oversold)
    }

    #[must_use]
    pub fn action(&self, value: f64) -> Action {
        zone_action(value, self.overbought, self.oversold)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChoppinessSettings {
    pub length: NonZero<usize>,
    pub threshold: f64,
}

impl Default for ChoppinessSettings {
    fn default() -> Self {
        Self {
            length: nz(14),
            threshold: 61.8,
        }
    }
}

impl ChoppinessSettings {
    /// # Errors
    ///
    /// A length below 2, where the index is undefined.
    pub fn validate(&self) -> Result<()> {
        if self.length.get() < 2 {
            return Err(Error::invalid(
                IndicatorKind::Choppiness,
                "length must be at least 2",
            ));
        }
        Ok(())
    }

    /// Above the threshold the market is ranging.
    #[must_use]
    pub fn regime(&self, value: f64) -> Regime {
        if value > self.threshold {
            Regime::Range
        } else {
            Regime::Trend
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IchimokuSettings {
    pub conversion_period: NonZero<usize>,
    pub base_period: NonZero<usize>,
    pub span_b_period: NonZero<usize>,
}

impl Default for IchimokuSettings {
    fn default() -> Self {
        Self {
            conversion_period: nz(9),
            base_period: nz(26),
            span_b_period: nz(52),
        }
    }
}

impl IchimokuSettings {
    /// Longest lookback of the three lines.
    #[must_use]
    pub fn longest(&self) -> usize {
        self.conversion_period
            .max(self.base_period)
            .max(self.span_b_period)
            .get()
    }

    /// Price above the cloud buys, below sells; a conversion line on the
    /// trend side of the base line makes it strong.
    #[must_use]
    pub fn level(&self, price: f64, conversion: f64, base: f64, span_a: f64, span_b: f64) -> Level {
        let top = span_a.max(span_b);
        let bottom = span_a.min(span_b);
        if price.is_nan() || span_a.is_nan() || span_b.is_nan() {
            Level::Neutral
        } else if price > top {
            if conversion > base {
                Level::StrongBuy
            } else {
                Level::Buy
            }
        } else if price < bottom {
            if conversion < base {
                Level::StrongSell
            } else {
                Level::Sell
            }
        } else {
            Level::Neutral
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParabolicSarSettings {
    pub start: f64,
    pub increment: f64,
    pub max: f64,
}

impl Default for ParabolicSarSettings {
    fn default() -> Self {
        Self {
            start: 0.02,
            increment: 0.02,
            max: 0.2,
        }
    }
}

impl ParabolicSarSettings {
    /// # Errors
    ///
    /// Non-positive factors or a start above the maximum.
    pub fn validate(&self) -> Result<()> {
        let kind = IndicatorKind::ParabolicSar;
        require_positive(kind, "start", self.start)?;
        require_positive(kind, "increment", self.increment)?;
        require_positive(kind, "max", self.max)?;
        if self.start > self.max {
            return Err(Error::invalid(kind, "start must not exceed max"));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SuperTrendSettings {
    pub length: NonZero<usize>,
    pub factor: f64,
}

impl Default for SuperTrendSettings {
    fn default() -> Self {
        Self {
            length: nz(10),
            factor: 3.0,
        }
    }
}

impl SuperTrendSettings {
    /// # Errors
    ///
    /// A non-positive factor.
    pub fn validate(&self) -> Result<()> {
        require_positive(IndicatorKind::SuperTrend, "factor", self.factor)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AtrTrailingStopSettings {
    pub length: NonZero<usize>,
    pub multiplier: f64,
}

impl Default for AtrTrailingStopSettings {
    fn default() -> Self {
        Self {
            length: nz(14),
            multiplier: 1.5,
        }
    }
}

impl AtrTrailingStopSettings {
    /// # Errors
    ///
    /// A non-positive multiplier.
    pub fn validate(&self) -> Result<()> {
        require_positive(IndicatorKind::AtrTrailingStop, "multiplier", self.multiplier)
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PivotSettings {
    #[serde(rename = "type")]
    pub kind: PivotType,
}

/// Settings for every indicator family.
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub rsi: RsiSettings,
    pub stochastic: StochasticSettings,
    pub cci: CciSettings,
    pub adx: AdxSettings,
    pub ao: AoSettings,
    pub momentum: MomentumSettings,
    pub macd: MacdSettings,
    pub ema: EmaSettings,
    pub sma: SmaSettings,
    pub bollinger_bands: BollingerSettings,
    pub atr: AtrSettings,
    pub mfi: MfiSettings,
    pub stoch_rsi: StochRsiSettings,
    pub williams_r: WilliamsRSettings,
    pub choppiness: ChoppinessSettings,
    pub ichimoku: IchimokuSettings,
    pub parabolic_sar: ParabolicSarSettings,
    pub super_trend: SuperTrendSettings,
    pub atr_trailing_stop: AtrTrailingStopSettings,
    pub pivots: PivotSettings,
}

impl Settings {
    /// Parses a (possibly partial) JSON settings record and validates it.
    ///
    /// # Errors
    ///
    /// [`Error::Json`] for malformed input or a zero length,
    /// [`Error::InvalidSettings`] for the first family failing validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks every family.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSettings`] naming the first family that fails.
    pub fn validate(&self) -> Result<()> {
        IndicatorKind::ALL
            .into_iter()
            .try_for_each(|kind| self.validate_kind(kind))
    }

    /// Checks one family; families without constraints always pass.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSettings`] when the family's settings cannot be
    /// computed.
    pub fn validate_kind(&self, kind: IndicatorKind) -> Result<()> {
        match kind {
            IndicatorKind::Rsi => self.rsi.validate(),
            IndicatorKind::Stochastic => self.stochastic.validate(),
            IndicatorKind::Cci => self.cci.validate(),
            IndicatorKind::Adx => self.adx.validate(),
            IndicatorKind::Ao => self.ao.validate(),
            IndicatorKind::Macd => self.macd.validate(),
            IndicatorKind::BollingerBands => self.bollinger_bands.validate(),
            IndicatorKind::Mfi => self.mfi.validate(),
            IndicatorKind::StochRsi => self.stoch_rsi.validate(),
            IndicatorKind::WilliamsR => self.williams_r.validate(),
            IndicatorKind::Choppiness => self.choppiness.validate(),
            IndicatorKind::ParabolicSar => self.parabolic_sar.validate(),
            IndicatorKind::SuperTrend => self.super_trend.validate(),
            IndicatorKind::AtrTrailingStop => self.atr_trailing_stop.validate(),
            IndicatorKind::Momentum
            | IndicatorKind::Ema
            | IndicatorKind::Sma
            | IndicatorKind::Atr
            | IndicatorKind::Vwap
            | IndicatorKind::Ichimoku
            | IndicatorKind::Obv
            | IndicatorKind::Pivots
            | IndicatorKind::Divergences
            | IndicatorKind::Confluence => Ok(()),
        }
    }
}
