use std::{fmt::Display, num::NonZero};

use crate::{
    Indicator, IndicatorConfig, Ohlcv, Price, PriceSource, atr::true_range_of,
    smoothing::SeededAverage,
};

/// Configuration for the Average Directional Index ([`Adx`]) indicator.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct AdxConfig {
    length: usize,
}

impl IndicatorConfig for AdxConfig {
    /// Bars before the first ADX value.
    #[inline]
    fn length(&self) -> usize {
        2 * self.length - 1
    }

    #[inline]
    fn source(&self) -> PriceSource {
        PriceSource::Close
    }
}

impl AdxConfig {
    #[must_use]
    pub fn new(length: NonZero<usize>) -> Self {
        Self {
            length: length.get(),
        }
    }
}

impl Display for AdxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AdxConfig({})", self.length)
    }
}

/// ADX with the directional indicators it is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdxValue {
    pub adx: f64,
    pub plus_di: f64,
    pub minus_di: f64,
}

#[derive(Clone, Copy, Debug)]
struct PrevBar {
    high: Price,
    low: Price,
    close: Price,
}

#[derive(Clone, Copy, Debug)]
struct Movement {
    plus_dm: f64,
    minus_dm: f64,
    true_range: f64,
}

impl Movement {
    /// The first bar has no directional movement and a true range of
    /// `high − low`.
    fn of(prev: Option<PrevBar>, high: Price, low: Price) -> Self {
        let Some(prev) = prev else {
            return Self {
                plus_dm: 0.0,
                minus_dm: 0.0,
                true_range: high - low,
            };
        };

        let up = high - prev.high;
        let down = prev.low - low;
        let (plus_dm, minus_dm) = if up.is_nan() || down.is_nan() {
            (f64::NAN, f64::NAN)
        } else {
            (
                if up > down && up > 0.0 { up } else { 0.0 },
                if down > up && down > 0.0 { down } else { 0.0 },
            )
        };

        Self {
            plus_dm,
            minus_dm,
            true_range: true_range_of(high, low, Some(prev.close)),
        }
    }
}

#[inline]
fn directional_index(movement: f64, true_range: f64) -> f64 {
    if true_range == 0.0 {
        0.0
    } else {
        100.0 * movement / true_range
    }
}

#[inline]
fn directional_movement_index(plus_di: f64, minus_di: f64) -> f64 {
    let sum = plus_di + minus_di;
    if sum == 0.0 {
        0.0
    } else {
        100.0 * (plus_di - minus_di).abs() / sum
    }
}

/// Value-level ADX shared by the batch series and the bar-level state.
#[derive(Clone, Debug)]
pub(crate) struct AdxCore {
    prev: Option<PrevBar>,
    plus_dm: SeededAverage,
    minus_dm: SeededAverage,
    true_range: SeededAverage,
    dx: SeededAverage,
    current: Option<AdxValue>,
}

impl AdxCore {
    pub(crate) fn new(length: usize) -> Self {
        Self {
            prev: None,
            plus_dm: SeededAverage::wilder(length),
            minus_dm: SeededAverage::wilder(length),
            true_range: SeededAverage::wilder(length),
            dx: SeededAverage::wilder(length),
            current: None,
        }
    }

    pub(crate) fn push(&mut self, high: Price, low: Price, close: Price) -> Option<AdxValue> {
        let movement = Movement::of(self.prev, high, low);
        self.prev = Some(PrevBar { high, low, close });

        let plus = self.plus_dm.push(movement.plus_dm);
        let minus = self.minus_dm.push(movement.minus_dm);
        let range = self.true_range.push(movement.true_range);

        self.current = match (plus, minus, range) {
            (Some(plus), Some(minus), Some(range)) => {
                let plus_di = directional_index(plus, range);
                let minus_di = directional_index(minus, range);
                self.dx
                    .push(directional_movement_index(plus_di, minus_di))
                    .map(|adx| AdxValue {
                        adx,
                        plus_di,
                        minus_di,
                    })
            }
            _ => None,
        };
        self.current
    }

    pub(crate) fn preview(&self, high: Price, low: Price) -> Option<AdxValue> {
        let movement = Movement::of(self.prev, high, low);
        let range = self.true_range.preview(movement.true_range)?;
        let plus_di = directional_index(self.plus_dm.preview(movement.plus_dm)?, range);
        let minus_di = directional_index(self.minus_dm.preview(movement.minus_dm)?, range);
        let adx = self
            .dx
            .preview(directional_movement_index(plus_di, minus_di))?;

        Some(AdxValue {
            adx,
            plus_di,
            minus_di,
        })
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<AdxValue> {
        self.current
    }
}

/// Average Directional Index (ADX) with Wilder's smoothing.
///
/// ```text
/// +DM = up move if up > down and up > 0, else 0
/// −DM = down move if down > up and down > 0, else 0
/// ±DI = 100 × Wilder(±DM) / Wilder(TR)
/// DX  = 100 × |+DI − −DI| / (+DI + −DI)
/// ADX = Wilder(DX)
/// ```
///
/// The first bar contributes zero movement and a `high − low` true range,
/// so the first ADX lands on bar `2 × length − 1`.
#[derive(Clone, Debug)]
pub struct Adx {
    config: AdxConfig,
    core: AdxCore,
}

impl Indicator for Adx {
    type Config = AdxConfig;
    type Output = AdxValue;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            core: AdxCore::new(config.length),
        }
    }

    #[inline]
    fn commit(&mut self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        self.core.push(ohlcv.high(), ohlcv.low(), ohlcv.close())
    }

    #[inline]
    fn preview(&self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        self.core.preview(ohlcv.high(), ohlcv.low())
    }

    #[inline]
    fn value(&self) -> Option<Self::Output> {
        self.core.value()
    }
}

impl Display for Adx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ADX({})", self.config.length)
    }
}
