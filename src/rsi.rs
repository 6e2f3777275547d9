use std::{fmt::Display, num::NonZero};

use crate::{Indicator, IndicatorConfig, Ohlcv, Price, PriceSource, smoothing::SeededAverage};

/// Configuration for the Relative Strength Index ([`Rsi`])
/// indicator.
///
/// RSI uses Wilder's smoothing, which has infinite memory: the
/// SMA seed (first `length` price changes) influences all
/// subsequent values. Output begins at bar `length + 1`.
///
/// # Example
///
/// ```
/// use quantedge_technicals::{IndicatorConfig, RsiConfig};
/// use std::num::NonZero;
///
/// let config = RsiConfig::close(NonZero::new(14).unwrap());
/// assert_eq!(config.length(), 14);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct RsiConfig {
    length: usize,
    source: PriceSource,
}

impl IndicatorConfig for RsiConfig {
    #[inline]
    fn length(&self) -> usize {
        self.length
    }

    #[inline]
    fn source(&self) -> PriceSource {
        self.source
    }
}

impl RsiConfig {
    #[must_use]
    pub fn new(length: NonZero<usize>, source: PriceSource) -> Self {
        Self {
            length: length.get(),
            source,
        }
    }

    /// RSI on closing price.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self::new(length, PriceSource::Close)
    }
}

impl Display for RsiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RsiConfig({}, {})", self.length, self.source)
    }
}

/// Value-level RSI shared by the batch series and the bar-level state.
#[derive(Clone, Debug)]
pub(crate) struct RsiCore {
    prev_price: Option<Price>,
    avg_gain: SeededAverage,
    avg_loss: SeededAverage,
    current: Option<Price>,
}

impl RsiCore {
    pub(crate) fn new(length: usize) -> Self {
        Self {
            prev_price: None,
            avg_gain: SeededAverage::wilder(length),
            avg_loss: SeededAverage::wilder(length),
            current: None,
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, price: Price) -> Option<Price> {
        let Some(prev_price) = self.prev_price else {
            if !price.is_nan() {
                self.prev_price = Some(price);
            }
            return None;
        };

        let (gain, loss) = gain_and_loss(prev_price, price);
        self.prev_price = Some(price);

        let avg_gain = self.avg_gain.push(gain);
        let avg_loss = self.avg_loss.push(loss);
        self.current = avg_gain.zip(avg_loss).map(|(g, l)| strength_index(g, l));
        self.current
    }

    #[inline]
    pub(crate) fn preview(&self, price: Price) -> Option<Price> {
        let (gain, loss) = gain_and_loss(self.prev_price?, price);
        let avg_gain = self.avg_gain.preview(gain)?;
        let avg_loss = self.avg_loss.preview(loss)?;
        Some(strength_index(avg_gain, avg_loss))
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<Price> {
        self.current
    }
}

/// Splits a price change into gain and loss. A `NaN` change yields `NaN`
/// for both, `f64::max` would silently turn it into zero.
#[inline]
fn gain_and_loss(prev: Price, cur: Price) -> (f64, f64) {
    let change = cur - prev;
    if change.is_nan() {
        (f64::NAN, f64::NAN)
    } else if change > 0.0 {
        (change, 0.0)
    } else {
        (0.0, -change)
    }
}

/// `100 × gain / (gain + loss)`; a market without movement reads 50.
#[inline]
fn strength_index(avg_gain: f64, avg_loss: f64) -> f64 {
    let total = avg_gain + avg_loss;
    if total == 0.0 {
        50.0
    } else {
        100.0 * avg_gain / total
    }
}

/// Relative Strength Index (RSI) with Wilder's smoothing.
///
/// Measures the speed and magnitude of recent price changes on
/// a 0–100 scale. Values above 70 are conventionally considered
/// overbought; below 30, oversold.
///
/// The first `length` price changes are averaged with a simple
/// mean (SMA seed). After seeding, gains and losses are smoothed
/// with Wilder's method (`α = 1 / length`):
///
/// ```text
/// avg_gain = prev_avg_gain × (length − 1) / length + gain / length
/// avg_loss = prev_avg_loss × (length − 1) / length + loss / length
/// RSI      = 100 × avg_gain / (avg_gain + avg_loss)
/// ```
///
/// # Example
///
/// ```
/// use quantedge_technicals::{Bar, Rsi, RsiConfig};
/// use std::num::NonZero;
///
/// let mut rsi = Rsi::new(RsiConfig::close(NonZero::new(3).unwrap()));
/// let bar = |t, c| Bar::new(t, c, c, c, c, 0.0);
///
/// // Seeding: need 3 price changes (4 bars)
/// assert_eq!(rsi.commit(&bar(1, 10.0)), None);
/// assert_eq!(rsi.commit(&bar(2, 12.0)), None);
/// assert_eq!(rsi.commit(&bar(3, 11.0)), None);
///
/// // Bar 4: changes = +2, −1, +2 → avg_gain=4/3, avg_loss=1/3 → RSI=80
/// let value = rsi.commit(&bar(4, 13.0)).unwrap();
/// assert!((value - 80.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug)]
pub struct Rsi {
    config: RsiConfig,
    core: RsiCore,
}

impl Indicator for Rsi {
    type Config = RsiConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            core: RsiCore::new(config.length),
        }
    }

    #[inline]
    fn commit(&mut self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        self.core.push(self.config.source.extract(ohlcv))
    }

    #[inline]
    fn preview(&self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        self.core.preview(self.config.source.extract(ohlcv))
    }

    #[inline]
    fn value(&self) -> Option<Self::Output> {
        self.core.value()
    }
}

impl Display for Rsi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RSI({}, {})", self.config.length, self.config.source)
    }
}
