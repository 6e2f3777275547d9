use std::{fmt::Display, num::NonZero};

use crate::{Indicator, IndicatorConfig, Ohlcv, Price, PriceSource, smoothing::SeededAverage};

/// Configuration for the Exponential Moving Average ([`Ema`]) indicator.
///
/// # Convergence
///
/// The first `length` values seed the average with their simple mean, so
/// output begins at bar `length`. Every later value carries a contribution
/// of the seed that decays by `(1 − α)` per bar.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct EmaConfig {
    length: usize,
    source: PriceSource,
}

impl IndicatorConfig for EmaConfig {
    #[inline]
    fn length(&self) -> usize {
        self.length
    }

    #[inline]
    fn source(&self) -> PriceSource {
        self.source
    }
}

impl EmaConfig {
    #[must_use]
    pub fn new(length: NonZero<usize>, source: PriceSource) -> Self {
        Self {
            length: length.get(),
            source,
        }
    }

    /// EMA on closing price.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self::new(length, PriceSource::Close)
    }
}

impl Display for EmaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EmaConfig({}, {})", self.length, self.source)
    }
}

/// Exponential Moving Average (EMA).
///
/// Weighted average that gives more weight to recent prices.
///
/// ```text
/// α   = 2 / (length + 1)
/// EMA = EMA_prev × (1 − α) + price × α
/// ```
///
/// # Example
///
/// ```
/// use quantedge_technicals::{Bar, Ema, EmaConfig};
/// use std::num::NonZero;
///
/// let mut ema = Ema::new(EmaConfig::close(NonZero::new(3).unwrap()));
/// let bar = |t, c| Bar::new(t, c, c, c, c, 0.0);
///
/// assert_eq!(ema.commit(&bar(1, 2.0)), None);
/// assert_eq!(ema.commit(&bar(2, 4.0)), None);
/// assert_eq!(ema.commit(&bar(3, 6.0)), Some(4.0));
/// assert_eq!(ema.commit(&bar(4, 8.0)), Some(6.0));
/// ```
#[derive(Clone, Debug)]
pub struct Ema {
    config: EmaConfig,
    average: SeededAverage,
}

impl Indicator for Ema {
    type Config = EmaConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            average: SeededAverage::exponential(config.length),
        }
    }

    #[inline]
    fn commit(&mut self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        self.average.push(self.config.source.extract(ohlcv))
    }

    #[inline]
    fn preview(&self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        self.average.preview(self.config.source.extract(ohlcv))
    }

    #[inline]
    fn value(&self) -> Option<Self::Output> {
        self.average.value()
    }
}

impl Display for Ema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EMA({}, {})", self.config.length, self.config.source)
    }
}
