use std::{fmt::Display, num::NonZero};

use crate::{Indicator, IndicatorConfig, Ohlcv, Price, PriceSource, price_window::PriceWindow};

/// Configuration for the Simple Moving Average ([`Sma`]) indicator.
///
/// # Example
///
/// ```
/// use quantedge_technicals::{IndicatorConfig, PriceSource, SmaConfig};
/// use std::num::NonZero;
///
/// let config = SmaConfig::new(NonZero::new(20).unwrap(), PriceSource::HL2);
/// assert_eq!(config.length(), 20);
/// assert_eq!(config.source(), PriceSource::HL2);
/// ```
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct SmaConfig {
    length: usize,
    source: PriceSource,
}

impl IndicatorConfig for SmaConfig {
    #[inline]
    fn length(&self) -> usize {
        self.length
    }

    #[inline]
    fn source(&self) -> PriceSource {
        self.source
    }
}

impl SmaConfig {
    #[must_use]
    pub fn new(length: NonZero<usize>, source: PriceSource) -> Self {
        Self {
            length: length.get(),
            source,
        }
    }

    /// SMA on closing price.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self::new(length, PriceSource::Close)
    }
}

impl Display for SmaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SmaConfig({}, {})", self.length, self.source)
    }
}

/// Simple Moving Average (SMA).
///
/// Arithmetic mean of the last `length` source values. Returns `None` until
/// the window is full.
///
/// ```text
/// SMA = (P₁ + P₂ + … + Pₙ) / n
/// ```
///
/// Running sums are kept relative to an anchor near the window mean, so
/// the average stays exact at any price magnitude.
#[derive(Clone, Debug)]
pub struct Sma {
    config: SmaConfig,
    window: PriceWindow,
    current: Option<Price>,
}

impl Indicator for Sma {
    type Config = SmaConfig;
    type Output = Price;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            window: PriceWindow::new(config.length),
            current: None,
        }
    }

    #[inline]
    fn commit(&mut self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        self.window.push(self.config.source.extract(ohlcv));
        self.current = self.window.mean();
        self.current
    }

    #[inline]
    fn preview(&self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        self.window.preview_mean(self.config.source.extract(ohlcv))
    }

    #[inline]
    fn value(&self) -> Option<Self::Output> {
        self.current
    }
}

impl Display for Sma {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SMA({}, {})", self.config.length, self.config.source)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::{Bar, bar, nz};

    fn sma(length: usize) -> Sma {
        Sma::new(SmaConfig::close(nz(length)))
    }

    mod filling {
        use super::*;

        #[test]
        fn none_until_window_full() {
            let mut sma = sma(3);
            assert_eq!(sma.commit(&bar(10.0, 1)), None);
            assert_eq!(sma.commit(&bar(20.0, 2)), None);
            assert_eq!(sma.commit(&bar(30.0, 3)), Some(20.0));
        }

        #[test]
        fn length_one_follows_price() {
            let mut sma = sma(1);
            assert_eq!(sma.commit(&bar(7.0, 1)), Some(7.0));
            assert_eq!(sma.commit(&bar(9.0, 2)), Some(9.0));
        }
    }

    mod sliding {
        use super::*;

        #[test]
        fn oldest_value_leaves_window() {
            let mut sma = sma(2);
            sma.commit(&bar(10.0, 1));
            sma.commit(&bar(20.0, 2));
            assert_eq!(sma.commit(&bar(40.0, 3)), Some(30.0));
        }

        #[test]
        fn uses_configured_source() {
            let mut sma = Sma::new(SmaConfig::new(nz(2), PriceSource::HL2));
            sma.commit(&Bar::new(0.0, 10.0, 0.0, 1.0).at(1));
            assert_eq!(sma.commit(&Bar::new(0.0, 20.0, 10.0, 1.0).at(2)), Some(10.0));
        }
    }

    mod preview {
        use super::*;

        #[test]
        fn preview_does_not_advance() {
            let mut sma = sma(2);
            sma.commit(&bar(10.0, 1));
            sma.commit(&bar(20.0, 2));
            assert_eq!(sma.preview(&bar(100.0, 3)), Some(60.0));
            assert_eq!(sma.preview(&bar(40.0, 3)), Some(30.0));
            assert_eq!(sma.value(), Some(15.0));
        }

        #[test]
        fn preview_then_commit_agree() {
            let mut sma = sma(3);
            for (i, p) in [3.0, 5.0, 7.0, 11.0].into_iter().enumerate() {
                sma.commit(&bar(p, i64::try_from(i).unwrap()));
            }
            let previewed = sma.preview(&bar(13.0, 9)).unwrap();
            let committed = sma.commit(&bar(13.0, 9)).unwrap();
            assert!((previewed - committed).abs() < 1e-12);
        }
    }

    #[test]
    fn display() {
        assert_eq!(sma(20).to_string(), "SMA(20, Close)");
    }
}
