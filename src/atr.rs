use std::{fmt::Display, num::NonZero};

use crate::{Indicator, IndicatorConfig, Ohlcv, Price, PriceSource, smoothing::SeededAverage};

/// Configuration for the Average True Range ([`Atr`]) indicator.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct AtrConfig {
    length: usize,
}

impl IndicatorConfig for AtrConfig {
    #[inline]
    fn length(&self) -> usize {
        self.length
    }

    /// ATR reads high, low and the previous close; the close is reported.
    #[inline]
    fn source(&self) -> PriceSource {
        PriceSource::Close
    }
}

impl AtrConfig {
    #[must_use]
    pub fn new(length: NonZero<usize>) -> Self {
        Self {
            length: length.get(),
        }
    }
}

impl Display for AtrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AtrConfig({})", self.length)
    }
}

/// True range of one bar.
///
/// `max(high − low, |high − prev_close|, |low − prev_close|)`, or
/// `high − low` on the first bar. Any `NaN` input yields `NaN`.
#[inline]
pub(crate) fn true_range_of(high: Price, low: Price, prev_close: Option<Price>) -> f64 {
    let hl = high - low;
    match prev_close {
        Some(prev_close) => {
            let hc = (high - prev_close).abs();
            let lc = (low - prev_close).abs();
            if hl.is_nan() || hc.is_nan() || lc.is_nan() {
                f64::NAN
            } else {
                hl.max(hc).max(lc)
            }
        }
        None => hl,
    }
}

/// Value-level ATR shared by the batch series and the bar-level state.
#[derive(Clone, Debug)]
pub(crate) struct AtrCore {
    prev_close: Option<Price>,
    average: SeededAverage,
}

impl AtrCore {
    pub(crate) fn new(length: usize) -> Self {
        Self {
            prev_close: None,
            average: SeededAverage::wilder(length),
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, high: Price, low: Price, close: Price) -> Option<f64> {
        let tr = true_range_of(high, low, self.prev_close);
        self.prev_close = Some(close);
        self.average.push(tr)
    }

    #[inline]
    pub(crate) fn preview(&self, high: Price, low: Price) -> Option<f64> {
        self.average
            .preview(true_range_of(high, low, self.prev_close))
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<f64> {
        self.average.value()
    }
}

/// Average True Range (ATR) with Wilder's smoothing.
///
/// ```text
/// TR  = max(high − low, |high − prev_close|, |low − prev_close|)
/// ATR = Wilder average of TR over `length` bars
/// ```
///
/// The first bar has no previous close, its true range is `high − low`.
/// Output begins at bar `length`.
#[derive(Clone, Debug)]
pub struct Atr {
    config: AtrConfig,
    core: AtrCore,
}

impl Indicator for Atr {
    type Config = AtrConfig;
    type Output = f64;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            core: AtrCore::new(config.length),
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

impl Display for Atr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ATR({})", self.config.length)
    }
}
