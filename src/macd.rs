use std::{fmt::Display, num::NonZero};

use crate::{Indicator, IndicatorConfig, Ohlcv, Price, PriceSource, smoothing::SeededAverage};

/// Configuration for the [`Macd`] indicator.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct MacdConfig {
    fast_length: usize,
    slow_length: usize,
    signal_length: usize,
    source: PriceSource,
}

impl IndicatorConfig for MacdConfig {
    /// Bars before the first signal value.
    #[inline]
    fn length(&self) -> usize {
        self.fast_length.max(self.slow_length) + self.signal_length - 1
    }

    #[inline]
    fn source(&self) -> PriceSource {
        self.source
    }
}

impl MacdConfig {
    #[must_use]
    pub fn new(
        fast_length: NonZero<usize>,
        slow_length: NonZero<usize>,
        signal_length: NonZero<usize>,
        source: PriceSource,
    ) -> Self {
        Self {
            fast_length: fast_length.get(),
            slow_length: slow_length.get(),
            signal_length: signal_length.get(),
            source,
        }
    }
}

impl Display for MacdConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MacdConfig({}, {}, {}, {})",
            self.fast_length, self.slow_length, self.signal_length, self.source
        )
    }
}

/// MACD line with its signal and histogram.
///
/// `signal` and `histogram` stay `None` until the signal EMA has seeded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: Option<f64>,
    pub histogram: Option<f64>,
}

impl MacdValue {
    fn new(macd: f64, signal: Option<f64>) -> Self {
        Self {
            macd,
            signal,
            histogram: signal.map(|s| macd - s),
        }
    }
}

/// Value-level MACD shared by the batch series and the bar-level state.
#[derive(Clone, Debug)]
pub(crate) struct MacdCore {
    fast: SeededAverage,
    slow: SeededAverage,
    signal: SeededAverage,
    current: Option<MacdValue>,
}

impl MacdCore {
    pub(crate) fn new(fast_length: usize, slow_length: usize, signal_length: usize) -> Self {
        Self {
            fast: SeededAverage::exponential(fast_length),
            slow: SeededAverage::exponential(slow_length),
            signal: SeededAverage::exponential(signal_length),
            current: None,
        }
    }

    pub(crate) fn push(&mut self, price: Price) -> Option<MacdValue> {
        let fast = self.fast.push(price);
        let slow = self.slow.push(price);

        self.current = fast.zip(slow).map(|(fast, slow)| {
            let line = fast - slow;
            MacdValue::new(line, self.signal.push(line))
        });
        self.current
    }

    pub(crate) fn preview(&self, price: Price) -> Option<MacdValue> {
        let line = self.fast.preview(price)? - self.slow.preview(price)?;
        Some(MacdValue::new(line, self.signal.preview(line)))
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<MacdValue> {
        self.current
    }
}

/// Moving Average Convergence Divergence (MACD).
///
/// ```text
/// MACD      = EMA(fast) − EMA(slow)
/// signal    = EMA(MACD, signal_length)
/// histogram = MACD − signal
/// ```
///
/// Both price EMAs seed with their simple mean; the signal EMA starts at the
/// first valid MACD value.
#[derive(Clone, Debug)]
pub struct Macd {
    config: MacdConfig,
    core: MacdCore,
}

impl Indicator for Macd {
    type Config = MacdConfig;
    type Output = MacdValue;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            core: MacdCore::new(
                config.fast_length,
                config.slow_length,
                config.signal_length,
            ),
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

impl Display for Macd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MACD({}, {}, {})",
            self.config.fast_length, self.config.slow_length, self.config.signal_length
        )
    }
}
