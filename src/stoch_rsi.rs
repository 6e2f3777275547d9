use std::{fmt::Display, num::NonZero};

use crate::{
    Indicator, IndicatorConfig, Ohlcv, Price, PriceSource, price_window::PriceWindow,
    ring_buffer::RingBuffer, rsi::RsiCore,
};

/// Configuration for the Stochastic RSI ([`StochRsi`]) indicator.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct StochRsiConfig {
    rsi_length: usize,
    stoch_length: usize,
    k_smoothing: usize,
    d_smoothing: usize,
    source: PriceSource,
}

impl IndicatorConfig for StochRsiConfig {
    /// Bars before the first %D value.
    #[inline]
    fn length(&self) -> usize {
        self.rsi_length + self.stoch_length + self.k_smoothing + self.d_smoothing - 2
    }

    #[inline]
    fn source(&self) -> PriceSource {
        self.source
    }
}

impl StochRsiConfig {
    #[must_use]
    pub fn new(
        rsi_length: NonZero<usize>,
        stoch_length: NonZero<usize>,
        k_smoothing: NonZero<usize>,
        d_smoothing: NonZero<usize>,
        source: PriceSource,
    ) -> Self {
        Self {
            rsi_length: rsi_length.get(),
            stoch_length: stoch_length.get(),
            k_smoothing: k_smoothing.get(),
            d_smoothing: d_smoothing.get(),
            source,
        }
    }
}

impl Display for StochRsiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "StochRsiConfig({}, {}, {}, {}, {})",
            self.rsi_length, self.stoch_length, self.k_smoothing, self.d_smoothing, self.source
        )
    }
}

/// %K and %D lines of a stochastic oscillator.
///
/// `d` stays `None` until enough %K values exist to average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StochValue {
    pub k: f64,
    pub d: Option<f64>,
}

/// `100 × (value − lowest) / (highest − lowest)`; a flat range reads 50.
#[inline]
pub(crate) fn stochastic_position(value: f64, lowest: f64, highest: f64) -> f64 {
    let range = highest - lowest;
    if range == 0.0 {
        50.0
    } else {
        100.0 * (value - lowest) / range
    }
}

/// Value-level Stochastic RSI shared by the batch series and the bar-level
/// state: an RSI, a window of the last `stoch_length` RSI values, and two
/// SMA windows for %K and %D.
#[derive(Clone, Debug)]
pub(crate) struct StochRsiCore {
    rsi: RsiCore,
    rsi_history: RingBuffer<f64>,
    k_smoothing: PriceWindow,
    d_smoothing: PriceWindow,
    current: Option<StochValue>,
}

impl StochRsiCore {
    pub(crate) fn new(
        rsi_length: usize,
        stoch_length: usize,
        k_smoothing: usize,
        d_smoothing: usize,
    ) -> Self {
        Self {
            rsi: RsiCore::new(rsi_length),
            rsi_history: RingBuffer::new(stoch_length),
            k_smoothing: PriceWindow::new(k_smoothing),
            d_smoothing: PriceWindow::new(d_smoothing),
            current: None,
        }
    }

    pub(crate) fn push(&mut self, price: Price) -> Option<StochValue> {
        let rsi = self.rsi.push(price)?;
        self.rsi_history.push(rsi);

        self.current = if self.rsi_history.is_full() {
            let (lowest, highest) = extremes(self.rsi_history.iter());
            self.k_smoothing
                .push(stochastic_position(rsi, lowest, highest));
            self.k_smoothing.mean().map(|k| {
                self.d_smoothing.push(k);
                StochValue {
                    k,
                    d: self.d_smoothing.mean(),
                }
            })
        } else {
            None
        };
        self.current
    }

    pub(crate) fn preview(&self, price: Price) -> Option<StochValue> {
        let rsi = self.rsi.preview(price)?;
        let capacity = self.rsi_history.capacity();
        if self.rsi_history.len() + 1 < capacity {
            return None;
        }

        let kept = self.rsi_history.iter().skip(self.rsi_history.len() + 1 - capacity);
        let (lowest, highest) = extremes(kept.chain(std::iter::once(rsi)));
        let k = self
            .k_smoothing
            .preview_mean(stochastic_position(rsi, lowest, highest))?;

        Some(StochValue {
            k,
            d: self.d_smoothing.preview_mean(k),
        })
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<StochValue> {
        self.current
    }
}

fn extremes(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Stochastic RSI.
///
/// Applies the stochastic oscillator to RSI values instead of prices:
///
/// ```text
/// raw %K = 100 × (RSI − min(RSI, n)) / (max(RSI, n) − min(RSI, n))
/// %K     = SMA(raw %K, k_smoothing)
/// %D     = SMA(%K, d_smoothing)
/// ```
///
/// A flat RSI window reads 50.
#[derive(Clone, Debug)]
pub struct StochRsi {
    config: StochRsiConfig,
    core: StochRsiCore,
}

impl Indicator for StochRsi {
    type Config = StochRsiConfig;
    type Output = StochValue;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            core: StochRsiCore::new(
                config.rsi_length,
                config.stoch_length,
                config.k_smoothing,
                config.d_smoothing,
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

impl Display for StochRsi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "StochRSI({}, {}, {}, {})",
            self.config.rsi_length,
            self.config.stoch_length,
            self.config.k_smoothing,
            self.config.d_smoothing
        )
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::cast_precision_loss)]
mod tests {
    use super::*;
    use crate::test_util::{bar, nz};

    fn stoch_rsi(rsi: usize, stoch: usize, k: usize, d: usize) -> StochRsi {
        StochRsi::new(StochRsiConfig::new(
            nz(rsi),
            nz(stoch),
            nz(k),
            nz(d),
            PriceSource::Close,
        ))
    }

    fn zigzag(n: i64) -> Vec<(i64, f64)> {
        (0..n)
            .map(|t| (t, if t % 3 == 0 { 10.0 } else { 10.0 + (t % 5) as f64 }))
            .collect()
    }

    #[test]
    fn first_k_after_rsi_and_stoch_windows() {
        let mut ind = stoch_rsi(2, 3, 1, 1);
        let outputs: Vec<_> = zigzag(8)
            .into_iter()
            .map(|(t, p)| ind.commit(&bar(p, t)))
            .collect();
        // RSI from bar 2, full window of 3 RSI values at bar 4
        assert!(outputs[..4].iter().all(Option::is_none));
        assert!(outputs[4].is_some());
    }

    #[test]
    fn d_lags_k() {
        let mut ind = stoch_rsi(2, 2, 1, 3);
        let mut first_k = None;
        let mut first_d = None;
        for (t, p) in zigzag(20) {
            if let Some(v) = ind.commit(&bar(p, t)) {
                first_k.get_or_insert(t);
                if v.d.is_some() {
                    first_d.get_or_insert(t);
                }
            }
        }
        assert_eq!(first_d.unwrap() - first_k.unwrap(), 2);
    }

    #[test]
    fn values_stay_in_range() {
        let mut ind = stoch_rsi(3, 4, 2, 2);
        for (t, p) in zigzag(60) {
            if let Some(v) = ind.commit(&bar(p, t)) {
                assert!((0.0..=100.0).contains(&v.k), "k {}", v.k);
            }
        }
    }

    #[test]
    fn preview_matches_commit() {
        let mut ind = stoch_rsi(3, 4, 2, 2);
        for (t, p) in zigzag(30) {
            ind.commit(&bar(p, t));
        }
        let before = ind.value();
        let previewed = ind.preview(&bar(13.5, 30)).unwrap();
        assert_eq!(ind.value(), before);
        let committed = ind.commit(&bar(13.5, 30)).unwrap();
        assert!((previewed.k - committed.k).abs() < 1e-9);
        assert!((previewed.d.unwrap() - committed.d.unwrap()).abs() < 1e-9);
    }

    #[test]
    fn flat_range_reads_fifty() {
        assert_eq!(stochastic_position(5.0, 5.0, 5.0), 50.0);
        assert_eq!(stochastic_position(7.5, 5.0, 10.0), 50.0);
        assert_eq!(stochastic_position(10.0, 5.0, 10.0), 100.0);
    }
}
