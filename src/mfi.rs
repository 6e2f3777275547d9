use std::{fmt::Display, num::NonZero};

use crate::{
    Indicator, IndicatorConfig, Ohlcv, Price, PriceSource, ring_buffer::RingBuffer,
};

/// Configuration for the Money Flow Index ([`Mfi`]) indicator.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct MfiConfig {
    length: usize,
}

impl IndicatorConfig for MfiConfig {
    #[inline]
    fn length(&self) -> usize {
        self.length
    }

    #[inline]
    fn source(&self) -> PriceSource {
        PriceSource::HLC3
    }
}

impl MfiConfig {
    #[must_use]
    pub fn new(length: NonZero<usize>) -> Self {
        Self {
            length: length.get(),
        }
    }
}

impl Display for MfiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MfiConfig({})", self.length)
    }
}

#[derive(Clone, Copy, Debug)]
struct Flow {
    positive: f64,
    negative: f64,
}

impl Flow {
    #[inline]
    fn between(prev_typical: Price, typical: Price, volume: f64) -> Self {
        let raw = typical * volume;
        if raw.is_nan() || prev_typical.is_nan() {
            Self {
                positive: f64::NAN,
                negative: f64::NAN,
            }
        } else if typical > prev_typical {
            Self {
                positive: raw,
                negative: 0.0,
            }
        } else if typical < prev_typical {
            Self {
                positive: 0.0,
                negative: raw,
            }
        } else {
            Self {
                positive: 0.0,
                negative: 0.0,
            }
        }
    }

    #[inline]
    fn is_valid(self) -> bool {
        !self.positive.is_nan()
    }
}

/// `100 − 100 / (1 + positive / negative)`; no flow at all reads 50, no
/// negative flow reads 100.
#[inline]
fn money_flow_index(positive: f64, negative: f64) -> f64 {
    if positive + negative == 0.0 {
        50.0
    } else if negative == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + positive / negative)
    }
}

/// Value-level MFI shared by the batch series and the bar-level state.
///
/// Keeps the last `length` money flows with running positive and negative
/// sums. Sums are rebuilt from the window once every `length` pushes so
/// subtraction residue never leaves a phantom flow behind.
#[derive(Clone, Debug)]
pub(crate) struct MfiCore {
    flows: RingBuffer<Flow>,
    sum_positive: f64,
    sum_negative: f64,
    invalid: usize,
    since_rebuild: usize,
    prev_typical: Option<Price>,
    current: Option<f64>,
}

impl MfiCore {
    pub(crate) fn new(length: usize) -> Self {
        Self {
            flows: RingBuffer::new(length),
            sum_positive: 0.0,
            sum_negative: 0.0,
            invalid: 0,
            since_rebuild: 0,
            prev_typical: None,
            current: None,
        }
    }

    #[inline]
    fn typical(high: Price, low: Price, close: Price) -> Price {
        (high + low + close) / 3.0
    }

    pub(crate) fn push(&mut self, high: Price, low: Price, close: Price, volume: f64) -> Option<f64> {
        let typical = Self::typical(high, low, close);
        let prev_typical = self.prev_typical.replace(typical)?;

        let flow = Flow::between(prev_typical, typical, volume);
        if let Some(old) = self.flows.push(flow) {
            if old.is_valid() {
                self.sum_positive -= old.positive;
                self.sum_negative -= old.negative;
            } else {
                self.invalid -= 1;
            }
        }
        if flow.is_valid() {
            self.sum_positive += flow.positive;
            self.sum_negative += flow.negative;
        } else {
            self.invalid += 1;
        }

        self.since_rebuild += 1;
        if self.flows.is_full() && self.since_rebuild >= self.flows.capacity() {
            self.rebuild();
        }

        self.current = (self.flows.is_full() && self.invalid == 0)
            .then(|| money_flow_index(self.sum_positive, self.sum_negative));
        self.current
    }

    pub(crate) fn preview(&self, high: Price, low: Price, close: Price, volume: f64) -> Option<f64> {
        let flow = Flow::between(self.prev_typical?, Self::typical(high, low, close), volume);
        if self.flows.len() + 1 < self.flows.capacity() || !flow.is_valid() {
            return None;
        }

        let (mut positive, mut negative, mut invalid) =
            (self.sum_positive, self.sum_negative, self.invalid);
        if self.flows.is_full()
            && let Some(old) = self.flows.oldest()
        {
            if old.is_valid() {
                positive -= old.positive;
                negative -= old.negative;
            } else {
                invalid -= 1;
            }
        }

        (invalid == 0).then(|| money_flow_index(positive + flow.positive, negative + flow.negative))
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<f64> {
        self.current
    }

    fn rebuild(&mut self) {
        let (positive, negative) = self
            .flows
            .iter()
            .filter(|f| f.is_valid())
            .fold((0.0, 0.0), |(p, n), f| (p + f.positive, n + f.negative));
        self.sum_positive = positive;
        self.sum_negative = negative;
        self.since_rebuild = 0;
    }
}

/// Money Flow Index (MFI).
///
/// Volume-weighted RSI over the typical price `(high + low + close) / 3`.
/// Raw money flow `typical × volume` counts as positive when the typical
/// price rose from the previous bar, negative when it fell.
///
/// ```text
/// MFI = 100 − 100 / (1 + Σpositive / Σnegative)
/// ```
///
/// Output begins at bar `length + 1` (the first bar has no previous typical
/// price).
#[derive(Clone, Debug)]
pub struct Mfi {
    config: MfiConfig,
    core: MfiCore,
}

impl Indicator for Mfi {
    type Config = MfiConfig;
    type Output = f64;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            core: MfiCore::new(config.length),
        }
    }

    #[inline]
    fn commit(&mut self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        self.core
            .push(ohlcv.high(), ohlcv.low(), ohlcv.close(), ohlcv.volume())
    }

    #[inline]
    fn preview(&self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        self.core
            .preview(ohlcv.high(), ohlcv.low(), ohlcv.close(), ohlcv.volume())
    }

    #[inline]
    fn value(&self) -> Option<Self::Output> {
        self.core.value()
    }
}

impl Display for Mfi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MFI({})", self.config.length)
    }
}
