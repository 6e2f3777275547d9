// src/test_util.rs

use crate::{Ohlcv, Price, Timestamp};

use std::num::NonZero;

/// Asserts that two `f64` values are approximately equal using a
/// relative epsilon of `4 * f64::EPSILON`, or an absolute tolerance when one
/// is given.
macro_rules! assert_approx {
    ($actual:expr, $expected:expr, $tolerance:expr) => {{
        let (a, e, tol) = ($actual, $expected, $tolerance);
        assert!(
            (a - e).abs() <= tol,
            "assert_approx failed: actual={a}, expected={e}, tolerance={tol}",
        );
    }};
    ($actual:expr, $expected:expr) => {{
        let (a, e) = ($actual, $expected);
        assert!(
            (a - e).abs() <= e.abs() * 4.0 * f64::EPSILON,
            "assert_approx failed: actual={a}, expected={e}, diff={}",
            (a - e).abs(),
        );
    }};
}

/// Asserts every listed index of a series is `NaN`.
macro_rules! assert_nan {
    ($series:expr, $range:expr) => {{
        let series = &$series;
        for i in $range {
            assert!(series[i].is_nan(), "expected NaN at {i}, got {}", series[i]);
        }
    }};
}

pub(crate) use assert_approx;
pub(crate) use assert_nan;

pub fn nz(n: usize) -> NonZero<usize> {
    NonZero::new(n).unwrap()
}

#[derive(Clone, Copy, Debug)]
pub struct Bar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub open_time: Timestamp,
    pub closed: bool,
}

impl Bar {
    pub fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume: 0.0,
            open_time: 0,
            closed: true,
        }
    }

    pub fn at(mut self, open_time: Timestamp) -> Self {
        self.open_time = open_time;
        self
    }

    pub fn vol(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    pub fn forming(mut self) -> Self {
        self.closed = false;
        self
    }
}

/// Convenience: bar with just a close price and timestamp (OHLC all equal to close).
pub fn bar(close: f64, time: Timestamp) -> Bar {
    Bar::new(close, close, close, close).at(time)
}

/// Flat bars from a list of closes, one per millisecond.
pub fn closes(values: &[f64]) -> Vec<Bar> {
    values
        .iter()
        .zip(0..)
        .map(|(&c, t)| bar(c, t))
        .collect()
}

impl Ohlcv for Bar {
    fn open(&self) -> Price {
        self.open
    }
    fn high(&self) -> Price {
        self.high
    }
    fn low(&self) -> Price {
        self.low
    }
    fn close(&self) -> Price {
        self.close
    }
    fn open_time(&self) -> Timestamp {
        self.open_time
    }
    fn volume(&self) -> f64 {
        self.volume
    }
    fn is_closed(&self) -> bool {
        self.closed
    }
}
