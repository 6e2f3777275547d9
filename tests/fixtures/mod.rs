#![allow(dead_code)]

use quantedge_technicals::{Bar, Ohlcv, Price, Timestamp};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, de::DeserializeOwned};

/// Hourly OHLCV bar parsed from the reference CSV.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RefBar {
    pub open_time: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Ohlcv for RefBar {
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
}

/// Reference value with timestamp.
#[derive(Debug, Deserialize)]
pub struct RefValue {
    pub open_time: Timestamp,
    pub expected: f64,
}

/// Reference BB value with timestamp.
#[derive(Debug, Deserialize)]
pub struct RefBbValue {
    pub open_time: Timestamp,
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

const OHLCV_PATH: &str = "tests/fixtures/data/ohlcv-1h.csv";

/// Load the reference OHLCV bars.
pub fn load_reference_ohlcvs() -> Vec<RefBar> {
    load_records(OHLCV_PATH, "invalid OHLCV record")
}

/// Reference bars as owned [`Bar`]s.
pub fn load_reference_bars() -> Vec<Bar> {
    load_reference_ohlcvs().iter().map(Bar::from_ohlcv).collect()
}

/// Load single-value reference data (SMA, EMA, RSI).
pub fn load_ref_values(path: &str) -> Vec<RefValue> {
    load_records(path, "invalid reference record")
}

/// Load BB reference data (upper, middle, lower).
pub fn load_bb_ref(path: &str) -> Vec<RefBbValue> {
    load_records(path, "invalid BB reference record")
}

/// Seeded geometric random walk of `n` closed hourly bars.
pub fn random_walk(seed: u64, n: usize) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = 100.0_f64;
    let mut time = 1_700_000_000_000_i64;

    (0..n)
        .map(|_| {
            let open = price;
            let close = open * (1.0 + rng.random_range(-0.02..0.02));
            let high = open.max(close) * (1.0 + rng.random_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.random_range(0.0..0.01));
            let volume = rng.random_range(10.0..1_000.0);
            let bar = Bar::new(time, open, high, low, close, volume);
            price = close;
            time += 3_600_000;
            bar
        })
        .collect()
}

/// Assert two f64 values are within tolerance.
pub fn assert_near(actual: f64, expected: f64, tolerance: f64, context: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{context}: expected {expected:.10}, got {actual:.10}, diff {diff:.2e} > tolerance {tolerance:.2e}"
    );
}

/// Assert two f64 values agree to a relative tolerance; two `NaN`s agree.
pub fn assert_close(actual: f64, expected: f64, relative: f64, context: &str) {
    if actual.is_nan() && expected.is_nan() {
        return;
    }
    let tolerance = relative * expected.abs().max(1.0);
    assert_near(actual, expected, tolerance, context);
}

/// Creates forming versions of a bar to simulate live repaints.
///
/// Returns 2 intermediate bars (with shifted close/high/low) followed
/// by the original bar. All share the same `open_time` and are marked as
/// forming.
pub fn repaint_sequence(bar: &Bar) -> Vec<Bar> {
    let t = bar.time;
    vec![
        // First tick: only open is known, close near open
        Bar::new(
            t,
            bar.open,
            bar.open * 1.001,
            bar.open * 0.999,
            bar.open * 1.0005,
            bar.volume * 0.1,
        )
        .forming(),
        // Mid-bar: partial movement toward final values
        Bar::new(
            t,
            bar.open,
            bar.open.midpoint(bar.high),
            bar.open.midpoint(bar.low),
            bar.open.midpoint(bar.close),
            bar.volume * 0.5,
        )
        .forming(),
        // Final: real OHLCV values
        bar.forming(),
    ]
}

/// Generate reference match + preview tests for a single-value indicator.
///
/// Usage: `reference_test!(sma_20, Sma, SmaConfig::close(nz(20)), "tests/fixtures/data/sma-20-close.csv", 1e-6);`
#[allow(unused_macros)]
macro_rules! reference_test {
    ($name:ident, $ind:ty, $config:expr, $ref_path:expr, $tolerance:expr) => {
        mod $name {
            use super::fixtures::*;
            use quantedge_technicals::*;
            use std::num::NonZero;

            fn nz(n: usize) -> NonZero<usize> {
                NonZero::new(n).unwrap()
            }

            #[test]
            fn matches_reference() {
                let bars = load_reference_ohlcvs();
                let reference = load_ref_values($ref_path);
                let mut ind = <$ind>::new($config);

                let mut ref_idx = 0;
                for bar in &bars {
                    ind.commit(bar);

                    if ref_idx < reference.len()
                        && bar.open_time == reference[ref_idx].open_time
                    {
                        let value = ind.value().unwrap_or_else(|| {
                            panic!("{} returned None at t={}", stringify!($name), bar.open_time)
                        });
                        assert_near(
                            value,
                            reference[ref_idx].expected,
                            $tolerance,
                            &format!(
                                "{} at bar {ref_idx} (t={})",
                                stringify!($name),
                                bar.open_time
                            ),
                        );
                        ref_idx += 1;
                    }
                }

                assert_eq!(
                    ref_idx,
                    reference.len(),
                    "not all reference values checked: {ref_idx}/{}",
                    reference.len()
                );
            }

            #[test]
            fn preview_matches_commit() {
                let bars = load_reference_bars();
                let mut ind = <$ind>::new($config);

                for (i, bar) in bars.iter().enumerate() {
                    let mut previewed = None;
                    for tick in repaint_sequence(bar) {
                        previewed = ind.preview(&tick);
                    }
                    let committed = ind.commit(bar);
                    match (previewed, committed) {
                        (None, None) => {}
                        (Some(p), Some(c)) => assert_near(p, c, $tolerance, &format!("bar {i}")),
                        (p, c) => panic!("convergence mismatch at bar {i}: {p:?} vs {c:?}"),
                    }
                }
            }
        }
    };
}

#[allow(unused_imports)]
pub(crate) use reference_test;

fn load_records<D>(path: &str, expect_msg: &str) -> Vec<D>
where
    D: DeserializeOwned,
{
    let mut rdr =
        csv::Reader::from_path(path).unwrap_or_else(|e| panic!("failed to open {path}: {e}"));

    rdr.deserialize().map(|r| r.expect(expect_msg)).collect()
}
