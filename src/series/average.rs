use crate::{price_window::PriceWindow, series::or_nan, smoothing::SeededAverage};

/// One exponential smoothing step: `prev·(1 − α) + value·α`.
#[inline]
#[must_use]
pub fn ema_step(prev: f64, value: f64, alpha: f64) -> f64 {
    prev * (1.0 - alpha) + value * alpha
}

/// One Wilder smoothing step: `prev·(n − 1)/n + value/n`.
#[inline]
#[must_use]
pub fn wilder_step(prev: f64, value: f64, length: f64) -> f64 {
    prev * (length - 1.0) / length + value / length
}

/// Simple moving average.
///
/// First value `period − 1` bars after the first valid input. A `NaN` inside the
/// window makes that output `NaN`; values recover once it leaves.
#[must_use]
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; data.len()];
    }

    let mut window = PriceWindow::new(period);
    data.iter()
        .map(|&value| {
            window.push(value);
            or_nan(window.mean())
        })
        .collect()
}

/// Exponential moving average, `α = 2 / (period + 1)`, seeded with the
/// simple mean of the first `period` valid values.
#[must_use]
pub fn ema(data: &[f64], period: usize) -> Vec<f64> {
    seeded(data, period, SeededAverage::exponential)
}

/// Wilder's running moving average, `α = 1 / period`, seeded with the
/// simple mean of the first `period` valid values.
#[must_use]
pub fn rma(data: &[f64], period: usize) -> Vec<f64> {
    seeded(data, period, SeededAverage::wilder)
}

fn seeded(data: &[f64], period: usize, average: fn(usize) -> SeededAverage) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; data.len()];
    }

    let mut average = average(period);
    data.iter().map(|&value| or_nan(average.push(value))).collect()
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::{assert_approx, assert_nan};

    mod simple {
        use super::*;

        #[test]
        fn warm_up_is_nan() {
            let out = sma(&[1.0, 2.0, 3.0, 4.0], 3);
            assert_nan!(out, 0..2);
            assert_eq!(&out[2..], &[2.0, 3.0]);
        }

        #[test]
        fn period_longer_than_data_is_all_nan() {
            let out = sma(&[1.0, 2.0], 5);
            assert_nan!(out, 0..2);
        }

        #[test]
        fn zero_period_is_all_nan() {
            assert_nan!(sma(&[1.0], 0), 0..1);
        }

        #[test]
        fn leading_nan_is_skipped() {
            let out = sma(&[f64::NAN, 2.0, 4.0, 6.0], 2);
            assert_nan!(out, 0..2);
            assert_eq!(&out[2..], &[3.0, 5.0]);
        }

        #[test]
        fn empty_input() {
            assert!(sma(&[], 3).is_empty());
        }
    }

    mod exponential {
        use super::*;

        #[test]
        fn seeded_with_simple_mean() {
            let out = ema(&[2.0, 4.0, 6.0, 8.0], 3);
            assert_nan!(out, 0..2);
            assert_eq!(out[2], 4.0);
            // alpha 0.5
            assert_eq!(out[3], 6.0);
        }

        #[test]
        fn constant_series_stays_constant() {
            let out = ema(&[5.0; 30], 10);
            assert!(out[9..].iter().all(|&v| v == 5.0));
        }

        #[test]
        fn step_matches_formula() {
            assert_approx!(ema_step(10.0, 20.0, 0.25), 12.5);
        }
    }

    mod wilder {
        use super::*;

        #[test]
        fn seeded_then_smoothed() {
            let out = rma(&[1.0, 3.0, 5.0], 2);
            assert!(out[0].is_nan());
            assert_eq!(out[1], 2.0);
            assert_eq!(out[2], 3.5);
        }

        #[test]
        fn step_matches_formula() {
            assert_approx!(wilder_step(14.0, 0.0, 14.0), 13.0);
        }

        #[test]
        fn nan_after_seed_is_absorbing() {
            let out = rma(&[1.0, 1.0, f64::NAN, 1.0], 2);
            assert_nan!(out, 2..4);
        }
    }
}
