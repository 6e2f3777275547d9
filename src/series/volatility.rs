use crate::{
    atr::{AtrCore, true_range_of},
    bb::BbValue,
    buffer_pool::BufferPool,
    price_window::{PriceWindow, PriceWindowWithSumOfSquares},
    series::{or_nan, with_extremes},
};

/// Upper, middle and lower Bollinger bands.
#[derive(Clone, Debug, PartialEq)]
pub struct BollingerSeries {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

/// True range per bar; the first bar reads `high − low`.
#[must_use]
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let prev_close = std::iter::once(None).chain(close.iter().copied().map(Some));
    high.iter()
        .zip(low)
        .zip(prev_close)
        .map(|((&h, &l), prev)| true_range_of(h, l, prev))
        .collect()
}

/// Average true range with Wilder smoothing.
#[must_use]
pub fn atr(high: &[f64], low: &[f64], close: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; close.len()];
    }

    let mut core = AtrCore::new(period);
    high.iter()
        .zip(low)
        .zip(close)
        .map(|((&h, &l), &c)| or_nan(core.push(h, l, c)))
        .collect()
}

/// Bollinger bands: SMA ± `multiplier` population standard deviations.
///
/// The variance comes from sums shifted by a moving anchor, which keeps
/// full precision at price magnitudes where `E[x²] − E[x]²` collapses.
#[must_use]
pub fn bollinger(data: &[f64], period: usize, multiplier: f64) -> BollingerSeries {
    let len = data.len();
    let mut out = BollingerSeries {
        upper: vec![f64::NAN; len],
        middle: vec![f64::NAN; len],
        lower: vec![f64::NAN; len],
    };
    if period == 0 {
        return out;
    }

    let mut window = PriceWindowWithSumOfSquares::with_sum_of_squares(period);
    for (i, &price) in data.iter().enumerate() {
        window.push(price);
        if let Some(moments) = window.moments() {
            let bands = BbValue::from_moments(moments, multiplier);
            out.upper[i] = bands.upper();
            out.middle[i] = bands.middle();
            out.lower[i] = bands.lower();
        }
    }
    out
}

/// Choppiness Index.
///
/// ```text
/// CHOP = 100 × log10(ΣTR / (HH − LL)) / log10(period)
/// ```
///
/// Near 100 the market is ranging, near 0 it is trending. A flat range
/// reads 100; `period < 2` yields all `NaN`.
#[must_use]
pub fn choppiness(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
    pool: &mut BufferPool,
) -> Vec<f64> {
    if period < 2 {
        return vec![f64::NAN; close.len()];
    }

    let mut window = PriceWindow::new(period);
    let tr_sums: Vec<f64> = true_range(high, low, close)
        .into_iter()
        .map(|tr| {
            window.push(tr);
            or_nan(window_sum(&window, period))
        })
        .collect();

    with_extremes(high, low, period, pool, |highest, lowest| {
        tr_sums
            .iter()
            .zip(highest.iter().zip(lowest))
            .map(|(&sum, (&hh, &ll))| choppiness_index(sum, hh, ll, period))
            .collect()
    })
}

/// Sum of a full window of true ranges.
#[inline]
#[allow(clippy::cast_precision_loss)]
pub(crate) fn window_sum(window: &PriceWindow, period: usize) -> Option<f64> {
    window.mean().map(|mean| mean * period as f64)
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn choppiness_index(tr_sum: f64, highest: f64, lowest: f64, period: usize) -> f64 {
    let range = highest - lowest;
    if range == 0.0 {
        100.0
    } else {
        100.0 * (tr_sum / range).log10() / (period as f64).log10()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::{assert_approx, assert_nan};

    mod ranges {
        use super::*;

        #[test]
        fn first_bar_has_no_previous_close() {
            let out = true_range(&[12.0, 15.0], &[10.0, 13.0], &[11.0, 14.0]);
            assert_eq!(out, vec![2.0, 4.0]);
        }

        #[test]
        fn atr_warm_up() {
            let out = atr(&[12.0, 15.0, 14.0], &[10.0, 13.0, 13.0], &[11.0, 14.0, 13.5], 2);
            assert!(out[0].is_nan());
            assert_eq!(out[1], 3.0);
            // TR 1 → 3 / 2 + 1 / 2
            assert_eq!(out[2], 2.0);
        }
    }

    mod bands {
        use super::*;

        fn deviation_at(base: f64) -> f64 {
            let offsets = [0.0, 1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0, 0.0, 1.0];
            let data: Vec<f64> = offsets.iter().map(|o| base + o).collect();
            let out = bollinger(&data, 5, 2.0);
            (out.upper[4] - out.middle[4]) / 2.0
        }

        #[test]
        fn billion_magnitude() {
            assert_approx!(deviation_at(1e9), 0.632_455_532_033_675_9, 1e-5);
        }

        #[test]
        fn quadrillion_magnitude() {
            assert_approx!(deviation_at(1e15), 0.632_455_532_033_675_9, 0.1);
        }

        #[test]
        fn middle_is_sma() {
            let out = bollinger(&[1.0, 2.0, 3.0, 4.0], 2, 2.0);
            assert_nan!(out.middle, 0..1);
            assert_eq!(&out.middle[1..], &[1.5, 2.5, 3.5]);
            assert_eq!(out.upper[1], 2.5);
            assert_eq!(out.lower[1], 0.5);
        }
    }

    mod chop {
        use super::*;

        #[test]
        fn flat_range_reads_100() {
            let flat = [3.0; 5];
            let mut pool = BufferPool::new();
            let out = choppiness(&flat, &flat, &flat, 3, &mut pool);
            assert_nan!(out, 0..2);
            assert_eq!(out[4], 100.0);
        }

        #[test]
        fn straight_trend_reads_low() {
            let high: Vec<f64> = (0..30).map(|i| f64::from(i) + 1.0).collect();
            let low: Vec<f64> = (0..30).map(|i| f64::from(i)).collect();
            let mut pool = BufferPool::new();
            let out = choppiness(&high, &low, &high, 14, &mut pool);
            // ΣTR = 14 × 1 over a range of 14 → log10(1) = 0
            assert_approx!(out[29], 0.0, 1e-9);
        }

        #[test]
        fn period_below_two_is_all_nan() {
            let data = [1.0, 2.0, 3.0];
            let mut pool = BufferPool::new();
            assert_nan!(choppiness(&data, &data, &data, 1, &mut pool), 0..3);
        }
    }
}
