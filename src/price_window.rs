use crate::{Price, ring_buffer::RingBuffer};

/// Rolling window with running sums kept relative to an anchor value.
///
/// Sums are stored as `Σ(x − anchor)` (and `Σ(x − anchor)²` when
/// `SUM_OF_SQUARES`), so large-magnitude prices do not cancel
/// catastrophically in the variance. The anchor moves to the window mean
/// and the sums are rebuilt from the buffer once every `size` pushes, which
/// also bounds add/subtract drift.
///
/// Non-finite values occupy a slot but contribute nothing to the sums;
/// while one is inside the window the window reports no value.
#[derive(Clone, Debug)]
pub(crate) struct PriceWindow<const SUM_OF_SQUARES: bool = false> {
    window: RingBuffer<Price>,
    anchor: Option<Price>,
    sum: f64,
    sum_of_squares: f64,
    invalid: usize,
    since_anchor: usize,
}

pub(crate) type PriceWindowWithSumOfSquares = PriceWindow<true>;

/// Mean and population variance of a full window.
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct Moments {
    pub mean: f64,
    pub variance: f64,
}

impl PriceWindow {
    pub fn new(size: usize) -> Self {
        Self::empty(size)
    }
}

impl PriceWindow<true> {
    pub fn with_sum_of_squares(size: usize) -> Self {
        Self::empty(size)
    }
}

impl<const SUM_OF_SQUARES: bool> PriceWindow<SUM_OF_SQUARES> {
    fn empty(size: usize) -> Self {
        Self {
            window: RingBuffer::new(size),
            anchor: None,
            sum: 0.0,
            sum_of_squares: 0.0,
            invalid: 0,
            since_anchor: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, price: Price) {
        if let Some(old) = self.window.push(price) {
            self.retire(old);
        }

        if price.is_finite() {
            let anchor = *self.anchor.get_or_insert(price);
            let shifted = price - anchor;
            self.sum += shifted;
            if SUM_OF_SQUARES {
                self.sum_of_squares += shifted * shifted;
            }
        } else {
            self.invalid += 1;
        }

        self.since_anchor += 1;
        if self.window.is_full() && self.since_anchor >= self.window.capacity() {
            self.reanchor();
        }
    }

    /// Mean of the full window, `None` while filling or holding a `NaN`.
    #[inline]
    pub fn mean(&self) -> Option<Price> {
        self.is_ready()
            .then(|| self.mean_of(self.anchor.unwrap_or(0.0), self.sum))
    }

    /// Mean as if `price` had been pushed.
    #[inline]
    pub fn preview_mean(&self, price: Price) -> Option<Price> {
        let (anchor, sum, _) = self.preview_sums(price)?;
        Some(self.mean_of(anchor, sum))
    }

    #[inline]
    fn is_ready(&self) -> bool {
        self.window.is_full() && self.invalid == 0
    }

    #[inline]
    fn mean_of(&self, anchor: Price, sum: f64) -> Price {
        anchor + sum * self.length_reciprocal()
    }

    #[inline]
    #[allow(clippy::cast_precision_loss)]
    fn length_reciprocal(&self) -> f64 {
        1.0 / self.window.capacity() as f64
    }

    fn retire(&mut self, old: Price) {
        if old.is_finite() {
            let shifted = old - self.anchor.unwrap_or(old);
            self.sum -= shifted;
            if SUM_OF_SQUARES {
                self.sum_of_squares -= shifted * shifted;
            }
        } else {
            self.invalid -= 1;
        }
    }

    /// Anchor and sums after a hypothetical push, `None` if the window would
    /// not be ready.
    fn preview_sums(&self, price: Price) -> Option<(Price, f64, f64)> {
        let full_after = self.window.len() + 1 >= self.window.capacity();
        if !full_after || !price.is_finite() {
            return None;
        }

        let mut invalid = self.invalid;
        let mut sum = self.sum;
        let mut sum_of_squares = self.sum_of_squares;
        let anchor = self.anchor.unwrap_or(price);

        if self.window.is_full()
            && let Some(old) = self.window.oldest()
        {
            if old.is_finite() {
                let shifted = old - anchor;
                sum -= shifted;
                sum_of_squares -= shifted * shifted;
            } else {
                invalid -= 1;
            }
        }
        if invalid > 0 {
            return None;
        }

        let shifted = price - anchor;
        Some((anchor, sum + shifted, sum_of_squares + shifted * shifted))
    }

    fn reanchor(&mut self) {
        let finite = self.window.len() - self.invalid;
        if finite == 0 {
            return;
        }

        #[allow(clippy::cast_precision_loss)]
        let mean = self.anchor.unwrap_or(0.0) + self.sum / finite as f64;
        self.anchor = Some(mean);
        self.sum = 0.0;
        self.sum_of_squares = 0.0;
        for price in self.window.iter().filter(|p| p.is_finite()) {
            let shifted = price - mean;
            self.sum += shifted;
            if SUM_OF_SQUARES {
                self.sum_of_squares += shifted * shifted;
            }
        }
        self.since_anchor = 0;
    }
}

impl PriceWindow<true> {
    /// Mean and population variance of the full window.
    #[inline]
    pub fn moments(&self) -> Option<Moments> {
        self.is_ready().then(|| {
            self.moments_of(self.anchor.unwrap_or(0.0), self.sum, self.sum_of_squares)
        })
    }

    /// Moments as if `price` had been pushed.
    #[inline]
    pub fn preview_moments(&self, price: Price) -> Option<Moments> {
        let (anchor, sum, sum_of_squares) = self.preview_sums(price)?;
        Some(self.moments_of(anchor, sum, sum_of_squares))
    }

    #[inline]
    fn moments_of(&self, anchor: Price, sum: f64, sum_of_squares: f64) -> Moments {
        let reciprocal = self.length_reciprocal();
        let shifted_mean = sum * reciprocal;
        let variance = shifted_mean
            .mul_add(-shifted_mean, sum_of_squares * reciprocal)
            .max(0.0);

        Moments {
            mean: anchor + shifted_mean,
            variance,
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::assert_approx;

    mod filling {
        use super::*;

        #[test]
        fn mean_is_none_until_window_full() {
            let mut w = PriceWindow::new(3);
            assert_eq!(w.mean(), None);
            w.push(10.0);
            w.push(20.0);
            assert_eq!(w.mean(), None);
            w.push(30.0);
            assert_eq!(w.mean(), Some(20.0));
        }

        #[test]
        fn preview_on_last_missing_slot_yields_value() {
            let mut w = PriceWindow::new(2);
            w.push(10.0);
            assert_eq!(w.preview_mean(20.0), Some(15.0));
            assert_eq!(w.mean(), None);
        }
    }

    mod sliding {
        use super::*;

        #[test]
        fn oldest_value_drops_on_push() {
            let mut w = PriceWindow::new(2);
            w.push(10.0);
            w.push(20.0);
            w.push(40.0);
            assert_eq!(w.mean(), Some(30.0));
        }

        #[test]
        fn preview_matches_push() {
            let mut w = PriceWindow::with_sum_of_squares(4);
            for p in [3.0, 7.0, 1.0, 9.0, 4.0] {
                w.push(p);
            }
            let preview = w.preview_moments(6.0).unwrap();
            w.push(6.0);
            let pushed = w.moments().unwrap();
            assert_approx!(preview.mean, pushed.mean);
            assert!((preview.variance - pushed.variance).abs() < 1e-12);
        }
    }

    mod variance {
        use super::*;

        #[test]
        fn population_variance() {
            let mut w = PriceWindow::with_sum_of_squares(4);
            for p in [2.0, 4.0, 4.0, 6.0] {
                w.push(p);
            }
            let m = w.moments().unwrap();
            assert_eq!(m.mean, 4.0);
            assert_eq!(m.variance, 2.0);
        }

        #[test]
        fn large_magnitude_keeps_precision() {
            let base = 1e15;
            let mut w = PriceWindow::with_sum_of_squares(5);
            for offset in [0.0, 1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0, 0.0] {
                w.push(base + offset);
            }
            // window: 0, 1, 0, -1, 0 → variance 0.4
            let m = w.moments().unwrap();
            assert!((m.variance - 0.4).abs() < 1e-9, "variance {}", m.variance);
            assert_eq!(m.mean, base);
        }

        #[test]
        fn constant_window_has_zero_variance() {
            let mut w = PriceWindow::with_sum_of_squares(3);
            for _ in 0..7 {
                w.push(123.456);
            }
            assert_eq!(w.moments().unwrap().variance, 0.0);
        }
    }

    mod nan {
        use super::*;

        #[test]
        fn nan_blocks_value_while_inside_window() {
            let mut w = PriceWindow::new(2);
            w.push(1.0);
            w.push(f64::NAN);
            assert_eq!(w.mean(), None);
            w.push(3.0);
            assert_eq!(w.mean(), None);
            w.push(5.0);
            assert_eq!(w.mean(), Some(4.0));
        }

        #[test]
        fn leading_nans_delay_first_value() {
            let mut w = PriceWindow::new(2);
            w.push(f64::NAN);
            w.push(f64::NAN);
            w.push(2.0);
            assert_eq!(w.mean(), None);
            w.push(4.0);
            assert_eq!(w.mean(), Some(3.0));
        }

        #[test]
        fn preview_with_nan_is_none() {
            let mut w = PriceWindow::new(2);
            w.push(1.0);
            w.push(2.0);
            assert_eq!(w.preview_mean(f64::NAN), None);
        }
    }
}
