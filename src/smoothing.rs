use crate::series::{ema_step, wilder_step};

/// Recursive smoothing rule applied once the seed is in place.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Smoothing {
    /// `α = 2 / (n + 1)`.
    Exponential,
    /// Wilder's running moving average, `α = 1 / n`.
    Wilder,
}

#[derive(Clone, Copy, Debug)]
enum Phase {
    Seeding { sum: f64, count: usize },
    Active { average: f64 },
}

/// Recursive average seeded by the simple mean of its first `length`
/// values.
///
/// Leading `NaN`s are skipped. Once a finite value has been accepted every
/// later value is folded in, so a `NaN` after that point is absorbing.
///
/// This is the single implementation of EMA and Wilder smoothing: batch
/// series fold it value by value and streaming states keep one per
/// smoothed input, which makes both paths produce identical results.
#[derive(Clone, Debug)]
pub(crate) struct SeededAverage {
    smoothing: Smoothing,
    length: usize,
    alpha: f64,
    phase: Phase,
}

impl SeededAverage {
    pub(crate) fn new(smoothing: Smoothing, length: usize) -> Self {
        debug_assert!(length > 0, "smoothing length must be positive");

        #[allow(clippy::cast_precision_loss)]
        let alpha = match smoothing {
            Smoothing::Exponential => 2.0 / (length as f64 + 1.0),
            Smoothing::Wilder => 1.0 / length as f64,
        };

        Self {
            smoothing,
            length,
            alpha,
            phase: Phase::Seeding { sum: 0.0, count: 0 },
        }
    }

    pub(crate) fn exponential(length: usize) -> Self {
        Self::new(Smoothing::Exponential, length)
    }

    pub(crate) fn wilder(length: usize) -> Self {
        Self::new(Smoothing::Wilder, length)
    }

    #[inline]
    pub(crate) fn push(&mut self, value: f64) -> Option<f64> {
        self.phase = self.advance(value);
        self.value()
    }

    #[inline]
    pub(crate) fn preview(&self, value: f64) -> Option<f64> {
        match self.advance(value) {
            Phase::Active { average } => Some(average),
            Phase::Seeding { .. } => None,
        }
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<f64> {
        match self.phase {
            Phase::Active { average } => Some(average),
            Phase::Seeding { .. } => None,
        }
    }

    #[inline]
    fn advance(&self, value: f64) -> Phase {
        match self.phase {
            Phase::Seeding { count: 0, .. } if value.is_nan() => self.phase,
            Phase::Seeding { sum, count } => {
                let sum = sum + value;
                let count = count + 1;
                if count == self.length {
                    #[allow(clippy::cast_precision_loss)]
                    let average = sum / self.length as f64;
                    Phase::Active { average }
                } else {
                    Phase::Seeding { sum, count }
                }
            }
            Phase::Active { average } => Phase::Active {
                average: match self.smoothing {
                    Smoothing::Exponential => ema_step(average, value, self.alpha),
                    #[allow(clippy::cast_precision_loss)]
                    Smoothing::Wilder => wilder_step(average, value, self.length as f64),
                },
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn seeds_with_simple_mean() {
        let mut avg = SeededAverage::exponential(3);
        assert_eq!(avg.push(1.0), None);
        assert_eq!(avg.push(2.0), None);
        assert_eq!(avg.push(3.0), Some(2.0));
    }

    #[test]
    fn exponential_step_after_seed() {
        let mut avg = SeededAverage::exponential(3);
        for v in [1.0, 2.0, 3.0] {
            avg.push(v);
        }
        // alpha = 0.5: 2 * 0.5 + 6 * 0.5
        assert_eq!(avg.push(6.0), Some(4.0));
    }

    #[test]
    fn wilder_step_after_seed() {
        let mut avg = SeededAverage::wilder(2);
        avg.push(2.0);
        avg.push(4.0);
        // (3 * 1 + 5) / 2
        assert_eq!(avg.push(5.0), Some(4.0));
    }

    #[test]
    fn preview_leaves_state_untouched() {
        let mut avg = SeededAverage::wilder(2);
        avg.push(2.0);
        assert_eq!(avg.preview(4.0), Some(3.0));
        assert_eq!(avg.value(), None);
        assert_eq!(avg.push(4.0), Some(3.0));
    }

    #[test]
    fn leading_nan_is_skipped() {
        let mut avg = SeededAverage::exponential(2);
        assert_eq!(avg.push(f64::NAN), None);
        assert_eq!(avg.push(1.0), None);
        assert_eq!(avg.push(3.0), Some(2.0));
    }

    #[test]
    fn nan_after_first_value_is_absorbing() {
        let mut avg = SeededAverage::wilder(2);
        avg.push(1.0);
        avg.push(3.0);
        assert!(avg.push(f64::NAN).unwrap().is_nan());
        assert!(avg.push(5.0).unwrap().is_nan());
    }
}
