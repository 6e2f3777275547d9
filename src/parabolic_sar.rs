use crate::Price;

#[derive(Clone, Copy, Debug)]
struct Extremes {
    high: Price,
    low: Price,
}

#[derive(Clone, Copy, Debug)]
struct Trend {
    rising: bool,
    sar: f64,
    extreme: Price,
    acceleration: f64,
    prev: Extremes,
    prev2: Option<Extremes>,
}

#[derive(Clone, Copy, Debug)]
enum Phase {
    Empty,
    First { high: Price, low: Price, close: Price },
    Running(Trend),
    Halted,
}

/// Acceleration factor schedule of a Parabolic SAR.
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct Acceleration {
    pub start: f64,
    pub increment: f64,
    pub max: f64,
}

/// Parabolic stop-and-reverse state.
///
/// The direction of the first trend comes from the second bar's close
/// against the first. The SAR never enters the range of the two previous
/// bars. A `NaN` before the first bar is skipped; any later `NaN` halts the
/// state for good.
#[derive(Clone, Debug)]
pub(crate) struct ParabolicSarState {
    acceleration: Acceleration,
    phase: Phase,
}

impl ParabolicSarState {
    pub(crate) fn new(acceleration: Acceleration) -> Self {
        Self {
            acceleration,
            phase: Phase::Empty,
        }
    }

    pub(crate) fn push(&mut self, high: Price, low: Price, close: Price) -> Option<f64> {
        self.phase = self.advance(high, low, close);
        self.value()
    }

    pub(crate) fn preview(&self, high: Price, low: Price, close: Price) -> Option<f64> {
        Self::output(self.advance(high, low, close))
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<f64> {
        Self::output(self.phase)
    }

    fn output(phase: Phase) -> Option<f64> {
        match phase {
            Phase::Running(trend) => Some(trend.sar),
            Phase::Halted => Some(f64::NAN),
            Phase::Empty | Phase::First { .. } => None,
        }
    }

    fn advance(&self, high: Price, low: Price, close: Price) -> Phase {
        let invalid = high.is_nan() || low.is_nan() || close.is_nan();
        match self.phase {
            Phase::Empty if invalid => Phase::Empty,
            Phase::Empty => Phase::First { high, low, close },
            Phase::Halted => Phase::Halted,
            _ if invalid => Phase::Halted,
            Phase::First {
                high: first_high,
                low: first_low,
                close: first_close,
            } => {
                let rising = close > first_close;
                let trend = Trend {
                    rising,
                    sar: if rising { first_low } else { first_high },
                    extreme: if rising { high } else { low },
                    acceleration: self.acceleration.start,
                    prev: Extremes {
                        high: first_high,
                        low: first_low,
                    },
                    prev2: None,
                };
                Phase::Running(self.step(trend, high, low))
            }
            Phase::Running(trend) => Phase::Running(self.step(trend, high, low)),
        }
    }

    fn step(&self, mut trend: Trend, high: Price, low: Price) -> Trend {
        let Acceleration {
            start,
            increment,
            max,
        } = self.acceleration;

        trend.sar += trend.acceleration * (trend.extreme - trend.sar);

        let reversed = if trend.rising && trend.sar > low {
            trend.rising = false;
            trend.sar = high.max(trend.extreme);
            trend.extreme = low;
            true
        } else if !trend.rising && trend.sar < high {
            trend.rising = true;
            trend.sar = low.min(trend.extreme);
            trend.extreme = high;
            true
        } else {
            false
        };

        if reversed {
            trend.acceleration = start;
        } else if (trend.rising && high > trend.extreme) || (!trend.rising && low < trend.extreme) {
            trend.extreme = if trend.rising { high } else { low };
            trend.acceleration = (trend.acceleration + increment).min(max);
        }

        let bounds = std::iter::once(trend.prev).chain(trend.prev2);
        trend.sar = if trend.rising {
            bounds.fold(trend.sar, |sar, bar| sar.min(bar.low))
        } else {
            bounds.fold(trend.sar, |sar, bar| sar.max(bar.high))
        };

        trend.prev2 = Some(trend.prev);
        trend.prev = Extremes { high, low };
        trend
    }
}
