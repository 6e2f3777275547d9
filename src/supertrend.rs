use crate::{Price, atr::AtrCore};

/// SuperTrend line and the trend it is tracking.
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct SuperTrendValue {
    pub value: f64,
    pub bullish: bool,
}

#[derive(Clone, Copy, Debug)]
struct Bands {
    upper: f64,
    lower: f64,
    bullish: bool,
}

impl Bands {
    fn line(self) -> SuperTrendValue {
        SuperTrendValue {
            value: if self.bullish { self.lower } else { self.upper },
            bullish: self.bullish,
        }
    }
}

/// ATR bands around the median price that only ratchet towards price.
///
/// ```text
/// upper = hl2 + factor × ATR,  lower = hl2 − factor × ATR
/// ```
///
/// The lower band never falls while the previous close held above it, the
/// upper band never rises while the previous close held below it. The line
/// follows the lower band in a bull trend and the upper band in a bear
/// trend, flipping when the close crosses the band in force. The first
/// value starts bearish.
#[derive(Clone, Debug)]
pub(crate) struct SuperTrendState {
    factor: f64,
    atr: AtrCore,
    prev_close: Option<Price>,
    bands: Option<Bands>,
}

impl SuperTrendState {
    pub(crate) fn new(length: usize, factor: f64) -> Self {
        Self {
            factor,
            atr: AtrCore::new(length),
            prev_close: None,
            bands: None,
        }
    }

    pub(crate) fn push(&mut self, high: Price, low: Price, close: Price) -> Option<SuperTrendValue> {
        let atr = self.atr.push(high, low, close);
        self.bands = atr.map(|atr| self.next_bands(atr, high, low, close));
        self.prev_close = Some(close);
        self.value()
    }

    pub(crate) fn preview(&self, high: Price, low: Price, close: Price) -> Option<SuperTrendValue> {
        let atr = self.atr.preview(high, low)?;
        Some(self.next_bands(atr, high, low, close).line())
    }

    #[inline]
    pub(crate) fn value(&self) -> Option<SuperTrendValue> {
        self.bands.map(Bands::line)
    }

    fn next_bands(&self, atr: f64, high: Price, low: Price, close: Price) -> Bands {
        let median = (high + low) / 2.0;
        let offset = self.factor * atr;
        let (upper, lower) = (median + offset, median - offset);

        let Some(prev) = self.bands else {
            return Bands {
                upper,
                lower,
                bullish: false,
            };
        };
        if upper.is_nan() || prev.upper.is_nan() {
            return Bands {
                upper: f64::NAN,
                lower: f64::NAN,
                bullish: prev.bullish,
            };
        }

        let prev_close = self.prev_close.unwrap_or(close);
        let lower = if lower > prev.lower || prev_close < prev.lower {
            lower
        } else {
            prev.lower
        };
        let upper = if upper < prev.upper || prev_close > prev.upper {
            upper
        } else {
            prev.upper
        };
        let bullish = if prev.bullish {
            close >= lower
        } else {
            close > upper
        };

        Bands {
            upper,
            lower,
            bullish,
        }
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn feed(state: &mut SuperTrendState, bars: &[(f64, f64, f64)]) -> Option<SuperTrendValue> {
        bars.iter()
            .fold(None, |_, &(h, l, c)| state.push(h, l, c))
    }

    #[test]
    fn first_value_is_upper_band() {
        let mut st = SuperTrendState::new(2, 1.0);
        assert_eq!(st.push(11.0, 9.0, 10.0), None);
        // TR 2, 2 → ATR 2, hl2 10
        let value = st.push(11.0, 9.0, 10.0).unwrap();
        assert_eq!(value.value, 12.0);
        assert!(!value.bullish);
    }

    #[test]
    fn breakout_flips_to_bull_on_lower_band() {
        let mut st = SuperTrendState::new(2, 1.0);
        feed(&mut st, &[(11.0, 9.0, 10.0), (11.0, 9.0, 10.0)]);
        let value = st.push(16.0, 14.0, 15.5).unwrap();
        assert!(value.bullish);
        assert!(value.value < 15.5);
    }

    #[test]
    fn upper_band_ratchets_down_in_bear_trend() {
        let mut st = SuperTrendState::new(2, 1.0);
        let mut prev = f64::INFINITY;
        for i in 0..10 {
            let base = 100.0 - f64::from(i);
            if let Some(v) = st.push(base + 1.0, base - 1.0, base - 0.5) {
                assert!(!v.bullish);
                assert!(v.value <= prev);
                prev = v.value;
            }
        }
    }

    #[test]
    fn preview_matches_push() {
        let mut st = SuperTrendState::new(3, 2.0);
        feed(
            &mut st,
            &[(10.0, 9.0, 9.5), (10.5, 9.2, 10.2), (11.0, 9.8, 10.9), (11.4, 10.1, 10.3)],
        );
        let before = st.value();
        let previewed = st.preview(12.0, 10.5, 11.9);
        assert_eq!(st.value(), before);
        assert_eq!(st.push(12.0, 10.5, 11.9), previewed);
    }
}
