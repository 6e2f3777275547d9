//! Regular and hidden divergences between price and an oscillator.
//!
//! Pivots are found on the oscillator, then the price extreme in a small
//! window around each pivot is compared: the two rarely peak on the same
//! bar.

use std::ops::RangeInclusive;

use crate::{
    sliding_window::{window_max, window_min},
    snapshot::{Divergence, DivergenceSide, DivergenceType},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PivotKind {
    High,
    Low,
}

/// A local extreme of a series.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Pivot {
    pub index: usize,
    pub value: f64,
    pub kind: PivotKind,
}

/// Pivot pairing rules.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DivergenceConfig {
    /// Bars on each side a pivot must strictly exceed.
    pub pivot_range: usize,
    /// Closest allowed distance between the two pivots.
    pub min_lookback: usize,
    /// Farthest allowed distance between the two pivots.
    pub max_lookback: usize,
    /// Bars on each side of a pivot searched for the price extreme.
    pub price_window: usize,
    /// Only pairs ending within this many bars of the end are reported.
    pub recency: usize,
}

impl Default for DivergenceConfig {
    fn default() -> Self {
        Self {
            pivot_range: 2,
            min_lookback: 5,
            max_lookback: 60,
            price_window: 2,
            recency: 15,
        }
    }
}

/// Strict pivots: index `i` is a high pivot when it is greater than the
/// `range` values on each side, a low pivot when it is smaller. `NaN`s
/// neither form nor confirm a pivot.
#[must_use]
pub fn find_pivots(values: &[f64], range: usize) -> Vec<Pivot> {
    if range == 0 || values.len() < 2 * range + 1 {
        return Vec::new();
    }

    let mut pivots = Vec::new();
    for i in range..values.len() - range {
        let current = values[i];
        let mut neighbours = values[i - range..i]
            .iter()
            .chain(&values[i + 1..=i + range]);

        if neighbours.clone().all(|&v| current > v) {
            pivots.push(Pivot {
                index: i,
                value: current,
                kind: PivotKind::High,
            });
        } else if neighbours.all(|&v| current < v) {
            pivots.push(Pivot {
                index: i,
                value: current,
                kind: PivotKind::Low,
            });
        }
    }
    pivots
}

/// Scans with the default rules. See [`DivergenceConfig::scan`].
#[must_use]
pub fn scan(high: &[f64], low: &[f64], indicator: &[f64], name: &str) -> Vec<Divergence> {
    DivergenceConfig::default().scan(high, low, indicator, name)
}

impl DivergenceConfig {
    /// Divergences of `indicator` against price, indexed like the slices.
    ///
    /// Bullish pairs compare low pivots against the lows, bearish pairs
    /// high pivots against the highs:
    ///
    /// ```text
    /// regular bullish  price lower low,   indicator higher low
    /// hidden bullish   price higher low,  indicator lower low
    /// regular bearish  price higher high, indicator lower high
    /// hidden bearish   price lower high,  indicator higher high
    /// ```
    ///
    /// Every recent end pivot is paired. For each end pivot, side and type
    /// only the widest qualifying pair is kept.
    #[must_use]
    pub fn scan(&self, high: &[f64], low: &[f64], indicator: &[f64], name: &str) -> Vec<Divergence> {
        let pivots = find_pivots(indicator, self.pivot_range);
        let recent_from = indicator.len().saturating_sub(self.recency);

        let mut out = Vec::new();
        for side in [DivergenceSide::Bullish, DivergenceSide::Bearish] {
            let (kind, prices) = match side {
                DivergenceSide::Bullish => (PivotKind::Low, low),
                DivergenceSide::Bearish => (PivotKind::High, high),
            };
            let side_pivots: Vec<Pivot> = pivots.iter().copied().filter(|p| p.kind == kind).collect();

            for (i, end) in side_pivots.iter().enumerate() {
                if end.index < recent_from {
                    continue;
                }

                let mut regular = None;
                let mut hidden = None;
                for start in &side_pivots[..i] {
                    if !self.lookback().contains(&(end.index - start.index)) {
                        continue;
                    }

                    let price_start = self.price_extreme(side, prices, start.index);
                    let price_end = self.price_extreme(side, prices, end.index);
                    let Some(kind) = classify(side, price_start, price_end, start.value, end.value)
                    else {
                        continue;
                    };

                    let slot = match kind {
                        DivergenceType::Regular => &mut regular,
                        DivergenceType::Hidden => &mut hidden,
                    };
                    slot.get_or_insert_with(|| Divergence {
                        indicator: name.to_owned(),
                        kind,
                        side,
                        start_idx: start.index,
                        end_idx: end.index,
                        price_start,
                        price_end,
                        ind_start: start.value,
                        ind_end: end.value,
                    });
                }
                out.extend(regular);
                out.extend(hidden);
            }
        }
        out
    }

    fn lookback(&self) -> RangeInclusive<usize> {
        self.min_lookback..=self.max_lookback
    }

    fn price_extreme(&self, side: DivergenceSide, prices: &[f64], index: usize) -> f64 {
        let from = index.saturating_sub(self.price_window);
        let to = (index + self.price_window).min(prices.len().saturating_sub(1));
        let Some(window) = prices.get(from..=to) else {
            return f64::NAN;
        };
        match side {
            DivergenceSide::Bullish => window_min(window.iter().copied()),
            DivergenceSide::Bearish => window_max(window.iter().copied()),
        }
    }
}

fn classify(
    side: DivergenceSide,
    price_start: f64,
    price_end: f64,
    ind_start: f64,
    ind_end: f64,
) -> Option<DivergenceType> {
    let (price_up, price_down) = (price_end > price_start, price_end < price_start);
    let (ind_up, ind_down) = (ind_end > ind_start, ind_end < ind_start);
    match side {
        DivergenceSide::Bullish if price_down && ind_up => Some(DivergenceType::Regular),
        DivergenceSide::Bullish if price_up && ind_down => Some(DivergenceType::Hidden),
        DivergenceSide::Bearish if price_up && ind_down => Some(DivergenceType::Regular),
        DivergenceSide::Bearish if price_down && ind_up => Some(DivergenceType::Hidden),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    mod pivots {
        use super::*;

        #[test]
        fn strict_extremes_only() {
            // index 5 and 6 tie, so neither is a low
            let values = [1.0, 2.0, 5.0, 2.0, 1.0, 0.0, 0.0, 1.0, 1.0];
            let pivots = find_pivots(&values, 2);
            assert_eq!(pivots.len(), 1);
            assert_eq!(pivots[0].index, 2);
            assert_eq!(pivots[0].kind, PivotKind::High);
        }

        #[test]
        fn plateau_is_not_a_pivot() {
            let values = [1.0, 2.0, 3.0, 3.0, 2.0, 1.0];
            assert!(find_pivots(&values, 2).is_empty());
        }

        #[test]
        fn low_pivot() {
            let values = [5.0, 4.0, 1.0, 4.0, 5.0];
            let pivots = find_pivots(&values, 2);
            assert_eq!(pivots[0].kind, PivotKind::Low);
            assert_eq!(pivots[0].value, 1.0);
        }

        #[test]
        fn nan_never_pivots() {
            let values = [1.0, 2.0, f64::NAN, 2.0, 1.0];
            assert!(find_pivots(&values, 2).is_empty());
        }

        #[test]
        fn short_input() {
            assert!(find_pivots(&[1.0, 2.0, 1.0], 2).is_empty());
        }
    }

    mod scanning {
        use super::*;

        /// Low pivots at `10` and `20` in a flat 30-bar indicator.
        fn two_lows(first: f64, second: f64) -> Vec<f64> {
            let mut ind = vec![50.0; 30];
            ind[10] = first;
            ind[20] = second;
            ind
        }

        #[test]
        fn regular_bullish() {
            let ind = two_lows(30.0, 35.0);
            let mut low = vec![100.0; 30];
            low[10] = 90.0;
            low[21] = 85.0;
            let high = vec![110.0; 30];

            let found = scan(&high, &low, &ind, "RSI");
            assert_eq!(found.len(), 1);
            let div = &found[0];
            assert_eq!((div.kind, div.side), (DivergenceType::Regular, DivergenceSide::Bullish));
            assert_eq!((div.start_idx, div.end_idx), (10, 20));
            assert_eq!((div.price_start, div.price_end), (90.0, 85.0));
            assert_eq!((div.ind_start, div.ind_end), (30.0, 35.0));
        }

        #[test]
        fn hidden_bullish() {
            let ind = two_lows(35.0, 30.0);
            let mut low = vec![100.0; 30];
            low[10] = 85.0;
            low[20] = 90.0;
            let found = scan(&[110.0; 30], &low, &ind, "RSI");
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].kind, DivergenceType::Hidden);
        }

        #[test]
        fn regular_bearish() {
            let mut ind = vec![50.0; 30];
            ind[12] = 80.0;
            ind[22] = 70.0;
            let mut high = vec![100.0; 30];
            high[12] = 110.0;
            high[22] = 115.0;
            let found = scan(&high, &[90.0; 30], &ind, "MACD");
            assert_eq!(found.len(), 1);
            assert_eq!((found[0].kind, found[0].side), (DivergenceType::Regular, DivergenceSide::Bearish));
        }

        #[test]
        fn too_close_pairs_are_ignored() {
            let mut ind = vec![50.0; 30];
            ind[20] = 30.0;
            ind[23] = 35.0;
            let mut low = vec![100.0; 30];
            low[20] = 90.0;
            low[23] = 85.0;
            assert!(scan(&[110.0; 30], &low, &ind, "RSI").is_empty());
        }

        #[test]
        fn stale_end_pivot_is_filtered() {
            let mut ind = vec![50.0; 60];
            ind[10] = 30.0;
            ind[20] = 35.0;
            let mut low = vec![100.0; 60];
            low[10] = 90.0;
            low[20] = 85.0;
            assert!(scan(&[110.0; 60], &low, &ind, "RSI").is_empty());
        }

        #[test]
        fn same_price_two_indicators() {
            let rsi = two_lows(30.0, 35.0);
            let mut stoch_rsi = vec![60.0; 30];
            stoch_rsi[10] = 12.0;
            stoch_rsi[20] = 28.0;
            let mut low = vec![100.0; 30];
            low[10] = 90.0;
            low[20] = 85.0;
            let high = vec![110.0; 30];

            let mut found = scan(&high, &low, &rsi, "RSI");
            found.extend(scan(&high, &low, &stoch_rsi, "StochRSI"));
            assert_eq!(found.len(), 2);

            let regular_bullish = |d: &Divergence| {
                (d.kind, d.side, d.start_idx, d.end_idx)
                    == (DivergenceType::Regular, DivergenceSide::Bullish, 10, 20)
            };
            assert!(found.iter().all(regular_bullish));
            assert_eq!(found[0].indicator, "RSI");
            assert_eq!((found[0].ind_start, found[0].ind_end), (30.0, 35.0));
            assert_eq!(found[1].indicator, "StochRSI");
            assert_eq!((found[1].ind_start, found[1].ind_end), (12.0, 28.0));
        }
    }
}
