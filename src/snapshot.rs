//! Public result shape of a technicals computation.
//!
//! Field names serialize in camelCase and are stable: downstream consumers
//! key off them.

use serde::{Deserialize, Serialize};

use crate::pivots::{PivotBasis, Pivots};

/// Signal of a single indicator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
    #[default]
    Neutral,
}

impl Action {
    /// `Buy` when only `buy` holds, `Sell` when only `sell` holds.
    #[inline]
    pub(crate) fn from_conditions(buy: bool, sell: bool) -> Self {
        match (buy, sell) {
            (true, false) => Self::Buy,
            (false, true) => Self::Sell,
            _ => Self::Neutral,
        }
    }
}

/// Five-step sentiment used by the confluence score and Ichimoku.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum Level {
    #[serde(rename = "Strong Sell")]
    StrongSell,
    Sell,
    #[default]
    Neutral,
    Buy,
    #[serde(rename = "Strong Buy")]
    StrongBuy,
}

/// One line of the oscillator or moving-average table.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorResult {
    pub name: String,
    pub params: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<f64>,
    pub action: Action,
}

impl IndicatorResult {
    pub(crate) fn new(name: impl Into<String>, params: impl Into<String>, value: f64, action: Action) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            value,
            signal: None,
            histogram: None,
            action,
        }
    }

    pub(crate) fn with_signal(mut self, signal: f64) -> Self {
        self.signal = Some(signal);
        self
    }

    pub(crate) fn with_histogram(mut self, histogram: f64) -> Self {
        self.histogram = Some(histogram);
        self
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// Position of the price inside the bands, 0 at the lower band and 1 at
    /// the upper band.
    pub percent_p: f64,
}

#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Volatility {
    pub atr: Option<f64>,
    pub bb: Option<BollingerBands>,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Oscillation {
    pub value: f64,
    pub action: Action,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StochRsiReading {
    pub k: f64,
    pub d: f64,
    pub action: Action,
}

/// Trending or ranging market as read by the Choppiness Index.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Regime {
    Trend,
    Range,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoppinessReading {
    pub value: f64,
    pub state: Regime,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IchimokuReading {
    pub conversion: f64,
    pub base: f64,
    pub span_a: f64,
    pub span_b: f64,
    pub action: Level,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Bull,
    Bear,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperTrendReading {
    pub value: f64,
    pub trend: TrendDirection,
}

/// Stop levels one ATR multiple away from the close, for long and short
/// entries.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailingStop {
    pub buy: f64,
    pub sell: f64,
}

#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advanced {
    pub vwap: Option<f64>,
    pub mfi: Option<Oscillation>,
    pub stoch_rsi: Option<StochRsiReading>,
    pub williams_r: Option<Oscillation>,
    pub choppiness: Option<ChoppinessReading>,
    pub ichimoku: Option<IchimokuReading>,
    pub parabolic_sar: Option<f64>,
    pub super_trend: Option<SuperTrendReading>,
    pub atr_trailing_stop: Option<TrailingStop>,
    pub obv: Option<f64>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub buy: usize,
    pub sell: usize,
    pub neutral: usize,
    pub action: Action,
}

impl Summary {
    /// Tallies the actions. The majority wins only when it beats both other
    /// counts.
    pub(crate) fn tally<'a>(results: impl IntoIterator<Item = &'a IndicatorResult>) -> Self {
        let mut summary = Self::default();
        for result in results {
            match result.action {
                Action::Buy => summary.buy += 1,
                Action::Sell => summary.sell += 1,
                Action::Neutral => summary.neutral += 1,
            }
        }
        summary.action = Action::from_conditions(
            summary.buy > summary.sell && summary.buy > summary.neutral,
            summary.sell > summary.buy && summary.sell > summary.neutral,
        );
        summary
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confluence {
    pub score: f64,
    pub level: Level,
    pub contributing: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DivergenceType {
    Regular,
    Hidden,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DivergenceSide {
    Bullish,
    Bearish,
}

/// Price and indicator pivots sloping against each other.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Divergence {
    pub indicator: String,
    #[serde(rename = "type")]
    pub kind: DivergenceType,
    pub side: DivergenceSide,
    pub start_idx: usize,
    pub end_idx: usize,
    pub price_start: f64,
    pub price_end: f64,
    pub ind_start: f64,
    pub ind_end: f64,
}

/// Everything computed for one bar series.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalsSnapshot {
    pub oscillators: Vec<IndicatorResult>,
    pub moving_averages: Vec<IndicatorResult>,
    pub volatility: Option<Volatility>,
    pub advanced: Advanced,
    pub pivots: Option<Pivots>,
    pub pivot_basis: Option<PivotBasis>,
    pub summary: Summary,
    pub confluence: Option<Confluence>,
    pub divergences: Vec<Divergence>,
}

impl TechnicalsSnapshot {
    /// Finds an oscillator or moving average by name.
    #[must_use]
    pub fn indicator(&self, name: &str) -> Option<&IndicatorResult> {
        self.oscillators
            .iter()
            .chain(&self.moving_averages)
            .find(|result| result.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(action: Action) -> IndicatorResult {
        IndicatorResult::new("X", "1", 0.0, action)
    }

    mod summary {
        use super::*;

        #[test]
        fn majority_must_beat_both_others() {
            let results = [result(Action::Buy), result(Action::Buy), result(Action::Sell)];
            assert_eq!(Summary::tally(&results).action, Action::Buy);

            let results = [result(Action::Buy), result(Action::Neutral)];
            assert_eq!(Summary::tally(&results).action, Action::Neutral);
        }

        #[test]
        fn counts_every_action() {
            let results = [result(Action::Sell), result(Action::Neutral), result(Action::Sell)];
            let summary = Summary::tally(&results);
            assert_eq!((summary.buy, summary.sell, summary.neutral), (0, 2, 1));
            assert_eq!(summary.action, Action::Sell);
        }
    }

    mod wire {
        use super::*;

        #[test]
        fn snapshot_field_names() {
            let json = serde_json::to_value(TechnicalsSnapshot::default()).unwrap();
            let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
            for key in [
                "oscillators",
                "movingAverages",
                "volatility",
                "advanced",
                "pivots",
                "pivotBasis",
                "summary",
                "confluence",
                "divergences",
            ] {
                assert!(keys.iter().any(|k| k == key), "missing {key}");
            }
        }

        #[test]
        fn levels_use_display_names() {
            assert_eq!(serde_json::to_string(&Level::StrongBuy).unwrap(), "\"Strong Buy\"");
            assert_eq!(serde_json::to_string(&Level::Sell).unwrap(), "\"Sell\"");
        }

        #[test]
        fn divergence_type_field() {
            let divergence = Divergence {
                indicator: "RSI".to_owned(),
                kind: DivergenceType::Hidden,
                side: DivergenceSide::Bearish,
                start_idx: 3,
                end_idx: 9,
                price_start: 1.0,
                price_end: 2.0,
                ind_start: 60.0,
                ind_end: 70.0,
            };
            let json = serde_json::to_value(&divergence).unwrap();
            assert_eq!(json["type"], "Hidden");
            assert_eq!(json["side"], "Bearish");
            assert_eq!(json["startIdx"], 3);
            assert_eq!(json["indEnd"], 70.0);
        }

        #[test]
        fn advanced_keys() {
            let advanced = Advanced {
                super_trend: Some(SuperTrendReading {
                    value: 1.0,
                    trend: TrendDirection::Bull,
                }),
                ..Advanced::default()
            };
            let json = serde_json::to_value(advanced).unwrap();
            assert_eq!(json["superTrend"]["trend"], "bull");
            assert!(json.get("atrTrailingStop").is_some());
            assert!(json.get("stochRsi").is_some());
        }
    }
}
