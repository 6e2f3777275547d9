//! Single 0–100 sentiment score over a finished snapshot.

use crate::snapshot::{
    Action, Confluence, DivergenceSide, DivergenceType, Level, TechnicalsSnapshot,
};

const NEUTRAL: i32 = 50;
const MA_TREND: i32 = 15;
const OSCILLATOR: i32 = 5;
const ICHIMOKU_STRONG: i32 = 20;
const ICHIMOKU: i32 = 10;
const REGULAR_DIVERGENCE: i32 = 15;
const HIDDEN_DIVERGENCE: i32 = 10;
const DIVERGENCE_CAP: i32 = 30;
const VWAP: i32 = 5;

struct Tally {
    score: i32,
    contributing: Vec<String>,
}

impl Tally {
    fn adjust(&mut self, amount: i32, reason: impl std::fmt::Display) {
        if amount != 0 {
            self.score += amount;
            self.contributing.push(format!("{amount:+} {reason}"));
        }
    }
}

/// Scores `snapshot` starting from 50:
///
/// * ±15 when moving averages mostly sit below (above) `price`,
/// * ±5 per buying (selling) oscillator,
/// * ±20 for a strong Ichimoku reading, ±10 for a plain one,
/// * +15/−15 per regular and ±10 per hidden divergence, ±30 at most in
///   total,
/// * ±5 for `price` above (not above) the VWAP.
///
/// The result is clamped to 0–100 and every non-zero adjustment is listed.
#[must_use]
pub fn score(snapshot: &TechnicalsSnapshot, price: f64) -> Confluence {
    let mut tally = Tally {
        score: NEUTRAL,
        contributing: Vec::new(),
    };

    let (buys, sells) = snapshot
        .moving_averages
        .iter()
        .fold((0, 0), |(b, s), ma| match ma.action {
            Action::Buy => (b + 1, s),
            Action::Sell => (b, s + 1),
            Action::Neutral => (b, s),
        });
    if buys > sells {
        tally.adjust(MA_TREND, "MA Trend Bullish");
    } else if sells > buys {
        tally.adjust(-MA_TREND, "MA Trend Bearish");
    }

    for oscillator in &snapshot.oscillators {
        match oscillator.action {
            Action::Buy => tally.adjust(OSCILLATOR, format_args!("{} Bullish", oscillator.name)),
            Action::Sell => tally.adjust(-OSCILLATOR, format_args!("{} Bearish", oscillator.name)),
            Action::Neutral => {}
        }
    }

    if let Some(ichimoku) = &snapshot.advanced.ichimoku {
        match ichimoku.action {
            Level::StrongBuy => tally.adjust(ICHIMOKU_STRONG, "Ichimoku Strong Bull"),
            Level::Buy => tally.adjust(ICHIMOKU, "Ichimoku Bull"),
            Level::Sell => tally.adjust(-ICHIMOKU, "Ichimoku Bear"),
            Level::StrongSell => tally.adjust(-ICHIMOKU_STRONG, "Ichimoku Strong Bear"),
            Level::Neutral => {}
        }
    }

    let divergences: i32 = snapshot
        .divergences
        .iter()
        .map(|div| {
            let weight = match div.kind {
                DivergenceType::Regular => REGULAR_DIVERGENCE,
                DivergenceType::Hidden => HIDDEN_DIVERGENCE,
            };
            match div.side {
                DivergenceSide::Bullish => weight,
                DivergenceSide::Bearish => -weight,
            }
        })
        .sum::<i32>()
        .clamp(-DIVERGENCE_CAP, DIVERGENCE_CAP);
    let direction = if divergences > 0 { "Bull" } else { "Bear" };
    tally.adjust(divergences, format_args!("Divergences ({direction})"));

    if let Some(vwap) = snapshot.advanced.vwap
        && !price.is_nan()
    {
        if price > vwap {
            tally.adjust(VWAP, "Price > VWAP");
        } else {
            tally.adjust(-VWAP, "Price < VWAP");
        }
    }

    let score = tally.score.clamp(0, 100);
    Confluence {
        score: f64::from(score),
        level: level_of(score),
        contributing: tally.contributing,
    }
}

fn level_of(score: i32) -> Level {
    match score {
        80.. => Level::StrongBuy,
        60.. => Level::Buy,
        ..=20 => Level::StrongSell,
        ..=40 => Level::Sell,
        _ => Level::Neutral,
    }
}
