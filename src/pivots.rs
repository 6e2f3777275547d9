use serde::{Deserialize, Serialize};

use crate::{Ohlcv, Price};

/// Floor-pivot formula family.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PivotType {
    #[default]
    Classic,
    Woodie,
    Camarilla,
    Fibonacci,
}

/// OHLC of the bar the pivot levels are derived from.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotBasis {
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub open: Price,
}

impl PivotBasis {
    #[must_use]
    pub fn of(bar: &impl Ohlcv) -> Self {
        Self {
            high: bar.high(),
            low: bar.low(),
            close: bar.close(),
            open: bar.open(),
        }
    }
}

/// Pivot point with three resistance and three support levels.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pivots {
    #[serde(rename = "type")]
    pub kind: PivotType,
    pub p: Price,
    pub r1: Price,
    pub r2: Price,
    pub r3: Price,
    pub s1: Price,
    pub s2: Price,
    pub s3: Price,
}

impl Pivots {
    /// Levels of `kind` from one completed bar.
    ///
    /// ```text
    /// classic    P = (H + L + C) / 3      R1 = 2P − L        S1 = 2P − H
    ///                                     R2 = P + (H − L)   S2 = P − (H − L)
    ///                                     R3 = H + 2(P − L)  S3 = L − 2(H − P)
    /// woodie     P = (H + L + 2C) / 4, levels as classic
    /// camarilla  P = C, R/S n = C ± 1.1 × (H − L) / {12, 6, 4}
    /// fibonacci  P = (H + L + C) / 3, R/S n = P ± (H − L) × {0.382, 0.618, 1}
    /// ```
    #[must_use]
    pub fn compute(kind: PivotType, basis: PivotBasis) -> Self {
        let PivotBasis {
            high, low, close, ..
        } = basis;
        let range = high - low;

        let floor = |p: Price| Self {
            kind,
            p,
            r1: 2.0 * p - low,
            r2: p + range,
            r3: high + 2.0 * (p - low),
            s1: 2.0 * p - high,
            s2: p - range,
            s3: low - 2.0 * (high - p),
        };
        let offsets = |p: Price, [first, second, third]: [f64; 3]| Self {
            kind,
            p,
            r1: p + range * first,
            r2: p + range * second,
            r3: p + range * third,
            s1: p - range * first,
            s2: p - range * second,
            s3: p - range * third,
        };

        match kind {
            PivotType::Classic => floor((high + low + close) / 3.0),
            PivotType::Woodie => floor((high + low + 2.0 * close) / 4.0),
            PivotType::Camarilla => offsets(close, [1.1 / 12.0, 1.1 / 6.0, 1.1 / 4.0]),
            PivotType::Fibonacci => offsets((high + low + close) / 3.0, [0.382, 0.618, 1.0]),
        }
    }
}

/// Index of the last closed bar: the last bar unless it is still forming.
pub(crate) fn basis_index<B: Ohlcv>(bars: &[B]) -> Option<usize> {
    match bars.last()? {
        last if last.is_closed() => Some(bars.len() - 1),
        _ => bars.len().checked_sub(2),
    }
}
