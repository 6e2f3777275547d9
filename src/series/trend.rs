use crate::{
    adx::AdxCore,
    buffer_pool::BufferPool,
    parabolic_sar::{Acceleration, ParabolicSarState},
    series::{or_nan, with_extremes},
    supertrend::SuperTrendState,
};

/// ADX with its directional indicators.
#[derive(Clone, Debug, PartialEq)]
pub struct AdxSeries {
    pub adx: Vec<f64>,
    pub plus_di: Vec<f64>,
    pub minus_di: Vec<f64>,
}

/// Ichimoku lines for each bar. The spans are the values computed on that
/// bar, without the forward displacement used when plotting the cloud.
#[derive(Clone, Debug, PartialEq)]
pub struct IchimokuSeries {
    pub conversion: Vec<f64>,
    pub base: Vec<f64>,
    pub span_a: Vec<f64>,
    pub span_b: Vec<f64>,
}

/// SuperTrend line and the trend direction per bar. `bullish` is `false`
/// where the line is `NaN`.
#[derive(Clone, Debug, PartialEq)]
pub struct SuperTrendSeries {
    pub value: Vec<f64>,
    pub bullish: Vec<bool>,
}

/// Average Directional Index with Wilder smoothing of +DM, −DM, TR and DX.
///
/// The first bar contributes no directional movement and a `high − low`
/// true range, so the first ADX lands at index `2 × period − 2`. The DI
/// lines are reported from the same index.
#[must_use]
pub fn adx(high: &[f64], low: &[f64], close: &[f64], period: usize) -> AdxSeries {
    let len = close.len();
    let mut out = AdxSeries {
        adx: vec![f64::NAN; len],
        plus_di: vec![f64::NAN; len],
        minus_di: vec![f64::NAN; len],
    };
    if period == 0 {
        return out;
    }

    let mut core = AdxCore::new(period);
    for (i, ((&h, &l), &c)) in high.iter().zip(low).zip(close).enumerate() {
        if let Some(value) = core.push(h, l, c) {
            out.adx[i] = value.adx;
            out.plus_di[i] = value.plus_di;
            out.minus_di[i] = value.minus_di;
        }
    }
    out
}

/// Ichimoku Kinko Hyo.
///
/// ```text
/// conversion = (HH + LL) / 2 over conversion_period
/// base       = (HH + LL) / 2 over base_period
/// span A     = (conversion + base) / 2
/// span B     = (HH + LL) / 2 over span_b_period
/// ```
#[must_use]
pub fn ichimoku(
    high: &[f64],
    low: &[f64],
    conversion_period: usize,
    base_period: usize,
    span_b_period: usize,
    pool: &mut BufferPool,
) -> IchimokuSeries {
    let mut midpoints = |period: usize| {
        if period == 0 {
            return vec![f64::NAN; high.len()];
        }
        with_extremes(high, low, period, pool, |highest, lowest| {
            highest
                .iter()
                .zip(lowest)
                .map(|(&hh, &ll)| f64::midpoint(hh, ll))
                .collect::<Vec<_>>()
        })
    };

    let conversion = midpoints(conversion_period);
    let base = midpoints(base_period);
    let span_b = midpoints(span_b_period);
    let span_a = conversion
        .iter()
        .zip(&base)
        .map(|(&c, &b)| f64::midpoint(c, b))
        .collect();

    IchimokuSeries {
        conversion,
        base,
        span_a,
        span_b,
    }
}

/// Parabolic SAR. The first value lands on the second bar.
#[must_use]
pub fn parabolic_sar(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    start: f64,
    increment: f64,
    max: f64,
) -> Vec<f64> {
    let mut state = ParabolicSarState::new(Acceleration {
        start,
        increment,
        max,
    });
    high.iter()
        .zip(low)
        .zip(close)
        .map(|((&h, &l), &c)| or_nan(state.push(h, l, c)))
        .collect()
}

/// SuperTrend over an ATR of `period` bars scaled by `factor`.
#[must_use]
pub fn supertrend(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
    factor: f64,
) -> SuperTrendSeries {
    let len = close.len();
    let mut out = SuperTrendSeries {
        value: vec![f64::NAN; len],
        bullish: vec![false; len],
    };
    if period == 0 {
        return out;
    }

    let mut state = SuperTrendState::new(period, factor);
    for (i, ((&h, &l), &c)) in high.iter().zip(low).zip(close).enumerate() {
        if let Some(line) = state.push(h, l, c) {
            out.value[i] = line.value;
            out.bullish[i] = line.bullish;
        }
    }
    out
}
