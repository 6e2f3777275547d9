use crate::{
    buffer_pool::BufferPool,
    macd::MacdCore,
    momentum::{AwesomeCore, MomentumCore},
    rsi::RsiCore,
    series::{or_nan, sma, with_extremes},
    stoch_rsi::{StochRsiCore, stochastic_position},
};

/// %K and %D lines of a stochastic oscillator.
#[derive(Clone, Debug, PartialEq)]
pub struct StochasticSeries {
    pub k: Vec<f64>,
    pub d: Vec<f64>,
}

impl StochasticSeries {
    fn nan(len: usize) -> Self {
        Self {
            k: vec![f64::NAN; len],
            d: vec![f64::NAN; len],
        }
    }
}

/// MACD line, signal line and histogram.
#[derive(Clone, Debug, PartialEq)]
pub struct MacdSeries {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

/// Wilder RSI.
///
/// The first value lands at index `period` (one change per bar), seeded
/// with the simple mean of the first `period` gains and losses. Both
/// averages at zero read 50, a zero average loss reads 100.
#[must_use]
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; data.len()];
    }

    let mut core = RsiCore::new(period);
    data.iter().map(|&price| or_nan(core.push(price))).collect()
}

/// Stochastic oscillator over equal-length `high`, `low`, `close` slices.
///
/// ```text
/// raw %K = 100 × (close − LL) / (HH − LL)
/// %K     = SMA(raw %K, k_smoothing)
/// %D     = SMA(%K, d_period)
/// ```
///
/// The rolling extremes come from the monotonic-deque scan with scratch
/// buffers taken from `pool`. A flat range reads 50.
#[must_use]
pub fn stochastic(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    k_period: usize,
    k_smoothing: usize,
    d_period: usize,
    pool: &mut BufferPool,
) -> StochasticSeries {
    if k_period == 0 || k_smoothing == 0 || d_period == 0 {
        return StochasticSeries::nan(close.len());
    }

    let raw = with_extremes(high, low, k_period, pool, |highest, lowest| {
        close
            .iter()
            .zip(highest.iter().zip(lowest))
            .map(|(&c, (&hh, &ll))| stochastic_position(c, ll, hh))
            .collect::<Vec<_>>()
    });

    let k = sma(&raw, k_smoothing);
    let d = sma(&k, d_period);
    StochasticSeries { k, d }
}

/// Williams %R, `−100 × (HH − close) / (HH − LL)`. A flat range reads −50.
#[must_use]
pub fn williams_r(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
    pool: &mut BufferPool,
) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; close.len()];
    }

    with_extremes(high, low, period, pool, |highest, lowest| {
        close
            .iter()
            .zip(highest.iter().zip(lowest))
            .map(|(&c, (&hh, &ll))| williams_position(c, ll, hh))
            .collect()
    })
}

/// Commodity Channel Index, `(x − SMA) / (0.015 × mean deviation)`, with
/// the mean deviation taken over the same window. Zero deviation reads 0.
#[must_use]
pub fn cci(data: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; data.len()];
    if period == 0 {
        return out;
    }

    for (i, window) in data.windows(period).enumerate() {
        out[i + period - 1] = commodity_channel_index(window.iter().copied());
    }
    out
}

/// `x[i] − x[i − period]`.
#[must_use]
pub fn momentum(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; data.len()];
    }

    let mut core = MomentumCore::new(period);
    data.iter().map(|&price| or_nan(core.push(price))).collect()
}

/// MACD with simple-mean-seeded EMAs; the signal EMA starts at the first
/// valid MACD value.
#[must_use]
pub fn macd(data: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let len = data.len();
    let mut out = MacdSeries {
        macd: vec![f64::NAN; len],
        signal: vec![f64::NAN; len],
        histogram: vec![f64::NAN; len],
    };
    if fast == 0 || slow == 0 || signal == 0 {
        return out;
    }

    let mut core = MacdCore::new(fast, slow, signal);
    for (i, &price) in data.iter().enumerate() {
        if let Some(value) = core.push(price) {
            out.macd[i] = value.macd;
            out.signal[i] = or_nan(value.signal);
            out.histogram[i] = or_nan(value.histogram);
        }
    }
    out
}

/// Awesome Oscillator: `SMA(hl2, fast) − SMA(hl2, slow)`.
#[must_use]
pub fn awesome_oscillator(high: &[f64], low: &[f64], fast: usize, slow: usize) -> Vec<f64> {
    if fast == 0 || slow == 0 {
        return vec![f64::NAN; high.len()];
    }

    let mut core = AwesomeCore::new(fast, slow);
    high.iter()
        .zip(low)
        .map(|(&h, &l)| or_nan(core.push((h + l) / 2.0)))
        .collect()
}

/// Stochastic RSI: the stochastic formula over a private RSI, smoothed into
/// %K and %D by simple averages.
#[must_use]
pub fn stoch_rsi(
    data: &[f64],
    rsi_period: usize,
    stoch_period: usize,
    k_smoothing: usize,
    d_smoothing: usize,
) -> StochasticSeries {
    let mut out = StochasticSeries::nan(data.len());
    if rsi_period == 0 || stoch_period == 0 || k_smoothing == 0 || d_smoothing == 0 {
        return out;
    }

    let mut core = StochRsiCore::new(rsi_period, stoch_period, k_smoothing, d_smoothing);
    for (i, &price) in data.iter().enumerate() {
        if let Some(value) = core.push(price) {
            out.k[i] = value.k;
            out.d[i] = or_nan(value.d);
        }
    }
    out
}

/// `−100 × (highest − close) / (highest − lowest)`; a flat range reads −50.
#[inline]
pub(crate) fn williams_position(close: f64, lowest: f64, highest: f64) -> f64 {
    let range = highest - lowest;
    if range == 0.0 {
        -50.0
    } else {
        -100.0 * (highest - close) / range
    }
}

/// CCI of the newest value of a window given oldest first.
pub(crate) fn commodity_channel_index(window: impl Iterator<Item = f64> + Clone) -> f64 {
    let (count, sum, current) = window
        .clone()
        .fold((0_usize, 0.0, f64::NAN), |(n, sum, _), v| (n + 1, sum + v, v));
    if count == 0 {
        return f64::NAN;
    }

    #[allow(clippy::cast_precision_loss)]
    let count = count as f64;
    let mean = sum / count;
    let deviation = window.map(|v| (v - mean).abs()).sum::<f64>() / count;
    if deviation == 0.0 {
        0.0
    } else {
        (current - mean) / (0.015 * deviation)
    }
}
