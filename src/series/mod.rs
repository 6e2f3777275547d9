//! Batch indicator library.
//!
//! Every function maps whole input slices to output vectors of the same
//! length. `NaN` marks "not enough data yet" and never panics. Recursive
//! and windowed indicators fold the same cores the streaming states use,
//! so a series and a stream fed the same values agree exactly.

mod average;
mod oscillator;
mod trend;
mod volatility;
mod volume;

pub use average::{ema, ema_step, rma, sma, wilder_step};
pub use oscillator::{
    MacdSeries, StochasticSeries, awesome_oscillator, cci, macd, momentum, rsi, stoch_rsi,
    stochastic, williams_r,
};
pub use trend::{
    AdxSeries, IchimokuSeries, SuperTrendSeries, adx, ichimoku, parabolic_sar, supertrend,
};
pub use volatility::{BollingerSeries, atr, bollinger, choppiness, true_range};
pub use volume::{mfi, obv, vwap};

pub(crate) use oscillator::{commodity_channel_index, williams_position};
pub(crate) use volatility::{choppiness_index, window_sum};

use crate::{
    buffer_pool::BufferPool,
    sliding_window::{rolling_max_into, rolling_min_into},
};

/// `Some` as the value, `None` as `NaN`.
#[inline]
pub(crate) fn or_nan(value: Option<f64>) -> f64 {
    value.unwrap_or(f64::NAN)
}

/// Runs `f` over the rolling highest high and lowest low, both held in
/// pooled scratch buffers that go back to the pool afterwards.
pub(crate) fn with_extremes<T>(
    high: &[f64],
    low: &[f64],
    period: usize,
    pool: &mut BufferPool,
    f: impl FnOnce(&[f64], &[f64]) -> T,
) -> T {
    let mut highest = pool.acquire(high.len());
    let mut lowest = pool.acquire(low.len());
    rolling_max_into(high, period, &mut highest);
    rolling_min_into(low, period, &mut lowest);

    let out = f(&highest, &lowest);

    pool.release(highest);
    pool.release(lowest);
    out
}
