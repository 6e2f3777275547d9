use serde::{Deserialize, Serialize};

/// A price value.
///
/// Semantic alias for [`f64`]. Documents intent in function signatures
/// without introducing newtype construction overhead.
pub type Price = f64;

/// Bar open time in milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// OHLCV bar data used as input to all calculations.
///
/// Implement this on your own kline/candle type to avoid per-tick
/// conversion. Both the batch calculator and the streaming engine accept
/// any `Ohlcv` and extract the configured [`PriceSource`](crate::PriceSource)
/// internally.
///
/// # Example
///
/// ```
/// use quantedge_technicals::{Ohlcv, Price, Timestamp};
///
/// struct MyKline {
///     o: f64, h: f64, l: f64, c: f64, v: f64,
///     ts: i64,
///     live: bool,
/// }
///
/// impl Ohlcv for MyKline {
///     fn open(&self) -> Price { self.o }
///     fn high(&self) -> Price { self.h }
///     fn low(&self) -> Price { self.l }
///     fn close(&self) -> Price { self.c }
///     fn open_time(&self) -> Timestamp { self.ts }
///     fn volume(&self) -> f64 { self.v }
///     fn is_closed(&self) -> bool { !self.live }
/// }
/// ```
pub trait Ohlcv {
    /// Opening price of the bar.
    fn open(&self) -> Price;

    /// Highest price during the bar.
    fn high(&self) -> Price;

    /// Lowest price during the bar.
    fn low(&self) -> Price;

    /// Closing (or latest) price of the bar.
    fn close(&self) -> Price;

    /// Bar open time.
    fn open_time(&self) -> Timestamp;

    /// Trade volume during the bar. Defaults to `0.0`.
    ///
    /// Override this for volume-dependent indicators (OBV, MFI, VWAP).
    fn volume(&self) -> f64 {
        0.0
    }

    /// Whether the bar is final. Defaults to `true`.
    ///
    /// Only the last bar of a series may be forming. A forming bar is
    /// excluded from pivot levels and from the committed streaming state.
    fn is_closed(&self) -> bool {
        true
    }
}

/// Owned OHLCV bar.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bar {
    pub time: Timestamp,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: f64,
    #[serde(default = "closed_by_default")]
    pub closed: bool,
}

fn closed_by_default() -> bool {
    true
}

impl Bar {
    /// A closed bar at `time`.
    #[must_use]
    pub fn new(time: Timestamp, open: Price, high: Price, low: Price, close: Price, volume: f64) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
            closed: true,
        }
    }

    /// Marks the bar as still forming.
    #[must_use]
    pub fn forming(mut self) -> Self {
        self.closed = false;
        self
    }

    /// Copies any [`Ohlcv`] into an owned bar.
    #[must_use]
    pub fn from_ohlcv(ohlcv: &impl Ohlcv) -> Self {
        Self {
            time: ohlcv.open_time(),
            open: ohlcv.open(),
            high: ohlcv.high(),
            low: ohlcv.low(),
            close: ohlcv.close(),
            volume: ohlcv.volume(),
            closed: ohlcv.is_closed(),
        }
    }
}

impl Ohlcv for Bar {
    fn open(&self) -> Price {
        self.open
    }

    fn high(&self) -> Price {
        self.high
    }

    fn low(&self) -> Price {
        self.low
    }

    fn close(&self) -> Price {
        self.close
    }

    fn open_time(&self) -> Timestamp {
        self.time
    }

    fn volume(&self) -> f64 {
        self.volume
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn bars_are_closed_unless_marked_forming() {
        let bar = Bar::new(1, 10.0, 12.0, 9.0, 11.0, 5.0);
        assert!(bar.is_closed());
        assert!(!bar.forming().is_closed());
    }

    #[test]
    fn closed_flag_defaults_when_missing_from_json() {
        let bar: Bar = serde_json::from_str(
            r#"{"time":1,"open":1.0,"high":2.0,"low":0.5,"close":1.5,"volume":10.0}"#,
        )
        .unwrap();
        assert!(bar.closed);
        assert_eq!(bar.volume(), 10.0);
    }
}
