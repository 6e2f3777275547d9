use crate::{Ohlcv, Price};

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// Price source extracted from an [`Ohlcv`] bar before feeding into an
/// indicator.
///
/// Each indicator is configured with a `PriceSource` that determines which
/// value (or derived value) to compute on. Serialized in lower case
/// (`"close"`, `"hl2"`, `"hlc3"`).
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    /// Opening price.
    Open,
    /// Highest price.
    High,
    /// Lowest price.
    Low,
    /// Closing price.
    #[default]
    Close,
    /// Median price: `(high + low) / 2`.
    HL2,
    /// Typical price: `(high + low + close) / 3`.
    HLC3,
}

impl Display for PriceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl PriceSource {
    #[inline]
    pub(crate) fn extract(self, ohlcv: &impl Ohlcv) -> Price {
        match self {
            Self::Open => ohlcv.open(),
            Self::High => ohlcv.high(),
            Self::Low => ohlcv.low(),
            Self::Close => ohlcv.close(),
            Self::HL2 => f64::midpoint(ohlcv.high(), ohlcv.low()),
            Self::HLC3 => (ohlcv.high() + ohlcv.low() + ohlcv.close()) / 3.0,
        }
    }

    /// Extracts this source from every bar.
    #[must_use]
    pub fn series<B: Ohlcv>(self, bars: &[B]) -> Vec<Price> {
        bars.iter().map(|bar| self.extract(bar)).collect()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::{Bar, assert_approx};

    fn bar() -> Bar {
        Bar::new(10.0, 30.0, 5.0, 20.0)
    }

    #[test]
    fn extract_open() {
        assert_eq!(PriceSource::Open.extract(&bar()), 10.0);
    }

    #[test]
    fn extract_high() {
        assert_eq!(PriceSource::High.extract(&bar()), 30.0);
    }

    #[test]
    fn extract_low() {
        assert_eq!(PriceSource::Low.extract(&bar()), 5.0);
    }

    #[test]
    fn extract_close() {
        assert_eq!(PriceSource::Close.extract(&bar()), 20.0);
    }

    #[test]
    fn extract_hl2() {
        // (30 + 5) / 2 = 17.5
        assert_eq!(PriceSource::HL2.extract(&bar()), 17.5);
    }

    #[test]
    fn extract_hlc3() {
        // (30 + 5 + 20) / 3 = 18.333...
        assert_approx!(PriceSource::HLC3.extract(&bar()), 55.0 / 3.0);
    }

    #[test]
    fn series_extracts_every_bar() {
        let bars = [bar(), Bar::new(1.0, 4.0, 0.0, 2.0)];
        assert_eq!(PriceSource::HL2.series(&bars), vec![17.5, 2.0]);
    }

    #[test]
    fn serializes_lower_case() {
        assert_eq!(serde_json::to_string(&PriceSource::HLC3).unwrap(), "\"hlc3\"");
        let parsed: PriceSource = serde_json::from_str("\"hl2\"").unwrap();
        assert_eq!(parsed, PriceSource::HL2);
    }
}
