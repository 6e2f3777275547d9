//! Cumulative volume measures: on-balance volume and VWAP.

use crate::Price;

/// Running on-balance volume, starting at zero on the first bar.
#[derive(Clone, Debug, Default)]
pub(crate) struct ObvCore {
    prev_close: Option<Price>,
    total: f64,
}

impl ObvCore {
    #[inline]
    fn advance(&self, close: Price, volume: f64) -> f64 {
        match self.prev_close {
            None => self.total,
            Some(prev) if prev.is_nan() || close.is_nan() || volume.is_nan() => f64::NAN,
            Some(prev) if close > prev => self.total + volume,
            Some(prev) if close < prev => self.total - volume,
            Some(_) => self.total,
        }
    }

    pub(crate) fn push(&mut self, close: Price, volume: f64) -> f64 {
        self.total = self.advance(close, volume);
        self.prev_close = Some(close);
        self.total
    }

    pub(crate) fn preview(&self, close: Price, volume: f64) -> f64 {
        self.advance(close, volume)
    }
}

/// Cumulative volume-weighted average of the typical price since the first
/// bar. With no volume traded yet it reads the typical price itself.
#[derive(Clone, Debug, Default)]
pub(crate) struct VwapCore {
    price_volume: f64,
    volume: f64,
}

impl VwapCore {
    #[inline]
    fn average(price_volume: f64, volume: f64, typical: Price) -> f64 {
        if volume == 0.0 {
            typical
        } else {
            price_volume / volume
        }
    }

    #[inline]
    fn typical(high: Price, low: Price, close: Price) -> Price {
        (high + low + close) / 3.0
    }

    pub(crate) fn push(&mut self, high: Price, low: Price, close: Price, volume: f64) -> f64 {
        let typical = Self::typical(high, low, close);
        self.price_volume += typical * volume;
        self.volume += volume;
        Self::average(self.price_volume, self.volume, typical)
    }

    pub(crate) fn preview(&self, high: Price, low: Price, close: Price, volume: f64) -> f64 {
        let typical = Self::typical(high, low, close);
        Self::average(
            self.price_volume + typical * volume,
            self.volume + volume,
            typical,
        )
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    mod obv {
        use super::*;

        #[test]
        fn adds_on_up_closes_and_subtracts_on_down_closes() {
            let mut obv = ObvCore::default();
            assert_eq!(obv.push(10.0, 100.0), 0.0);
            assert_eq!(obv.push(11.0, 50.0), 50.0);
            assert_eq!(obv.push(10.5, 20.0), 30.0);
            assert_eq!(obv.push(10.5, 99.0), 30.0);
        }

        #[test]
        fn preview_leaves_total() {
            let mut obv = ObvCore::default();
            obv.push(10.0, 1.0);
            assert_eq!(obv.preview(12.0, 7.0), 7.0);
            assert_eq!(obv.preview(9.0, 3.0), -3.0);
        }
    }

    mod vwap {
        use super::*;

        #[test]
        fn volume_weighted_typical_price() {
            let mut vwap = VwapCore::default();
            assert_eq!(vwap.push(12.0, 6.0, 9.0, 1.0), 9.0);
            // typical 12, volume 2 → (9 + 24) / 3
            assert_eq!(vwap.push(15.0, 9.0, 12.0, 2.0), 11.0);
        }

        #[test]
        fn zero_volume_reads_typical_price() {
            let mut vwap = VwapCore::default();
            assert_eq!(vwap.push(3.0, 1.0, 2.0, 0.0), 2.0);
        }

        #[test]
        fn preview_matches_push() {
            let mut vwap = VwapCore::default();
            vwap.push(12.0, 6.0, 9.0, 1.0);
            let previewed = vwap.preview(15.0, 9.0, 12.0, 2.0);
            assert_eq!(vwap.push(15.0, 9.0, 12.0, 2.0), previewed);
        }
    }
}
