use crate::{
    flow::{ObvCore, VwapCore},
    mfi::MfiCore,
    series::or_nan,
};

/// Money Flow Index over the typical price `(high + low + close) / 3`.
///
/// First value at index `period`. No flow at all reads 50, no negative
/// flow reads 100.
#[must_use]
pub fn mfi(high: &[f64], low: &[f64], close: &[f64], volume: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return vec![f64::NAN; close.len()];
    }

    let mut core = MfiCore::new(period);
    high.iter()
        .zip(low)
        .zip(close.iter().zip(volume))
        .map(|((&h, &l), (&c, &v))| or_nan(core.push(h, l, c, v)))
        .collect()
}

/// Volume-weighted average price, cumulative from the first bar.
///
/// Until some volume has traded it reads the typical price.
#[must_use]
pub fn vwap(high: &[f64], low: &[f64], close: &[f64], volume: &[f64]) -> Vec<f64> {
    let mut core = VwapCore::default();
    high.iter()
        .zip(low)
        .zip(close.iter().zip(volume))
        .map(|((&h, &l), (&c, &v))| core.push(h, l, c, v))
        .collect()
}

/// On-balance volume starting at zero on the first bar.
#[must_use]
pub fn obv(close: &[f64], volume: &[f64]) -> Vec<f64> {
    let mut core = ObvCore::default();
    close
        .iter()
        .zip(volume)
        .map(|(&c, &v)| core.push(c, v))
        .collect()
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::test_util::assert_nan;

    #[test]
    fn mfi_first_value_at_period() {
        let price = [10.0, 11.0, 10.5, 12.0, 11.0];
        let volume = [100.0; 5];
        let out = mfi(&price, &price, &price, &volume, 3);
        assert_nan!(out, 0..3);
        assert!(out[3..].iter().all(|v| (0.0..=100.0).contains(v)));
    }

    #[test]
    fn mfi_flat_reads_fifty() {
        let price = [10.0; 4];
        let out = mfi(&price, &price, &price, &[5.0; 4], 2);
        assert_eq!(out[3], 50.0);
    }

    #[test]
    fn vwap_zero_volume_reads_typical_price() {
        let out = vwap(&[12.0, 15.0], &[6.0, 9.0], &[9.0, 12.0], &[0.0, 0.0]);
        assert_eq!(out, vec![9.0, 12.0]);
    }

    #[test]
    fn vwap_weights_by_volume() {
        let out = vwap(&[12.0, 15.0], &[6.0, 9.0], &[9.0, 12.0], &[1.0, 2.0]);
        assert_eq!(out[1], 11.0);
    }

    #[test]
    fn obv_accumulates_signed_volume() {
        let out = obv(&[10.0, 11.0, 10.0, 10.0], &[5.0, 3.0, 2.0, 9.0]);
        assert_eq!(out, vec![0.0, 3.0, 1.0, 1.0]);
    }
}
