//! Technical analysis snapshots for Rust, batch and incremental.
//!
//! [`calculate`] turns a bar series into a [`TechnicalsSnapshot`]:
//! oscillators and moving averages with buy/sell actions, volatility
//! bands, advanced indicators, floor pivots, divergences and a confluence
//! score. [`StatefulEngine`] produces the same snapshot incrementally,
//! evaluating a forming bar without disturbing committed state.
//!
//! Bars come in through the [`Ohlcv`] trait. Which families run and with
//! what parameters is decided by [`EnabledSet`] and [`Settings`]; a family
//! whose settings do not validate is skipped and logged, never fatal.
//!
//! The [`series`] module exposes the batch indicator functions the
//! snapshot is built from. Single indicators can also be streamed through
//! the [`Indicator`] types ([`Sma`], [`Ema`], [`Rsi`], [`Macd`], …), whose
//! [`new`](Sma::new), [`commit`](Sma::commit), [`preview`](Sma::preview)
//! and [`value`](Sma::value) are inherent methods: no trait import needed.

mod adx;
mod atr;
mod backend;
mod bank;
mod bb;
mod buffer_pool;
mod calculator;
mod confluence;
mod divergence;
mod ema;
mod engine;
mod error;
mod flow;
mod indicator;
mod macd;
mod mfi;
mod momentum;
mod ohlcv;
mod parabolic_sar;
mod pivots;
mod price_source;
mod price_window;
mod ring_buffer;
mod rsi;
pub mod series;
mod settings;
mod sliding_window;
mod sma;
mod smoothing;
mod snapshot;
mod stoch_rsi;
mod supertrend;

pub use crate::error::{Error, Result};
pub use crate::indicator::{Indicator, IndicatorConfig};
pub use crate::ohlcv::{Bar, Ohlcv, Price, Timestamp};
pub use crate::price_source::PriceSource;

pub use crate::adx::{Adx, AdxConfig, AdxValue};
pub use crate::atr::{Atr, AtrConfig};
pub use crate::bb::{Bb, BbConfig, BbValue, StdDev};
pub use crate::ema::{Ema, EmaConfig};
pub use crate::macd::{Macd, MacdConfig, MacdValue};
pub use crate::mfi::{Mfi, MfiConfig};
pub use crate::rsi::{Rsi, RsiConfig};
pub use crate::sma::{Sma, SmaConfig};
pub use crate::stoch_rsi::{StochRsi, StochRsiConfig, StochValue};

pub use crate::backend::{ComputeBackend, NativeBackend};
pub use crate::buffer_pool::BufferPool;
pub use crate::calculator::calculate;
pub use crate::confluence::score as confluence_score;
pub use crate::divergence::{DivergenceConfig, Pivot, PivotKind, find_pivots, scan as scan_divergences};
pub use crate::engine::StatefulEngine;
pub use crate::pivots::{PivotBasis, PivotType, Pivots};
pub use crate::settings::{
    AdxSettings, AoSettings, AtrSettings, AtrTrailingStopSettings, BollingerSettings,
    CciSettings, ChoppinessSettings, EmaSettings, EnabledSet, IchimokuSettings, IndicatorKind,
    MaType, MacdSettings, MfiSettings, MomentumSettings, ParabolicSarSettings, PivotSettings,
    RsiSettings, Settings, SmaSettings, StochRsiSettings, StochasticSettings, SuperTrendSettings,
    WilliamsRSettings, moving_average_action,
};
pub use crate::sliding_window::{rolling_max, rolling_max_into, rolling_min, rolling_min_into};
pub use crate::snapshot::{
    Action, Advanced, BollingerBands, ChoppinessReading, Confluence, Divergence, DivergenceSide,
    DivergenceType, IchimokuReading, IndicatorResult, Level, Oscillation, Regime, StochRsiReading,
    Summary, SuperTrendReading, TechnicalsSnapshot, TrailingStop, TrendDirection, Volatility,
};

macro_rules! impl_indicator_methods {
    ($type:ty, $config:ty, $output:ty) => {
        impl $type {
            /// See [`Indicator::new`].
            #[must_use]
            pub fn new(config: $config) -> Self {
                <Self as Indicator>::new(config)
            }

            /// See [`Indicator::commit`].
            #[inline]
            pub fn commit(&mut self, ohlcv: &impl Ohlcv) -> Option<$output> {
                <Self as Indicator>::commit(self, ohlcv)
            }

            /// See [`Indicator::preview`].
            #[must_use]
            #[inline]
            pub fn preview(&self, ohlcv: &impl Ohlcv) -> Option<$output> {
                <Self as Indicator>::preview(self, ohlcv)
            }

            /// See [`Indicator::value`].
            #[must_use]
            #[inline]
            pub fn value(&self) -> Option<$output> {
                <Self as Indicator>::value(self)
            }
        }
    };
}

impl_indicator_methods!(Sma, SmaConfig, Price);
impl_indicator_methods!(Ema, EmaConfig, Price);
impl_indicator_methods!(Bb, BbConfig, BbValue);
impl_indicator_methods!(Rsi, RsiConfig, Price);
impl_indicator_methods!(Macd, MacdConfig, MacdValue);
impl_indicator_methods!(StochRsi, StochRsiConfig, StochValue);
impl_indicator_methods!(Atr, AtrConfig, f64);
impl_indicator_methods!(Adx, AdxConfig, AdxValue);
impl_indicator_methods!(Mfi, MfiConfig, f64);

#[cfg(test)]
mod test_util;

#[cfg(test)]
mod inherent_methods {
    use super::{Bb, BbConfig, BbValue, Ema, EmaConfig, Ohlcv, Price, Rsi, RsiConfig, Sma, SmaConfig, Timestamp};
    use std::num::NonZero;

    struct Tick(f64, i64);
    impl Ohlcv for Tick {
        fn open(&self) -> Price {
            self.0
        }
        fn high(&self) -> Price {
            self.0
        }
        fn low(&self) -> Price {
            self.0
        }
        fn close(&self) -> Price {
            self.0
        }
        fn open_time(&self) -> Timestamp {
            self.1
        }
    }

    #[test]
    fn sma_without_indicator_import() {
        let mut sma = Sma::new(SmaConfig::close(NonZero::new(2).unwrap()));
        assert_eq!(sma.commit(&Tick(10.0, 1)), None);
        assert_eq!(sma.preview(&Tick(30.0, 2)), Some(20.0));
        assert_eq!(sma.commit(&Tick(20.0, 2)), Some(15.0));
        assert_eq!(sma.value(), Some(15.0));
    }

    #[test]
    fn ema_without_indicator_import() {
        let mut ema = Ema::new(EmaConfig::close(NonZero::new(2).unwrap()));
        assert_eq!(ema.commit(&Tick(10.0, 1)), None);
        assert!(ema.commit(&Tick(20.0, 2)).is_some());
        assert!(ema.value().is_some());
    }

    #[test]
    fn bb_without_indicator_import() {
        let mut bb = Bb::new(BbConfig::close(NonZero::new(2).unwrap()));
        assert!(bb.commit(&Tick(10.0, 1)).is_none());
        let v: Option<BbValue> = bb.commit(&Tick(20.0, 2));
        assert!(v.is_some());
        assert!(bb.value().is_some());
    }

    #[test]
    fn rsi_without_indicator_import() {
        let mut rsi = Rsi::new(RsiConfig::close(NonZero::new(2).unwrap()));
        for (t, price) in [10.0, 11.0, 12.0].into_iter().enumerate() {
            rsi.commit(&Tick(price, i64::try_from(t).unwrap()));
        }
        assert_eq!(rsi.value(), Some(100.0));
    }
}
