use crate::{Ohlcv, PriceSource};

use std::fmt::{Debug, Display};

/// Configuration for a technical [`Indicator`].
///
/// Every indicator has a corresponding config type that holds its parameters
/// (length, price source, etc). Configs are value types: cheap to copy and
/// compare.
pub trait IndicatorConfig: Sized + Copy + PartialEq + Display + Debug {
    /// Longest window length (number of bars) the indicator reads.
    fn length(&self) -> usize;

    /// Price source to extract from each bar.
    fn source(&self) -> PriceSource;
}

/// A streaming technical indicator.
///
/// State advances only through [`commit`](Indicator::commit), which folds a
/// closed bar in permanently. [`preview`](Indicator::preview) answers "what
/// would the value be if this bar closed now" from a shared reference, so a
/// forming bar can be evaluated any number of times without touching the
/// committed state. Output is `None` until enough data has been received
/// for convergence.
///
/// # Example
///
/// ```
/// use quantedge_technicals::{Bar, Indicator, Sma, SmaConfig};
/// use std::num::NonZero;
///
/// let mut sma = Sma::new(SmaConfig::close(NonZero::new(3).unwrap()));
/// let bar = |t, c| Bar::new(t, c, c, c, c, 0.0);
///
/// assert_eq!(sma.commit(&bar(1, 10.0)), None);
/// assert_eq!(sma.commit(&bar(2, 20.0)), None);
/// assert_eq!(sma.preview(&bar(3, 60.0)), Some(30.0));
/// assert_eq!(sma.commit(&bar(3, 30.0)), Some(20.0));
/// ```
pub trait Indicator: Sized + Clone + Display + Debug {
    /// Configuration type for this indicator.
    type Config: IndicatorConfig;

    /// Computed output type. `f64` for simple indicators,
    /// a struct for composite ones (e.g. Bollinger Bands).
    type Output: Copy + Debug;

    /// Creates a new indicator from the given config.
    fn new(config: Self::Config) -> Self;

    /// Folds a closed bar into the state and returns the new value,
    /// or `None` if not yet converged.
    fn commit(&mut self, ohlcv: &impl Ohlcv) -> Option<Self::Output>;

    /// Returns the value the indicator would have if `ohlcv` closed now.
    /// Never mutates state.
    fn preview(&self, ohlcv: &impl Ohlcv) -> Option<Self::Output>;

    /// Returns the last committed value without advancing state,
    /// or `None` if not yet converged.
    fn value(&self) -> Option<Self::Output>;
}
