use std::{
    fmt::Display,
    hash::{Hash, Hasher},
    num::NonZero,
};

use crate::{
    Indicator, IndicatorConfig, Ohlcv, Price, PriceSource,
    price_window::{Moments, PriceWindow, PriceWindowWithSumOfSquares},
};

/// Standard deviation multiplier for Bollinger Bands.
///
/// Wraps a positive, non-NaN `f64`. The constructor panics if the value is
/// zero, negative, or NaN.
///
/// Defaults to `2.0` (the standard Bollinger Bands setting).
///
/// Implements `Eq` and `Hash` via bit-level comparison, which is safe because
/// NaN is rejected at construction.
#[derive(Clone, Copy, Debug)]
pub struct StdDev(f64);

impl StdDev {
    /// Creates a new standard deviation multiplier.
    ///
    /// # Panics
    ///
    /// Panics if `value` is zero, negative, or NaN.
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self::try_new(value).expect("std_dev must be positive and not NaN")
    }

    /// Creates a multiplier, `None` if `value` is zero, negative, or NaN.
    #[must_use]
    pub fn try_new(value: f64) -> Option<Self> {
        (value > 0.0).then_some(Self(value))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for StdDev {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for StdDev {}

impl Hash for StdDev {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Default for StdDev {
    fn default() -> Self {
        Self(2.0)
    }
}

/// Configuration for the Bollinger Bands ([`Bb`]) indicator.
///
/// # Convergence
///
/// Bollinger Bands use an SMA for the middle band. Like SMA, values are exact
/// once the window is full, there is no warm-up bias to suppress.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct BbConfig {
    length: usize,
    source: PriceSource,
    std_dev: StdDev,
}

impl IndicatorConfig for BbConfig {
    #[inline]
    fn length(&self) -> usize {
        self.length
    }

    #[inline]
    fn source(&self) -> PriceSource {
        self.source
    }
}

impl BbConfig {
    #[must_use]
    pub fn new(length: NonZero<usize>, source: PriceSource, std_dev: StdDev) -> Self {
        Self {
            length: length.get(),
            source,
            std_dev,
        }
    }

    /// BB with custom length, close price, 2σ.
    #[must_use]
    pub fn close(length: NonZero<usize>) -> Self {
        Self::new(length, PriceSource::Close, StdDev::default())
    }

    #[must_use]
    pub fn std_dev(&self) -> StdDev {
        self.std_dev
    }
}

impl Display for BbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BbConfig({}, {}, {})",
            self.length, self.source, self.std_dev.0
        )
    }
}

/// Bollinger Bands output.
///
/// The middle band is the SMA. Upper and lower bands are offset by
/// `std_dev × σ`, where `σ` is the population standard deviation of the window.
///
/// ```text
/// upper  = SMA + k × σ
/// middle = SMA
/// lower  = SMA − k × σ
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BbValue {
    upper: Price,
    middle: Price,
    lower: Price,
}

impl BbValue {
    pub(crate) fn from_moments(moments: Moments, multiplier: f64) -> Self {
        let offset = moments.variance.sqrt() * multiplier;
        Self {
            upper: moments.mean + offset,
            middle: moments.mean,
            lower: moments.mean - offset,
        }
    }

    pub(crate) fn from_bands(upper: Price, middle: Price, lower: Price) -> Self {
        Self {
            upper,
            middle,
            lower,
        }
    }

    /// Upper band: `SMA + k × σ`.
    #[inline]
    #[must_use]
    pub fn upper(&self) -> Price {
        self.upper
    }

    /// Middle band: SMA of the window.
    #[inline]
    #[must_use]
    pub fn middle(&self) -> Price {
        self.middle
    }

    /// Lower band: `SMA − k × σ`.
    #[inline]
    #[must_use]
    pub fn lower(&self) -> Price {
        self.lower
    }

    /// Band width: `upper − lower`.
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Position of `price` within the bands: 0 at the lower band, 1 at the
    /// upper. Collapsed bands read 0.5.
    #[inline]
    #[must_use]
    pub fn percent_b(&self, price: Price) -> f64 {
        let width = self.width();
        if width == 0.0 {
            0.5
        } else {
            (price - self.lower) / width
        }
    }
}

impl Display for BbValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BB(u: {}, m: {}, l: {})",
            self.upper, self.middle, self.lower
        )
    }
}

/// Bollinger Bands (BB).
///
/// A volatility indicator consisting of three bands: a simple moving average
/// (middle) with upper and lower bands offset by a configurable number of
/// standard deviations.
///
/// Running sums are kept relative to an anchor near the window mean, so the
/// variance does not cancel catastrophically at large price magnitudes: a
/// window of `1e15 + {0, 1, 0, −1, 0}` reads σ² = 0.4.
///
/// # Example
///
/// ```
/// use quantedge_technicals::{Bar, Bb, BbConfig};
/// use std::num::NonZero;
///
/// let mut bb = Bb::new(BbConfig::close(NonZero::new(20).unwrap()));
/// let bar = |t, c| Bar::new(t, c, c, c, c, 0.0);
///
/// for t in 1..20 {
///     bb.commit(&bar(t, 100.0));
/// }
///
/// if let Some(value) = bb.commit(&bar(20, 100.0)) {
///     println!("upper: {}, middle: {}, lower: {}",
///         value.upper(), value.middle(), value.lower());
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Bb {
    config: BbConfig,
    window: PriceWindowWithSumOfSquares,
    current: Option<BbValue>,
}

impl Indicator for Bb {
    type Config = BbConfig;
    type Output = BbValue;

    fn new(config: Self::Config) -> Self {
        Self {
            config,
            window: PriceWindow::with_sum_of_squares(config.length),
            current: None,
        }
    }

    #[inline]
    fn commit(&mut self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        self.window.push(self.config.source.extract(ohlcv));
        self.current = self
            .window
            .moments()
            .map(|m| BbValue::from_moments(m, self.config.std_dev.0));
        self.current
    }

    #[inline]
    fn preview(&self, ohlcv: &impl Ohlcv) -> Option<Self::Output> {
        self.window
            .preview_moments(self.config.source.extract(ohlcv))
            .map(|m| BbValue::from_moments(m, self.config.std_dev.0))
    }

    #[inline]
    fn value(&self) -> Option<Self::Output> {
        self.current
    }
}

impl Display for Bb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BB({}, {}, {})",
            self.config.length, self.config.source, self.config.std_dev.0,
        )
    }
}
