//! Incremental state for every enabled family.
//!
//! Each family keeps the same core the batch series fold, so committing
//! bars one at a time lands on exactly the readings a batch pass over the
//! same bars produces. Families that need a whole window of bars (rolling
//! extremes, CCI) read it from a shared tail of recent closed bars.

use crate::{
    Bar, EnabledSet, IndicatorKind, Settings,
    adx::AdxCore,
    atr::{AtrCore, true_range_of},
    bb::BbValue,
    calculator::{IchimokuLines, KdLines, MacdLines, Readings, converged, run_family},
    divergence,
    flow::{ObvCore, VwapCore},
    macd::{MacdCore, MacdValue},
    mfi::MfiCore,
    momentum::{AwesomeCore, MomentumCore},
    parabolic_sar::{Acceleration, ParabolicSarState},
    pivots::PivotBasis,
    price_window::{PriceWindow, PriceWindowWithSumOfSquares},
    ring_buffer::RingBuffer,
    rsi::RsiCore,
    series::{choppiness_index, commodity_channel_index, or_nan, williams_position, window_sum},
    settings::{CciSettings, IchimokuSettings, MaType},
    sliding_window::{window_max, window_min},
    smoothing::SeededAverage,
    snapshot::Divergence,
    stoch_rsi::{StochRsiCore, stochastic_position},
    supertrend::SuperTrendState,
};

/// Oscillator history kept for divergence scans. Pairs end within the
/// last 15 bars and start at most 60 bars earlier, with a few bars of
/// margin for pivot confirmation and the price window.
const DIVERGENCE_TAIL: usize = 128;

/// The committed tail, optionally followed by a forming bar.
#[derive(Clone, Copy)]
struct Window<'a> {
    tail: &'a RingBuffer<Bar>,
    forming: Option<&'a Bar>,
}

impl<'a> Window<'a> {
    fn len(self) -> usize {
        self.tail.len() + usize::from(self.forming.is_some())
    }

    /// The newest `n` bars oldest first, `None` while fewer are known.
    fn last(self, n: usize) -> Option<impl Iterator<Item = Bar> + Clone + 'a> {
        let skip = self.len().checked_sub(n)?;
        Some(self.tail.iter().chain(self.forming.copied()).skip(skip))
    }

    /// Highest high and lowest low of the newest `n` bars.
    fn extremes(self, n: usize) -> (f64, f64) {
        self.last(n).map_or((f64::NAN, f64::NAN), |bars| {
            (
                window_max(bars.clone().map(|bar| bar.high)),
                window_min(bars.map(|bar| bar.low)),
            )
        })
    }

    fn midpoint(self, n: usize) -> f64 {
        let (highest, lowest) = self.extremes(n);
        f64::midpoint(highest, lowest)
    }
}

#[derive(Clone, Debug)]
struct StochasticState {
    k_period: usize,
    k: PriceWindow,
    d: PriceWindow,
}

impl StochasticState {
    fn raw(&self, window: Window<'_>, close: f64) -> f64 {
        let (highest, lowest) = window.extremes(self.k_period);
        stochastic_position(close, lowest, highest)
    }

    fn push(&mut self, window: Window<'_>, close: f64) -> KdLines {
        self.k.push(self.raw(window, close));
        let k = or_nan(self.k.mean());
        self.d.push(k);
        KdLines {
            k,
            d: or_nan(self.d.mean()),
        }
    }

    fn preview(&self, window: Window<'_>, close: f64) -> KdLines {
        let k = or_nan(self.k.preview_mean(self.raw(window, close)));
        KdLines {
            k,
            d: or_nan(self.d.preview_mean(k)),
        }
    }
}

#[derive(Clone, Debug)]
enum Smoother {
    Simple(PriceWindow),
    Exponential(SeededAverage),
}

impl Smoother {
    fn push(&mut self, value: f64) -> f64 {
        match self {
            Self::Simple(window) => {
                window.push(value);
                or_nan(window.mean())
            }
            Self::Exponential(average) => or_nan(average.push(value)),
        }
    }

    fn preview(&self, value: f64) -> f64 {
        match self {
            Self::Simple(window) => or_nan(window.preview_mean(value)),
            Self::Exponential(average) => or_nan(average.preview(value)),
        }
    }
}

#[derive(Clone, Debug)]
struct CciState {
    settings: CciSettings,
    smoother: Option<Smoother>,
}

impl CciState {
    fn new(settings: CciSettings) -> Self {
        let smoother = match (settings.smoothing_length.get(), settings.smoothing_type) {
            (1, _) => None,
            (n, MaType::Sma) => Some(Smoother::Simple(PriceWindow::new(n))),
            (n, MaType::Ema) => Some(Smoother::Exponential(SeededAverage::exponential(n))),
        };
        Self { settings, smoother }
    }

    fn raw(&self, window: Window<'_>) -> f64 {
        let source = self.settings.source;
        window
            .last(self.settings.length.get())
            .map_or(f64::NAN, |bars| {
                commodity_channel_index(bars.map(move |bar| source.extract(&bar)))
            })
    }

    fn push(&mut self, window: Window<'_>) -> f64 {
        let raw = self.raw(window);
        match &mut self.smoother {
            Some(smoother) => smoother.push(raw),
            None => raw,
        }
    }

    fn preview(&self, window: Window<'_>) -> f64 {
        let raw = self.raw(window);
        self.smoother
            .as_ref()
            .map_or(raw, |smoother| smoother.preview(raw))
    }
}

#[derive(Clone, Debug)]
struct ChoppinessState {
    length: usize,
    true_ranges: PriceWindow,
    prev_close: Option<f64>,
}

impl ChoppinessState {
    fn new(length: usize) -> Self {
        Self {
            length,
            true_ranges: PriceWindow::new(length),
            prev_close: None,
        }
    }

    fn index(&self, window: Window<'_>, tr_sum: Option<f64>) -> f64 {
        let (highest, lowest) = window.extremes(self.length);
        choppiness_index(or_nan(tr_sum), highest, lowest, self.length)
    }

    fn push(&mut self, window: Window<'_>, bar: &Bar) -> f64 {
        let tr = true_range_of(bar.high, bar.low, self.prev_close);
        self.prev_close = Some(bar.close);
        self.true_ranges.push(tr);
        self.index(window, window_sum(&self.true_ranges, self.length))
    }

    #[allow(clippy::cast_precision_loss)]
    fn preview(&self, window: Window<'_>, bar: &Bar) -> f64 {
        let tr = true_range_of(bar.high, bar.low, self.prev_close);
        let sum = self
            .true_ranges
            .preview_mean(tr)
            .map(|mean| mean * self.length as f64);
        self.index(window, sum)
    }
}

#[derive(Clone, Copy, Debug)]
struct Sample {
    high: f64,
    low: f64,
    rsi: f64,
    macd: f64,
    stoch_rsi: f64,
}

impl Sample {
    fn of(bar: &Bar, readings: &Readings) -> Self {
        Self {
            high: bar.high,
            low: bar.low,
            rsi: or_nan(readings.rsi),
            macd: readings.macd.map_or(f64::NAN, |m| m.line),
            stoch_rsi: readings.stoch_rsi.map_or(f64::NAN, |kd| kd.k),
        }
    }
}

/// Recent price and oscillator values for divergence scans.
#[derive(Clone, Debug)]
struct DivergenceTail {
    samples: RingBuffer<Sample>,
    seen: usize,
    rsi: bool,
    macd: bool,
    stoch_rsi: bool,
}

impl DivergenceTail {
    fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
        self.seen += 1;
    }

    /// Scans the tail (plus `forming`) with indices relative to the first
    /// bar ever seen.
    fn scan(&self, forming: Option<Sample>) -> Vec<Divergence> {
        let samples: Vec<Sample> = self.samples.iter().chain(forming).collect();
        let offset = self.seen + usize::from(forming.is_some()) - samples.len();
        let high: Vec<f64> = samples.iter().map(|s| s.high).collect();
        let low: Vec<f64> = samples.iter().map(|s| s.low).collect();

        let columns: [(&str, bool, fn(&Sample) -> f64); 3] = [
            ("RSI", self.rsi, |s| s.rsi),
            ("MACD", self.macd, |s| s.macd),
            ("StochRSI", self.stoch_rsi, |s| s.stoch_rsi),
        ];

        let mut found = Vec::new();
        for (name, tracked, pick) in columns {
            if !tracked {
                continue;
            }
            let values: Vec<f64> = samples.iter().map(pick).collect();
            found.extend(
                divergence::scan(&high, &low, &values, name)
                    .into_iter()
                    .map(|mut div| {
                        div.start_idx += offset;
                        div.end_idx += offset;
                        div
                    }),
            );
        }
        found
    }
}

/// Per-family streaming state for one settings record.
///
/// A family that is disabled or whose settings fail validation has no
/// state and never appears in the readings.
#[derive(Clone, Debug)]
pub(crate) struct IndicatorBank {
    settings: Settings,
    tail: RingBuffer<Bar>,
    committed: usize,
    last_close: Option<f64>,

    rsi: Option<RsiCore>,
    stochastic: Option<StochasticState>,
    cci: Option<CciState>,
    adx: Option<AdxCore>,
    ao: Option<AwesomeCore>,
    momentum: Option<MomentumCore>,
    macd: Option<MacdCore>,
    ema: Option<[SeededAverage; 3]>,
    sma: Option<[PriceWindow; 3]>,

    atr: Option<AtrCore>,
    bb: Option<PriceWindowWithSumOfSquares>,

    mfi: Option<MfiCore>,
    stoch_rsi: Option<StochRsiCore>,
    williams_r: Option<usize>,
    choppiness: Option<ChoppinessState>,
    vwap: Option<VwapCore>,
    ichimoku: Option<IchimokuSettings>,
    parabolic_sar: Option<ParabolicSarState>,
    super_trend: Option<SuperTrendState>,
    trailing_atr: Option<AtrCore>,
    obv: Option<ObvCore>,

    divergences: Option<DivergenceTail>,
}

impl IndicatorBank {
    pub(crate) fn new(settings: &Settings, enabled: &EnabledSet) -> Self {
        use IndicatorKind as K;

        let s = settings;
        let family = |kind| run_family(kind, s, enabled, || ());

        let stochastic = run_family(K::Stochastic, s, enabled, || StochasticState {
            k_period: s.stochastic.k_period.get(),
            k: PriceWindow::new(s.stochastic.k_smoothing.get()),
            d: PriceWindow::new(s.stochastic.d_period.get()),
        });
        let cci = run_family(K::Cci, s, enabled, || CciState::new(s.cci));
        let williams_r = family(K::WilliamsR).map(|()| s.williams_r.length.get());
        let choppiness = run_family(K::Choppiness, s, enabled, || {
            ChoppinessState::new(s.choppiness.length.get())
        });
        let ichimoku = family(K::Ichimoku).map(|()| s.ichimoku);

        let tail_len = [
            stochastic.as_ref().map(|st| st.k_period),
            cci.as_ref().map(|c| c.settings.length.get()),
            williams_r,
            choppiness.as_ref().map(|c| c.length),
            ichimoku.map(|ich| ich.longest()),
        ]
        .into_iter()
        .flatten()
        .fold(1, usize::max);

        let rsi = run_family(K::Rsi, s, enabled, || RsiCore::new(s.rsi.length.get()));
        let macd = run_family(K::Macd, s, enabled, || {
            MacdCore::new(
                s.macd.fast_length.get(),
                s.macd.slow_length.get(),
                s.macd.signal_length.get(),
            )
        });
        let stoch_rsi = run_family(K::StochRsi, s, enabled, || {
            let sr = &s.stoch_rsi;
            StochRsiCore::new(
                sr.rsi_length.get(),
                sr.stoch_length.get(),
                sr.k_smoothing.get(),
                sr.d_smoothing.get(),
            )
        });
        let divergences = run_family(K::Divergences, s, enabled, || DivergenceTail {
            samples: RingBuffer::new(DIVERGENCE_TAIL),
            seen: 0,
            rsi: rsi.is_some(),
            macd: macd.is_some(),
            stoch_rsi: stoch_rsi.is_some(),
        });

        Self {
            settings: *settings,
            tail: RingBuffer::new(tail_len),
            committed: 0,
            last_close: None,
            rsi,
            stochastic,
            cci,
            adx: run_family(K::Adx, s, enabled, || AdxCore::new(s.adx.adx_smoothing.get())),
            ao: run_family(K::Ao, s, enabled, || {
                AwesomeCore::new(s.ao.fast_length.get(), s.ao.slow_length.get())
            }),
            momentum: run_family(K::Momentum, s, enabled, || {
                MomentumCore::new(s.momentum.length.get())
            }),
            macd,
            ema: run_family(K::Ema, s, enabled, || {
                s.ema.lengths().map(|n| SeededAverage::exponential(n.get()))
            }),
            sma: run_family(K::Sma, s, enabled, || {
                s.sma.lengths().map(|n| PriceWindow::new(n.get()))
            }),
            atr: run_family(K::Atr, s, enabled, || AtrCore::new(s.atr.length.get())),
            bb: run_family(K::BollingerBands, s, enabled, || {
                PriceWindowWithSumOfSquares::with_sum_of_squares(s.bollinger_bands.length.get())
            }),
            mfi: run_family(K::Mfi, s, enabled, || MfiCore::new(s.mfi.length.get())),
            stoch_rsi,
            williams_r,
            choppiness,
            vwap: run_family(K::Vwap, s, enabled, VwapCore::default),
            ichimoku,
            parabolic_sar: run_family(K::ParabolicSar, s, enabled, || {
                let p = &s.parabolic_sar;
                ParabolicSarState::new(Acceleration {
                    start: p.start,
                    increment: p.increment,
                    max: p.max,
                })
            }),
            super_trend: run_family(K::SuperTrend, s, enabled, || {
                SuperTrendState::new(s.super_trend.length.get(), s.super_trend.factor)
            }),
            trailing_atr: run_family(K::AtrTrailingStop, s, enabled, || {
                AtrCore::new(s.atr_trailing_stop.length.get())
            }),
            obv: run_family(K::Obv, s, enabled, ObvCore::default),
            divergences,
        }
    }

    /// Number of committed bars.
    pub(crate) fn committed(&self) -> usize {
        self.committed
    }

    /// Folds a closed bar into every family without scanning for
    /// divergences. Used to replay history.
    #[allow(clippy::too_many_lines)]
    pub(crate) fn advance(&mut self, bar: &Bar) -> Readings {
        self.tail.push(*bar);
        self.committed += 1;
        let prev_close = self.last_close.replace(bar.close);

        let s = &self.settings;
        let window = Window {
            tail: &self.tail,
            forming: None,
        };
        let (high, low, close, volume) = (bar.high, bar.low, bar.close, bar.volume);

        let rsi = self
            .rsi
            .as_mut()
            .map(|core| or_nan(core.push(s.rsi.source.extract(bar))));
        let macd = self
            .macd
            .as_mut()
            .map(|core| macd_lines(core.push(s.macd.source.extract(bar))));
        let stoch_rsi = self.stoch_rsi.as_mut().map(|core| {
            core.push(s.stoch_rsi.source.extract(bar))
                .and_then(|v| converged(v.k).map(|k| KdLines { k, d: or_nan(v.d) }))
        });

        let readings = Readings {
            bars: self.committed,
            close,
            prev_close,
            pivot_basis: Some(PivotBasis::of(bar)),
            rsi,
            stochastic: self
                .stochastic
                .as_mut()
                .map(|state| state.push(window, close)),
            cci: self.cci.as_mut().map(|state| state.push(window)),
            adx: self
                .adx
                .as_mut()
                .map(|core| core.push(high, low, close).map_or(f64::NAN, |v| v.adx)),
            ao: self
                .ao
                .as_mut()
                .map(|core| or_nan(core.push((high + low) / 2.0))),
            momentum: self
                .momentum
                .as_mut()
                .map(|core| or_nan(core.push(s.momentum.source.extract(bar)))),
            macd,
            ema: self.ema.as_mut().map(|averages| {
                let price = s.ema.source.extract(bar);
                averages.each_mut().map(|average| or_nan(average.push(price)))
            }),
            sma: self.sma.as_mut().map(|windows| {
                let price = s.sma.source.extract(bar);
                windows.each_mut().map(|w| {
                    w.push(price);
                    or_nan(w.mean())
                })
            }),
            atr: self
                .atr
                .as_mut()
                .and_then(|core| core.push(high, low, close))
                .and_then(converged),
            bb: self.bb.as_mut().and_then(|w| {
                w.push(s.bollinger_bands.source.extract(bar));
                w.moments()
                    .map(|m| BbValue::from_moments(m, s.bollinger_bands.std_dev))
            }),
            mfi: self
                .mfi
                .as_mut()
                .and_then(|core| core.push(high, low, close, volume))
                .and_then(converged),
            stoch_rsi: stoch_rsi.flatten(),
            williams_r: self
                .williams_r
                .and_then(|length| williams(window, length, close)),
            choppiness: self
                .choppiness
                .as_mut()
                .and_then(|state| converged(state.push(window, bar))),
            vwap: self
                .vwap
                .as_mut()
                .and_then(|core| converged(core.push(high, low, close, volume))),
            ichimoku: self.ichimoku.and_then(|ich| ichimoku(window, &ich)),
            parabolic_sar: self
                .parabolic_sar
                .as_mut()
                .and_then(|state| state.push(high, low, close))
                .and_then(converged),
            super_trend: self
                .super_trend
                .as_mut()
                .and_then(|state| state.push(high, low, close))
                .filter(|line| !line.value.is_nan()),
            trailing_atr: self
                .trailing_atr
                .as_mut()
                .and_then(|core| core.push(high, low, close))
                .and_then(converged),
            obv: self
                .obv
                .as_mut()
                .and_then(|core| converged(core.push(close, volume))),
            divergences: Vec::new(),
        };

        if let Some(tail) = &mut self.divergences {
            tail.push(Sample::of(bar, &readings));
        }
        readings
    }

    /// Folds a closed bar into every family.
    pub(crate) fn commit(&mut self, bar: &Bar) -> Readings {
        let mut readings = self.advance(bar);
        if let Some(tail) = &self.divergences {
            readings.divergences = tail.scan(None);
        }
        readings
    }

    /// Readings as if `bar` closed now, leaving the state untouched.
    #[allow(clippy::too_many_lines)]
    pub(crate) fn preview(&self, bar: &Bar) -> Readings {
        let s = &self.settings;
        let window = Window {
            tail: &self.tail,
            forming: Some(bar),
        };
        let (high, low, close, volume) = (bar.high, bar.low, bar.close, bar.volume);

        let mut readings = Readings {
            bars: self.committed + 1,
            close,
            prev_close: self.last_close,
            pivot_basis: self.tail.newest().map(|last| PivotBasis::of(&last)),
            rsi: self
                .rsi
                .as_ref()
                .map(|core| or_nan(core.preview(s.rsi.source.extract(bar)))),
            stochastic: self
                .stochastic
                .as_ref()
                .map(|state| state.preview(window, close)),
            cci: self.cci.as_ref().map(|state| state.preview(window)),
            adx: self
                .adx
                .as_ref()
                .map(|core| core.preview(high, low).map_or(f64::NAN, |v| v.adx)),
            ao: self
                .ao
                .as_ref()
                .map(|core| or_nan(core.preview((high + low) / 2.0))),
            momentum: self
                .momentum
                .as_ref()
                .map(|core| or_nan(core.preview(s.momentum.source.extract(bar)))),
            macd: self
                .macd
                .as_ref()
                .map(|core| macd_lines(core.preview(s.macd.source.extract(bar)))),
            ema: self.ema.as_ref().map(|averages| {
                let price = s.ema.source.extract(bar);
                averages.each_ref().map(|average| or_nan(average.preview(price)))
            }),
            sma: self.sma.as_ref().map(|windows| {
                let price = s.sma.source.extract(bar);
                windows.each_ref().map(|w| or_nan(w.preview_mean(price)))
            }),
            atr: self
                .atr
                .as_ref()
                .and_then(|core| core.preview(high, low))
                .and_then(converged),
            bb: self.bb.as_ref().and_then(|w| {
                w.preview_moments(s.bollinger_bands.source.extract(bar))
                    .map(|m| BbValue::from_moments(m, s.bollinger_bands.std_dev))
            }),
            mfi: self
                .mfi
                .as_ref()
                .and_then(|core| core.preview(high, low, close, volume))
                .and_then(converged),
            stoch_rsi: self.stoch_rsi.as_ref().and_then(|core| {
                core.preview(s.stoch_rsi.source.extract(bar))
                    .and_then(|v| converged(v.k).map(|k| KdLines { k, d: or_nan(v.d) }))
            }),
            williams_r: self
                .williams_r
                .and_then(|length| williams(window, length, close)),
            choppiness: self
                .choppiness
                .as_ref()
                .and_then(|state| converged(state.preview(window, bar))),
            vwap: self
                .vwap
                .as_ref()
                .and_then(|core| converged(core.preview(high, low, close, volume))),
            ichimoku: self.ichimoku.and_then(|ich| ichimoku(window, &ich)),
            parabolic_sar: self
                .parabolic_sar
                .as_ref()
                .and_then(|state| state.preview(high, low, close))
                .and_then(converged),
            super_trend: self
                .super_trend
                .as_ref()
                .and_then(|state| state.preview(high, low, close))
                .filter(|line| !line.value.is_nan()),
            trailing_atr: self
                .trailing_atr
                .as_ref()
                .and_then(|core| core.preview(high, low))
                .and_then(converged),
            obv: self
                .obv
                .as_ref()
                .and_then(|core| converged(core.preview(close, volume))),
            divergences: Vec::new(),
        };

        if let Some(tail) = &self.divergences {
            readings.divergences = tail.scan(Some(Sample::of(bar, &readings)));
        }
        readings
    }
}

fn macd_lines(value: Option<MacdValue>) -> MacdLines {
    value.map_or(
        MacdLines {
            line: f64::NAN,
            signal: f64::NAN,
            histogram: f64::NAN,
        },
        |v| MacdLines {
            line: v.macd,
            signal: or_nan(v.signal),
            histogram: or_nan(v.histogram),
        },
    )
}

fn williams(window: Window<'_>, length: usize, close: f64) -> Option<f64> {
    let (highest, lowest) = window.extremes(length);
    converged(williams_position(close, lowest, highest))
}

fn ichimoku(window: Window<'_>, settings: &IchimokuSettings) -> Option<IchimokuLines> {
    let lines = IchimokuLines::new(
        window.midpoint(settings.conversion_period.get()),
        window.midpoint(settings.base_period.get()),
        window.midpoint(settings.span_b_period.get()),
    );
    (!lines.span_a.is_nan() && !lines.span_b.is_nan()).then_some(lines)
}
