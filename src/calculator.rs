//! Batch snapshot over a whole bar series.
//!
//! The batch pass and the streaming bank both reduce to [`Readings`], the
//! latest value of every enabled family, and share [`assemble`] to turn
//! them into a [`TechnicalsSnapshot`]. The snapshot therefore cannot
//! differ between the two paths except through the values themselves.

use tracing::warn;

use crate::{
    EnabledSet, IndicatorKind, Ohlcv, PriceSource, Result, Settings,
    bb::BbValue,
    buffer_pool::BufferPool,
    confluence, divergence,
    pivots::{PivotBasis, Pivots, basis_index},
    series,
    settings::{MaType, moving_average_action},
    snapshot::{
        Advanced, BollingerBands, ChoppinessReading, Divergence, IchimokuReading,
        IndicatorResult, Oscillation, StochRsiReading, SuperTrendReading, Summary,
        TechnicalsSnapshot, TrailingStop, TrendDirection, Volatility,
    },
    supertrend::SuperTrendValue,
};

/// %K and %D of a stochastic-style oscillator.
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct KdLines {
    pub k: f64,
    pub d: f64,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct MacdLines {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) struct IchimokuLines {
    pub conversion: f64,
    pub base: f64,
    pub span_a: f64,
    pub span_b: f64,
}

impl IchimokuLines {
    pub(crate) fn new(conversion: f64, base: f64, span_b: f64) -> Self {
        Self {
            conversion,
            base,
            span_a: f64::midpoint(conversion, base),
            span_b,
        }
    }
}

/// Latest value of every family, as seen on the last bar.
///
/// `None` means the family is disabled or was skipped. Table entries
/// (oscillators, moving averages) carry `NaN` while warming up; the other
/// families are `None` until they have converged.
#[derive(Clone, Debug, Default)]
pub(crate) struct Readings {
    pub bars: usize,
    pub close: f64,
    pub prev_close: Option<f64>,
    pub pivot_basis: Option<PivotBasis>,

    pub rsi: Option<f64>,
    pub stochastic: Option<KdLines>,
    pub cci: Option<f64>,
    pub adx: Option<f64>,
    pub ao: Option<f64>,
    pub momentum: Option<f64>,
    pub macd: Option<MacdLines>,
    pub ema: Option<[f64; 3]>,
    pub sma: Option<[f64; 3]>,

    pub atr: Option<f64>,
    pub bb: Option<BbValue>,

    pub mfi: Option<f64>,
    pub stoch_rsi: Option<KdLines>,
    pub williams_r: Option<f64>,
    pub choppiness: Option<f64>,
    pub vwap: Option<f64>,
    pub ichimoku: Option<IchimokuLines>,
    pub parabolic_sar: Option<f64>,
    pub super_trend: Option<SuperTrendValue>,
    pub trailing_atr: Option<f64>,
    pub obv: Option<f64>,

    pub divergences: Vec<Divergence>,
}

/// `None` for a value that has not converged.
#[inline]
pub(crate) fn converged(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

/// Runs `compute` for an enabled family whose settings validate. A family
/// with invalid settings is logged and left out.
pub(crate) fn run_family<T>(
    kind: IndicatorKind,
    settings: &Settings,
    enabled: &EnabledSet,
    compute: impl FnOnce() -> T,
) -> Option<T> {
    if !enabled.contains(kind) {
        return None;
    }
    match checked(kind, settings, compute) {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(indicator = %kind, %error, "indicator skipped");
            None
        }
    }
}

fn checked<T>(kind: IndicatorKind, settings: &Settings, compute: impl FnOnce() -> T) -> Result<T> {
    settings.validate_kind(kind)?;
    Ok(compute())
}

/// Computes the snapshot of `bars` in one batch pass. The last bar may be
/// forming; it is included in every value but never used for pivots.
///
/// Fewer than two bars produce an empty snapshot.
#[must_use]
pub fn calculate<B: Ohlcv>(
    bars: &[B],
    settings: &Settings,
    enabled: &EnabledSet,
    pool: &mut BufferPool,
) -> TechnicalsSnapshot {
    if bars.len() < 2 {
        return TechnicalsSnapshot::default();
    }
    assemble(batch_readings(bars, settings, enabled, pool), settings, enabled)
}

#[inline]
fn last(series: &[f64]) -> f64 {
    series.last().copied().unwrap_or(f64::NAN)
}

#[allow(clippy::too_many_lines)]
fn batch_readings<B: Ohlcv>(
    bars: &[B],
    settings: &Settings,
    enabled: &EnabledSet,
    pool: &mut BufferPool,
) -> Readings {
    use IndicatorKind as K;

    let s = settings;
    let high = PriceSource::High.series(bars);
    let low = PriceSource::Low.series(bars);
    let close = PriceSource::Close.series(bars);
    let volume: Vec<f64> = bars.iter().map(Ohlcv::volume).collect();
    let len = bars.len();

    let rsi = run_family(K::Rsi, s, enabled, || {
        series::rsi(&s.rsi.source.series(bars), s.rsi.length.get())
    });

    let stochastic = run_family(K::Stochastic, s, enabled, || {
        let st = &s.stochastic;
        let out = series::stochastic(
            &high,
            &low,
            &close,
            st.k_period.get(),
            st.k_smoothing.get(),
            st.d_period.get(),
            pool,
        );
        KdLines {
            k: last(&out.k),
            d: last(&out.d),
        }
    });

    let cci = run_family(K::Cci, s, enabled, || {
        let raw = series::cci(&s.cci.source.series(bars), s.cci.length.get());
        let smoothed = match (s.cci.smoothing_length.get(), s.cci.smoothing_type) {
            (1, _) => raw,
            (n, MaType::Sma) => series::sma(&raw, n),
            (n, MaType::Ema) => series::ema(&raw, n),
        };
        last(&smoothed)
    });

    let adx = run_family(K::Adx, s, enabled, || {
        last(&series::adx(&high, &low, &close, s.adx.adx_smoothing.get()).adx)
    });

    let ao = run_family(K::Ao, s, enabled, || {
        last(&series::awesome_oscillator(
            &high,
            &low,
            s.ao.fast_length.get(),
            s.ao.slow_length.get(),
        ))
    });

    let momentum = run_family(K::Momentum, s, enabled, || {
        last(&series::momentum(
            &s.momentum.source.series(bars),
            s.momentum.length.get(),
        ))
    });

    let macd = run_family(K::Macd, s, enabled, || {
        let m = &s.macd;
        series::macd(
            &m.source.series(bars),
            m.fast_length.get(),
            m.slow_length.get(),
            m.signal_length.get(),
        )
    });

    let ema = run_family(K::Ema, s, enabled, || {
        let source = s.ema.source.series(bars);
        s.ema.lengths().map(|n| last(&series::ema(&source, n.get())))
    });

    let sma = run_family(K::Sma, s, enabled, || {
        let source = s.sma.source.series(bars);
        s.sma.lengths().map(|n| last(&series::sma(&source, n.get())))
    });

    let atr = run_family(K::Atr, s, enabled, || {
        last(&series::atr(&high, &low, &close, s.atr.length.get()))
    });

    let bb = run_family(K::BollingerBands, s, enabled, || {
        let b = &s.bollinger_bands;
        let out = series::bollinger(&b.source.series(bars), b.length.get(), b.std_dev);
        converged(last(&out.middle))
            .map(|middle| BbValue::from_bands(last(&out.upper), middle, last(&out.lower)))
    });

    let mfi = run_family(K::Mfi, s, enabled, || {
        last(&series::mfi(&high, &low, &close, &volume, s.mfi.length.get()))
    });

    let stoch_rsi = run_family(K::StochRsi, s, enabled, || {
        let sr = &s.stoch_rsi;
        series::stoch_rsi(
            &sr.source.series(bars),
            sr.rsi_length.get(),
            sr.stoch_length.get(),
            sr.k_smoothing.get(),
            sr.d_smoothing.get(),
        )
    });

    let williams_r = run_family(K::WilliamsR, s, enabled, || {
        last(&series::williams_r(
            &high,
            &low,
            &close,
            s.williams_r.length.get(),
            pool,
        ))
    });

    let choppiness = run_family(K::Choppiness, s, enabled, || {
        last(&series::choppiness(
            &high,
            &low,
            &close,
            s.choppiness.length.get(),
            pool,
        ))
    });

    let vwap = run_family(K::Vwap, s, enabled, || {
        last(&series::vwap(&high, &low, &close, &volume))
    });

    let ichimoku = run_family(K::Ichimoku, s, enabled, || {
        let ich = &s.ichimoku;
        let out = series::ichimoku(
            &high,
            &low,
            ich.conversion_period.get(),
            ich.base_period.get(),
            ich.span_b_period.get(),
            pool,
        );
        IchimokuLines::new(last(&out.conversion), last(&out.base), last(&out.span_b))
    });

    let parabolic_sar = run_family(K::ParabolicSar, s, enabled, || {
        let p = &s.parabolic_sar;
        last(&series::parabolic_sar(
            &high,
            &low,
            &close,
            p.start,
            p.increment,
            p.max,
        ))
    });

    let super_trend = run_family(K::SuperTrend, s, enabled, || {
        let out = series::supertrend(
            &high,
            &low,
            &close,
            s.super_trend.length.get(),
            s.super_trend.factor,
        );
        converged(last(&out.value)).map(|value| SuperTrendValue {
            value,
            bullish: out.bullish.last().copied().unwrap_or(false),
        })
    });

    let trailing_atr = run_family(K::AtrTrailingStop, s, enabled, || {
        last(&series::atr(
            &high,
            &low,
            &close,
            s.atr_trailing_stop.length.get(),
        ))
    });

    let obv = run_family(K::Obv, s, enabled, || last(&series::obv(&close, &volume)));

    let divergences = run_family(K::Divergences, s, enabled, || {
        let mut found = Vec::new();
        if let Some(rsi) = &rsi {
            found.extend(divergence::scan(&high, &low, rsi, "RSI"));
        }
        if let Some(macd) = &macd {
            found.extend(divergence::scan(&high, &low, &macd.macd, "MACD"));
        }
        if let Some(stoch_rsi) = &stoch_rsi {
            found.extend(divergence::scan(&high, &low, &stoch_rsi.k, "StochRSI"));
        }
        found
    })
    .unwrap_or_default();

    Readings {
        bars: len,
        close: last(&close),
        prev_close: len.checked_sub(2).map(|i| close[i]),
        pivot_basis: basis_index(bars).map(|i| PivotBasis::of(&bars[i])),
        rsi: rsi.as_deref().map(last),
        stochastic,
        cci,
        adx,
        ao,
        momentum,
        macd: macd.map(|m| MacdLines {
            line: last(&m.macd),
            signal: last(&m.signal),
            histogram: last(&m.histogram),
        }),
        ema,
        sma,
        atr: atr.and_then(converged),
        bb: bb.flatten(),
        mfi: mfi.and_then(converged),
        stoch_rsi: stoch_rsi.and_then(|sr| {
            converged(last(&sr.k)).map(|k| KdLines { k, d: last(&sr.d) })
        }),
        williams_r: williams_r.and_then(converged),
        choppiness: choppiness.and_then(converged),
        vwap: vwap.and_then(converged),
        ichimoku: ichimoku.filter(|lines| !lines.span_a.is_nan() && !lines.span_b.is_nan()),
        parabolic_sar: parabolic_sar.and_then(converged),
        super_trend: super_trend.flatten(),
        trailing_atr: trailing_atr.and_then(converged),
        obv: obv.and_then(converged),
        divergences,
    }
}

/// Builds the public snapshot from one set of readings.
#[allow(clippy::too_many_lines)]
pub(crate) fn assemble(
    readings: Readings,
    settings: &Settings,
    enabled: &EnabledSet,
) -> TechnicalsSnapshot {
    if readings.bars < 2 {
        return TechnicalsSnapshot::default();
    }

    let s = settings;
    let close = readings.close;

    let mut oscillators = Vec::with_capacity(7);
    if let Some(rsi) = readings.rsi {
        oscillators.push(IndicatorResult::new(
            "RSI",
            s.rsi.length.to_string(),
            rsi,
            s.rsi.action(rsi),
        ));
    }
    if let Some(KdLines { k, d }) = readings.stochastic {
        let st = &s.stochastic;
        oscillators.push(
            IndicatorResult::new(
                "Stoch",
                format!("{}, {}, {}", st.k_period, st.k_smoothing, st.d_period),
                k,
                st.action(k, d),
            )
            .with_signal(d),
        );
    }
    if let Some(cci) = readings.cci {
        let c = &s.cci;
        let params = if c.smoothing_length.get() > 1 {
            format!("{}, {} ({})", c.length, c.smoothing_length, c.smoothing_type)
        } else {
            c.length.to_string()
        };
        oscillators.push(IndicatorResult::new("CCI", params, cci, c.action(cci)));
    }
    if let Some(adx) = readings.adx {
        oscillators.push(IndicatorResult::new(
            "ADX",
            s.adx.adx_smoothing.to_string(),
            adx,
            s.adx.action(adx, close, readings.prev_close),
        ));
    }
    if let Some(ao) = readings.ao {
        oscillators.push(IndicatorResult::new(
            "Awesome Osc.",
            format!("{}, {}", s.ao.fast_length, s.ao.slow_length),
            ao,
            s.ao.action(ao),
        ));
    }
    if let Some(momentum) = readings.momentum {
        oscillators.push(IndicatorResult::new(
            "Momentum",
            s.momentum.length.to_string(),
            momentum,
            s.momentum.action(momentum),
        ));
    }
    if let Some(MacdLines {
        line,
        signal,
        histogram,
    }) = readings.macd
    {
        let m = &s.macd;
        oscillators.push(
            IndicatorResult::new(
                "MACD",
                format!("{}, {}, {}", m.fast_length, m.slow_length, m.signal_length),
                line,
                m.action(line, signal),
            )
            .with_signal(signal)
            .with_histogram(histogram),
        );
    }

    let mut moving_averages = Vec::with_capacity(6);
    let averages = [
        ("EMA", s.ema.lengths(), readings.ema),
        ("SMA", s.sma.lengths(), readings.sma),
    ];
    for (name, lengths, values) in averages {
        let Some(values) = values else { continue };
        for (length, value) in lengths.into_iter().zip(values) {
            if !value.is_nan() {
                moving_averages.push(IndicatorResult::new(
                    name,
                    length.to_string(),
                    value,
                    moving_average_action(close, value),
                ));
            }
        }
    }

    let volatility = (enabled.contains(IndicatorKind::Atr)
        || enabled.contains(IndicatorKind::BollingerBands))
    .then(|| Volatility {
        atr: readings.atr,
        bb: readings.bb.map(|bb| BollingerBands {
            upper: bb.upper(),
            middle: bb.middle(),
            lower: bb.lower(),
            percent_p: bb.percent_b(close),
        }),
    });

    let advanced = Advanced {
        vwap: readings.vwap,
        mfi: readings.mfi.map(|value| Oscillation {
            value,
            action: s.mfi.action(value),
        }),
        stoch_rsi: readings.stoch_rsi.map(|KdLines { k, d }| StochRsiReading {
            k,
            d,
            action: s.stoch_rsi.action(k, d),
        }),
        williams_r: readings.williams_r.map(|value| Oscillation {
            value,
            action: s.williams_r.action(value),
        }),
        choppiness: readings.choppiness.map(|value| ChoppinessReading {
            value,
            state: s.choppiness.regime(value),
        }),
        ichimoku: readings.ichimoku.map(|lines| IchimokuReading {
            conversion: lines.conversion,
            base: lines.base,
            span_a: lines.span_a,
            span_b: lines.span_b,
            action: s.ichimoku.level(
                close,
                lines.conversion,
                lines.base,
                lines.span_a,
                lines.span_b,
            ),
        }),
        parabolic_sar: readings.parabolic_sar,
        super_trend: readings.super_trend.map(|line| SuperTrendReading {
            value: line.value,
            trend: if line.bullish {
                TrendDirection::Bull
            } else {
                TrendDirection::Bear
            },
        }),
        atr_trailing_stop: readings.trailing_atr.map(|atr| {
            let offset = s.atr_trailing_stop.multiplier * atr;
            TrailingStop {
                buy: close + offset,
                sell: close - offset,
            }
        }),
        obv: readings.obv,
    };

    let (pivots, pivot_basis) = if enabled.contains(IndicatorKind::Pivots) {
        let basis = readings.pivot_basis;
        (basis.map(|basis| Pivots::compute(s.pivots.kind, basis)), basis)
    } else {
        (None, None)
    };

    let summary = Summary::tally(oscillators.iter().chain(&moving_averages));

    let mut snapshot = TechnicalsSnapshot {
        oscillators,
        moving_averages,
        volatility,
        advanced,
        pivots,
        pivot_basis,
        summary,
        confluence: None,
        divergences: readings.divergences,
    };
    if enabled.contains(IndicatorKind::Confluence) {
        snapshot.confluence = Some(confluence::score(&snapshot, close));
    }
    snapshot
}
