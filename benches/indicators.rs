#[path = "../tests/fixtures/mod.rs"]
mod fixtures;

use crate::fixtures::{load_reference_bars, load_reference_ohlcvs};

use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use quantedge_technicals::{
    BufferPool, EnabledSet, Ema, EmaConfig, IndicatorKind, PriceSource, Rsi, RsiConfig, Settings,
    Sma, SmaConfig, StatefulEngine, calculate, series,
};
use std::{hint::black_box, num::NonZero, time::Duration};

fn nz(n: usize) -> NonZero<usize> {
    NonZero::new(n).expect("non zero value")
}

fn stream_benchmarks(c: &mut Criterion) {
    let bars = load_reference_ohlcvs();
    let mut group = c.benchmark_group("stream");
    group.throughput(Throughput::Elements(bars.len() as u64));
    group.warm_up_time(Duration::from_secs(5));
    group.measurement_time(Duration::from_secs(10));

    macro_rules! stream_bench {
        ($name:expr, $ind_type:ty, $config:expr) => {
            group.bench_function($name, |b| {
                b.iter_batched(
                    || <$ind_type>::new($config),
                    |mut ind| {
                        for bar in &bars {
                            black_box(ind.commit(bar));
                        }
                    },
                    BatchSize::SmallInput,
                );
            });
        };
    }

    stream_bench!("sma200", Sma, SmaConfig::close(nz(200)));
    stream_bench!("ema200", Ema, EmaConfig::close(nz(200)));
    stream_bench!("rsi14", Rsi, RsiConfig::close(nz(14)));

    group.finish();
}

fn series_benchmarks(c: &mut Criterion) {
    let close = PriceSource::Close.series(&load_reference_ohlcvs());
    let mut group = c.benchmark_group("series");
    group.throughput(Throughput::Elements(close.len() as u64));

    group.bench_function("sma200", |b| b.iter(|| black_box(series::sma(&close, 200))));
    group.bench_function("rsi14", |b| b.iter(|| black_box(series::rsi(&close, 14))));
    group.bench_function("macd", |b| b.iter(|| black_box(series::macd(&close, 12, 26, 9))));

    group.finish();
}

fn snapshot_benchmarks(c: &mut Criterion) {
    let bars = load_reference_bars();
    let settings = Settings::default();
    let mut group = c.benchmark_group("snapshot");
    group.warm_up_time(Duration::from_secs(5));
    group.measurement_time(Duration::from_secs(10));

    let mut pool = BufferPool::new();
    group.bench_function("batch_all", |b| {
        b.iter(|| black_box(calculate(&bars, &settings, &EnabledSet::all(), &mut pool)));
    });

    let table_only: EnabledSet = IndicatorKind::ALL
        .into_iter()
        .take_while(|kind| *kind != IndicatorKind::BollingerBands)
        .collect();
    group.bench_function("batch_table", |b| {
        b.iter(|| black_box(calculate(&bars, &settings, &table_only, &mut pool)));
    });

    group.finish();
}

fn engine_benchmarks(c: &mut Criterion) {
    let bars = load_reference_bars();
    let mut group = c.benchmark_group("engine");
    group.sample_size(200);
    group.noise_threshold(0.03);
    group.warm_up_time(Duration::from_secs(5));
    group.measurement_time(Duration::from_secs(10));

    // Pre-feed all bars except the last, then benchmark a single tick.
    let (warmup, last) = bars.split_at(bars.len() - 1);
    let forming = {
        let mut bar = last[0].forming();
        bar.close *= 1.001;
        bar
    };

    let mut engine = StatefulEngine::new(Settings::default(), EnabledSet::all());
    engine.initialize(warmup);
    group.bench_function("update", |b| b.iter(|| black_box(engine.update(&forming))));

    group.bench_function("commit", |b| {
        b.iter_batched(
            || {
                let mut engine = StatefulEngine::new(Settings::default(), EnabledSet::all());
                engine.initialize(warmup);
                engine
            },
            |mut engine| black_box(engine.commit(&last[0])),
            BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(
    benches,
    stream_benchmarks,
    series_benchmarks,
    snapshot_benchmarks,
    engine_benchmarks
);
criterion_main!(benches);
