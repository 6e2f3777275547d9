use tracing::{debug, trace};

use crate::{
    Bar, EnabledSet, Ohlcv, Settings,
    bank::IndicatorBank,
    buffer_pool::BufferPool,
    calculator::{assemble, calculate},
    snapshot::TechnicalsSnapshot,
};

#[derive(Clone, Debug)]
struct Ready {
    bank: IndicatorBank,
    forming: Option<Bar>,
}

/// Incremental snapshot engine for one symbol and timeframe.
///
/// [`initialize`](Self::initialize) computes the snapshot of a history in
/// one batch pass and seeds per-family state from its closed bars. After
/// that, [`update`](Self::update) evaluates the forming bar without
/// touching that state and [`commit`](Self::commit) folds in a closed bar,
/// each in time independent of the history length. Either produces the
/// snapshot a batch pass over the same bars would.
///
/// # Example
///
/// ```
/// use quantedge_technicals::{Bar, EnabledSet, Settings, StatefulEngine};
///
/// let history: Vec<Bar> = (0..100)
///     .map(|i| {
///         let c = 100.0 + f64::from(i);
///         Bar::new(i64::from(i) * 60_000, c, c + 1.0, c - 1.0, c, 10.0)
///     })
///     .collect();
///
/// let mut engine = StatefulEngine::new(Settings::default(), EnabledSet::all());
/// engine.initialize(&history);
///
/// let tick = Bar::new(6_000_000, 200.0, 202.0, 199.0, 201.5, 3.0).forming();
/// let live = engine.update(&tick);
/// assert!(live.indicator("RSI").is_some());
///
/// let closed = Bar::new(6_000_000, 200.0, 202.5, 199.0, 202.0, 7.0);
/// engine.commit(&closed);
/// ```
#[derive(Debug)]
pub struct StatefulEngine {
    settings: Settings,
    enabled: EnabledSet,
    pool: BufferPool,
    state: Option<Ready>,
}

impl StatefulEngine {
    /// An engine that must be [initialized](Self::initialize) before use.
    #[must_use]
    pub fn new(settings: Settings, enabled: EnabledSet) -> Self {
        Self {
            settings,
            enabled,
            pool: BufferPool::new(),
            state: None,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn enabled(&self) -> &EnabledSet {
        &self.enabled
    }

    /// Whether [`initialize`](Self::initialize) has run since construction
    /// or the last [`reconfigure`](Self::reconfigure).
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state.is_some()
    }

    /// The bar last passed to [`update`](Self::update), cleared by
    /// [`commit`](Self::commit).
    #[must_use]
    pub fn forming(&self) -> Option<&Bar> {
        self.state.as_ref().and_then(|ready| ready.forming.as_ref())
    }

    /// Computes the snapshot of `history` and seeds the incremental state
    /// from its closed bars. A trailing bar that is not closed becomes the
    /// forming bar. Re-initializing discards all previous state.
    pub fn initialize<B: Ohlcv>(&mut self, history: &[B]) -> TechnicalsSnapshot {
        let snapshot = calculate(history, &self.settings, &self.enabled, &mut self.pool);

        let (closed, forming) = match history.split_last() {
            Some((last, rest)) if !last.is_closed() => (rest, Some(Bar::from_ohlcv(last))),
            _ => (history, None),
        };

        let mut bank = IndicatorBank::new(&self.settings, &self.enabled);
        for bar in closed {
            bank.advance(&Bar::from_ohlcv(bar));
        }

        debug!(
            bars = history.len(),
            closed = closed.len(),
            forming = forming.is_some(),
            "engine initialized"
        );
        self.state = Some(Ready { bank, forming });
        snapshot
    }

    /// Snapshot with `forming` as the in-progress bar. Repeated calls
    /// replace one another; committed state is never touched.
    ///
    /// # Panics
    ///
    /// Before [`initialize`](Self::initialize).
    #[track_caller]
    pub fn update(&mut self, forming: &impl Ohlcv) -> TechnicalsSnapshot {
        let Some(ready) = self.state.as_mut() else {
            panic!("StatefulEngine::update called before initialize");
        };

        let bar = Bar::from_ohlcv(forming).forming();
        trace!(time = bar.time, close = bar.close, "forming bar");
        let readings = ready.bank.preview(&bar);
        ready.forming = Some(bar);
        assemble(readings, &self.settings, &self.enabled)
    }

    /// Folds `closed` into the state permanently and returns the snapshot
    /// ending with it.
    ///
    /// # Panics
    ///
    /// Before [`initialize`](Self::initialize).
    #[track_caller]
    pub fn commit(&mut self, closed: &impl Ohlcv) -> TechnicalsSnapshot {
        let Some(ready) = self.state.as_mut() else {
            panic!("StatefulEngine::commit called before initialize");
        };

        let bar = Bar {
            closed: true,
            ..Bar::from_ohlcv(closed)
        };
        let readings = ready.bank.commit(&bar);
        ready.forming = None;
        debug!(
            time = bar.time,
            bars = ready.bank.committed(),
            "bar committed"
        );
        assemble(readings, &self.settings, &self.enabled)
    }

    /// Swaps settings or the enabled set. The engine must be initialized
    /// again before the next update or commit.
    pub fn reconfigure(&mut self, settings: Settings, enabled: EnabledSet) {
        self.settings = settings;
        self.enabled = enabled;
        self.state = None;
        self.pool.clear();
        debug!("engine reconfigured");
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::{IndicatorKind, snapshot::Action};

    #[allow(clippy::cast_precision_loss)]
    fn history(n: i64) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                let close = 50.0 + (t * 0.2).sin() * 5.0 + t * 0.1;
                Bar::new(i * 60_000, close - 0.4, close + 0.9, close - 0.8, close, 100.0 + t)
            })
            .collect()
    }

    fn engine() -> StatefulEngine {
        StatefulEngine::new(Settings::default(), EnabledSet::all())
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn not_ready_until_initialized() {
            let mut engine = engine();
            assert!(!engine.is_ready());
            engine.initialize(&history(10));
            assert!(engine.is_ready());
        }

        #[test]
        #[should_panic(expected = "before initialize")]
        fn update_before_initialize_panics() {
            engine().update(&history(1)[0]);
        }

        #[test]
        #[should_panic(expected = "before initialize")]
        fn commit_before_initialize_panics() {
            engine().commit(&history(1)[0]);
        }

        #[test]
        fn reconfigure_requires_initialize() {
            let mut engine = engine();
            engine.initialize(&history(10));
            engine.reconfigure(Settings::default(), EnabledSet::none());
            assert!(!engine.is_ready());
            assert!(!engine.enabled().contains(IndicatorKind::Rsi));
        }

        #[test]
        fn trailing_forming_bar_is_kept() {
            let mut bars = history(30);
            let last = bars.len() - 1;
            bars[last] = bars[last].forming();
            let mut engine = engine();
            engine.initialize(&bars);
            assert_eq!(engine.forming().map(|b| b.close), Some(bars[last].close));

            engine.commit(&bars[last]);
            assert!(engine.forming().is_none());
        }
    }

    mod incremental {
        use super::*;

        #[test]
        fn update_matches_batch_with_forming_bar() {
            let bars = history(120);
            let mut engine = engine();
            engine.initialize(&bars[..119]);
            let live = engine.update(&bars[119]);

            let mut full = bars.clone();
            full[119] = full[119].forming();
            let batch = super::engine().initialize(&full);

            assert_eq!(live.oscillators.len(), batch.oscillators.len());
            for (a, b) in live.oscillators.iter().zip(&batch.oscillators) {
                assert!((a.value - b.value).abs() <= 1e-9 * b.value.abs().max(1.0), "{}", a.name);
            }
            assert_eq!(live.pivot_basis, batch.pivot_basis);
        }

        #[test]
        fn repeated_updates_do_not_accumulate() {
            let bars = history(80);
            let mut engine = engine();
            engine.initialize(&bars[..79]);
            let first = engine.update(&bars[79]);
            let mut other = bars[79];
            other.close += 3.0;
            engine.update(&other);
            let again = engine.update(&bars[79]);
            assert_eq!(first, again);
        }

        #[test]
        fn commit_matches_initialize() {
            let bars = history(90);
            let mut engine = engine();
            engine.initialize(&bars[..85]);
            let mut last = TechnicalsSnapshot::default();
            for bar in &bars[85..] {
                last = engine.commit(bar);
            }
            let batch = super::engine().initialize(&bars);
            for (a, b) in last.moving_averages.iter().zip(&batch.moving_averages) {
                assert!((a.value - b.value).abs() <= 1e-9 * b.value.abs());
            }
            assert_eq!(last.summary, batch.summary);
        }

        #[test]
        fn flat_market_reads_neutral() {
            let bars: Vec<Bar> = (0..40)
                .map(|i| Bar::new(i * 60_000, 10.0, 10.0, 10.0, 10.0, 1.0))
                .collect();
            let mut engine = engine();
            engine.initialize(&bars);
            let snapshot = engine.update(&Bar::new(40 * 60_000, 10.0, 10.0, 10.0, 10.0, 1.0));
            assert_eq!(snapshot.indicator("RSI").map(|r| r.action), Some(Action::Neutral));
        }
    }
}
