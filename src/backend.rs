use crate::{
    Bar, EnabledSet, Settings, buffer_pool::BufferPool, calculator::calculate,
    snapshot::TechnicalsSnapshot,
};

/// A provider of batch snapshots.
///
/// Alternative implementations (an accelerated one, a remote one) plug in
/// behind this trait. They must agree with [`NativeBackend`] on every
/// reading to within floating-point tolerance.
pub trait ComputeBackend {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    /// Snapshot of `bars`; the last bar may be forming.
    fn compute(&mut self, bars: &[Bar], settings: &Settings, enabled: &EnabledSet)
    -> TechnicalsSnapshot;
}

/// The in-process batch calculator, reusing its scratch buffers between
/// calls.
#[derive(Debug, Default)]
pub struct NativeBackend {
    pool: BufferPool,
}

impl NativeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ComputeBackend for NativeBackend {
    fn name(&self) -> &str {
        "native"
    }

    fn compute(
        &mut self,
        bars: &[Bar],
        settings: &Settings,
        enabled: &EnabledSet,
    ) -> TechnicalsSnapshot {
        calculate(bars, settings, enabled, &mut self.pool)
    }
}
