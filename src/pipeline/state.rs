use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle of a pipeline.
///
/// `Running -> Draining -> Finished`, or `Running -> Finished` directly when
/// the output is closed without a drain phase being observed. `Finished` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelineState {
    Running = 0,
    Draining = 1,
    Finished = 2,
}

impl PipelineState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Running,
            1 => Self::Draining,
            _ => Self::Finished,
        }
    }
}

/// Shared, atomically updated [`PipelineState`].
///
/// Every transition is a compare-and-swap, so each one happens at most once
/// no matter how many tasks race on it.
#[derive(Debug, Clone)]
pub struct StateCell(Arc<AtomicU8>);

impl StateCell {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU8::new(PipelineState::Running as u8)))
    }

    pub fn get(&self) -> PipelineState {
        PipelineState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// `Running -> Draining`. Returns `true` for the caller that made the move.
    pub fn begin_draining(&self) -> bool {
        self.0
            .compare_exchange(
                PipelineState::Running as u8,
                PipelineState::Draining as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Move to `Finished`. Returns `true` only for the first caller.
    pub fn finish(&self) -> bool {
        self.0
            .swap(PipelineState::Finished as u8, Ordering::AcqRel)
            != PipelineState::Finished as u8
    }

    pub fn is_finished(&self) -> bool {
        self.get() == PipelineState::Finished
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
