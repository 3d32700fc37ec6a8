use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::types::Generation;

/// Polled by the search to learn whether its result is still wanted.
pub trait Cancellation {
    /// True once the caller no longer wants the result.
    fn is_cancelled(&self) -> bool;
}

/// Never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shared latest-generation cell written by the input owner and read by running searches.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    /// Counter at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest generation.
    pub fn current(&self) -> Generation {
        self.current.load(Ordering::Acquire)
    }

    /// Publishes a newer generation. Older values are ignored.
    pub fn advance_to(&self, generation: Generation) {
        self.current.fetch_max(generation, Ordering::AcqRel);
    }

    /// Guard for a search started at `generation`.
    pub fn guard(&self, generation: Generation) -> GenerationGuard {
        GenerationGuard {
            current: Arc::clone(&self.current),
            target: generation,
        }
    }
}

/// Cancels once the shared counter moves past the generation the search was started for.
#[derive(Debug, Clone)]
pub struct GenerationGuard {
    current: Arc<AtomicU64>,
    target: Generation,
}

impl GenerationGuard {
    /// Generation this guard belongs to.
    pub fn target(&self) -> Generation {
        self.target
    }

    /// True when the shared counter still equals the target.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.target
    }
}

impl Cancellation for GenerationGuard {
    fn is_cancelled(&self) -> bool {
        !self.is_current()
    }
}

impl<F> Cancellation for F
where
    F: Fn() -> bool,
{
    fn is_cancelled(&self) -> bool {
        self()
    }
}
