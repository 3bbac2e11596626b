//! Per-task execution attributes: priority class, processor affinity, and the
//! derived affinity mask.
//!
//! [`ExecutionAttributes`] is a plain value. It travels with a task and is
//! applied to the worker's OS thread immediately before the task body runs;
//! see [`crate::pal::apply_to_current_thread`].

use crate::pal;

/// Abstract thread priority class.
///
/// The platform mapping is a contract users rely on:
///
/// | Class | Windows | Unix (`SCHED_OTHER`) |
/// |-------|---------|----------------------|
/// | `Low` | below normal | 0 |
/// | `Normal` | normal | 1 |
/// | `High` | above normal | 5 |
/// | `Critical` | highest | 10 |
/// | `TimeCritical` | time critical | 20 |
///
/// Platforms that reject non-default `SCHED_OTHER` priorities fall back to a
/// `nice` value with the same monotonic ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ThreadPriority {
    /// Below-normal priority.
    Low,
    /// The platform default.
    #[default]
    Normal,
    /// Above-normal priority.
    High,
    /// Highest non-realtime priority.
    Critical,
    /// Realtime-adjacent priority. Use sparingly.
    TimeCritical,
}

/// How strictly the task is bound to its ideal core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AffinityMode {
    /// Prefer the ideal core but let the scheduler migrate the thread.
    /// On Unix this pins to the single ideal core (documented deviation:
    /// Unix has no ideal-processor concept).
    #[default]
    Soft,
    /// Restrict the thread to exactly the cores in the affinity mask.
    Hard,
    /// No affinity request; leave the thread where the scheduler put it.
    Undefined,
}

/// Scheduling attributes carried by a task.
///
/// Freely copyable; a worker reads a snapshot right before dispatching the
/// task body, so the last value written before dispatch wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionAttributes {
    priority: ThreadPriority,
    affinity_mode: AffinityMode,
    ideal_core: usize,
    affinity_mask: u64,
}

impl ExecutionAttributes {
    /// Creates attributes with all defaults: normal priority, soft affinity,
    /// ideal core 0, empty mask.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the priority class.
    #[must_use]
    pub fn priority(&self) -> ThreadPriority {
        self.priority
    }

    /// Returns the affinity mode.
    #[must_use]
    pub fn affinity_mode(&self) -> AffinityMode {
        self.affinity_mode
    }

    /// Returns the ideal core index.
    #[must_use]
    pub fn ideal_core(&self) -> usize {
        self.ideal_core
    }

    /// Returns the affinity mask. Bit *i* set means core *i* is permitted.
    ///
    /// A mask of 0 under [`AffinityMode::Hard`] is treated as "no request",
    /// never as "no cores allowed".
    #[must_use]
    pub fn affinity_mask(&self) -> u64 {
        self.affinity_mask
    }

    /// Sets the priority class.
    pub fn set_priority(&mut self, priority: ThreadPriority) {
        self.priority = priority;
    }

    /// Sets the affinity mode.
    pub fn set_affinity_mode(&mut self, mode: AffinityMode) {
        self.affinity_mode = mode;
    }

    /// Sets the ideal core index. Call [`Self::build_affinity_mask`] afterwards
    /// to refresh the derived mask.
    pub fn set_ideal_core(&mut self, core: usize) {
        self.ideal_core = core;
    }

    /// Replaces the three primary fields in one step and rebuilds the mask.
    pub fn fill(&mut self, mode: AffinityMode, priority: ThreadPriority, core: usize) {
        self.affinity_mode = mode;
        self.priority = priority;
        self.ideal_core = core;
        self.build_affinity_mask();
    }

    /// Derives the affinity mask from the ideal core: `1 << ideal_core` when
    /// the core index addresses an existing logical CPU, otherwise 0.
    pub fn build_affinity_mask(&mut self) {
        self.affinity_mask = derive_mask(self.ideal_core, pal::logical_cpu_count());
    }
}

/// Mask derivation, separated from the OS probe so it can be tested against
/// arbitrary CPU counts.
fn derive_mask(ideal_core: usize, logical_cpus: usize) -> u64 {
    if ideal_core < logical_cpus && ideal_core < u64::BITS as usize {
        1u64 << ideal_core
    } else {
        0
    }
}
