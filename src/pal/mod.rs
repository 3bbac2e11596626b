//! Platform abstraction layer: applying scheduling attributes to the current
//! OS thread and probing basic hardware facts.
//!
//! The backend is compile-selected from the actual build target; the advisory
//! [`crate::PlatformId`] in the pool configuration plays no part in the
//! selection. All attribute application is best-effort: OS errors are logged
//! at trace level and swallowed, because a task that runs at the wrong
//! priority is better than a task that does not run.

use std::num::NonZeroUsize;

use crate::attrs::ExecutionAttributes;

#[cfg(unix)]
mod unix;
#[cfg(unix)]
use unix as sys;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
use windows as sys;

#[cfg(not(any(unix, windows)))]
mod fallback;
#[cfg(not(any(unix, windows)))]
use fallback as sys;

/// A coarse snapshot of system memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryStatus {
    /// Physical memory installed, in bytes.
    pub total_bytes: u64,
    /// Memory in use, as a percentage of `total_bytes`.
    pub load_percent: u32,
}

/// Applies `attrs` to the calling thread: affinity first (hard mask, or the
/// platform's rendering of a soft ideal-core preference), then priority,
/// always. Errors are swallowed.
pub fn apply_to_current_thread(attrs: &ExecutionAttributes) {
    sys::apply(attrs);
}

/// Number of logical CPUs, at least 1.
#[must_use]
pub fn logical_cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Current memory status, where the platform exposes one.
#[must_use]
pub fn memory_status() -> Option<MemoryStatus> {
    sys::memory_status()
}
