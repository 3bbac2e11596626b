//! A coarse description of the host system: logical processor count and
//! memory facts. Probed once at construction; call
//! [`SystemDescription::refresh`] to re-sample.

use crate::pal::{self, MemoryStatus};

/// Snapshot of the host's processors and memory.
#[derive(Debug, Clone, Copy)]
pub struct SystemDescription {
    logical_processors: usize,
    memory: Option<MemoryStatus>,
}

impl SystemDescription {
    /// Probes the system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            logical_processors: pal::logical_cpu_count(),
            memory: pal::memory_status(),
        }
    }

    /// Re-samples the memory figures (the processor count is stable for the
    /// lifetime of the process on the platforms this crate targets).
    pub fn refresh(&mut self) {
        self.memory = pal::memory_status();
    }

    /// Number of logical processors, at least 1.
    #[must_use]
    pub fn logical_processors(&self) -> usize {
        self.logical_processors
    }

    /// Physical memory in bytes; 0 where the platform reports none.
    #[must_use]
    pub fn physical_memory_bytes(&self) -> u64 {
        self.memory.map_or(0, |memory| memory.total_bytes)
    }

    /// Memory in use as a percentage; 0 where the platform reports none.
    #[must_use]
    pub fn memory_load_percent(&self) -> u32 {
        self.memory.map_or(0, |memory| memory.load_percent)
    }

    /// True if physical memory exceeds `megabytes`.
    #[must_use]
    pub fn memory_exceeds(&self, megabytes: u64) -> bool {
        self.physical_memory_bytes() / (1024 * 1024) > megabytes
    }
}

impl Default for SystemDescription {
    fn default() -> Self {
        Self::new()
    }
}
