//! Unix backend: `sched_setaffinity` for hard masks, single-core pinning for
//! soft preferences (Unix has no ideal-processor concept), and
//! `pthread_setschedparam` for priority with a `nice` fallback where
//! `SCHED_OTHER` admits only one static priority.
#![allow(unsafe_code)]

use std::mem;

use tracing::trace;

use crate::attrs::{AffinityMode, ExecutionAttributes, ThreadPriority};
use crate::pal::MemoryStatus;

pub(super) fn apply(attrs: &ExecutionAttributes) {
    match attrs.affinity_mode() {
        AffinityMode::Hard => {
            let mask = attrs.affinity_mask();
            // An empty mask under hard mode is "no request", never "no cores".
            if mask != 0 {
                set_affinity_mask(mask);
            }
        }
        AffinityMode::Soft => {
            let core = attrs.ideal_core();
            if core < super::logical_cpu_count() && core < u64::BITS as usize {
                set_affinity_mask(1u64 << core);
            }
        }
        AffinityMode::Undefined => {}
    }
    set_priority(attrs.priority());
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn set_affinity_mask(mask: u64) {
    // SAFETY: all-zeroes is a valid cpu_set_t; 0 targets the calling thread.
    let rc = unsafe {
        let mut cpuset: libc::cpu_set_t = mem::zeroed();
        libc::CPU_ZERO(&mut cpuset);
        for core in 0..u64::BITS as usize {
            if mask & (1u64 << core) != 0 {
                libc::CPU_SET(core, &mut cpuset);
            }
        }
        libc::sched_setaffinity(0, mem::size_of::<libc::cpu_set_t>(), &cpuset)
    };
    if rc != 0 {
        trace!(mask, "sched_setaffinity failed, ignoring");
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn set_affinity_mask(mask: u64) {
    // No portable thread-affinity call on this Unix.
    trace!(mask, "thread affinity not supported on this platform");
}

fn set_priority(priority: ThreadPriority) {
    // SAFETY: plain queries, no preconditions.
    let (min, max) = unsafe {
        (
            libc::sched_get_priority_min(libc::SCHED_OTHER),
            libc::sched_get_priority_max(libc::SCHED_OTHER),
        )
    };

    if max > min {
        let wanted = match priority {
            ThreadPriority::Low => 0,
            ThreadPriority::Normal => 1,
            ThreadPriority::High => 5,
            ThreadPriority::Critical => 10,
            ThreadPriority::TimeCritical => 20,
        };
        // SAFETY: zeroed sched_param is valid; pthread_self is always live.
        let rc = unsafe {
            let mut param: libc::sched_param = mem::zeroed();
            param.sched_priority = wanted.clamp(min, max);
            libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_OTHER, &param)
        };
        if rc != 0 {
            trace!(?priority, rc, "pthread_setschedparam failed, ignoring");
        }
    } else {
        // SCHED_OTHER has a single static priority here (Linux); express the
        // same monotonic ordering through the nice value instead.
        let nice = match priority {
            ThreadPriority::Low => 5,
            ThreadPriority::Normal => 0,
            ThreadPriority::High => -2,
            ThreadPriority::Critical => -5,
            ThreadPriority::TimeCritical => -10,
        };
        // SAFETY: who == 0 targets the calling thread on Linux.
        let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS as _, 0, nice) };
        if rc != 0 {
            trace!(?priority, nice, "setpriority failed, ignoring");
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
pub(super) fn memory_status() -> Option<MemoryStatus> {
    // SAFETY: all-zeroes is a valid sysinfo buffer.
    let info = unsafe {
        let mut info: libc::sysinfo = mem::zeroed();
        if libc::sysinfo(&mut info) != 0 {
            return None;
        }
        info
    };
    let unit = if info.mem_unit == 0 {
        1
    } else {
        u64::from(info.mem_unit)
    };
    let total = info.totalram as u64 * unit;
    if total == 0 {
        return None;
    }
    let free = info.freeram as u64 * unit;
    Some(MemoryStatus {
        total_bytes: total,
        load_percent: ((total.saturating_sub(free)) * 100 / total) as u32,
    })
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub(super) fn memory_status() -> Option<MemoryStatus> {
    None
}
