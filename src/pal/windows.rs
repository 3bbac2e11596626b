//! Windows backend: `SetThreadAffinityMask` for hard masks,
//! `SetThreadIdealProcessor` for soft preferences, `SetThreadPriority` for
//! the priority class.
#![allow(unsafe_code)]

use tracing::trace;

use windows::Win32::System::SystemInformation::{GlobalMemoryStatusEx, MEMORYSTATUSEX};
use windows::Win32::System::Threading::{
    GetCurrentThread, SetThreadAffinityMask, SetThreadIdealProcessor, SetThreadPriority,
    THREAD_PRIORITY_ABOVE_NORMAL, THREAD_PRIORITY_BELOW_NORMAL, THREAD_PRIORITY_HIGHEST,
    THREAD_PRIORITY_NORMAL, THREAD_PRIORITY_TIME_CRITICAL,
};

use crate::attrs::{AffinityMode, ExecutionAttributes, ThreadPriority};
use crate::pal::MemoryStatus;

pub(super) fn apply(attrs: &ExecutionAttributes) {
    // SAFETY: GetCurrentThread returns a pseudo-handle that is always valid
    // for the calling thread and needs no close.
    unsafe {
        let handle = GetCurrentThread();

        match attrs.affinity_mode() {
            AffinityMode::Hard => {
                let mask = attrs.affinity_mask();
                // An empty mask under hard mode is "no request", never "no cores".
                if mask != 0 && SetThreadAffinityMask(handle, mask as usize) == 0 {
                    trace!(mask, "SetThreadAffinityMask failed, ignoring");
                }
            }
            AffinityMode::Soft => {
                let core = attrs.ideal_core();
                if core < super::logical_cpu_count()
                    && SetThreadIdealProcessor(handle, core as u32) == u32::MAX
                {
                    trace!(core, "SetThreadIdealProcessor failed, ignoring");
                }
            }
            AffinityMode::Undefined => {}
        }

        let class = match attrs.priority() {
            ThreadPriority::Low => THREAD_PRIORITY_BELOW_NORMAL,
            ThreadPriority::Normal => THREAD_PRIORITY_NORMAL,
            ThreadPriority::High => THREAD_PRIORITY_ABOVE_NORMAL,
            ThreadPriority::Critical => THREAD_PRIORITY_HIGHEST,
            ThreadPriority::TimeCritical => THREAD_PRIORITY_TIME_CRITICAL,
        };
        if let Err(err) = SetThreadPriority(handle, class) {
            trace!(priority = ?attrs.priority(), %err, "SetThreadPriority failed, ignoring");
        }
    }
}

pub(super) fn memory_status() -> Option<MemoryStatus> {
    let mut status = MEMORYSTATUSEX {
        dwLength: std::mem::size_of::<MEMORYSTATUSEX>() as u32,
        ..Default::default()
    };
    // SAFETY: the buffer is valid and dwLength is set as the API requires.
    unsafe { GlobalMemoryStatusEx(&mut status) }.ok()?;
    Some(MemoryStatus {
        total_bytes: status.ullTotalPhys,
        load_percent: status.dwMemoryLoad,
    })
}
