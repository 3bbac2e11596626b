//! Fallback backend for targets with neither Unix nor Windows thread APIs.
//! Attribute application is a no-op; the contract is best-effort anyway.

use tracing::trace;

use crate::attrs::ExecutionAttributes;
use crate::pal::MemoryStatus;

pub(super) fn apply(attrs: &ExecutionAttributes) {
    trace!(?attrs, "no platform binding on this target, ignoring attributes");
}

pub(super) fn memory_status() -> Option<MemoryStatus> {
    None
}
