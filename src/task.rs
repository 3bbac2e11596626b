//! Task representations: one-shot callback tasks and client-owned object
//! tasks.
//!
//! A callback task is a boxed closure consumed exactly once by the worker
//! that runs it. Payload ownership moves into the closure, so whatever the
//! closure captures is released when it returns.
//!
//! An object task is any type implementing [`TaskObject`], submitted as an
//! [`ObjectHandle`] (`Arc<dyn TaskObject>`). The pool clones the handle for
//! the duration of the task's residence and never takes ownership of the
//! underlying entity. Identity is the allocation address of the handle, so
//! two clones of the same `Arc` name the same task and two distinct
//! allocations never collide, whatever their `object_id` values say.

use std::fmt;
use std::sync::Arc;

use crate::attrs::ExecutionAttributes;

/// A one-shot callback task.
pub struct CallbackTask {
    work: Box<dyn FnOnce() + Send + 'static>,
}

impl CallbackTask {
    /// Wraps a closure as a callback task.
    pub fn new(work: impl FnOnce() + Send + 'static) -> Self {
        Self {
            work: Box::new(work),
        }
    }

    /// Consumes the task and runs its closure.
    pub(crate) fn run(self) {
        (self.work)();
    }
}

impl fmt::Debug for CallbackTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackTask").finish_non_exhaustive()
    }
}

/// A client-owned entity the pool can execute.
///
/// Implementors that want per-run scheduling attributes keep an
/// [`ExecutionAttributes`] value in their own interior-mutable state and
/// return the current snapshot from [`TaskObject::attributes`]; the worker
/// reads that snapshot immediately before calling
/// [`TaskObject::execute`], so the last value written before dispatch wins.
pub trait TaskObject: Send + Sync {
    /// The work to run.
    fn execute(&self);

    /// Client-assigned identifier, unique per client domain. The pool never
    /// enforces uniqueness; task identity is handle address, not this value.
    fn object_id(&self) -> u32 {
        0
    }

    /// Scheduling attributes snapshot, read right before `execute`.
    fn attributes(&self) -> ExecutionAttributes {
        ExecutionAttributes::default()
    }
}

/// Shared handle to an object task.
pub type ObjectHandle = Arc<dyn TaskObject>;

/// Identity comparison by handle address (metadata ignored, so a handle
/// compares equal to itself even across unsize coercions).
pub(crate) fn same_object(a: &ObjectHandle, b: &ObjectHandle) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
