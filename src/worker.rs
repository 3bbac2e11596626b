//! Worker threads: one long-lived OS thread per worker, with a status atom,
//! a parking primitive, single-slot mailboxes, and a cooperative stop flag.
//!
//! The handoff protocol is: the dispatcher fills a mailbox slot, marks the
//! worker executing, clears the suspension flag, and notifies the condvar —
//! all with the park mutex held, so a worker that was about to park re-checks
//! and finds the work instead of sleeping through the wakeup. The worker
//! applies the task's scheduling attributes to its own thread, runs the task
//! body (panics contained), and transitions to purging before parking again.
//! Purging workers are recycled to idle by the dispatcher's sweep.
//!
//! Pausing is cooperative at task boundaries: a pause request suspends the
//! worker at the end of the in-flight task, *before* the purge transition, so
//! an observer still sees which object the worker is holding while paused.

use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace, warn};

use crate::pal;
use crate::task::{same_object, CallbackTask, ObjectHandle};

/// Observable worker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WorkerStatus {
    /// Not executing; ready for an assignment.
    Idle = 0,
    /// Running a task, or about to (the assignment is published).
    Executing = 1,
    /// Task finished; waiting for the dispatcher to recycle the worker.
    Purging = 2,
    /// Suspended by a pause request.
    Pausing = 3,
}

impl WorkerStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Idle,
            1 => Self::Executing,
            2 => Self::Purging,
            _ => Self::Pausing,
        }
    }
}

/// Mailbox slots, guarded by the park mutex so publication and the park
/// predicate are serialized.
#[derive(Default)]
struct Mailboxes {
    next_callback: Option<CallbackTask>,
    next_object: Option<ObjectHandle>,
}

impl Mailboxes {
    fn is_empty(&self) -> bool {
        self.next_callback.is_none() && self.next_object.is_none()
    }
}

/// State shared between a worker thread and the pool.
pub(crate) struct WorkerShared {
    index: usize,
    status: AtomicU8,
    /// Park condition. True means "stay parked until notified".
    suspended: AtomicBool,
    /// True while a task body is running (status may read `Pausing` then).
    busy: AtomicBool,
    /// Cooperative stop; checked at every boundary.
    stop: AtomicBool,
    park: Mutex<Mailboxes>,
    unparked: Condvar,
    /// The object task currently resident on this worker, for per-object
    /// lookup. Never locked while the park mutex is held, and vice versa.
    current_object: Mutex<Option<ObjectHandle>>,
}

impl WorkerShared {
    fn new(index: usize) -> Self {
        Self {
            index,
            status: AtomicU8::new(WorkerStatus::Idle as u8),
            suspended: AtomicBool::new(true),
            busy: AtomicBool::new(false),
            stop: AtomicBool::new(false),
            park: Mutex::new(Mailboxes::default()),
            unparked: Condvar::new(),
            current_object: Mutex::new(None),
        }
    }

    pub(crate) fn status(&self) -> WorkerStatus {
        WorkerStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub(crate) fn set_status(&self, status: WorkerStatus) {
        self.status.store(status as u8, Ordering::Release);
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// True if the dispatcher may publish an assignment here.
    pub(crate) fn claimable(&self) -> bool {
        self.status() == WorkerStatus::Idle && !self.is_stopped()
    }

    /// True if this worker currently holds `handle`.
    pub(crate) fn holds_object(&self, handle: &ObjectHandle) -> bool {
        self.current_object
            .lock()
            .as_ref()
            .is_some_and(|held| same_object(held, handle))
    }

    /// Publishes a callback assignment and unparks the worker.
    pub(crate) fn publish_callback(&self, task: CallbackTask) {
        let mut slots = self.park.lock();
        slots.next_callback = Some(task);
        self.set_status(WorkerStatus::Executing);
        self.suspended.store(false, Ordering::Release);
        self.unparked.notify_one();
    }

    /// Publishes an object assignment and unparks the worker. The handle is
    /// recorded as current immediately so per-object lookup sees it from the
    /// moment the worker counts as executing.
    pub(crate) fn publish_object(&self, handle: ObjectHandle) {
        *self.current_object.lock() = Some(Arc::clone(&handle));
        let mut slots = self.park.lock();
        slots.next_object = Some(handle);
        self.set_status(WorkerStatus::Executing);
        self.suspended.store(false, Ordering::Release);
        self.unparked.notify_one();
    }

    /// Requests a pause. Takes effect at the worker's next task boundary.
    pub(crate) fn pause(&self) {
        self.set_status(WorkerStatus::Pausing);
        self.suspended.store(true, Ordering::Release);
    }

    /// Clears a pause. Status returns to the prior running state.
    pub(crate) fn resume(&self) {
        if self.busy.load(Ordering::Acquire) {
            self.set_status(WorkerStatus::Executing);
        } else {
            self.set_status(WorkerStatus::Idle);
        }
        let _slots = self.park.lock();
        self.suspended.store(false, Ordering::Release);
        self.unparked.notify_one();
    }

    /// Requests cooperative stop and wakes the worker so it can exit. A task
    /// already running completes first.
    pub(crate) fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
        let _slots = self.park.lock();
        self.unparked.notify_one();
    }

    /// Parks at a task boundary while a pause is in effect.
    fn pause_checkpoint(&self) {
        if !self.suspended.load(Ordering::Acquire) || self.is_stopped() {
            return;
        }
        debug!(worker = self.index, "paused at task boundary");
        let mut slots = self.park.lock();
        while self.suspended.load(Ordering::Acquire) && !self.is_stopped() {
            self.unparked.wait(&mut slots);
        }
    }
}

/// Worker main loop. Runs until the stop flag is observed at a boundary.
fn run(shared: &WorkerShared) {
    loop {
        if shared.is_stopped() {
            break;
        }

        let (object, callback) = {
            let mut slots = shared.park.lock();
            (slots.next_object.take(), slots.next_callback.take())
        };

        if let Some(handle) = object {
            shared.busy.store(true, Ordering::Release);
            // Attributes are read immediately before execute, so the latest
            // value the client wrote wins.
            pal::apply_to_current_thread(&handle.attributes());
            trace!(
                worker = shared.index,
                object_id = handle.object_id(),
                "executing object task"
            );
            if catch_unwind(AssertUnwindSafe(|| handle.execute())).is_err() {
                warn!(
                    worker = shared.index,
                    object_id = handle.object_id(),
                    "object task panicked; worker continues"
                );
            }
            shared.pause_checkpoint();
            shared.busy.store(false, Ordering::Release);
            shared.set_status(WorkerStatus::Purging);
            *shared.current_object.lock() = None;
        } else if let Some(task) = callback {
            shared.busy.store(true, Ordering::Release);
            trace!(worker = shared.index, "executing callback task");
            if catch_unwind(AssertUnwindSafe(|| task.run())).is_err() {
                warn!(worker = shared.index, "callback task panicked; worker continues");
            }
            shared.pause_checkpoint();
            shared.busy.store(false, Ordering::Release);
            shared.set_status(WorkerStatus::Purging);
        }

        // Park until the next assignment, a resume, or stop. Skipped when an
        // assignment raced in before we took the lock.
        let mut slots = shared.park.lock();
        if slots.is_empty() && !shared.is_stopped() {
            shared.suspended.store(true, Ordering::Release);
            while shared.suspended.load(Ordering::Acquire) && !shared.is_stopped() {
                shared.unparked.wait(&mut slots);
            }
        }
    }

    // Terminal: report idle so pool-wide counters settle. The claim scan
    // skips stopped workers, so nothing is published here again.
    shared.busy.store(false, Ordering::Release);
    shared.set_status(WorkerStatus::Idle);
    debug!(worker = shared.index, "worker thread exiting");
}

/// A worker owned by the pool: the shared state plus the join handle.
pub(crate) struct Worker {
    pub(crate) shared: Arc<WorkerShared>,
    join: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawns a worker thread, parked and idle.
    pub(crate) fn spawn(
        index: usize,
        name_prefix: &str,
        stack_size: Option<usize>,
    ) -> io::Result<Self> {
        let shared = Arc::new(WorkerShared::new(index));
        let mut builder = thread::Builder::new().name(format!("{name_prefix}-worker-{index}"));
        if let Some(bytes) = stack_size {
            builder = builder.stack_size(bytes);
        }
        let thread_shared = Arc::clone(&shared);
        let join = builder.spawn(move || run(&thread_shared))?;
        Ok(Self {
            shared,
            join: Some(join),
        })
    }

    /// Stops the worker cooperatively and joins its thread. Idempotent.
    pub(crate) fn terminate(&mut self) {
        self.shared.request_stop();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.terminate();
    }
}
