//! The dispatcher: a background thread that drains submission queues onto
//! idle workers and recycles purging workers.
//!
//! Each sweep runs under the pool mutex and processes, in order: missed
//! object tasks, fresh object tasks, missed callback tasks, fresh callback
//! tasks. A missed-queue item that cannot be placed stops that queue's pass
//! (order must not invert); a fresh-queue item that cannot be placed is
//! displaced to the back of its missed queue, where it precedes everything
//! submitted later. The sweep ends by promoting purging workers back to
//! idle. Sweeps run every `dispatch_interval` (10 ms by default) or sooner
//! when a submission signals the dispatcher.

use std::io;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::pool::{PoolInner, PoolState};
use crate::worker::{Worker, WorkerShared, WorkerStatus};

/// Wakeup channel between submitters and the dispatcher thread. The pending
/// flag absorbs notifications that arrive between sweeps.
pub(crate) struct DispatchSignal {
    pending: Mutex<bool>,
    condvar: Condvar,
}

impl DispatchSignal {
    pub(crate) fn new() -> Self {
        Self {
            pending: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    pub(crate) fn notify(&self) {
        *self.pending.lock() = true;
        self.condvar.notify_one();
    }

    fn wait(&self, timeout: Duration) {
        let mut pending = self.pending.lock();
        if !*pending {
            let _ = self.condvar.wait_for(&mut pending, timeout);
        }
        *pending = false;
    }
}

/// The dispatcher thread handle, owned by the pool.
pub(crate) struct Dispatcher {
    join: Option<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawns the dispatcher thread.
    pub(crate) fn spawn(inner: Arc<PoolInner>, name_prefix: &str) -> io::Result<Self> {
        let join = thread::Builder::new()
            .name(format!("{name_prefix}-dispatcher"))
            .spawn(move || run(&inner))?;
        Ok(Self { join: Some(join) })
    }

    /// Wakes the dispatcher so it observes the shutdown flag, then joins it.
    /// Idempotent.
    pub(crate) fn stop(&mut self, inner: &PoolInner) {
        inner.signal.notify();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

fn run(inner: &PoolInner) {
    debug!("dispatcher running");
    while !inner.shutdown.load(Ordering::Acquire) {
        sweep(&mut inner.state.lock());
        inner.signal.wait(inner.config.dispatch_interval);
    }
    debug!("dispatcher exiting");
}

/// One dispatch pass: drain queues onto idle workers, then recycle purging
/// workers. Runs with the pool state locked.
///
/// While submissions are locked the system is draining: queued tasks stay
/// queued and no new task starts, but finished workers are still recycled so
/// the drain can be observed to settle.
fn sweep(state: &mut PoolState) {
    let PoolState {
        queues,
        workers,
        submissions_locked,
    } = state;

    if *submissions_locked {
        for worker in workers.iter() {
            if worker.shared.status() == WorkerStatus::Purging {
                worker.shared.set_status(WorkerStatus::Idle);
            }
        }
        return;
    }

    // Missed object tasks: oldest work in the system goes first. Stop the
    // pass as soon as a claim fails so queue order is never inverted.
    while !queues.missed_objects.is_empty() {
        let Some(worker) = claim_idle_worker(workers) else {
            break;
        };
        if let Some(handle) = queues.missed_objects.pop_front() {
            trace!(object_id = handle.object_id(), "dispatching missed object task");
            worker.publish_object(handle);
        }
    }

    // Fresh object tasks: place what fits, displace the rest to the missed
    // queue's back (everything already missed is older, so order holds).
    while let Some(handle) = queues.fresh_objects.pop_front() {
        match claim_idle_worker(workers) {
            Some(worker) => {
                trace!(object_id = handle.object_id(), "dispatching object task");
                worker.publish_object(handle);
            }
            None => queues.missed_objects.push_back(handle),
        }
    }

    // Callback tasks, same discipline.
    while !queues.missed_callbacks.is_empty() {
        let Some(worker) = claim_idle_worker(workers) else {
            break;
        };
        if let Some(task) = queues.missed_callbacks.pop_front() {
            trace!("dispatching missed callback task");
            worker.publish_callback(task);
        }
    }

    while let Some(task) = queues.fresh_callbacks.pop_front() {
        match claim_idle_worker(workers) {
            Some(worker) => {
                trace!("dispatching callback task");
                worker.publish_callback(task);
            }
            None => queues.missed_callbacks.push_back(task),
        }
    }

    // Recycle workers that finished since the last sweep.
    for worker in workers.iter() {
        if worker.shared.status() == WorkerStatus::Purging {
            worker.shared.set_status(WorkerStatus::Idle);
        }
    }
}

/// Linear scan for the first idle, non-stopped worker. Publishing flips the
/// worker to executing, so a sweep never claims the same worker twice.
fn claim_idle_worker(workers: &[Worker]) -> Option<Arc<WorkerShared>> {
    workers
        .iter()
        .find(|worker| worker.shared.claimable())
        .map(|worker| Arc::clone(&worker.shared))
}
