//! The pool facade: creation, submission, queries, per-object and pool-wide
//! lifecycle control, and shutdown.
//!
//! The pool owns its workers and the dispatcher thread. Every control-plane
//! operation runs under the pool mutex, which serializes queue mutations,
//! worker-sequence access, the submission lock, and the scan-and-act
//! sequences of per-object operations. Worker status reads are atomic, so
//! the counters are eventually consistent snapshots — exact whenever the
//! caller holds no stale assumption across the call, which is all the
//! contract promises.
//!
//! # Example
//!
//! ```
//! use threadmill::{Pool, PoolConfig};
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//!
//! let pool = Pool::create(PoolConfig::new().max_threads(2)).unwrap();
//! let counter = Arc::new(AtomicU32::new(0));
//! let task_counter = Arc::clone(&counter);
//! pool.submit(move || {
//!     task_counter.fetch_add(1, Ordering::Relaxed);
//! })
//! .unwrap();
//!
//! // Shutdown drops queued-but-undispatched work, so drain first.
//! let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
//! while counter.load(Ordering::Relaxed) == 0 && std::time::Instant::now() < deadline {
//!     std::thread::yield_now();
//! }
//! pool.shutdown();
//! assert_eq!(counter.load(Ordering::Relaxed), 1);
//! ```

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::config::PoolConfig;
use crate::dispatcher::{DispatchSignal, Dispatcher};
use crate::error::{SpawnError, SubmitError, WaitOutcome};
use crate::queue::SubmissionQueues;
use crate::task::{CallbackTask, ObjectHandle};
use crate::worker::{Worker, WorkerStatus};

/// Mutable pool state, guarded by the pool mutex.
pub(crate) struct PoolState {
    pub(crate) queues: SubmissionQueues,
    pub(crate) workers: Vec<Worker>,
    pub(crate) submissions_locked: bool,
}

/// State shared with the dispatcher thread.
pub(crate) struct PoolInner {
    pub(crate) config: PoolConfig,
    pub(crate) state: Mutex<PoolState>,
    /// Paired with `state` by `wait_for_object`'s polling loop.
    pub(crate) completion: Condvar,
    pub(crate) signal: DispatchSignal,
    pub(crate) shutdown: AtomicBool,
}

/// A fixed-size pool of long-lived worker threads.
///
/// Dropping the pool shuts it down: the dispatcher stops, every worker is
/// cooperatively terminated and joined, and the queues are cleared.
pub struct Pool {
    inner: Arc<PoolInner>,
    dispatcher: Mutex<Option<Dispatcher>>,
}

impl Pool {
    /// Creates a pool per `config`: spawns the workers (parked and idle) and
    /// the dispatcher thread.
    ///
    /// Creation succeeds if at least one worker thread could be spawned; the
    /// realized count is reported by [`Pool::max_workers`]. If no worker or
    /// no dispatcher could be spawned, everything partially created is torn
    /// down before the error returns.
    pub fn create(config: PoolConfig) -> Result<Self, SpawnError> {
        let mut workers = Vec::with_capacity(config.max_threads);
        let mut spawn_failure: Option<io::Error> = None;
        for index in 0..config.max_threads {
            match Worker::spawn(index, &config.thread_name_prefix, config.worker_stack_size) {
                Ok(worker) => workers.push(worker),
                Err(err) => {
                    warn!(index, %err, "worker thread failed to spawn");
                    spawn_failure = Some(err);
                }
            }
        }
        if workers.is_empty() {
            // Nothing to tear down: no worker exists.
            return Err(SpawnError::NoWorkers(spawn_failure.unwrap_or_else(|| {
                io::Error::other("pool configured with zero worker threads")
            })));
        }
        debug!(
            workers = workers.len(),
            requested = config.max_threads,
            "pool created"
        );

        let max_tasks = config.max_tasks;
        let inner = Arc::new(PoolInner {
            config,
            state: Mutex::new(PoolState {
                queues: SubmissionQueues::new(max_tasks),
                workers,
                submissions_locked: false,
            }),
            completion: Condvar::new(),
            signal: DispatchSignal::new(),
            shutdown: AtomicBool::new(false),
        });

        let dispatcher =
            match Dispatcher::spawn(Arc::clone(&inner), &inner.config.thread_name_prefix) {
                Ok(dispatcher) => dispatcher,
                Err(err) => {
                    // Tear the workers down; a pool with no dispatcher
                    // would accept tasks and never run them.
                    for worker in inner.state.lock().workers.iter_mut() {
                        worker.terminate();
                    }
                    return Err(SpawnError::NoDispatcher(err));
                }
            };

        Ok(Self {
            inner,
            dispatcher: Mutex::new(Some(dispatcher)),
        })
    }

    // === Submission ===

    /// Submits a closure as a callback task.
    pub fn submit(&self, work: impl FnOnce() + Send + 'static) -> Result<(), SubmitError> {
        self.submit_callback(CallbackTask::new(work))
    }

    /// Submits a callback task.
    pub fn submit_callback(&self, task: CallbackTask) -> Result<(), SubmitError> {
        if self.inner.shutdown.load(Ordering::Acquire) {
            return Err(SubmitError::ShuttingDown);
        }
        {
            let mut state = self.inner.state.lock();
            if state.submissions_locked {
                return Err(SubmitError::SubmissionsLocked);
            }
            state.queues.enqueue_callback(task)?;
        }
        self.inner.signal.notify();
        Ok(())
    }

    /// Submits an object task. The pool holds a clone of the handle from now
    /// until the task's `execute` completes.
    pub fn submit_object(&self, handle: ObjectHandle) -> Result<(), SubmitError> {
        if self.inner.shutdown.load(Ordering::Acquire) {
            return Err(SubmitError::ShuttingDown);
        }
        {
            let mut state = self.inner.state.lock();
            if state.submissions_locked {
                return Err(SubmitError::SubmissionsLocked);
            }
            state.queues.enqueue_object(handle)?;
        }
        self.inner.signal.notify();
        Ok(())
    }

    // === Queries ===

    /// Number of object tasks waiting in the fresh queue.
    #[must_use]
    pub fn object_task_count(&self) -> usize {
        self.inner.state.lock().queues.fresh_object_count()
    }

    /// Number of object tasks waiting in the missed queue.
    #[must_use]
    pub fn missed_object_task_count(&self) -> usize {
        self.inner.state.lock().queues.missed_object_count()
    }

    /// Number of workers available for an assignment (idle or purging).
    #[must_use]
    pub fn available_workers(&self) -> usize {
        let state = self.inner.state.lock();
        state
            .workers
            .iter()
            .filter(|worker| {
                matches!(
                    worker.shared.status(),
                    WorkerStatus::Idle | WorkerStatus::Purging
                )
            })
            .count()
    }

    /// Number of workers the pool realized at creation (0 after shutdown).
    #[must_use]
    pub fn max_workers(&self) -> usize {
        self.inner.state.lock().workers.len()
    }

    /// Number of workers in exactly the given status.
    #[must_use]
    pub fn status_count(&self, status: WorkerStatus) -> usize {
        let state = self.inner.state.lock();
        state
            .workers
            .iter()
            .filter(|worker| worker.shared.status() == status)
            .count()
    }

    /// True while some worker is actually executing (paused and recycling
    /// workers do not count as working).
    #[must_use]
    pub fn any_working(&self) -> bool {
        let state = self.inner.state.lock();
        let mut available = 0;
        let mut pausing = 0;
        for worker in &state.workers {
            match worker.shared.status() {
                WorkerStatus::Idle | WorkerStatus::Purging => available += 1,
                WorkerStatus::Pausing => pausing += 1,
                WorkerStatus::Executing => {}
            }
        }
        state.workers.len() != available + pausing
    }

    /// True when all four submission queues are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().queues.is_empty()
    }

    // === Per-object control ===

    /// Status of the worker currently holding `handle`, or `None` when no
    /// worker holds it (queued-but-undispatched tasks report `None` too).
    #[must_use]
    pub fn object_status(&self, handle: &ObjectHandle) -> Option<WorkerStatus> {
        let state = self.inner.state.lock();
        state
            .workers
            .iter()
            .find(|worker| worker.shared.holds_object(handle))
            .map(|worker| worker.shared.status())
    }

    /// Pauses the worker holding `handle` at its next task boundary. No-op
    /// when no worker holds it.
    pub fn pause_object(&self, handle: &ObjectHandle) {
        let state = self.inner.state.lock();
        if let Some(worker) = state
            .workers
            .iter()
            .find(|worker| worker.shared.holds_object(handle))
        {
            worker.shared.pause();
        }
    }

    /// Resumes the worker holding `handle`. No-op when no worker holds it.
    pub fn resume_object(&self, handle: &ObjectHandle) {
        let state = self.inner.state.lock();
        if let Some(worker) = state
            .workers
            .iter()
            .find(|worker| worker.shared.holds_object(handle))
        {
            worker.shared.resume();
        }
    }

    /// Cooperatively terminates the worker holding `handle`: the in-flight
    /// task completes, then the worker thread exits and is joined. No-op
    /// when no worker holds it.
    pub fn terminate_object(&self, handle: &ObjectHandle) {
        let mut state = self.inner.state.lock();
        if let Some(worker) = state
            .workers
            .iter_mut()
            .find(|worker| worker.shared.holds_object(handle))
        {
            worker.terminate();
        }
    }

    /// Waits until `handle` is neither queued nor held by a worker, polling
    /// at the configured wait-poll granularity (100 ms by default). `None`
    /// waits forever.
    ///
    /// Returns [`WaitOutcome::Completed`] immediately for a handle the pool
    /// has never seen — a non-fatal miss, since the task may simply have
    /// completed before the wait began.
    pub fn wait_for_object(&self, handle: &ObjectHandle, timeout: Option<Duration>) -> WaitOutcome {
        let poll = self.inner.config.wait_poll_interval;
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut state = self.inner.state.lock();
        loop {
            let resident = state.queues.contains_object(handle)
                || state
                    .workers
                    .iter()
                    .any(|worker| worker.shared.holds_object(handle));
            if !resident {
                return WaitOutcome::Completed;
            }
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return WaitOutcome::TimedOut;
                    }
                    (deadline - now).min(poll)
                }
                None => poll,
            };
            let _ = self.inner.completion.wait_for(&mut state, slice);
        }
    }

    // === Pool-wide control ===

    /// Locks submissions and pauses every non-idle worker at its next task
    /// boundary, draining the system. Submissions stay locked until
    /// [`Pool::unlock_submissions`].
    pub fn suspend_all(&self) {
        let mut state = self.inner.state.lock();
        state.submissions_locked = true;
        for worker in &state.workers {
            if worker.shared.status() != WorkerStatus::Idle {
                worker.shared.pause();
            }
        }
    }

    /// Same drain as [`Pool::suspend_all`]; kept as a distinct operation for
    /// callers that phrase the intent as pausing rather than suspending.
    pub fn pause_all(&self) {
        self.suspend_all();
    }

    /// Resumes every non-idle worker. Deliberately does *not* re-open
    /// submissions; call [`Pool::unlock_submissions`] for that.
    pub fn resume_all(&self) {
        let state = self.inner.state.lock();
        for worker in &state.workers {
            if worker.shared.status() != WorkerStatus::Idle {
                worker.shared.resume();
            }
        }
    }

    /// Re-opens submissions after a drain.
    pub fn unlock_submissions(&self) {
        self.inner.state.lock().submissions_locked = false;
    }

    /// Locks submissions and cooperatively terminates every non-idle worker:
    /// each finishes its in-flight task, exits, and is joined. Idle workers
    /// keep running and the pool remains usable for queued-but-undispatched
    /// work once submissions are unlocked.
    pub fn terminate_all(&self) {
        let mut state = self.inner.state.lock();
        state.submissions_locked = true;
        for worker in state.workers.iter_mut() {
            if worker.shared.status() != WorkerStatus::Idle {
                worker.terminate();
            }
        }
    }

    // === Shutdown ===

    /// Stops the dispatcher, terminates and joins every worker, and clears
    /// all queues. Idempotent; also invoked by `Drop`.
    pub fn shutdown(&self) {
        let first = !self.inner.shutdown.swap(true, Ordering::AcqRel);
        if first {
            debug!("pool shutting down");
        }

        // Stop the dispatcher before taking the pool mutex: its sweep takes
        // the same lock.
        if let Some(mut dispatcher) = self.dispatcher.lock().take() {
            dispatcher.stop(&self.inner);
        }

        let mut state = self.inner.state.lock();
        for worker in state.workers.iter_mut() {
            worker.terminate();
        }
        state.workers.clear();
        state.queues.clear();
        drop(state);

        // Release any wait_for_object callers promptly.
        self.inner.completion.notify_all();
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Pool")
            .field("workers", &state.workers.len())
            .field("queued_objects", &state.queues.fresh_object_count())
            .field("missed_objects", &state.queues.missed_object_count())
            .field("submissions_locked", &state.submissions_locked)
            .field("shutdown", &self.inner.shutdown.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskObject;
    use std::sync::atomic::AtomicU32;
    use std::thread;

    fn small_pool(threads: usize) -> Pool {
        Pool::create(
            PoolConfig::new()
                .max_threads(threads)
                .thread_name_prefix("pool-test"),
        )
        .unwrap()
    }

    struct Counting {
        hits: AtomicU32,
    }

    impl TaskObject for Counting {
        fn execute(&self) {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn zero_threads_is_a_creation_error() {
        let err = Pool::create(PoolConfig::new().max_threads(0)).unwrap_err();
        assert!(matches!(err, SpawnError::NoWorkers(_)));
    }

    #[test]
    fn counters_start_settled() {
        let pool = small_pool(3);
        assert_eq!(pool.max_workers(), 3);
        assert_eq!(pool.available_workers(), 3);
        assert_eq!(pool.status_count(WorkerStatus::Idle), 3);
        assert_eq!(pool.object_task_count(), 0);
        assert_eq!(pool.missed_object_task_count(), 0);
        assert!(pool.is_empty());
        assert!(!pool.any_working());
    }

    #[test]
    fn submit_after_shutdown_is_refused() {
        let pool = small_pool(1);
        pool.shutdown();
        assert!(matches!(
            pool.submit(|| {}),
            Err(SubmitError::ShuttingDown)
        ));
    }

    #[test]
    fn locked_submissions_are_refused_until_unlocked() {
        let pool = small_pool(1);
        pool.suspend_all();
        assert!(matches!(
            pool.submit(|| {}),
            Err(SubmitError::SubmissionsLocked)
        ));
        // resume_all alone does not re-open intake.
        pool.resume_all();
        assert!(matches!(
            pool.submit(|| {}),
            Err(SubmitError::SubmissionsLocked)
        ));
        pool.unlock_submissions();
        assert!(pool.submit(|| {}).is_ok());
    }

    #[test]
    fn object_lookup_misses_are_silent() {
        let pool = small_pool(1);
        let handle: ObjectHandle = Arc::new(Counting {
            hits: AtomicU32::new(0),
        });
        assert_eq!(pool.object_status(&handle), None);
        pool.pause_object(&handle);
        pool.resume_object(&handle);
        pool.terminate_object(&handle);
        assert_eq!(
            pool.wait_for_object(&handle, Some(Duration::from_millis(10))),
            WaitOutcome::Completed
        );
    }

    #[test]
    fn executes_object_task_end_to_end() {
        let pool = small_pool(2);
        let object = Arc::new(Counting {
            hits: AtomicU32::new(0),
        });
        let handle: ObjectHandle = object.clone();
        pool.submit_object(Arc::clone(&handle)).unwrap();
        // Residence may not have started yet; poll until the task has left
        // the queue, a worker, and the counter shows the run.
        let deadline = Instant::now() + Duration::from_secs(2);
        while object.hits.load(Ordering::Relaxed) == 0 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
        assert_eq!(object.hits.load(Ordering::Relaxed), 1);
        assert_eq!(
            pool.wait_for_object(&handle, Some(Duration::from_secs(2))),
            WaitOutcome::Completed
        );
        pool.shutdown();
    }

    #[test]
    fn shutdown_is_idempotent() {
        let pool = small_pool(2);
        pool.submit(|| {}).unwrap();
        pool.shutdown();
        pool.shutdown();
        assert_eq!(pool.max_workers(), 0);
        assert!(pool.is_empty());
        assert!(!pool.any_working());
    }
}
