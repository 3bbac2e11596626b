//! A thin convenience facade owning a single pool, plus optional
//! process-wide sugar.
//!
//! Every application-facing call forwards to the owned pool when one exists;
//! without a pool, queries return their neutral values and control calls are
//! no-ops, so a `Foundation` is always safe to call. Prefer owning a
//! [`Pool`] directly; reach for [`Foundation::global`] only when threading a
//! pool through the call graph is genuinely impractical.

use std::sync::OnceLock;
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::PoolConfig;
use crate::error::{SpawnError, SubmitError, WaitOutcome};
use crate::pool::Pool;
use crate::task::{CallbackTask, ObjectHandle};
use crate::worker::WorkerStatus;

/// Owns at most one [`Pool`] and forwards calls to it.
#[derive(Default)]
pub struct Foundation {
    pool: Mutex<Option<Pool>>,
}

static GLOBAL: OnceLock<Foundation> = OnceLock::new();

impl Foundation {
    /// Creates an empty foundation (no pool yet).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide foundation.
    #[must_use]
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(Self::new)
    }

    /// Creates the owned pool if none exists yet. A second call is a no-op
    /// that reports success.
    pub fn create_pool(&self, config: PoolConfig) -> Result<(), SpawnError> {
        let mut pool = self.pool.lock();
        if pool.is_none() {
            *pool = Some(Pool::create(config)?);
        }
        Ok(())
    }

    /// True once a pool has been created and not shut down via
    /// [`Foundation::shutdown`].
    #[must_use]
    pub fn has_pool(&self) -> bool {
        self.pool.lock().is_some()
    }

    /// Submits a closure. Fails with [`SubmitError::ShuttingDown`] when no
    /// pool exists.
    pub fn submit(&self, work: impl FnOnce() + Send + 'static) -> Result<(), SubmitError> {
        self.submit_callback(CallbackTask::new(work))
    }

    /// Submits a callback task.
    pub fn submit_callback(&self, task: CallbackTask) -> Result<(), SubmitError> {
        match &*self.pool.lock() {
            Some(pool) => pool.submit_callback(task),
            None => Err(SubmitError::ShuttingDown),
        }
    }

    /// Submits an object task.
    pub fn submit_object(&self, handle: ObjectHandle) -> Result<(), SubmitError> {
        match &*self.pool.lock() {
            Some(pool) => pool.submit_object(handle),
            None => Err(SubmitError::ShuttingDown),
        }
    }

    /// True while some worker is executing; false without a pool.
    #[must_use]
    pub fn any_working(&self) -> bool {
        self.pool.lock().as_ref().is_some_and(Pool::any_working)
    }

    /// True when the queues are empty; trivially true without a pool.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.lock().as_ref().map_or(true, Pool::is_empty)
    }

    /// Forwards [`Pool::suspend_all`]; no-op without a pool.
    pub fn suspend_all(&self) {
        if let Some(pool) = &*self.pool.lock() {
            pool.suspend_all();
        }
    }

    /// Forwards [`Pool::pause_all`]; no-op without a pool.
    pub fn pause_all(&self) {
        if let Some(pool) = &*self.pool.lock() {
            pool.pause_all();
        }
    }

    /// Forwards [`Pool::resume_all`]; no-op without a pool.
    pub fn resume_all(&self) {
        if let Some(pool) = &*self.pool.lock() {
            pool.resume_all();
        }
    }

    /// Forwards [`Pool::unlock_submissions`]; no-op without a pool.
    pub fn unlock_submissions(&self) {
        if let Some(pool) = &*self.pool.lock() {
            pool.unlock_submissions();
        }
    }

    /// Forwards [`Pool::terminate_all`]; no-op without a pool.
    pub fn terminate_all(&self) {
        if let Some(pool) = &*self.pool.lock() {
            pool.terminate_all();
        }
    }

    /// Forwards [`Pool::pause_object`]; no-op without a pool.
    pub fn pause_object(&self, handle: &ObjectHandle) {
        if let Some(pool) = &*self.pool.lock() {
            pool.pause_object(handle);
        }
    }

    /// Forwards [`Pool::resume_object`]; no-op without a pool.
    pub fn resume_object(&self, handle: &ObjectHandle) {
        if let Some(pool) = &*self.pool.lock() {
            pool.resume_object(handle);
        }
    }

    /// Forwards [`Pool::terminate_object`]; no-op without a pool.
    pub fn terminate_object(&self, handle: &ObjectHandle) {
        if let Some(pool) = &*self.pool.lock() {
            pool.terminate_object(handle);
        }
    }

    /// Forwards [`Pool::object_status`]; `None` without a pool.
    #[must_use]
    pub fn object_status(&self, handle: &ObjectHandle) -> Option<WorkerStatus> {
        self.pool
            .lock()
            .as_ref()
            .and_then(|pool| pool.object_status(handle))
    }

    /// Forwards [`Pool::wait_for_object`]; completes immediately without a
    /// pool.
    pub fn wait_for_object(&self, handle: &ObjectHandle, timeout: Option<Duration>) -> WaitOutcome {
        match &*self.pool.lock() {
            Some(pool) => pool.wait_for_object(handle, timeout),
            None => WaitOutcome::Completed,
        }
    }

    /// Shuts the owned pool down and releases it. Idempotent.
    pub fn shutdown(&self) {
        if let Some(pool) = self.pool.lock().take() {
            pool.shutdown();
        }
    }
}

impl Drop for Foundation {
    fn drop(&mut self) {
        self.shutdown();
    }
}
