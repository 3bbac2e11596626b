//! Threadmill: a cross-platform worker-pool runtime with per-task scheduling
//! attributes.
//!
//! # Overview
//!
//! A pool is a fixed-size set of long-lived OS threads. Clients submit either
//! a *callback task* (a one-shot closure) or an *object task* (a shared
//! handle implementing [`TaskObject`], carrying its own execute method and
//! scheduling attributes). A background dispatcher drains the submission
//! queues onto idle workers every few milliseconds; tasks that could not be
//! placed wait in a secondary "missed" queue that is always served before
//! newer work, so dispatch order is submission order.
//!
//! Each object task carries [`ExecutionAttributes`] — a priority class, an
//! affinity mode, and an ideal core — which the worker applies to its own OS
//! thread immediately before running the task. Attribute application is
//! best-effort: a task that runs at the wrong priority beats a task that
//! does not run.
//!
//! # Core guarantees
//!
//! - **FIFO per queue**: tasks of one kind dispatch in submission order.
//! - **Exactly once**: each accepted submission executes exactly once.
//! - **Containment**: a panicking task body never takes down its worker or
//!   the pool.
//! - **Total control plane**: no pool method panics; failures are the typed
//!   values in [`error`].
//! - **Cooperative lifecycle**: pause, resume, and terminate act at task
//!   boundaries; a running task body is never preempted.
//!
//! # Module structure
//!
//! - [`attrs`]: priority, affinity mode, and the derived affinity mask
//! - [`task`]: callback tasks and the [`TaskObject`] trait
//! - [`pool`]: the pool facade
//! - [`config`]: pool configuration
//! - [`error`]: error types
//! - [`pal`]: platform binding (affinity, priority, CPU and memory probes)
//! - [`system`]: host system description
//! - [`foundation`]: single-pool convenience facade and process-wide sugar
//!
//! # Example
//!
//! ```
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use threadmill::{
//!     AffinityMode, ExecutionAttributes, Pool, PoolConfig, TaskObject, ThreadPriority,
//! };
//!
//! struct Render {
//!     done: AtomicBool,
//! }
//!
//! impl TaskObject for Render {
//!     fn execute(&self) {
//!         self.done.store(true, Ordering::Release);
//!     }
//!
//!     fn attributes(&self) -> ExecutionAttributes {
//!         let mut attrs = ExecutionAttributes::new();
//!         attrs.fill(AffinityMode::Soft, ThreadPriority::High, 0);
//!         attrs
//!     }
//! }
//!
//! let pool = Pool::create(PoolConfig::new().max_threads(2)).unwrap();
//! let render = Arc::new(Render {
//!     done: AtomicBool::new(false),
//! });
//! let handle: threadmill::ObjectHandle = render.clone();
//! pool.submit_object(Arc::clone(&handle)).unwrap();
//! pool.wait_for_object(&handle, Some(Duration::from_secs(5)));
//! assert!(render.done.load(Ordering::Acquire));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod attrs;
pub mod config;
mod dispatcher;
pub mod error;
pub mod foundation;
pub mod pal;
pub mod pool;
mod queue;
pub mod system;
pub mod task;
mod worker;

pub use attrs::{AffinityMode, ExecutionAttributes, ThreadPriority};
pub use config::{PlatformId, PoolConfig};
pub use error::{SpawnError, SubmitError, WaitOutcome};
pub use foundation::Foundation;
pub use pool::Pool;
pub use system::SystemDescription;
pub use task::{CallbackTask, ObjectHandle, TaskObject};
pub use worker::WorkerStatus;
