//! Execution contexts for [`receive_on`](crate::publisher::PublisherExt::receive_on).
//!
//! A [`Scheduler`] runs boxed tasks somewhere: inline, on a thread pool, on
//! a tokio runtime, or, in tests, only when asked to.
//!
//! | Scheduler             | Runs tasks                          | Feature            |
//! |-----------------------|-------------------------------------|--------------------|
//! | `ImmediateScheduler`  | inline, on the calling thread       |                    |
//! | `ThreadPoolScheduler` | on a `futures` thread pool          | `futures-scheduler`|
//! | `TokioScheduler`      | on a tokio runtime                  | `tokio-scheduler`  |
//! | `TestScheduler`       | when `run`/`run_one` is called      |                    |

use thiserror::Error;

mod test_scheduler;
#[cfg(feature = "futures-scheduler")]
mod thread_pool;
#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;

pub use test_scheduler::TestScheduler;
#[cfg(feature = "futures-scheduler")]
pub use thread_pool::{ThreadPoolScheduler, ThreadPoolSchedulerBuilder};
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// A unit of work handed to a scheduler.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

pub trait Scheduler: Clone + Send + Sync + 'static {
  fn schedule(&self, task: Task);
}

/// Runs every task immediately on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  #[inline]
  fn schedule(&self, task: Task) { task() }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
  #[error("failed to build thread pool: {0}")]
  ThreadPool(String),
  #[error("no tokio runtime is running on this thread")]
  NoRuntime,
}

impl From<std::io::Error> for SchedulerError {
  fn from(error: std::io::Error) -> Self { SchedulerError::ThreadPool(error.to_string()) }
}
