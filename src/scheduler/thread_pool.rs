use futures::{executor::ThreadPool, future};
use once_cell::sync::Lazy;
use tracing::debug;

use super::{Scheduler, SchedulerError, Task};

static DEFAULT_POOL: Lazy<Result<ThreadPool, SchedulerError>> = Lazy::new(|| {
  let pool = ThreadPool::builder().name_prefix("rxcombine-").create()?;
  debug!("default thread pool created");
  Ok(pool)
});

/// Runs tasks on a `futures` thread pool.
///
/// Tasks of the same `receive_on` subscription never run concurrently with
/// each other; tasks of different subscriptions may.
#[derive(Clone)]
pub struct ThreadPoolScheduler {
  pool: ThreadPool,
}

impl ThreadPoolScheduler {
  /// The process-wide pool, created on first use.
  pub fn shared() -> Result<Self, SchedulerError> {
    (*DEFAULT_POOL).clone().map(|pool| ThreadPoolScheduler { pool })
  }

  pub fn from_pool(pool: ThreadPool) -> Self { ThreadPoolScheduler { pool } }

  pub fn builder() -> ThreadPoolSchedulerBuilder { ThreadPoolSchedulerBuilder::default() }
}

impl Scheduler for ThreadPoolScheduler {
  fn schedule(&self, task: Task) { self.pool.spawn_ok(future::lazy(move |_| task())); }
}

/// Configures a dedicated pool. Unset options keep the `futures` defaults.
#[derive(Clone, Debug, Default)]
pub struct ThreadPoolSchedulerBuilder {
  pool_size: Option<usize>,
  name_prefix: Option<String>,
}

impl ThreadPoolSchedulerBuilder {
  /// Number of worker threads. Zero is rejected by [`build`](Self::build).
  pub fn pool_size(mut self, size: usize) -> Self {
    self.pool_size = Some(size);
    self
  }

  pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.name_prefix = Some(prefix.into());
    self
  }

  pub fn build(self) -> Result<ThreadPoolScheduler, SchedulerError> {
    if self.pool_size == Some(0) {
      return Err(SchedulerError::ThreadPool("pool size must be at least 1".into()));
    }
    let mut builder = ThreadPool::builder();
    if let Some(size) = self.pool_size {
      builder.pool_size(size);
    }
    if let Some(prefix) = self.name_prefix {
      builder.name_prefix(prefix);
    }
    let pool = builder.create()?;
    debug!(pool_size = ?self.pool_size, "thread pool scheduler built");
    Ok(ThreadPoolScheduler { pool })
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{mpsc, Arc, Mutex};

  use super::*;
  use crate::prelude::*;

  #[rxcombine_macro::test]
  fn preserves_order_per_subscription() {
    let scheduler = ThreadPoolScheduler::builder().pool_size(4).build().unwrap();
    let seen = Arc::new(Mutex::new(vec![]));
    let (tx, rx) = mpsc::channel();
    let c_seen = seen.clone();
    let _token = Sequence::new(0..200)
      .receive_on(scheduler)
      .sink(
        move |_| tx.send(()).unwrap(),
        move |v| c_seen.lock().unwrap().push(v),
      );

    rx.recv().unwrap();
    assert_eq!(*seen.lock().unwrap(), (0..200).collect::<Vec<_>>());
  }

  #[rxcombine_macro::test]
  fn shared_pool_runs_tasks() {
    let scheduler = ThreadPoolScheduler::shared().unwrap();
    let (tx, rx) = mpsc::channel();
    scheduler.schedule(Box::new(move || {
      let name = std::thread::current().name().map(String::from);
      tx.send(name).unwrap();
    }));
    let name = rx.recv().unwrap().unwrap_or_default();
    assert!(name.starts_with("rxcombine-"), "{name}");
  }

  #[rxcombine_macro::test]
  fn empty_pool_is_an_error() {
    let built = ThreadPoolScheduler::builder().pool_size(0).build();
    assert!(matches!(built, Err(SchedulerError::ThreadPool(_))));
  }
}
