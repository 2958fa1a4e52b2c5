use tokio::runtime::Handle;

use super::{Scheduler, SchedulerError, Task};

/// Spawns tasks onto a tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioScheduler {
  handle: Handle,
}

impl TokioScheduler {
  /// The runtime the calling thread is running in.
  pub fn current() -> Result<Self, SchedulerError> {
    Handle::try_current()
      .map(|handle| TokioScheduler { handle })
      .map_err(|_| SchedulerError::NoRuntime)
  }

  pub fn from_handle(handle: Handle) -> Self { TokioScheduler { handle } }
}

impl Scheduler for TokioScheduler {
  fn schedule(&self, task: Task) {
    // The join handle is dropped: the task is detached, not aborted.
    drop(self.handle.spawn(async move { task() }));
  }
}
