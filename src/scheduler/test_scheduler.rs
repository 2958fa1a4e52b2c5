//! Test Scheduler for deterministic testing of `receive_on`.
//!
//! Tasks are queued, never run, until the test drives the scheduler with
//! [`run`](TestScheduler::run) or [`run_one`](TestScheduler::run_one). Clones
//! share one queue, so a test can keep a handle while the pipeline owns
//! another.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use rxcombine::prelude::*;
//!
//! let scheduler = TestScheduler::new();
//! let seen = Arc::new(Mutex::new(vec![]));
//! let c_seen = seen.clone();
//! let _token = Just::new(1)
//!   .receive_on(scheduler.clone())
//!   .sink_value(move |v| c_seen.lock().unwrap().push(v));
//!
//! assert!(seen.lock().unwrap().is_empty());
//! scheduler.run();
//! assert_eq!(*seen.lock().unwrap(), vec![1]);
//! ```

use std::collections::VecDeque;

use super::{Scheduler, Task};
use crate::rc::MutArc;

#[derive(Clone, Default)]
pub struct TestScheduler {
  queue: MutArc<VecDeque<Task>>,
}

impl TestScheduler {
  pub fn new() -> Self { Self::default() }

  /// Run the oldest queued task. Returns `false` when nothing was queued.
  pub fn run_one(&self) -> bool {
    // Popped before running: the task may schedule more work.
    let task = self.queue.rc_deref_mut().pop_front();
    match task {
      Some(task) => {
        task();
        true
      }
      None => false,
    }
  }

  /// Run tasks, including ones scheduled while running, until the queue is
  /// empty. Returns how many ran.
  pub fn run(&self) -> usize {
    let mut count = 0;
    while self.run_one() {
      count += 1;
    }
    count
  }

  pub fn pending_count(&self) -> usize { self.queue.rc_deref_mut().len() }
}

impl Scheduler for TestScheduler {
  fn schedule(&self, task: Task) { self.queue.rc_deref_mut().push_back(task); }
}
