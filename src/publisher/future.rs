//! Eager, single-value publisher.
//!
//! A [`Future`] runs its work exactly once, when it is created, and hands
//! the work a [`Promise`]. The first call on any clone of that promise fixes
//! the outcome; every subscriber, early or late, observes that same outcome.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use rxcombine::prelude::*;
//!
//! let future = Future::<_, ()>::new(|promise| {
//!   promise.succeed(42);
//! });
//!
//! let seen = Arc::new(Mutex::new(None));
//! let c_seen = seen.clone();
//! let _token = future.sink(|_| {}, move |v| *c_seen.lock().unwrap() = Some(v));
//! assert_eq!(*seen.lock().unwrap(), Some(42));
//! ```

use std::sync::Arc;

use tracing::{debug, trace};

use super::Publisher;
use crate::{
  completion::Completion,
  demand::Demand,
  rc::{MutArc, WeakMutArc},
  subscriber::{Event, SerializedSubscriber, Subscriber},
  subscription::{AnyCancellable, Registry, Subscription},
};

struct FutureState<O, E> {
  result: Option<Result<O, E>>,
  /// Subscribers that arrived before the result.
  pending: Registry<Arc<FutureSubscription<O, E>>>,
}

/// A publisher that eventually produces a single value or fails.
pub struct Future<O, E> {
  state: MutArc<FutureState<O, E>>,
}

impl<O, E> Clone for Future<O, E> {
  fn clone(&self) -> Self { Future { state: self.state.clone() } }
}

impl<O, E> Future<O, E>
where
  O: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  /// Run `work` now, on the calling thread.
  ///
  /// `work` may resolve the promise before returning, or keep a clone of it
  /// and resolve it later from any thread.
  pub fn new(work: impl FnOnce(Promise<O, E>)) -> Self {
    let state = MutArc::own(FutureState { result: None, pending: Registry::new() });
    work(Promise { state: state.clone() });
    Future { state }
  }

  /// A future that is already resolved with `result`.
  pub fn resolved(result: Result<O, E>) -> Self {
    Future::new(move |promise| {
      promise.fulfill(result);
    })
  }

  /// The outcome, once the promise has been fulfilled.
  pub fn result(&self) -> Option<Result<O, E>> { self.state.rc_deref_mut().result.clone() }
}

impl<O, E> Publisher for Future<O, E>
where
  O: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  type Output = O;
  type Failure = E;

  fn subscribe<S>(&self, subscriber: S) -> AnyCancellable
  where
    S: Subscriber<O, E> + 'static,
  {
    let outbox = SerializedSubscriber::new(subscriber);
    let (subscription, stored, drain) = {
      let mut state = self.state.rc_deref_mut();
      let id = state.pending.next_id();
      let subscription = Arc::new(FutureSubscription {
        id,
        future: self.state.downgrade(),
        outbox: outbox.clone(),
        slot: MutArc::own(Slot { requested: false, outcome: None, delivered: false }),
      });
      // Queued under the future lock so a concurrent `fulfill` can only
      // land behind it.
      let drain = outbox.enqueue(Event::Subscription(subscription.clone()));
      let stored = match &state.result {
        Some(result) => Some(result.clone()),
        None => {
          state.pending.register(id, subscription.clone());
          None
        }
      };
      (subscription, stored, drain)
    };
    trace!(id = subscription.id, resolved = stored.is_some(), "future subscribed");

    if drain {
      outbox.drain();
    }
    if let Some(outcome) = stored {
      subscription.offer(outcome);
    }
    AnyCancellable::new(subscription)
  }
}

// ============================================================================
// Promise
// ============================================================================

/// The write side of a [`Future`]. Only the first call has any effect.
pub struct Promise<O, E> {
  state: MutArc<FutureState<O, E>>,
}

impl<O, E> Clone for Promise<O, E> {
  fn clone(&self) -> Self { Promise { state: self.state.clone() } }
}

impl<O, E> Promise<O, E>
where
  O: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  /// Store `result` and deliver it to every waiting subscriber.
  ///
  /// Returns `false`, and changes nothing, if the future was already
  /// resolved.
  pub fn fulfill(&self, result: Result<O, E>) -> bool {
    let pending = {
      let mut state = self.state.rc_deref_mut();
      if state.result.is_some() {
        trace!("future already resolved, promise ignored");
        return false;
      }
      state.result = Some(result.clone());
      state.pending.take_all()
    };
    debug!(subscribers = pending.len(), success = result.is_ok(), "future resolved");
    // Every subscriber holds the outcome before any of them runs, so one
    // that panics cannot keep it from the others.
    for subscription in &pending {
      subscription.store(result.clone());
    }
    for subscription in &pending {
      subscription.try_deliver();
    }
    true
  }

  pub fn succeed(&self, value: O) -> bool { self.fulfill(Ok(value)) }

  pub fn fail(&self, error: E) -> bool { self.fulfill(Err(error)) }
}

// ============================================================================
// FutureSubscription
// ============================================================================

struct Slot<O, E> {
  requested: bool,
  outcome: Option<Result<O, E>>,
  delivered: bool,
}

struct FutureSubscription<O, E> {
  id: usize,
  future: WeakMutArc<FutureState<O, E>>,
  outbox: SerializedSubscriber<O, E>,
  slot: MutArc<Slot<O, E>>,
}

impl<O, E> FutureSubscription<O, E> {
  fn store(&self, outcome: Result<O, E>) {
    let mut slot = self.slot.rc_deref_mut();
    if !slot.delivered {
      slot.outcome = Some(outcome);
    }
  }

  fn offer(&self, outcome: Result<O, E>) {
    self.store(outcome);
    self.try_deliver();
  }

  /// A value waits for demand; a failure does not.
  fn try_deliver(&self) {
    let outcome = {
      let mut slot = self.slot.rc_deref_mut();
      let ready = match &slot.outcome {
        Some(Ok(_)) => slot.requested,
        Some(Err(_)) => true,
        None => false,
      };
      if !ready || slot.delivered {
        return;
      }
      slot.delivered = true;
      slot.outcome.take()
    };

    let drain = match outcome {
      Some(Ok(value)) => {
        let value_drain = self.outbox.enqueue(Event::Value(value));
        let completion_drain = self.outbox.enqueue(Event::Completion(Completion::Finished));
        value_drain || completion_drain
      }
      Some(Err(error)) => self.outbox.enqueue(Event::Completion(Completion::Failure(error))),
      None => false,
    };
    if drain {
      self.outbox.drain();
    }
  }
}

impl<O: Send, E: Send> Subscription for FutureSubscription<O, E> {
  fn request(&self, demand: Demand) {
    if demand.is_zero() {
      return;
    }
    self.slot.rc_deref_mut().requested = true;
    self.try_deliver();
  }

  fn cancel(&self) {
    if !self.outbox.cancel() {
      return;
    }
    {
      let mut slot = self.slot.rc_deref_mut();
      slot.delivered = true;
      slot.outcome = None;
    }
    if let Some(future) = self.future.upgrade() {
      let removed = future.rc_deref_mut().pending.unregister(self.id);
      drop(removed);
    }
    trace!(id = self.id, "future subscription cancelled");
  }

  fn is_closed(&self) -> bool { self.outbox.is_closed() }
}
