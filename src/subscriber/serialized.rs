//! Serialized delivery to one subscriber.
//!
//! Every stage that may be driven from more than one call stack (subjects,
//! futures, the scheduler boundary) delivers through a
//! [`SerializedSubscriber`]. Events are appended to a queue and handed to the
//! subscriber by a single drainer at a time:
//!
//! - an event pushed while the subscriber is inside a callback (a re-entrant
//!   `send`, a `send` from another thread) is queued and delivered after the
//!   running callback returns, in push order;
//! - no lock is held while subscriber code runs, so a subscriber may cancel
//!   its own subscription or send to the subject that feeds it;
//! - nothing is accepted after a completion or after cancellation.

use std::collections::VecDeque;

use tracing::{trace, warn};

use super::{BoxedSubscriber, Subscriber};
use crate::{
  completion::Completion,
  demand::Demand,
  rc::MutArc,
  subscription::SubscriptionRef,
};

pub(crate) enum Event<Input, Failure> {
  Subscription(SubscriptionRef),
  Value(Input),
  Completion(Completion<Failure>),
}

struct SerialState<Input, Failure> {
  /// `None` while the drainer holds it, and after termination.
  subscriber: Option<BoxedSubscriber<Input, Failure>>,
  queue: VecDeque<Event<Input, Failure>>,
  draining: bool,
  terminated: bool,
  cancelled: bool,
  /// Receives the additional demand returned from `receive`.
  upstream: Option<SubscriptionRef>,
}

pub(crate) struct SerializedSubscriber<Input, Failure>(MutArc<SerialState<Input, Failure>>);

impl<Input, Failure> Clone for SerializedSubscriber<Input, Failure> {
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Input, Failure> SerializedSubscriber<Input, Failure> {
  pub(crate) fn new<S>(subscriber: S) -> Self
  where
    S: Subscriber<Input, Failure> + 'static,
  {
    SerializedSubscriber(MutArc::own(SerialState {
      subscriber: Some(Box::new(subscriber)),
      queue: VecDeque::new(),
      draining: false,
      terminated: false,
      cancelled: false,
      upstream: None,
    }))
  }

  pub(crate) fn set_upstream(&self, upstream: SubscriptionRef) {
    let mut state = self.0.rc_deref_mut();
    if !state.cancelled && !state.terminated {
      state.upstream = Some(upstream);
    }
  }

  /// Queue `event`. Returns `true` when the caller became the drainer and
  /// must call [`drain`](Self::drain) once it holds no locks.
  #[must_use]
  pub(crate) fn enqueue(&self, event: Event<Input, Failure>) -> bool {
    let mut state = self.0.rc_deref_mut();
    if state.terminated || state.cancelled {
      return false;
    }
    if matches!(event, Event::Completion(_)) {
      state.terminated = true;
    }
    state.queue.push_back(event);
    if state.draining {
      false
    } else {
      state.draining = true;
      true
    }
  }

  /// Queue `event` and deliver it on the current call stack unless another
  /// delivery is already running.
  pub(crate) fn push(&self, event: Event<Input, Failure>) {
    if self.enqueue(event) {
      self.drain();
    }
  }

  /// Deliver queued events until the queue is empty. Only the caller that
  /// received `true` from [`enqueue`](Self::enqueue) may call this.
  ///
  /// If a callback panics the subscription is cancelled: the queue is
  /// discarded, the upstream is cancelled and nothing more is accepted.
  pub(crate) fn drain(&self) {
    loop {
      let (mut subscriber, event) = {
        let mut state = self.0.rc_deref_mut();
        if state.cancelled {
          state.draining = false;
          state.queue.clear();
          let released = (state.subscriber.take(), state.upstream.take());
          drop(state);
          drop(released);
          return;
        }
        let Some(event) = state.queue.pop_front() else {
          state.draining = false;
          return;
        };
        let Some(subscriber) = state.subscriber.take() else {
          state.draining = false;
          state.queue.clear();
          return;
        };
        (subscriber, event)
      };

      let guard = UnwindGuard(&self.0);
      let (more, completed) = match event {
        Event::Subscription(subscription) => {
          subscriber.receive_subscription(subscription);
          (Demand::NONE, false)
        }
        Event::Value(value) => (subscriber.receive(value), false),
        Event::Completion(completion) => {
          subscriber.receive_completion(completion);
          (Demand::NONE, true)
        }
      };
      std::mem::forget(guard);

      if completed {
        let upstream = {
          let mut state = self.0.rc_deref_mut();
          state.draining = false;
          state.queue.clear();
          state.upstream.take()
        };
        trace!("serialized subscriber terminated");
        drop((subscriber, upstream));
        return;
      }
      if !more.is_zero() {
        let upstream = self.0.rc_deref_mut().upstream.clone();
        if let Some(upstream) = upstream {
          upstream.request(more);
        }
      }

      let mut state = self.0.rc_deref_mut();
      if state.cancelled {
        state.draining = false;
        state.queue.clear();
        let upstream = state.upstream.take();
        drop(state);
        drop((subscriber, upstream));
        return;
      }
      state.subscriber = Some(subscriber);
    }
  }

  /// Give up the drainer role without delivering. Whatever is queued is
  /// delivered by whoever enqueues next.
  fn release(&self) { self.0.rc_deref_mut().draining = false; }

  /// Discard queued events and release the subscriber. A callback that is
  /// running keeps running; nothing is delivered after it returns.
  pub(crate) fn cancel(&self) -> bool {
    let mut state = self.0.rc_deref_mut();
    if state.cancelled || (state.terminated && !state.draining && state.subscriber.is_none()) {
      return false;
    }
    state.cancelled = true;
    state.queue.clear();
    let released = if state.draining {
      (None, state.upstream.take())
    } else {
      (state.subscriber.take(), state.upstream.take())
    };
    drop(state);
    drop(released);
    true
  }

  /// `true` once cancelled or once a completion was accepted.
  pub(crate) fn is_closed(&self) -> bool {
    let state = self.0.rc_deref_mut();
    state.cancelled || state.terminated
  }
}

/// Drain every outbox in turn.
///
/// A panicking subscriber unwinds out of its own `drain`; the outboxes after
/// it give up their drainer role so their queued events still go out with
/// the next delivery instead of being stranded.
pub(crate) fn drain_all<Input, Failure>(
  outboxes: impl IntoIterator<Item = SerializedSubscriber<Input, Failure>>,
) {
  struct Remaining<Input, Failure>(std::vec::IntoIter<SerializedSubscriber<Input, Failure>>);

  impl<Input, Failure> Drop for Remaining<Input, Failure> {
    fn drop(&mut self) {
      for outbox in self.0.by_ref() {
        outbox.release();
      }
    }
  }

  let mut remaining = Remaining(outboxes.into_iter().collect::<Vec<_>>().into_iter());
  while let Some(outbox) = remaining.0.next() {
    outbox.drain();
  }
}

/// Cancels the serialized state if a subscriber callback unwinds.
struct UnwindGuard<'a, Input, Failure>(&'a MutArc<SerialState<Input, Failure>>);

impl<Input, Failure> Drop for UnwindGuard<'_, Input, Failure> {
  fn drop(&mut self) {
    let (queue, upstream) = {
      let mut state = self.0.rc_deref_mut();
      state.cancelled = true;
      state.draining = false;
      (std::mem::take(&mut state.queue), state.upstream.take())
    };
    warn!("subscriber panicked during delivery, subscription cancelled");
    drop(queue);
    if let Some(upstream) = upstream {
      upstream.cancel();
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use super::*;
  use crate::subscription::{EmptySubscription, Subscription};

  #[derive(Debug, PartialEq)]
  enum Seen {
    Subscribed,
    Value(i32),
    Done(Completion<()>),
  }

  struct Recorder {
    seen: Arc<Mutex<Vec<Seen>>>,
    on_value: Option<Box<dyn FnMut(i32) + Send>>,
  }

  impl Subscriber<i32, ()> for Recorder {
    fn receive_subscription(&mut self, _: SubscriptionRef) {
      self.seen.lock().unwrap().push(Seen::Subscribed);
    }

    fn receive(&mut self, input: i32) -> Demand {
      self.seen.lock().unwrap().push(Seen::Value(input));
      if let Some(f) = self.on_value.as_mut() {
        f(input);
      }
      Demand::NONE
    }

    fn receive_completion(&mut self, completion: Completion<()>) {
      self.seen.lock().unwrap().push(Seen::Done(completion));
    }
  }

  fn recorder() -> (Recorder, Arc<Mutex<Vec<Seen>>>) {
    let seen = Arc::new(Mutex::new(vec![]));
    (Recorder { seen: seen.clone(), on_value: None }, seen)
  }

  #[rxcombine_macro::test]
  fn delivers_in_order_and_stops_after_completion() {
    let (rec, seen) = recorder();
    let serial = SerializedSubscriber::new(rec);
    serial.push(Event::Subscription(Arc::new(EmptySubscription::new())));
    serial.push(Event::Value(1));
    serial.push(Event::Completion(Completion::Finished));
    serial.push(Event::Value(2));
    serial.push(Event::Completion(Completion::Failure(())));

    assert_eq!(
      *seen.lock().unwrap(),
      vec![Seen::Subscribed, Seen::Value(1), Seen::Done(Completion::Finished)]
    );
    assert!(serial.is_closed());
  }

  #[rxcombine_macro::test]
  fn reentrant_push_is_queued_behind_running_callback() {
    let (mut rec, seen) = recorder();
    let slot: Arc<Mutex<Option<SerializedSubscriber<i32, ()>>>> = Arc::new(Mutex::new(None));
    let c_slot = slot.clone();
    rec.on_value = Some(Box::new(move |v| {
      if v == 1 {
        let serial = c_slot.lock().unwrap().clone();
        if let Some(serial) = serial {
          serial.push(Event::Value(10));
          serial.push(Event::Completion(Completion::Finished));
        }
      }
    }));
    let serial = SerializedSubscriber::new(rec);
    *slot.lock().unwrap() = Some(serial.clone());

    serial.push(Event::Value(1));
    assert_eq!(
      *seen.lock().unwrap(),
      vec![Seen::Value(1), Seen::Value(10), Seen::Done(Completion::Finished)]
    );
    slot.lock().unwrap().take();
  }

  #[rxcombine_macro::test]
  fn cancel_inside_callback_suppresses_the_rest() {
    let (mut rec, seen) = recorder();
    let slot: Arc<Mutex<Option<SerializedSubscriber<i32, ()>>>> = Arc::new(Mutex::new(None));
    let c_slot = slot.clone();
    rec.on_value = Some(Box::new(move |_| {
      let serial = c_slot.lock().unwrap().take();
      if let Some(serial) = serial {
        serial.push(Event::Value(99));
        assert!(serial.cancel());
        assert!(!serial.cancel());
      }
    }));
    let serial = SerializedSubscriber::new(rec);
    *slot.lock().unwrap() = Some(serial.clone());

    serial.push(Event::Value(1));
    serial.push(Event::Value(2));
    assert_eq!(*seen.lock().unwrap(), vec![Seen::Value(1)]);
  }

  #[rxcombine_macro::test]
  fn additional_demand_goes_upstream() {
    struct Greedy;
    impl Subscriber<i32, ()> for Greedy {
      fn receive_subscription(&mut self, _: SubscriptionRef) {}
      fn receive(&mut self, _: i32) -> Demand { Demand::max(2) }
      fn receive_completion(&mut self, _: Completion<()>) {}
    }

    struct Counting(Mutex<Vec<Demand>>);
    impl Subscription for Counting {
      fn request(&self, demand: Demand) { self.0.lock().unwrap().push(demand); }
      fn cancel(&self) {}
      fn is_closed(&self) -> bool { false }
    }

    let upstream = Arc::new(Counting(Mutex::new(vec![])));
    let serial = SerializedSubscriber::new(Greedy);
    serial.set_upstream(upstream.clone());
    serial.push(Event::Value(1));
    assert_eq!(*upstream.0.lock().unwrap(), vec![Demand::max(2)]);
  }
  #[rxcombine_macro::test]
  fn panicking_callback_closes_the_subscriber() {
    struct Upstream(Mutex<bool>);
    impl Subscription for Upstream {
      fn request(&self, _: Demand) {}
      fn cancel(&self) { *self.0.lock().unwrap() = true; }
      fn is_closed(&self) -> bool { *self.0.lock().unwrap() }
    }

    let (mut rec, seen) = recorder();
    rec.on_value = Some(Box::new(|v| assert_ne!(v, 1, "subscriber gave up")));
    let serial = SerializedSubscriber::new(rec);
    let upstream = Arc::new(Upstream(Mutex::new(false)));
    serial.set_upstream(upstream.clone());

    let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
      serial.push(Event::Value(1));
    }));
    assert!(unwound.is_err());
    assert!(serial.is_closed());
    assert!(upstream.is_closed());

    assert!(!serial.enqueue(Event::Value(2)));
    assert!(serial.0.rc_deref_mut().queue.is_empty());
    assert_eq!(*seen.lock().unwrap(), vec![Seen::Value(1)]);
  }

  #[rxcombine_macro::test]
  fn drain_all_hands_back_the_rest_after_a_panic() {
    let (mut first, _) = recorder();
    first.on_value = Some(Box::new(|_| panic!("first subscriber failed")));
    let (second, second_seen) = recorder();
    let first = SerializedSubscriber::new(first);
    let second = SerializedSubscriber::new(second);

    let ready: Vec<_> = [&first, &second]
      .into_iter()
      .filter(|outbox| outbox.enqueue(Event::Value(7)))
      .cloned()
      .collect();
    assert_eq!(ready.len(), 2);
    let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| drain_all(ready)));
    assert!(unwound.is_err());
    assert!(second_seen.lock().unwrap().is_empty());

    second.push(Event::Value(8));
    assert_eq!(*second_seen.lock().unwrap(), vec![Seen::Value(7), Seen::Value(8)]);
  }
}
