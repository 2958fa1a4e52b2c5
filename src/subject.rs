//! Subjects: publishers that are fed imperatively.
//!
//! A subject keeps an ordered registry of its live subscribers and a latched
//! terminal event. `send` broadcasts to the subscribers registered at the
//! moment of the call; `send_completion` latches the terminal event, delivers
//! it and clears the registry. A subscriber arriving after termination gets
//! the latched completion and nothing else.
//!
//! Subjects do not track per-subscriber demand: every registered subscriber
//! is treated as having requested unlimited values.

use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::{
  completion::Completion,
  demand::Demand,
  rc::{MutArc, WeakMutArc},
  subscriber::{drain_all, Event, SerializedSubscriber, Subscriber},
  subscription::{AnyCancellable, Registry, Subscription},
};

mod current_value;
mod passthrough;

pub use current_value::CurrentValueSubject;
pub use passthrough::PassthroughSubject;

struct SubjectState<O, E> {
  subscribers: Registry<Arc<Registration<O, E>>>,
  completion: Option<Completion<E>>,
  /// Only a `CurrentValueSubject` keeps a value here.
  current: Option<O>,
}

/// Registry, latch and broadcast shared by both subject flavours.
pub(crate) struct SubjectCore<O, E>(MutArc<SubjectState<O, E>>);

impl<O, E> Clone for SubjectCore<O, E> {
  fn clone(&self) -> Self { SubjectCore(self.0.clone()) }
}

type Outboxes<O, E> = SmallVec<[SerializedSubscriber<O, E>; 2]>;

impl<O, E> SubjectCore<O, E>
where
  O: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  pub(crate) fn new(current: Option<O>) -> Self {
    SubjectCore(MutArc::own(SubjectState {
      subscribers: Registry::new(),
      completion: None,
      current,
    }))
  }

  pub(crate) fn subscribe<S>(&self, subscriber: S) -> AnyCancellable
  where
    S: Subscriber<O, E> + 'static,
  {
    let outbox = SerializedSubscriber::new(subscriber);
    let (registration, drain) = {
      let mut state = self.0.rc_deref_mut();
      let id = state.subscribers.next_id();
      let registration = Arc::new(Registration {
        id,
        outbox: outbox.clone(),
        subject: self.0.downgrade(),
      });
      // Queued under the subject lock, so the subscription always reaches
      // the subscriber before anything a concurrent `send` broadcasts.
      let mut drain = outbox.enqueue(Event::Subscription(registration.clone()));
      if let Some(completion) = &state.completion {
        drain |= outbox.enqueue(Event::Completion(completion.clone()));
        trace!(id, "subscribed to terminated subject");
      } else {
        if let Some(current) = &state.current {
          drain |= outbox.enqueue(Event::Value(current.clone()));
        }
        state.subscribers.register(id, registration.clone());
        trace!(id, subscribers = state.subscribers.len(), "subject subscribed");
      }
      (registration, drain)
    };

    if drain {
      outbox.drain();
    }
    AnyCancellable::new(registration)
  }

  pub(crate) fn send(&self, value: O) {
    let (ready, dead): (Outboxes<O, E>, _) = {
      let mut state = self.0.rc_deref_mut();
      if state.completion.is_some() {
        return;
      }
      if let Some(current) = state.current.as_mut() {
        *current = value.clone();
      }
      // A subscriber that panicked is closed without having cancelled.
      let dead = state.subscribers.prune(|registration| registration.outbox.is_closed());

      let mut ready = SmallVec::new();
      let mut value = Some(value);
      let mut registrations = state.subscribers.entries().peekable();
      while let Some(registration) = registrations.next() {
        // The last subscriber gets the original, the others a clone.
        let item = if registrations.peek().is_some() { value.clone() } else { value.take() };
        let Some(item) = item else { break };
        if registration.outbox.enqueue(Event::Value(item)) {
          ready.push(registration.outbox.clone());
        }
      }
      (ready, dead)
    };
    if !dead.is_empty() {
      trace!(pruned = dead.len(), "closed subscribers pruned");
    }
    drop(dead);

    drain_all(ready);
  }

  /// Latch `completion` and deliver it. Only the first call has an effect.
  pub(crate) fn send_completion(&self, completion: Completion<E>) {
    let (ready, released): (Outboxes<O, E>, _) = {
      let mut state = self.0.rc_deref_mut();
      if state.completion.is_some() {
        return;
      }
      state.completion = Some(completion.clone());
      let released = state.subscribers.take_all();
      let ready = released
        .iter()
        .filter(|registration| registration.outbox.enqueue(Event::Completion(completion.clone())))
        .map(|registration| registration.outbox.clone())
        .collect();
      (ready, released)
    };
    debug!(
      subscribers = released.len(),
      failure = completion.is_failure(),
      "subject completion latched"
    );

    drain_all(ready);
    drop(released);
  }

  pub(crate) fn current(&self) -> Option<O> { self.0.rc_deref_mut().current.clone() }

  /// Registered subscribers that can still receive values.
  pub(crate) fn subscriber_count(&self) -> usize {
    let state = self.0.rc_deref_mut();
    state.subscribers.entries().filter(|registration| !registration.outbox.is_closed()).count()
  }

  pub(crate) fn completion(&self) -> Option<Completion<E>> {
    self.0.rc_deref_mut().completion.clone()
  }
}

/// The subscription a subject hands each subscriber.
struct Registration<O, E> {
  id: usize,
  outbox: SerializedSubscriber<O, E>,
  subject: WeakMutArc<SubjectState<O, E>>,
}

impl<O: Send, E: Send> Subscription for Registration<O, E> {
  /// Demand is not tracked; every subscriber receives every value.
  fn request(&self, _demand: Demand) {}

  fn cancel(&self) {
    if !self.outbox.cancel() {
      return;
    }
    if let Some(subject) = self.subject.upgrade() {
      let removed = subject.rc_deref_mut().subscribers.unregister(self.id);
      drop(removed);
    }
    trace!(id = self.id, "subject subscription cancelled");
  }

  fn is_closed(&self) -> bool { self.outbox.is_closed() }
}

/// Attaching a subject to an upstream publisher relays everything it emits.
impl<O, E> Subscriber<O, E> for SubjectCore<O, E>
where
  O: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  fn receive_subscription(&mut self, subscription: crate::subscription::SubscriptionRef) {
    subscription.request(Demand::UNLIMITED);
  }

  fn receive(&mut self, input: O) -> Demand {
    self.send(input);
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<E>) { self.send_completion(completion); }
}
