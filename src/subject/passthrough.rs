use std::convert::Infallible;

use super::SubjectCore;
use crate::{
  completion::Completion,
  demand::Demand,
  publisher::Publisher,
  subscriber::Subscriber,
  subscription::{AnyCancellable, SubscriptionRef},
};

/// A subject that keeps no value: subscribers only see what is sent after
/// they subscribed.
///
/// Clones share the same registry and latch.
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use rxcombine::prelude::*;
///
/// let subject = PassthroughSubject::<&str, ()>::new();
/// let seen = Arc::new(Mutex::new(vec![]));
/// let c_seen = seen.clone();
/// let _a = subject.sink(|_| {}, move |v| c_seen.lock().unwrap().push(v));
///
/// subject.send("x");
/// subject.send_completion(Completion::Finished);
/// subject.send("ignored");
/// assert_eq!(*seen.lock().unwrap(), vec!["x"]);
/// ```
pub struct PassthroughSubject<O, E = Infallible> {
  core: SubjectCore<O, E>,
}

impl<O, E> Clone for PassthroughSubject<O, E> {
  fn clone(&self) -> Self { PassthroughSubject { core: self.core.clone() } }
}

impl<O, E> PassthroughSubject<O, E>
where
  O: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  pub fn new() -> Self { PassthroughSubject { core: SubjectCore::new(None) } }

  /// Deliver `value` to every current subscriber. No-op once terminated.
  #[inline]
  pub fn send(&self, value: O) { self.core.send(value) }

  /// Latch and deliver the terminal event. Later calls are ignored.
  #[inline]
  pub fn send_completion(&self, completion: Completion<E>) { self.core.send_completion(completion) }

  pub fn subscriber_count(&self) -> usize { self.core.subscriber_count() }

  /// The latched terminal event, if any.
  pub fn completion(&self) -> Option<Completion<E>> { self.core.completion() }
}

impl<O, E> Default for PassthroughSubject<O, E>
where
  O: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  fn default() -> Self { Self::new() }
}

impl<O, E> Publisher for PassthroughSubject<O, E>
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
    self.core.subscribe(subscriber)
  }
}

impl<O, E> Subscriber<O, E> for PassthroughSubject<O, E>
where
  O: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    self.core.receive_subscription(subscription)
  }

  fn receive(&mut self, input: O) -> Demand { self.core.receive(input) }

  fn receive_completion(&mut self, completion: Completion<E>) {
    self.core.receive_completion(completion)
  }
}
