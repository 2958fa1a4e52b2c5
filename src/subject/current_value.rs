use std::convert::Infallible;

use super::SubjectCore;
use crate::{
  completion::Completion,
  demand::Demand,
  publisher::Publisher,
  subscriber::Subscriber,
  subscription::{AnyCancellable, SubscriptionRef},
};

/// A subject that holds a current value.
///
/// Every new subscriber receives the current value first, then each value
/// sent afterwards. After termination the stored value is kept but no longer
/// updated or replayed.
pub struct CurrentValueSubject<O, E = Infallible> {
  core: SubjectCore<O, E>,
}

impl<O, E> Clone for CurrentValueSubject<O, E> {
  fn clone(&self) -> Self { CurrentValueSubject { core: self.core.clone() } }
}

impl<O, E> CurrentValueSubject<O, E>
where
  O: Clone + Send + 'static,
  E: Clone + Send + 'static,
{
  pub fn new(value: O) -> Self { CurrentValueSubject { core: SubjectCore::new(Some(value)) } }

  /// The value most recently sent, or the initial one.
  pub fn value(&self) -> O {
    match self.core.current() {
      Some(value) => value,
      None => unreachable!("a current value subject always holds a value"),
    }
  }

  /// Store `value` and deliver it to every current subscriber.
  #[inline]
  pub fn send(&self, value: O) { self.core.send(value) }

  #[inline]
  pub fn send_completion(&self, completion: Completion<E>) { self.core.send_completion(completion) }

  pub fn subscriber_count(&self) -> usize { self.core.subscriber_count() }

  pub fn completion(&self) -> Option<Completion<E>> { self.core.completion() }
}

impl<O, E> Publisher for CurrentValueSubject<O, E>
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

impl<O, E> Subscriber<O, E> for CurrentValueSubject<O, E>
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
