use std::{convert::Infallible, marker::PhantomData, sync::Arc};

use super::{sequence::subscribe_iter, Publisher};
use crate::{
  completion::Completion,
  subscriber::Subscriber,
  subscription::{AnyCancellable, EmptySubscription, Subscription},
};

/// Emits one value once demand arrives, then finishes.
#[derive(Clone, Debug)]
pub struct Just<O>(O);

impl<O> Just<O> {
  pub fn new(value: O) -> Self { Just(value) }
}

impl<O> Publisher for Just<O>
where
  O: Clone + Send + 'static,
{
  type Output = O;
  type Failure = Infallible;

  fn subscribe<S>(&self, subscriber: S) -> AnyCancellable
  where
    S: Subscriber<O, Infallible> + 'static,
  {
    subscribe_iter(std::iter::once(self.0.clone()), subscriber)
  }
}

/// Finishes immediately without emitting.
pub struct Empty<O, E>(PhantomData<fn() -> (O, E)>);

impl<O, E> Empty<O, E> {
  pub fn new() -> Self { Empty(PhantomData) }
}

impl<O, E> Default for Empty<O, E> {
  fn default() -> Self { Self::new() }
}

impl<O, E> Clone for Empty<O, E> {
  fn clone(&self) -> Self { Self::new() }
}

impl<O, E> Publisher for Empty<O, E> {
  type Output = O;
  type Failure = E;

  fn subscribe<S>(&self, subscriber: S) -> AnyCancellable
  where
    S: Subscriber<O, E> + 'static,
  {
    complete_now(subscriber, Completion::Finished)
  }
}

/// Fails immediately with a clone of the stored error.
#[derive(Clone, Debug)]
pub struct Fail<O, E> {
  error: E,
  _p: PhantomData<fn() -> O>,
}

impl<O, E> Fail<O, E> {
  pub fn new(error: E) -> Self { Fail { error, _p: PhantomData } }
}

impl<O, E: Clone> Publisher for Fail<O, E> {
  type Output = O;
  type Failure = E;

  fn subscribe<S>(&self, subscriber: S) -> AnyCancellable
  where
    S: Subscriber<O, E> + 'static,
  {
    complete_now(subscriber, Completion::Failure(self.error.clone()))
  }
}

/// A terminal event needs no demand, so it follows the subscription at once
/// unless the subscriber cancelled in between.
fn complete_now<O, E, S>(mut subscriber: S, completion: Completion<E>) -> AnyCancellable
where
  S: Subscriber<O, E>,
{
  let subscription = Arc::new(EmptySubscription::new());
  subscriber.receive_subscription(subscription.clone());
  if !subscription.is_closed() {
    subscription.cancel();
    subscriber.receive_completion(completion);
  }
  AnyCancellable::new(subscription)
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use super::*;
  use crate::prelude::*;

  #[rxcombine_macro::test]
  fn just_emits_once_and_finishes() {
    let seen = Arc::new(Mutex::new(vec![]));
    let finished = Arc::new(Mutex::new(false));
    let (c_seen, c_finished) = (seen.clone(), finished.clone());
    let _token = Just::new("a").sink(
      move |c| *c_finished.lock().unwrap() = c.is_finished(),
      move |v| c_seen.lock().unwrap().push(v),
    );
    assert_eq!(*seen.lock().unwrap(), vec!["a"]);
    assert!(*finished.lock().unwrap());
  }

  #[rxcombine_macro::test]
  fn fail_delivers_only_the_failure() {
    let seen = Arc::new(Mutex::new(vec![]));
    let completion = Arc::new(Mutex::new(None));
    let (c_seen, c_completion) = (seen.clone(), completion.clone());
    let _token = Fail::<i32, _>::new("nope").sink(
      move |c| *c_completion.lock().unwrap() = Some(c),
      move |v| c_seen.lock().unwrap().push(v),
    );
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(*completion.lock().unwrap(), Some(Completion::Failure("nope")));
  }

  #[rxcombine_macro::test]
  fn empty_finishes() {
    let completion = Arc::new(Mutex::new(None));
    let c_completion = completion.clone();
    let token = Empty::<i32, ()>::new().sink(
      move |c| *c_completion.lock().unwrap() = Some(c),
      |_| unreachable!(),
    );
    assert_eq!(*completion.lock().unwrap(), Some(Completion::Finished));
    assert!(token.is_closed());
  }
}
