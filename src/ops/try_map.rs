use std::{marker::PhantomData, sync::Arc};

use tracing::trace;

use crate::{
  completion::Completion,
  demand::Demand,
  publisher::Publisher,
  subscriber::Subscriber,
  subscription::{AnyCancellable, SubscriptionRef},
};

/// Publisher returned by [`PublisherExt::try_map`](crate::publisher::PublisherExt::try_map).
pub struct TryMapOp<S, F> {
  source: S,
  func: Arc<F>,
}

impl<S, F> TryMapOp<S, F> {
  pub(crate) fn new(source: S, func: F) -> Self { TryMapOp { source, func: Arc::new(func) } }
}

impl<S: Clone, F> Clone for TryMapOp<S, F> {
  fn clone(&self) -> Self { TryMapOp { source: self.source.clone(), func: self.func.clone() } }
}

impl<S, F, B, E2> Publisher for TryMapOp<S, F>
where
  S: Publisher,
  S::Output: 'static,
  S::Failure: 'static,
  F: Fn(S::Output) -> Result<B, E2> + Send + Sync + 'static,
  E2: From<S::Failure>,
{
  type Output = B;
  type Failure = E2;

  fn subscribe<Sub>(&self, subscriber: Sub) -> AnyCancellable
  where
    Sub: Subscriber<B, E2> + 'static,
  {
    self
      .source
      .subscribe(TryMapSubscriber::new(subscriber, self.func.clone()))
  }
}

/// Applies a fallible transform and turns the first error into the terminal
/// failure.
///
/// Also drives [`decode`](crate::publisher::PublisherExt::decode).
pub struct TryMapSubscriber<Sub, F, E1> {
  downstream: Sub,
  func: Arc<F>,
  upstream: Option<SubscriptionRef>,
  done: bool,
  _p: PhantomData<fn(E1)>,
}

impl<Sub, F, E1> TryMapSubscriber<Sub, F, E1> {
  pub(crate) fn new(downstream: Sub, func: Arc<F>) -> Self {
    TryMapSubscriber { downstream, func, upstream: None, done: false, _p: PhantomData }
  }
}

impl<In, Out, E1, E2, Sub, F> Subscriber<In, E1> for TryMapSubscriber<Sub, F, E1>
where
  Sub: Subscriber<Out, E2>,
  F: Fn(In) -> Result<Out, E2> + Send + Sync,
  E2: From<E1>,
{
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    self.upstream = Some(subscription.clone());
    self.downstream.receive_subscription(subscription)
  }

  fn receive(&mut self, input: In) -> Demand {
    if self.done {
      return Demand::NONE;
    }
    match (self.func)(input) {
      Ok(output) => self.downstream.receive(output),
      Err(error) => {
        self.done = true;
        if let Some(upstream) = self.upstream.take() {
          upstream.cancel();
        }
        trace!("transform failed, upstream cancelled");
        self.downstream.receive_completion(Completion::Failure(error));
        Demand::NONE
      }
    }
  }

  fn receive_completion(&mut self, completion: Completion<E1>) {
    if self.done {
      return;
    }
    self.done = true;
    self.upstream = None;
    self.downstream.receive_completion(completion.map_failure(E2::from))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[derive(Debug, Clone, PartialEq)]
  enum Oops {
    Odd(i32),
  }

  impl From<std::convert::Infallible> for Oops {
    fn from(never: std::convert::Infallible) -> Self { match never {} }
  }

  #[rxcombine_macro::test]
  fn first_error_terminates_and_cancels_upstream() {
    let seen = Arc::new(Mutex::new(vec![]));
    let completion = Arc::new(Mutex::new(None));
    let (c_seen, c_completion) = (seen.clone(), completion.clone());
    let token = Sequence::new(vec![2, 4, 5, 6, 7])
      .try_map(|v| if v % 2 == 0 { Ok(v) } else { Err(Oops::Odd(v)) })
      .sink(
        move |c| *c_completion.lock().unwrap() = Some(c),
        move |v| c_seen.lock().unwrap().push(v),
      );

    assert_eq!(*seen.lock().unwrap(), vec![2, 4]);
    assert_eq!(*completion.lock().unwrap(), Some(Completion::Failure(Oops::Odd(5))));
    assert!(token.is_closed());
  }

  #[rxcombine_macro::test]
  fn widens_upstream_failure() {
    let completion = Arc::new(Mutex::new(None));
    let c_completion = completion.clone();
    let _token = Fail::<i32, FetchError>::new(FetchError::Status(503))
      .try_map(|v| Ok::<_, PipelineError>(v))
      .sink(move |c| *c_completion.lock().unwrap() = Some(c), |_| {});

    assert_eq!(
      *completion.lock().unwrap(),
      Some(Completion::Failure(PipelineError::Fetch(FetchError::Status(503))))
    );
  }

  #[rxcombine_macro::test]
  fn subject_upstream_is_detached_after_failure() {
    let subject = PassthroughSubject::<i32>::new();
    let completions = Arc::new(Mutex::new(0));
    let c_completions = completions.clone();
    let _token = subject
      .clone()
      .try_map(|v| if v < 0 { Err(Oops::Odd(v)) } else { Ok(v) })
      .sink(move |_| *c_completions.lock().unwrap() += 1, |_| {});

    subject.send(1);
    subject.send(-1);
    assert_eq!(subject.subscriber_count(), 0);
    subject.send(-2);
    subject.send_completion(Completion::Finished);
    assert_eq!(*completions.lock().unwrap(), 1);
  }
}
