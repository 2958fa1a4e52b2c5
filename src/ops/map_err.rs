use std::sync::Arc;

use crate::{
  completion::Completion,
  demand::Demand,
  publisher::Publisher,
  subscriber::Subscriber,
  subscription::{AnyCancellable, SubscriptionRef},
};

/// Publisher returned by [`PublisherExt::map_err`](crate::publisher::PublisherExt::map_err).
pub struct MapErrOp<S, F> {
  source: S,
  func: Arc<F>,
}

impl<S, F> MapErrOp<S, F> {
  pub(crate) fn new(source: S, func: F) -> Self { MapErrOp { source, func: Arc::new(func) } }
}

impl<S: Clone, F> Clone for MapErrOp<S, F> {
  fn clone(&self) -> Self { MapErrOp { source: self.source.clone(), func: self.func.clone() } }
}

impl<S, F, E2> Publisher for MapErrOp<S, F>
where
  S: Publisher,
  S::Failure: 'static,
  F: Fn(S::Failure) -> E2 + Send + Sync + 'static,
{
  type Output = S::Output;
  type Failure = E2;

  fn subscribe<Sub>(&self, subscriber: Sub) -> AnyCancellable
  where
    Sub: Subscriber<S::Output, E2> + 'static,
  {
    self
      .source
      .subscribe(MapErrSubscriber { downstream: subscriber, func: self.func.clone() })
  }
}

pub struct MapErrSubscriber<Sub, F> {
  downstream: Sub,
  func: Arc<F>,
}

impl<Item, E1, E2, Sub, F> Subscriber<Item, E1> for MapErrSubscriber<Sub, F>
where
  Sub: Subscriber<Item, E2>,
  F: Fn(E1) -> E2 + Send + Sync,
{
  #[inline]
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    self.downstream.receive_subscription(subscription)
  }

  #[inline]
  fn receive(&mut self, input: Item) -> Demand { self.downstream.receive(input) }

  fn receive_completion(&mut self, completion: Completion<E1>) {
    let func = &self.func;
    self
      .downstream
      .receive_completion(completion.map_failure(|e| func(e)))
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::prelude::*;

  #[rxcombine_macro::test]
  fn transforms_the_failure() {
    let completion = Arc::new(Mutex::new(None));
    let c_completion = completion.clone();
    let _token = Fail::<i32, u16>::new(404)
      .map_err(FetchError::Status)
      .sink(move |c| *c_completion.lock().unwrap() = Some(c), |_| {});
    assert_eq!(
      *completion.lock().unwrap(),
      Some(Completion::Failure(FetchError::Status(404)))
    );
  }

  #[rxcombine_macro::test]
  fn values_and_finish_pass_through() {
    let log = Arc::new(Mutex::new(vec![]));
    let (c_log, v_log) = (log.clone(), log.clone());
    let _token = Sequence::new(vec![1, 2])
      .map_err(|never| -> String { match never {} })
      .sink(
        move |c| c_log.lock().unwrap().push(format!("{c:?}")),
        move |v| v_log.lock().unwrap().push(v.to_string()),
      );
    assert_eq!(*log.lock().unwrap(), vec!["1", "2", "Finished"]);
  }
}
