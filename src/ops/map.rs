use std::sync::Arc;

use crate::{
  completion::Completion,
  demand::Demand,
  publisher::Publisher,
  subscriber::Subscriber,
  subscription::{AnyCancellable, SubscriptionRef},
};

/// Publisher returned by [`PublisherExt::map`](crate::publisher::PublisherExt::map).
pub struct MapOp<S, F> {
  source: S,
  func: Arc<F>,
}

impl<S, F> MapOp<S, F> {
  pub(crate) fn new(source: S, func: F) -> Self { MapOp { source, func: Arc::new(func) } }
}

impl<S: Clone, F> Clone for MapOp<S, F> {
  fn clone(&self) -> Self { MapOp { source: self.source.clone(), func: self.func.clone() } }
}

impl<S, F, B> Publisher for MapOp<S, F>
where
  S: Publisher,
  S::Output: 'static,
  S::Failure: 'static,
  F: Fn(S::Output) -> B + Send + Sync + 'static,
{
  type Output = B;
  type Failure = S::Failure;

  fn subscribe<Sub>(&self, subscriber: Sub) -> AnyCancellable
  where
    Sub: Subscriber<B, S::Failure> + 'static,
  {
    self
      .source
      .subscribe(MapSubscriber { downstream: subscriber, func: self.func.clone() })
  }
}

pub struct MapSubscriber<Sub, F> {
  downstream: Sub,
  func: Arc<F>,
}

impl<In, Out, E, Sub, F> Subscriber<In, E> for MapSubscriber<Sub, F>
where
  Sub: Subscriber<Out, E>,
  F: Fn(In) -> Out + Send + Sync,
{
  #[inline]
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    self.downstream.receive_subscription(subscription)
  }

  #[inline]
  fn receive(&mut self, input: In) -> Demand { self.downstream.receive((self.func)(input)) }

  #[inline]
  fn receive_completion(&mut self, completion: Completion<E>) {
    self.downstream.receive_completion(completion)
  }
}
