use std::sync::Arc;

use super::Publisher;
use crate::{
  subscriber::{BoxedSubscriber, Subscriber},
  subscription::AnyCancellable,
};

/// Object-safe face of [`Publisher`].
///
/// `Publisher::subscribe` is generic over the subscriber type, so it cannot
/// be called through a trait object. `DynPublisher` takes the subscriber
/// boxed instead and is implemented for every sendable publisher.
pub trait DynPublisher<Output, Failure>: Send + Sync {
  fn dyn_subscribe(&self, subscriber: BoxedSubscriber<Output, Failure>) -> AnyCancellable;
}

impl<P> DynPublisher<P::Output, P::Failure> for P
where
  P: Publisher + Send + Sync,
  P::Output: 'static,
  P::Failure: 'static,
{
  #[inline]
  fn dyn_subscribe(&self, subscriber: BoxedSubscriber<P::Output, P::Failure>) -> AnyCancellable {
    self.subscribe(subscriber)
  }
}

/// A publisher with its concrete type erased.
///
/// Behaves exactly like the publisher it wraps. Cloning shares the wrapped
/// publisher; each `subscribe` still creates an independent subscription.
pub struct AnyPublisher<Output, Failure>(Arc<dyn DynPublisher<Output, Failure>>);

impl<Output, Failure> AnyPublisher<Output, Failure> {
  pub fn new<P>(publisher: P) -> Self
  where
    P: Publisher<Output = Output, Failure = Failure> + Send + Sync + 'static,
    Output: 'static,
    Failure: 'static,
  {
    AnyPublisher(Arc::new(publisher))
  }
}

impl<Output, Failure> Clone for AnyPublisher<Output, Failure> {
  fn clone(&self) -> Self { AnyPublisher(self.0.clone()) }
}

impl<Output: 'static, Failure: 'static> Publisher for AnyPublisher<Output, Failure> {
  type Output = Output;
  type Failure = Failure;

  fn subscribe<S>(&self, subscriber: S) -> AnyCancellable
  where
    S: Subscriber<Output, Failure> + 'static,
  {
    self.0.dyn_subscribe(Box::new(subscriber))
  }
}
