//! Subscriber trait and implementations
//!
//! A Subscriber is the consumer side of a publisher. It receives exactly one
//! subscription, then zero or more values, then at most one completion.

use std::{convert::Infallible, marker::PhantomData};

use crate::{
  completion::Completion,
  demand::Demand,
  subscription::SubscriptionRef,
};

mod serialized;
pub(crate) use serialized::{drain_all, Event, SerializedSubscriber};

// ============================================================================
// Subscriber Trait
// ============================================================================

/// Subscriber trait: the consumer of a publisher's stream.
///
/// The protocol is:
///
/// 1. `receive_subscription` is called once, before anything else. The
///    subscriber requests demand through the subscription it receives.
/// 2. `receive` is called for each value, never more often than the demand
///    requested so far permits. The returned [`Demand`] is added to the
///    outstanding demand.
/// 3. `receive_completion` is called at most once, and nothing follows it.
pub trait Subscriber<Input, Failure>: Send {
  fn receive_subscription(&mut self, subscription: SubscriptionRef);

  /// Receive the next value, returning any additional demand.
  fn receive(&mut self, input: Input) -> Demand;

  fn receive_completion(&mut self, completion: Completion<Failure>);
}

/// Type-erased subscriber, used by [`AnyPublisher`](crate::publisher::AnyPublisher)
/// and by every stage that stores heterogeneous subscribers.
pub type BoxedSubscriber<Input, Failure> = Box<dyn Subscriber<Input, Failure>>;

impl<Input, Failure, S> Subscriber<Input, Failure> for Box<S>
where
  S: Subscriber<Input, Failure> + ?Sized,
{
  #[inline]
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    (**self).receive_subscription(subscription)
  }

  #[inline]
  fn receive(&mut self, input: Input) -> Demand { (**self).receive(input) }

  #[inline]
  fn receive_completion(&mut self, completion: Completion<Failure>) {
    (**self).receive_completion(completion)
  }
}

// ============================================================================
// Sink - closure subscriber
// ============================================================================

/// Closure subscriber that requests unlimited demand.
///
/// Created by [`PublisherExt::sink`](crate::publisher::PublisherExt::sink) and
/// [`PublisherExt::sink_value`](crate::publisher::PublisherExt::sink_value).
pub struct Sink<Input, Failure, FV, FC> {
  receive_value: FV,
  receive_completion: Option<FC>,
  subscribed: bool,
  _p: PhantomData<fn(Input, Failure)>,
}

impl<Input, Failure, FV, FC> Sink<Input, Failure, FV, FC>
where
  FV: FnMut(Input) + Send,
  FC: FnOnce(Completion<Failure>) + Send,
{
  pub fn new(receive_completion: FC, receive_value: FV) -> Self {
    Sink {
      receive_value,
      receive_completion: Some(receive_completion),
      subscribed: false,
      _p: PhantomData,
    }
  }
}

impl<Input, FV> Sink<Input, Infallible, FV, fn(Completion<Infallible>)>
where
  FV: FnMut(Input) + Send,
{
  /// Sink for publishers that cannot fail; completion is ignored.
  pub fn values(receive_value: FV) -> Self {
    Sink::new(ignore_completion as fn(Completion<Infallible>), receive_value)
  }
}

fn ignore_completion(_: Completion<Infallible>) {}

impl<Input, Failure, FV, FC> Subscriber<Input, Failure> for Sink<Input, Failure, FV, FC>
where
  FV: FnMut(Input) + Send,
  FC: FnOnce(Completion<Failure>) + Send,
{
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    // A sink serves exactly one upstream.
    if self.subscribed {
      subscription.cancel();
      return;
    }
    self.subscribed = true;
    subscription.request(Demand::UNLIMITED);
  }

  #[inline]
  fn receive(&mut self, input: Input) -> Demand {
    (self.receive_value)(input);
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<Failure>) {
    if let Some(receive_completion) = self.receive_completion.take() {
      receive_completion(completion);
    }
  }
}

// ============================================================================
// Tests
// ============================================================================
