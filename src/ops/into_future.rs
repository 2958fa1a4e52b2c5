use std::{
  pin::Pin,
  task::{Context, Poll, Waker},
};

use thiserror::Error;
use tracing::trace;

use crate::{
  completion::Completion,
  demand::Demand,
  publisher::Publisher,
  rc::MutArc,
  subscriber::Subscriber,
  subscription::{AnyCancellable, SubscriptionRef},
};

/// Why a publisher could not be turned into a single value.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntoFutureError {
  #[error("the publisher finished without emitting a value")]
  Empty,
  #[error("the publisher emitted more than one value")]
  MultipleValues,
}

type FutureOutput<O, E> = Result<Result<O, E>, IntoFutureError>;

struct FutureCell<O, E> {
  value: Option<O>,
  outcome: Option<FutureOutput<O, E>>,
  waker: Option<Waker>,
}

/// A `std::future::Future` resolving to the single value of a publisher.
///
/// Created by [`PublisherExt::into_future`](crate::publisher::PublisherExt::into_future).
/// The publisher is subscribed when this is created; dropping it cancels
/// the subscription.
pub struct PublisherFuture<O, E> {
  cell: MutArc<FutureCell<O, E>>,
  _subscription: AnyCancellable,
}

impl<O, E> PublisherFuture<O, E>
where
  O: Send + 'static,
  E: Send + 'static,
{
  pub(crate) fn new<P>(publisher: &P) -> Self
  where
    P: Publisher<Output = O, Failure = E> + ?Sized,
  {
    let cell = MutArc::own(FutureCell { value: None, outcome: None, waker: None });
    let subscription =
      publisher.subscribe(FutureSubscriber { cell: cell.clone(), upstream: None });
    PublisherFuture { cell, _subscription: subscription }
  }
}

impl<O, E> std::future::Future for PublisherFuture<O, E> {
  type Output = FutureOutput<O, E>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let mut cell = self.cell.rc_deref_mut();
    match cell.outcome.take() {
      Some(outcome) => Poll::Ready(outcome),
      None => {
        cell.waker = Some(cx.waker().clone());
        Poll::Pending
      }
    }
  }
}

struct FutureSubscriber<O, E> {
  cell: MutArc<FutureCell<O, E>>,
  upstream: Option<SubscriptionRef>,
}

impl<O, E> FutureSubscriber<O, E> {
  fn resolve(&mut self, outcome: FutureOutput<O, E>) {
    self.upstream = None;
    let waker = {
      let mut cell = self.cell.rc_deref_mut();
      if cell.outcome.is_some() {
        return;
      }
      cell.value = None;
      cell.outcome = Some(outcome);
      cell.waker.take()
    };
    trace!("publisher future resolved");
    if let Some(waker) = waker {
      waker.wake();
    }
  }
}

impl<O: Send, E: Send> Subscriber<O, E> for FutureSubscriber<O, E> {
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    // Two is enough to notice a publisher that is not single-valued.
    self.upstream = Some(subscription.clone());
    subscription.request(Demand::max(2));
  }

  fn receive(&mut self, input: O) -> Demand {
    let first = {
      let mut cell = self.cell.rc_deref_mut();
      if cell.outcome.is_some() {
        return Demand::NONE;
      }
      let first = cell.value.is_none();
      if first {
        cell.value = Some(input);
      }
      first
    };
    if !first {
      if let Some(upstream) = self.upstream.take() {
        upstream.cancel();
      }
      self.resolve(Err(IntoFutureError::MultipleValues));
    }
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<E>) {
    let outcome = match completion {
      Completion::Finished => match self.cell.rc_deref_mut().value.take() {
        Some(value) => Ok(Ok(value)),
        None => Err(IntoFutureError::Empty),
      },
      Completion::Failure(error) => Ok(Err(error)),
    };
    self.resolve(outcome);
  }
}
