use std::{
  collections::VecDeque,
  pin::Pin,
  task::{Context, Poll, Waker},
};

use futures::Stream;

use crate::{
  completion::Completion,
  demand::Demand,
  publisher::Publisher,
  rc::MutArc,
  subscriber::Subscriber,
  subscription::{AnyCancellable, SubscriptionRef},
};

struct StreamCell<O, E> {
  items: VecDeque<Result<O, E>>,
  upstream: Option<SubscriptionRef>,
  /// A unit of demand was requested and its value has not arrived yet.
  in_flight: bool,
  finished: bool,
  waker: Option<Waker>,
}

/// A `futures::Stream` over the values of a publisher.
///
/// Created by [`PublisherExt::into_stream`](crate::publisher::PublisherExt::into_stream).
/// Each poll that finds nothing buffered requests exactly one more value,
/// so the publisher never runs ahead of the consumer. A failure is yielded
/// as the last item, `Err(e)`.
pub struct PublisherStream<O, E> {
  cell: MutArc<StreamCell<O, E>>,
  _subscription: AnyCancellable,
}

impl<O, E> PublisherStream<O, E>
where
  O: Send + 'static,
  E: Send + 'static,
{
  pub(crate) fn new<P>(publisher: &P) -> Self
  where
    P: Publisher<Output = O, Failure = E> + ?Sized,
  {
    let cell = MutArc::own(StreamCell {
      items: VecDeque::new(),
      upstream: None,
      in_flight: false,
      finished: false,
      waker: None,
    });
    let subscription = publisher.subscribe(StreamSubscriber { cell: cell.clone() });
    PublisherStream { cell, _subscription: subscription }
  }
}

impl<O, E> Stream for PublisherStream<O, E> {
  type Item = Result<O, E>;

  fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
    loop {
      let upstream = {
        let mut cell = self.cell.rc_deref_mut();
        if let Some(item) = cell.items.pop_front() {
          return Poll::Ready(Some(item));
        }
        if cell.finished {
          return Poll::Ready(None);
        }
        cell.waker = Some(cx.waker().clone());
        if cell.in_flight {
          return Poll::Pending;
        }
        match cell.upstream.clone() {
          Some(upstream) => {
            cell.in_flight = true;
            upstream
          }
          None => return Poll::Pending,
        }
      };
      // A synchronous publisher answers inside `request`, so look again.
      upstream.request(Demand::max(1));
    }
  }
}

struct StreamSubscriber<O, E> {
  cell: MutArc<StreamCell<O, E>>,
}

impl<O, E> StreamSubscriber<O, E> {
  fn push(&self, item: Option<Result<O, E>>) {
    let waker = {
      let mut cell = self.cell.rc_deref_mut();
      match item {
        Some(item) => {
          cell.items.push_back(item);
          cell.in_flight = false;
        }
        None => {
          cell.finished = true;
          cell.upstream = None;
        }
      }
      cell.waker.take()
    };
    if let Some(waker) = waker {
      waker.wake();
    }
  }
}

impl<O: Send, E: Send> Subscriber<O, E> for StreamSubscriber<O, E> {
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    let waker = {
      let mut cell = self.cell.rc_deref_mut();
      cell.upstream = Some(subscription);
      cell.waker.take()
    };
    if let Some(waker) = waker {
      waker.wake();
    }
  }

  fn receive(&mut self, input: O) -> Demand {
    self.push(Some(Ok(input)));
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<E>) {
    if let Completion::Failure(error) = completion {
      self.push(Some(Err(error)));
    }
    self.push(None);
  }
}
