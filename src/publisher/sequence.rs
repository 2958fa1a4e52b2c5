//! Demand-driven iteration.
//!
//! [`Sequence`] is the canonical backpressure-respecting source: it emits
//! the next item only while the subscriber has outstanding demand, and it
//! completes as soon as the iterator is exhausted, whether or not demand is
//! left.

use std::{iter::Peekable, marker::PhantomData, sync::Arc};

use tracing::trace;

use super::Publisher;
use crate::{
  completion::Completion,
  demand::Demand,
  rc::MutArc,
  subscriber::Subscriber,
  subscription::{AnyCancellable, Subscription},
};

/// Emits the items of an iterable, one per unit of demand, then finishes.
#[derive(Clone, Debug)]
pub struct Sequence<I> {
  items: I,
}

impl<I> Sequence<I>
where
  I: IntoIterator + Clone,
{
  pub fn new(items: I) -> Self { Sequence { items } }
}

impl<I> Publisher for Sequence<I>
where
  I: IntoIterator + Clone,
  I::IntoIter: Send + 'static,
  I::Item: Send + 'static,
{
  type Output = I::Item;
  type Failure = std::convert::Infallible;

  fn subscribe<S>(&self, subscriber: S) -> AnyCancellable
  where
    S: Subscriber<Self::Output, Self::Failure> + 'static,
  {
    subscribe_iter(self.items.clone().into_iter(), subscriber)
  }
}

/// Run the iteration protocol for `iter` against `subscriber`.
pub(crate) fn subscribe_iter<It, E, S>(iter: It, subscriber: S) -> AnyCancellable
where
  It: Iterator + Send + 'static,
  It::Item: Send + 'static,
  E: 'static,
  S: Subscriber<It::Item, E> + 'static,
{
  let subscription = Arc::new(IterSubscription(MutArc::own(IterState {
    iter: iter.peekable(),
    demand: Demand::NONE,
    subscriber: None,
    // Held until the subscriber is stored, so a `request` made from inside
    // `receive_subscription` only records the demand.
    draining: true,
    closed: false,
    _p: PhantomData,
  })));
  trace!("sequence subscribed");

  let mut subscriber = subscriber;
  subscriber.receive_subscription(subscription.clone());
  subscription.drain(subscriber);
  AnyCancellable::new(subscription)
}

struct IterState<It: Iterator, E, S> {
  iter: Peekable<It>,
  demand: Demand,
  /// Taken out by the drainer while it delivers.
  subscriber: Option<S>,
  draining: bool,
  closed: bool,
  _p: PhantomData<fn(E)>,
}

struct IterSubscription<It: Iterator, E, S>(MutArc<IterState<It, E, S>>);

impl<It, E, S> IterSubscription<It, E, S>
where
  It: Iterator,
  S: Subscriber<It::Item, E>,
{
  /// Emit while demand lasts. The caller must own the `draining` flag.
  fn drain(&self, mut subscriber: S) {
    loop {
      let mut state = self.0.rc_deref_mut();
      if state.closed {
        state.draining = false;
        drop(state);
        return;
      }
      if state.iter.peek().is_none() {
        state.closed = true;
        state.draining = false;
        drop(state);
        subscriber.receive_completion(Completion::Finished);
        return;
      }
      if !state.demand.take_one() {
        state.subscriber = Some(subscriber);
        state.draining = false;
        return;
      }
      let Some(item) = state.iter.next() else { continue };
      drop(state);

      let more = subscriber.receive(item);
      if !more.is_zero() {
        self.0.rc_deref_mut().demand += more;
      }
    }
  }
}

impl<It, E, S> Subscription for IterSubscription<It, E, S>
where
  It: Iterator + Send,
  It::Item: Send,
  S: Subscriber<It::Item, E>,
{
  fn request(&self, demand: Demand) {
    let subscriber = {
      let mut state = self.0.rc_deref_mut();
      if state.closed {
        return;
      }
      state.demand += demand;
      if state.draining {
        return;
      }
      let Some(subscriber) = state.subscriber.take() else { return };
      state.draining = true;
      subscriber
    };
    self.drain(subscriber);
  }

  fn cancel(&self) {
    let subscriber = {
      let mut state = self.0.rc_deref_mut();
      if state.closed {
        return;
      }
      state.closed = true;
      state.subscriber.take()
    };
    trace!("sequence cancelled");
    drop(subscriber);
  }

  fn is_closed(&self) -> bool { self.0.rc_deref_mut().closed }
}
