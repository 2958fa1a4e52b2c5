//! Scheduler boundary.
//!
//! `receive_on` re-dispatches `receive_subscription`, `receive` and
//! `receive_completion` onto a [`Scheduler`]. Events of one subscription go
//! through a serial queue that at most one scheduled task drains at a time,
//! so they arrive in upstream order even on a multi-threaded pool. Nothing
//! orders deliveries of different subscriptions.

use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc,
};

use tracing::trace;

use crate::{
  completion::Completion,
  demand::Demand,
  publisher::Publisher,
  rc::MutArc,
  scheduler::Scheduler,
  subscriber::{Event, SerializedSubscriber, Subscriber},
  subscription::{AnyCancellable, Subscription, SubscriptionRef},
};

/// Publisher returned by [`PublisherExt::receive_on`](crate::publisher::PublisherExt::receive_on).
#[derive(Clone)]
pub struct ReceiveOnOp<S, Sch> {
  source: S,
  scheduler: Sch,
}

impl<S, Sch> ReceiveOnOp<S, Sch> {
  pub(crate) fn new(source: S, scheduler: Sch) -> Self { ReceiveOnOp { source, scheduler } }
}

impl<S, Sch> Publisher for ReceiveOnOp<S, Sch>
where
  S: Publisher,
  S::Output: Send + 'static,
  S::Failure: Send + 'static,
  Sch: Scheduler,
{
  type Output = S::Output;
  type Failure = S::Failure;

  fn subscribe<Sub>(&self, subscriber: Sub) -> AnyCancellable
  where
    Sub: Subscriber<S::Output, S::Failure> + 'static,
  {
    let outbox = SerializedSubscriber::new(subscriber);
    let link = Arc::new(ReceiveOnSubscription {
      outbox: outbox.clone(),
      upstream: MutArc::own(None),
      cancelled: AtomicBool::new(false),
    });
    let relay = ReceiveOnSubscriber {
      outbox,
      link: link.clone(),
      scheduler: self.scheduler.clone(),
    };
    let upstream = self.source.subscribe(relay).into_subscription();
    link.attach(upstream);
    AnyCancellable::new(link)
  }
}

/// The subscription handed to the downstream.
///
/// Demand is forwarded upstream as is. Cancelling also discards whatever is
/// still waiting in the serial queue.
struct ReceiveOnSubscription<O, E> {
  outbox: SerializedSubscriber<O, E>,
  upstream: MutArc<Option<SubscriptionRef>>,
  cancelled: AtomicBool,
}

impl<O, E> ReceiveOnSubscription<O, E> {
  fn attach(&self, upstream: SubscriptionRef) {
    if self.cancelled.load(Ordering::Acquire) {
      upstream.cancel();
      return;
    }
    let mut slot = self.upstream.rc_deref_mut();
    if slot.is_none() {
      *slot = Some(upstream);
    }
  }
}

impl<O: Send, E: Send> Subscription for ReceiveOnSubscription<O, E> {
  fn request(&self, demand: Demand) {
    let upstream = self.upstream.rc_deref_mut().clone();
    if let Some(upstream) = upstream {
      upstream.request(demand);
    }
  }

  fn cancel(&self) {
    if self.cancelled.swap(true, Ordering::AcqRel) {
      return;
    }
    self.outbox.cancel();
    let upstream = self.upstream.rc_deref_mut().take();
    if let Some(upstream) = upstream {
      upstream.cancel();
    }
    trace!("receive_on subscription cancelled");
  }

  fn is_closed(&self) -> bool { self.cancelled.load(Ordering::Acquire) || self.outbox.is_closed() }
}

struct ReceiveOnSubscriber<O, E, Sch> {
  outbox: SerializedSubscriber<O, E>,
  link: Arc<ReceiveOnSubscription<O, E>>,
  scheduler: Sch,
}

impl<O, E, Sch> ReceiveOnSubscriber<O, E, Sch>
where
  O: Send + 'static,
  E: Send + 'static,
  Sch: Scheduler,
{
  fn dispatch(&self, event: Event<O, E>) {
    if self.outbox.enqueue(event) {
      let outbox = self.outbox.clone();
      self.scheduler.schedule(Box::new(move || outbox.drain()));
    }
  }
}

impl<O, E, Sch> Subscriber<O, E> for ReceiveOnSubscriber<O, E, Sch>
where
  O: Send + 'static,
  E: Send + 'static,
  Sch: Scheduler,
{
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    self.link.attach(subscription.clone());
    self.outbox.set_upstream(subscription);
    self.dispatch(Event::Subscription(self.link.clone()));
  }

  /// Demand is requested by the downstream once it runs on the scheduler.
  fn receive(&mut self, input: O) -> Demand {
    self.dispatch(Event::Value(input));
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<E>) {
    self.dispatch(Event::Completion(completion));
  }
}
