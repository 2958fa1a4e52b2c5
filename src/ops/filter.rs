use std::sync::Arc;

use crate::{
  completion::Completion,
  demand::Demand,
  publisher::Publisher,
  subscriber::Subscriber,
  subscription::{AnyCancellable, SubscriptionRef},
};

/// Publisher returned by [`PublisherExt::filter`](crate::publisher::PublisherExt::filter).
pub struct FilterOp<S, F> {
  source: S,
  predicate: Arc<F>,
}

impl<S, F> FilterOp<S, F> {
  pub(crate) fn new(source: S, predicate: F) -> Self {
    FilterOp { source, predicate: Arc::new(predicate) }
  }
}

impl<S: Clone, F> Clone for FilterOp<S, F> {
  fn clone(&self) -> Self {
    FilterOp { source: self.source.clone(), predicate: self.predicate.clone() }
  }
}

impl<S, F> Publisher for FilterOp<S, F>
where
  S: Publisher,
  F: Fn(&S::Output) -> bool + Send + Sync + 'static,
{
  type Output = S::Output;
  type Failure = S::Failure;

  fn subscribe<Sub>(&self, subscriber: Sub) -> AnyCancellable
  where
    Sub: Subscriber<S::Output, S::Failure> + 'static,
  {
    self
      .source
      .subscribe(FilterSubscriber { downstream: subscriber, predicate: self.predicate.clone() })
  }
}

pub struct FilterSubscriber<Sub, F> {
  downstream: Sub,
  predicate: Arc<F>,
}

impl<Item, E, Sub, F> Subscriber<Item, E> for FilterSubscriber<Sub, F>
where
  Sub: Subscriber<Item, E>,
  F: Fn(&Item) -> bool + Send + Sync,
{
  #[inline]
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    self.downstream.receive_subscription(subscription)
  }

  /// A dropped value asks for nothing more: the demand it used is spent.
  fn receive(&mut self, input: Item) -> Demand {
    if (self.predicate)(&input) {
      self.downstream.receive(input)
    } else {
      Demand::NONE
    }
  }

  #[inline]
  fn receive_completion(&mut self, completion: Completion<E>) {
    self.downstream.receive_completion(completion)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use crate::{prelude::*, subscription::SubscriptionRef};

  #[rxcombine_macro::test]
  fn keeps_matching_values() {
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _token = Sequence::new(0..10)
      .filter(|v| v % 3 == 0)
      .sink_value(move |v| c_seen.lock().unwrap().push(v));
    assert_eq!(*seen.lock().unwrap(), vec![0, 3, 6, 9]);
  }

  struct TakeTwo {
    seen: Arc<Mutex<Vec<i32>>>,
    finished: Arc<Mutex<bool>>,
  }

  impl Subscriber<i32, std::convert::Infallible> for TakeTwo {
    fn receive_subscription(&mut self, subscription: SubscriptionRef) {
      subscription.request(Demand::max(2));
    }

    fn receive(&mut self, input: i32) -> Demand {
      self.seen.lock().unwrap().push(input);
      Demand::NONE
    }

    fn receive_completion(&mut self, _: Completion<std::convert::Infallible>) {
      *self.finished.lock().unwrap() = true;
    }
  }

  #[rxcombine_macro::test]
  fn dropped_values_consume_demand() {
    let seen = Arc::new(Mutex::new(vec![]));
    let finished = Arc::new(Mutex::new(false));
    let _token = Sequence::new(vec![1, 2, 3, 4])
      .filter(|v| v % 2 == 0)
      .subscribe(TakeTwo { seen: seen.clone(), finished: finished.clone() });

    // Demand of two is spent on 1 and 2; only 2 passes the filter.
    assert_eq!(*seen.lock().unwrap(), vec![2]);
    assert!(!*finished.lock().unwrap());
  }
}
