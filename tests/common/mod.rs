//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use rxcombine::prelude::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Seen<O, E> {
  Value(O),
  Done(Completion<E>),
}

/// Subscriber that records everything it receives.
///
/// It requests `initial` demand on subscription and keeps the subscription
/// so the test can request more or cancel later through its [`Handle`].
pub struct Recorder<O, E> {
  initial: Demand,
  handle: Handle<O, E>,
}

pub struct Handle<O, E> {
  seen: Arc<Mutex<Vec<Seen<O, E>>>>,
  subscription: Arc<Mutex<Option<SubscriptionRef>>>,
}

impl<O, E> Clone for Handle<O, E> {
  fn clone(&self) -> Self {
    Handle { seen: self.seen.clone(), subscription: self.subscription.clone() }
  }
}

pub fn recorder<O, E>(initial: Demand) -> (Recorder<O, E>, Handle<O, E>) {
  let handle = Handle { seen: Arc::default(), subscription: Arc::default() };
  (Recorder { initial, handle: handle.clone() }, handle)
}

impl<O: Clone, E: Clone> Handle<O, E> {
  pub fn seen(&self) -> Vec<Seen<O, E>> { self.seen.lock().unwrap().clone() }

  pub fn values(&self) -> Vec<O> {
    self
      .seen()
      .into_iter()
      .filter_map(|s| match s {
        Seen::Value(v) => Some(v),
        Seen::Done(_) => None,
      })
      .collect()
  }

  pub fn completions(&self) -> Vec<Completion<E>> {
    self
      .seen()
      .into_iter()
      .filter_map(|s| match s {
        Seen::Value(_) => None,
        Seen::Done(c) => Some(c),
      })
      .collect()
  }

  /// Requests more through the stored subscription; a no-op once the
  /// recorder has completed.
  pub fn request(&self, demand: Demand) {
    let subscription = self.subscription.lock().unwrap().clone();
    if let Some(subscription) = subscription {
      subscription.request(demand);
    }
  }

  pub fn cancel(&self) {
    let subscription = self.subscription.lock().unwrap().take();
    if let Some(subscription) = subscription {
      subscription.cancel();
    }
  }
}

impl<O: Send, E: Send> Subscriber<O, E> for Recorder<O, E> {
  fn receive_subscription(&mut self, subscription: SubscriptionRef) {
    *self.handle.subscription.lock().unwrap() = Some(subscription.clone());
    subscription.request(self.initial);
  }

  fn receive(&mut self, input: O) -> Demand {
    self.handle.seen.lock().unwrap().push(Seen::Value(input));
    Demand::NONE
  }

  fn receive_completion(&mut self, completion: Completion<E>) {
    self.handle.seen.lock().unwrap().push(Seen::Done(completion));
    self.handle.subscription.lock().unwrap().take();
  }
}
