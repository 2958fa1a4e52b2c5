//! Subscriptions and cancellation tokens.
//!
//! A [`Subscription`] is the live link between one publisher stage and one
//! subscriber: the subscriber requests [`Demand`] through it and may cancel
//! it. The caller of `subscribe` receives an [`AnyCancellable`], a scoped
//! token that cancels the subscription when dropped or when
//! [`cancel`](AnyCancellable::cancel) is called explicitly.

use std::{
  fmt::{Debug, Formatter},
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use smallvec::SmallVec;

use crate::{demand::Demand, rc::MutArc};

mod registry;
pub(crate) use registry::Registry;

/// The subscriber side of the demand protocol.
///
/// Implementations must make `cancel` idempotent and silent: the second call
/// has no effect and cancellation never produces a completion.
pub trait Subscription: Send + Sync {
  /// Add `demand` to the outstanding demand of this subscription.
  fn request(&self, demand: Demand);

  /// Stop all deliveries that have not started yet and release upstream
  /// resources.
  fn cancel(&self);

  fn is_closed(&self) -> bool;
}

/// Shared handle to a live subscription.
pub type SubscriptionRef = Arc<dyn Subscription>;

impl Debug for dyn Subscription {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("dyn Subscription")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}

// ============================================================================
// EmptySubscription
// ============================================================================

/// Subscription of a source that has nothing to deliver on demand.
///
/// Used by sources that complete during `subscribe` (`Empty`, `Fail`, a
/// subject that already terminated).
#[derive(Debug, Default)]
pub struct EmptySubscription {
  cancelled: AtomicBool,
}

impl EmptySubscription {
  pub fn new() -> Self { Self::default() }

  pub fn cancelled() -> Self { Self { cancelled: AtomicBool::new(true) } }
}

impl Subscription for EmptySubscription {
  fn request(&self, _demand: Demand) {}

  fn cancel(&self) { self.cancelled.store(true, Ordering::Release); }

  fn is_closed(&self) -> bool { self.cancelled.load(Ordering::Acquire) }
}

// ============================================================================
// FnSubscription
// ============================================================================

/// Subscription whose cancellation runs a teardown closure at most once.
pub struct FnSubscription {
  teardown: MutArc<Option<Box<dyn FnOnce() + Send>>>,
  cancelled: AtomicBool,
}

impl FnSubscription {
  pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
    Self {
      teardown: MutArc::own(Some(Box::new(teardown))),
      cancelled: AtomicBool::new(false),
    }
  }
}

impl Subscription for FnSubscription {
  fn request(&self, _demand: Demand) {}

  fn cancel(&self) {
    if self.cancelled.swap(true, Ordering::AcqRel) {
      return;
    }
    let teardown = self.teardown.rc_deref_mut().take();
    if let Some(teardown) = teardown {
      teardown();
    }
  }

  fn is_closed(&self) -> bool { self.cancelled.load(Ordering::Acquire) }
}

// ============================================================================
// AnyCancellable
// ============================================================================

/// Caller-held token for one live subscription.
///
/// The token must be retained for as long as the pipeline should stay
/// alive. Dropping it cancels the subscription, so an unused return value
/// tears the pipeline down immediately.
///
/// If you want to keep a subscription alive together with others, put it in
/// a [`CancellableBag`] with [`store`](AnyCancellable::store).
#[must_use = "dropping an AnyCancellable cancels its subscription"]
pub struct AnyCancellable(Option<SubscriptionRef>);

impl AnyCancellable {
  pub fn new(subscription: SubscriptionRef) -> Self { AnyCancellable(Some(subscription)) }

  /// A token that runs `teardown` the first time it is cancelled.
  pub fn from_fn(teardown: impl FnOnce() + Send + 'static) -> Self {
    AnyCancellable::new(Arc::new(FnSubscription::new(teardown)))
  }

  /// Explicit dispose. Idempotent.
  pub fn cancel(&self) {
    if let Some(subscription) = &self.0 {
      subscription.cancel();
    }
  }

  pub fn is_closed(&self) -> bool { self.0.as_ref().map_or(true, |s| s.is_closed()) }

  /// Request more demand on the underlying subscription.
  pub fn request(&self, demand: Demand) {
    if let Some(subscription) = &self.0 {
      subscription.request(demand);
    }
  }

  /// Move this token into `bag`; the subscription then lives as long as the
  /// bag does.
  pub fn store(self, bag: &mut CancellableBag) { bag.insert(self); }

  /// Release the underlying subscription without cancelling it.
  ///
  /// Operators use this to hand the upstream subscription to their own
  /// cancellation logic. The caller becomes responsible for cancelling it.
  pub fn into_subscription(mut self) -> SubscriptionRef {
    self
      .0
      .take()
      .unwrap_or_else(|| Arc::new(EmptySubscription::cancelled()))
  }
}

impl Drop for AnyCancellable {
  #[inline]
  fn drop(&mut self) {
    if let Some(subscription) = self.0.take() {
      subscription.cancel();
    }
  }
}

impl Debug for AnyCancellable {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AnyCancellable")
      .field("is_closed", &self.is_closed())
      .finish()
  }
}

// ============================================================================
// CancellableBag
// ============================================================================

/// Owns a group of [`AnyCancellable`]s; dropping the bag cancels all of them.
#[derive(Debug, Default)]
pub struct CancellableBag {
  teardown: SmallVec<[AnyCancellable; 2]>,
}

impl CancellableBag {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, cancellable: AnyCancellable) {
    self.teardown.retain(|c| !c.is_closed());
    self.teardown.push(cancellable);
  }

  pub fn len(&self) -> usize { self.teardown.len() }

  pub fn is_empty(&self) -> bool { self.teardown.is_empty() }

  /// Cancel every stored subscription and empty the bag.
  pub fn cancel_all(&mut self) {
    for cancellable in self.teardown.drain(..) {
      cancellable.cancel();
    }
  }
}

impl Extend<AnyCancellable> for CancellableBag {
  fn extend<I: IntoIterator<Item = AnyCancellable>>(&mut self, iter: I) {
    for cancellable in iter {
      self.insert(cancellable);
    }
  }
}
