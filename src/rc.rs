//! Shared mutable cells used by every stateful stage.
//!
//! All shared state in the runtime (subject registries, future result cells,
//! serialized delivery queues) lives behind a [`MutArc`]. A poisoned lock is
//! recovered rather than propagated: a panicking subscriber must not wedge
//! every other subscriber of the same subject.

use std::{
  fmt::{Debug, Formatter},
  sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

#[derive(Default)]
pub struct MutArc<T>(Arc<Mutex<T>>);

/// Non-owning back-reference to a [`MutArc`].
pub struct WeakMutArc<T>(Weak<Mutex<T>>);

impl<T> MutArc<T> {
  pub fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }

  #[inline]
  pub fn rc_deref_mut(&self) -> MutexGuard<'_, T> {
    self.0.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn downgrade(&self) -> WeakMutArc<T> { WeakMutArc(Arc::downgrade(&self.0)) }
}

impl<T> WeakMutArc<T> {
  pub fn upgrade(&self) -> Option<MutArc<T>> { self.0.upgrade().map(MutArc) }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Clone for WeakMutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> Default for WeakMutArc<T> {
  fn default() -> Self { Self(Weak::new()) }
}

impl<T> Debug for MutArc<T> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MutArc")
      .field("strong", &Arc::strong_count(&self.0))
      .finish()
  }
}
