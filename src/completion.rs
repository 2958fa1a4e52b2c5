//! The terminal event of a subscription.

/// Terminal event: the stream either finished normally or failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Completion<E> {
  Finished,
  Failure(E),
}

impl<E> Completion<E> {
  #[inline]
  pub fn is_finished(&self) -> bool { matches!(self, Completion::Finished) }

  #[inline]
  pub fn is_failure(&self) -> bool { matches!(self, Completion::Failure(_)) }

  pub fn failure(self) -> Option<E> {
    match self {
      Completion::Finished => None,
      Completion::Failure(e) => Some(e),
    }
  }

  /// Transform the failure, leaving `Finished` untouched.
  pub fn map_failure<E2>(self, f: impl FnOnce(E) -> E2) -> Completion<E2> {
    match self {
      Completion::Finished => Completion::Finished,
      Completion::Failure(e) => Completion::Failure(f(e)),
    }
  }
}

impl<E> From<Result<(), E>> for Completion<E> {
  fn from(result: Result<(), E>) -> Self {
    match result {
      Ok(()) => Completion::Finished,
      Err(e) => Completion::Failure(e),
    }
  }
}
