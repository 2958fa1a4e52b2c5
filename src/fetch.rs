//! The fetch collaborator.
//!
//! Transport lives outside this crate. A pipeline only needs something that
//! hands out a fresh publisher of raw bytes each time it is asked; retrying
//! is asking again.

use crate::{error::FetchError, publisher::Publisher};

/// Raw payload produced by a fetch.
pub type Bytes = Vec<u8>;

pub trait Fetch {
  type Publisher: Publisher<Output = Bytes, Failure = FetchError>;

  fn fetch(&self) -> Self::Publisher;
}

impl<F, P> Fetch for F
where
  F: Fn() -> P,
  P: Publisher<Output = Bytes, Failure = FetchError>,
{
  type Publisher = P;

  #[inline]
  fn fetch(&self) -> P { self() }
}
