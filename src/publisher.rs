//! Publisher trait and the built-in sources.
//!
//! A publisher is an inert description of a stream. Nothing happens until
//! [`subscribe`](Publisher::subscribe) is called, and the same publisher may
//! be subscribed any number of times; every subscription is independent.
//!
//! Operators live on [`PublisherExt`], which is implemented for every
//! publisher.

use std::convert::Infallible;

use crate::{
  completion::Completion,
  decoder::Decoder,
  error::DecodeError,
  ops::{
    decode::DecodeOp, filter::FilterOp, into_future::PublisherFuture,
    into_stream::PublisherStream, map::MapOp, map_err::MapErrOp, receive_on::ReceiveOnOp,
    try_map::TryMapOp,
  },
  scheduler::Scheduler,
  subscriber::{Sink, Subscriber},
  subscription::AnyCancellable,
};

mod any;
mod future;
mod just;
mod sequence;

pub use any::{AnyPublisher, DynPublisher};
pub use future::{Future, Promise};
pub use just::{Empty, Fail, Just};
pub use sequence::Sequence;
pub(crate) use sequence::subscribe_iter;

// ============================================================================
// Publisher Trait
// ============================================================================

/// The producer side of a stream.
///
/// `subscribe` attaches `subscriber` and returns the token that keeps the
/// subscription alive. The subscriber receives its subscription before
/// `subscribe` returns for every publisher in this crate.
pub trait Publisher {
  type Output;
  type Failure;

  fn subscribe<S>(&self, subscriber: S) -> AnyCancellable
  where
    S: Subscriber<Self::Output, Self::Failure> + 'static;
}

impl<P: Publisher + ?Sized> Publisher for &P {
  type Output = P::Output;
  type Failure = P::Failure;

  #[inline]
  fn subscribe<S>(&self, subscriber: S) -> AnyCancellable
  where
    S: Subscriber<Self::Output, Self::Failure> + 'static,
  {
    (**self).subscribe(subscriber)
  }
}

// ============================================================================
// Operators
// ============================================================================

/// Operators available on every [`Publisher`].
pub trait PublisherExt: Publisher {
  /// Transform every value with `f`. Completion is forwarded unchanged.
  fn map<B, F>(self, f: F) -> MapOp<Self, F>
  where
    Self: Sized,
    F: Fn(Self::Output) -> B + Send + Sync + 'static,
  {
    MapOp::new(self, f)
  }

  /// Transform every value with a fallible `f`.
  ///
  /// The first `Err` cancels the upstream and becomes the single terminal
  /// event; the failing item produces no value. Upstream failures are widened
  /// into `E2` with `From`.
  fn try_map<B, E2, F>(self, f: F) -> TryMapOp<Self, F>
  where
    Self: Sized,
    F: Fn(Self::Output) -> Result<B, E2> + Send + Sync + 'static,
    E2: From<Self::Failure>,
  {
    TryMapOp::new(self, f)
  }

  /// Forward only the values for which `predicate` returns `true`.
  ///
  /// A suppressed value still consumes the unit of demand it was delivered
  /// under; the filter never asks the upstream for a replacement.
  fn filter<F>(self, predicate: F) -> FilterOp<Self, F>
  where
    Self: Sized,
    F: Fn(&Self::Output) -> bool + Send + Sync + 'static,
  {
    FilterOp::new(self, predicate)
  }

  /// Decode every byte-like value with `decoder`. A decode error fails the
  /// stream exactly like a failing [`try_map`](PublisherExt::try_map).
  fn decode<T, D, E2>(self, decoder: D) -> DecodeOp<Self, D, T, E2>
  where
    Self: Sized,
    Self::Output: AsRef<[u8]>,
    D: Decoder<T> + 'static,
    E2: From<Self::Failure> + From<DecodeError>,
  {
    DecodeOp::new(self, decoder)
  }

  /// Transform the failure with `f`. Values pass through unchanged.
  fn map_err<E2, F>(self, f: F) -> MapErrOp<Self, F>
  where
    Self: Sized,
    F: Fn(Self::Failure) -> E2 + Send + Sync + 'static,
  {
    MapErrOp::new(self, f)
  }

  /// Hide the concrete publisher type behind an [`AnyPublisher`].
  fn erase(self) -> AnyPublisher<Self::Output, Self::Failure>
  where
    Self: Sized + Send + Sync + 'static,
    Self::Output: 'static,
    Self::Failure: 'static,
  {
    AnyPublisher::new(self)
  }

  /// Deliver subscription, values and completion on `scheduler`.
  fn receive_on<Sch>(self, scheduler: Sch) -> ReceiveOnOp<Self, Sch>
  where
    Self: Sized,
    Sch: Scheduler,
  {
    ReceiveOnOp::new(self, scheduler)
  }

  /// Attach closures as an unlimited-demand subscriber.
  fn sink<FC, FV>(&self, receive_completion: FC, receive_value: FV) -> AnyCancellable
  where
    FC: FnOnce(Completion<Self::Failure>) + Send + 'static,
    FV: FnMut(Self::Output) + Send + 'static,
    Self::Output: 'static,
    Self::Failure: 'static,
  {
    self.subscribe(Sink::new(receive_completion, receive_value))
  }

  /// [`sink`](PublisherExt::sink) for publishers that cannot fail.
  fn sink_value<FV>(&self, receive_value: FV) -> AnyCancellable
  where
    Self: Publisher<Failure = Infallible>,
    FV: FnMut(Self::Output) + Send + 'static,
    Self::Output: 'static,
  {
    self.subscribe(Sink::values(receive_value))
  }

  /// Subscribe now and resolve to the single value of this publisher.
  fn into_future(&self) -> PublisherFuture<Self::Output, Self::Failure>
  where
    Self::Output: Send + 'static,
    Self::Failure: Send + 'static,
  {
    PublisherFuture::new(self)
  }

  /// Subscribe now and poll the values one demand unit at a time.
  fn into_stream(&self) -> PublisherStream<Self::Output, Self::Failure>
  where
    Self::Output: Send + 'static,
    Self::Failure: Send + 'static,
  {
    PublisherStream::new(self)
  }
}

impl<P: Publisher + ?Sized> PublisherExt for P {}
