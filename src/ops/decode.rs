use std::{marker::PhantomData, sync::Arc};

use super::try_map::TryMapSubscriber;
use crate::{
  decoder::Decoder,
  error::DecodeError,
  publisher::Publisher,
  subscriber::Subscriber,
  subscription::AnyCancellable,
};

/// Publisher returned by [`PublisherExt::decode`](crate::publisher::PublisherExt::decode).
///
/// Every upstream value is decoded into `T`. The first decode error cancels
/// the upstream and fails the stream with `E2::from(error)`.
pub struct DecodeOp<S, D, T, E2> {
  source: S,
  decoder: Arc<D>,
  _p: PhantomData<fn() -> (T, E2)>,
}

impl<S, D, T, E2> DecodeOp<S, D, T, E2> {
  pub(crate) fn new(source: S, decoder: D) -> Self {
    DecodeOp { source, decoder: Arc::new(decoder), _p: PhantomData }
  }
}

impl<S: Clone, D, T, E2> Clone for DecodeOp<S, D, T, E2> {
  fn clone(&self) -> Self {
    DecodeOp { source: self.source.clone(), decoder: self.decoder.clone(), _p: PhantomData }
  }
}

impl<S, D, T, E2> Publisher for DecodeOp<S, D, T, E2>
where
  S: Publisher,
  S::Output: AsRef<[u8]> + 'static,
  S::Failure: 'static,
  D: Decoder<T> + 'static,
  E2: From<S::Failure> + From<DecodeError>,
{
  type Output = T;
  type Failure = E2;

  fn subscribe<Sub>(&self, subscriber: Sub) -> AnyCancellable
  where
    Sub: Subscriber<T, E2> + 'static,
  {
    let decoder = self.decoder.clone();
    let decode = move |bytes: S::Output| decoder.decode(bytes.as_ref()).map_err(E2::from);
    self
      .source
      .subscribe(TryMapSubscriber::new(subscriber, Arc::new(decode)))
  }
}
