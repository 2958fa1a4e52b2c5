//! Byte decoders used by [`decode`](crate::publisher::PublisherExt::decode).

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::error::DecodeError;

/// Turns a byte payload into a `T`.
pub trait Decoder<T>: Send + Sync {
  fn decode(&self, bytes: &[u8]) -> Result<T, DecodeError>;
}

impl<T, F> Decoder<T> for F
where
  F: Fn(&[u8]) -> Result<T, DecodeError> + Send + Sync,
{
  #[inline]
  fn decode(&self, bytes: &[u8]) -> Result<T, DecodeError> { self(bytes) }
}

/// JSON decoder backed by `serde_json`.
pub struct JsonDecoder<T>(PhantomData<fn() -> T>);

impl<T> JsonDecoder<T> {
  pub fn new() -> Self { JsonDecoder(PhantomData) }
}

impl<T> Default for JsonDecoder<T> {
  fn default() -> Self { Self::new() }
}

impl<T> Clone for JsonDecoder<T> {
  fn clone(&self) -> Self { Self::new() }
}

impl<T: DeserializeOwned> Decoder<T> for JsonDecoder<T> {
  fn decode(&self, bytes: &[u8]) -> Result<T, DecodeError> {
    serde_json::from_slice(bytes).map_err(DecodeError::from)
  }
}
