//! Error types of the pipeline.
//!
//! Cancellation is never an error: a cancelled subscription simply stops.
//! Every failure that does flow through a pipeline is one of these types,
//! and all of them are `Clone` so subjects and futures can replay them.

use std::convert::Infallible;

use serde_json::error::Category;
use thiserror::Error;

/// A payload could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
  /// The input is not syntactically valid.
  #[error("syntax error at line {line}, column {column}: {message}")]
  Syntax { line: usize, column: usize, message: String },
  /// The input is valid but does not match the target type.
  #[error("data error at line {line}, column {column}: {message}")]
  Data { line: usize, column: usize, message: String },
  /// The input ended before a complete value was read.
  #[error("unexpected end of input at line {line}, column {column}")]
  Eof { line: usize, column: usize },
  #[error("io error while decoding: {message}")]
  Io { message: String },
}

impl From<serde_json::Error> for DecodeError {
  fn from(error: serde_json::Error) -> Self {
    let (line, column) = (error.line(), error.column());
    match error.classify() {
      Category::Syntax => DecodeError::Syntax { line, column, message: error.to_string() },
      Category::Data => DecodeError::Data { line, column, message: error.to_string() },
      Category::Eof => DecodeError::Eof { line, column },
      Category::Io => DecodeError::Io { message: error.to_string() },
    }
  }
}

/// The fetch collaborator failed to produce bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
  #[error("transport error: {0}")]
  Transport(String),
  #[error("unexpected status {0}")]
  Status(u16),
  #[error("request cancelled")]
  Cancelled,
}

/// Failure type of a fetch-then-decode pipeline.
///
/// `try_map` and `decode` widen upstream failures into this type through
/// the `From` conversions below.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
  #[error(transparent)]
  Fetch(#[from] FetchError),
  #[error(transparent)]
  Decode(#[from] DecodeError),
  #[error("transform failed: {0}")]
  Transform(String),
}

impl From<Infallible> for PipelineError {
  fn from(never: Infallible) -> Self { match never {} }
}
