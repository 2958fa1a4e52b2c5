//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

// Protocol values
pub use crate::{completion::Completion, demand::Demand};
// Collaborators
pub use crate::{
  decoder::{Decoder, JsonDecoder},
  fetch::{Bytes, Fetch},
};
// Errors
pub use crate::error::{DecodeError, FetchError, PipelineError};
// Operators
pub use crate::ops::{
  into_future::{IntoFutureError, PublisherFuture},
  into_stream::PublisherStream,
};
// Publishers and sources
pub use crate::publisher::{
  AnyPublisher, DynPublisher, Empty, Fail, Future, Just, Promise, Publisher, PublisherExt,
  Sequence,
};
// Schedulers
#[cfg(feature = "futures-scheduler")]
pub use crate::scheduler::{ThreadPoolScheduler, ThreadPoolSchedulerBuilder};
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::TokioScheduler;
pub use crate::scheduler::{ImmediateScheduler, Scheduler, SchedulerError, TestScheduler};
// Subjects
pub use crate::subject::{CurrentValueSubject, PassthroughSubject};
// Subscribers and subscriptions
pub use crate::subscriber::{BoxedSubscriber, Sink, Subscriber};
pub use crate::subscription::{AnyCancellable, CancellableBag, Subscription, SubscriptionRef};
