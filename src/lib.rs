//! # rxcombine: demand-driven reactive streams
//!
//! Publishers, subscribers, subjects and futures with explicit
//! backpressure: a publisher only emits what its subscriber has requested.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use rxcombine::prelude::*;
//!
//! let seen = Arc::new(Mutex::new(vec![]));
//! let c_seen = seen.clone();
//! let _token = Sequence::new(0..10)
//!   .filter(|v| v % 2 == 0)
//!   .map(|v| v * 2)
//!   .sink_value(move |v| c_seen.lock().unwrap().push(v));
//!
//! assert_eq!(*seen.lock().unwrap(), vec![0, 4, 8, 12, 16]);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Publisher`] | Inert description of a stream; operators via [`PublisherExt`] |
//! | [`Subscriber`] | Receives a subscription, values, then at most one completion |
//! | [`Subscription`] | Requests [`Demand`] and cancels |
//! | [`AnyCancellable`] | Token returned by `subscribe`; dropping it cancels |
//! | [`PassthroughSubject`] / [`CurrentValueSubject`] | Imperatively fed multicast publishers |
//! | [`Future`] | Eager single-value publisher resolved through a [`Promise`] |
//!
//! ## Feature Flags
//!
//! - **`futures-scheduler`** (default): `ThreadPoolScheduler` on a `futures`
//!   thread pool
//! - **`tokio-scheduler`**: `TokioScheduler` on a tokio runtime
//!
//! [`Publisher`]: publisher::Publisher
//! [`PublisherExt`]: publisher::PublisherExt
//! [`Subscriber`]: subscriber::Subscriber
//! [`Subscription`]: subscription::Subscription
//! [`Demand`]: demand::Demand
//! [`AnyCancellable`]: subscription::AnyCancellable
//! [`PassthroughSubject`]: subject::PassthroughSubject
//! [`CurrentValueSubject`]: subject::CurrentValueSubject
//! [`Future`]: publisher::Future
//! [`Promise`]: publisher::Promise

pub mod completion;
pub mod decoder;
pub mod demand;
pub mod error;
pub mod fetch;
pub mod ops;
pub mod prelude;
pub mod publisher;
pub mod rc;
pub mod scheduler;
pub mod subject;
pub mod subscriber;
pub mod subscription;

pub use prelude::*;

#[cfg(doctest)]
mod __markdown_doctests {
  mod readme {
    #![doc = include_str!("../README.md")]
  }
}
