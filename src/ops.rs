//! Operators.
//!
//! Each operator is an immutable publisher wrapping its source. Subscribing
//! to it installs an intermediate subscriber on the source that transforms
//! what flows through. None of the synchronous operators buffer, so they
//! hand the upstream subscription straight to their downstream and demand
//! passes through untouched.
pub mod decode;
pub mod filter;
pub mod into_future;
pub mod into_stream;
pub mod map;
pub mod map_err;
pub mod receive_on;
pub mod try_map;
