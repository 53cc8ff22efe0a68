//! Base types and error handling.
//!
//! Provides the foundational types every other module builds on:
//! - [`CallError`]: classified call failures carrying the call identity
//! - [`CallState`]: lifecycle of an asynchronously dispatched call

pub mod callerror;
pub mod callstate;
pub mod context;

pub use callerror::{BoxError, BuildFailure, CallError, CallErrorKind, CodecError};
pub use callstate::CallState;
