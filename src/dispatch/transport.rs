//! The network side of a call.
//!
//! The engine never opens connections itself; it hands the finished
//! [`RequestAccumulator`] to a [`Transport`] and consumes what comes back.

use crate::base::callerror::BoxError;
use crate::http::request::RequestAccumulator;
use crate::http::response::RawResponse;

/// Executes a built request and returns the full response. Blocking.
pub trait Transport: Send + Sync + 'static {
    fn execute(&self, request: RequestAccumulator) -> Result<RawResponse, BoxError>;
}

/// Transport backed by a closure. See [`transport_fn`].
pub struct FnTransport<F>(F);

impl<F> Transport for FnTransport<F>
where
    F: Fn(RequestAccumulator) -> Result<RawResponse, BoxError> + Send + Sync + 'static,
{
    fn execute(&self, request: RequestAccumulator) -> Result<RawResponse, BoxError> {
        (self.0)(request)
    }
}

/// Wraps a closure as a [`Transport`].
///
/// ```rust,ignore
/// let transport = transport_fn(|req| {
///     Ok(RawResponse::new(StatusCode::OK).with_body(req.url().unwrap().to_string()))
/// });
/// ```
pub fn transport_fn<F>(f: F) -> FnTransport<F>
where
    F: Fn(RequestAccumulator) -> Result<RawResponse, BoxError> + Send + Sync + 'static,
{
    FnTransport(f)
}
