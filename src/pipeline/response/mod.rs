//! Response consumption: header capture, then the return value.

pub mod entity;
pub mod headers;

pub use entity::ResponseEntityStage;
pub use headers::{HeaderSlot, ResponseHeaderStage};

use crate::base::callerror::CallError;
use crate::call::shape::OwnedValue;
use crate::http::response::RawResponse;
use crate::pipeline::InvocationContext;
use tracing::debug;

/// The result of a successful call: the response and the decoded value.
#[derive(Debug)]
pub struct Reply {
    response: RawResponse,
    value: Option<OwnedValue>,
}

impl Reply {
    pub fn new(response: RawResponse, value: Option<OwnedValue>) -> Self {
        Self { response, value }
    }

    pub fn response(&self) -> &RawResponse {
        &self.response
    }

    pub fn value(&self) -> Option<&OwnedValue> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<OwnedValue> {
        self.value
    }

    pub fn into_parts(self) -> (RawResponse, Option<OwnedValue>) {
        (self.response, self.value)
    }

    /// The decoded value as `T`. `Ok(None)` when no value was produced;
    /// `Err` returns the value untouched when it has another type.
    pub fn downcast<T: 'static>(self) -> Result<Option<T>, OwnedValue> {
        match self.value {
            None => Ok(None),
            Some(value) => value.downcast::<T>().map(|v| Some(*v)),
        }
    }
}

/// Header stage followed by entity stage.
#[derive(Default)]
pub struct ResponsePipeline {
    headers: ResponseHeaderStage,
    entity: ResponseEntityStage,
}

impl ResponsePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consume(
        &self,
        ctx: &InvocationContext<'_>,
        response: RawResponse,
    ) -> Result<Reply, CallError> {
        debug!(call = %ctx.call_id(), status = %response.status(), "Consuming response");
        self.headers.apply(ctx, &response);
        let value = self.entity.apply(ctx, &response)?;
        Ok(Reply::new(response, value))
    }
}
