//! Request construction.
//!
//! A [`RequestPipeline`] is an ordered list of [`RequestStage`]s, each
//! amending the same [`RequestAccumulator`]. The first failing stage aborts
//! the call and the half-built request is dropped.

pub mod entity;
pub mod form;
pub mod headers;
pub mod intercept;
pub mod path;
pub mod query;
pub mod uri;

pub use entity::EntityStage;
pub use form::FormStage;
pub use headers::HeaderStage;
pub use intercept::InterceptorStage;
pub use path::PathStage;
pub use query::QueryStage;
pub use uri::UriStage;

use crate::base::callerror::{BuildFailure, CallError};
use crate::call::descriptor::Argument;
use crate::call::shape::Rendered;
use crate::http::request::RequestAccumulator;
use crate::pipeline::InvocationContext;
use http::Method;
use tracing::debug;

/// One step of request construction.
pub trait RequestStage: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        ctx: &InvocationContext<'_>,
        request: &mut RequestAccumulator,
    ) -> Result<(), CallError>;
}

/// Ordered request stages.
pub struct RequestPipeline {
    stages: Vec<Box<dyn RequestStage>>,
}

impl Default for RequestPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestPipeline {
    /// The standard order: URI, headers, path, query, form, entity,
    /// interceptors.
    pub fn new() -> Self {
        Self::with_stages(vec![
            Box::new(UriStage),
            Box::new(HeaderStage),
            Box::new(PathStage),
            Box::new(QueryStage),
            Box::new(FormStage),
            Box::new(EntityStage),
            Box::new(InterceptorStage),
        ])
    }

    pub fn with_stages(stages: Vec<Box<dyn RequestStage>>) -> Self {
        Self { stages }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn build(&self, ctx: &InvocationContext<'_>) -> Result<RequestAccumulator, CallError> {
        let mut request = RequestAccumulator::new(ctx.descriptor().method().clone());
        for stage in &self.stages {
            debug!(call = %ctx.call_id(), stage = stage.name(), "Applying request stage");
            stage.apply(ctx, &mut request)?;
        }
        Ok(request)
    }
}

/// POST, PUT and PATCH carry a body.
pub(crate) fn encloses_entity(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

/// Text values of a parameter argument. `Ok(None)` when the value is absent.
pub(crate) fn render_argument(
    param: &str,
    argument: &Argument,
) -> Result<Option<Rendered>, BuildFailure> {
    let Some(value) = argument.value() else {
        return Ok(None);
    };
    argument
        .shape()
        .render(value)
        .map(Some)
        .ok_or_else(|| BuildFailure::NotRenderable {
            param: param.to_string(),
            shape: argument.shape().name(),
        })
}
