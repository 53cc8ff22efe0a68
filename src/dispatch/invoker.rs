use crate::base::callerror::CallError;
use crate::base::context::CallResultExt;
use crate::behavior::resolver::{EffectiveBehavior, MetadataResolver};
use crate::call::descriptor::CallDescriptor;
use crate::codec::registry::CodecRegistry;
use crate::dispatch::transport::Transport;
use crate::http::request::RequestAccumulator;
use crate::http::response::RawResponse;
use crate::pipeline::{InvocationContext, Reply, RequestPipeline, ResponsePipeline};
use std::sync::Arc;
use tracing::debug;

/// Runs one call end to end: resolve, build, execute, consume.
///
/// Shared by the synchronous entry points and the async workers.
pub struct Invoker {
    registry: Arc<CodecRegistry>,
    transport: Arc<dyn Transport>,
    request: RequestPipeline,
    response: ResponsePipeline,
}

impl Invoker {
    pub fn new(registry: Arc<CodecRegistry>, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry,
            transport,
            request: RequestPipeline::new(),
            response: ResponsePipeline::new(),
        }
    }

    pub fn registry(&self) -> &Arc<CodecRegistry> {
        &self.registry
    }

    fn behavior(descriptor: &CallDescriptor, force_async: bool) -> EffectiveBehavior {
        let mut behavior = MetadataResolver::resolve(descriptor);
        behavior.is_async |= force_async;
        behavior
    }

    pub fn build_request(&self, descriptor: &CallDescriptor) -> Result<RequestAccumulator, CallError> {
        let behavior = Self::behavior(descriptor, false);
        let ctx = InvocationContext::new(descriptor, &behavior, &self.registry);
        self.request.build(&ctx)
    }

    pub fn consume_response(
        &self,
        descriptor: &CallDescriptor,
        response: RawResponse,
    ) -> Result<Reply, CallError> {
        let behavior = Self::behavior(descriptor, false);
        let ctx = InvocationContext::new(descriptor, &behavior, &self.registry);
        self.response.consume(&ctx, response)
    }

    /// Full call on the current thread. `async_mode` marks the call as
    /// non-blocking for the response stage.
    pub fn run(&self, descriptor: &CallDescriptor, async_mode: bool) -> Result<Reply, CallError> {
        let behavior = Self::behavior(descriptor, async_mode);
        let ctx = InvocationContext::new(descriptor, &behavior, &self.registry);

        let request = self.request.build(&ctx)?;
        debug!(
            call = %ctx.call_id(),
            method = %request.method(),
            url = request.url().map(|u| u.as_str()).unwrap_or_default(),
            "Executing request"
        );
        let response = self
            .transport
            .execute(request)
            .transport_context(ctx.call_id())?;
        self.response.consume(&ctx, response)
    }
}
