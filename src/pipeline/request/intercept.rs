use crate::base::callerror::CallError;
use crate::base::context::BuildResultExt;
use crate::behavior::interceptor::InterceptorChain;
use crate::http::request::RequestAccumulator;
use crate::pipeline::request::RequestStage;
use crate::pipeline::InvocationContext;

/// Runs the resolved interceptors in order.
pub struct InterceptorStage;

impl RequestStage for InterceptorStage {
    fn name(&self) -> &'static str {
        "interceptors"
    }

    fn apply(
        &self,
        ctx: &InvocationContext<'_>,
        request: &mut RequestAccumulator,
    ) -> Result<(), CallError> {
        InterceptorChain::new(&ctx.behavior().interceptors)
            .run(ctx, request)
            .build_context(ctx.call_id())
    }
}
