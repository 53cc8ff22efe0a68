use crate::base::callerror::CallError;
use crate::base::context::BuildResultExt;
use crate::call::descriptor::ArgRole;
use crate::http::request::RequestAccumulator;
use crate::pipeline::request::{render_argument, RequestStage};
use crate::pipeline::InvocationContext;

/// Static headers from the resolved behavior, then header arguments.
/// Repeated names append; nothing is overwritten.
pub struct HeaderStage;

impl RequestStage for HeaderStage {
    fn name(&self) -> &'static str {
        "headers"
    }

    fn apply(
        &self,
        ctx: &InvocationContext<'_>,
        request: &mut RequestAccumulator,
    ) -> Result<(), CallError> {
        let call = ctx.call_id();
        for (name, value) in &ctx.behavior().headers {
            request.append_header(name, value).build_context(call)?;
        }

        for argument in ctx.descriptor().arguments() {
            let ArgRole::Header(name) = argument.role() else {
                continue;
            };
            let Some(rendered) = render_argument(name, argument).build_context(call)? else {
                continue;
            };
            for value in rendered.into_values() {
                request.append_header(name, &value).build_context(call)?;
            }
        }
        Ok(())
    }
}
