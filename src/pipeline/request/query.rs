use crate::base::callerror::CallError;
use crate::base::context::BuildResultExt;
use crate::call::descriptor::ArgRole;
use crate::http::request::RequestAccumulator;
use crate::pipeline::request::{render_argument, RequestStage};
use crate::pipeline::InvocationContext;

/// Appends static query parameters, then query arguments. Multi-valued
/// arguments repeat the name; absent arguments are skipped.
pub struct QueryStage;

impl RequestStage for QueryStage {
    fn name(&self) -> &'static str {
        "query"
    }

    fn apply(
        &self,
        ctx: &InvocationContext<'_>,
        request: &mut RequestAccumulator,
    ) -> Result<(), CallError> {
        let call = ctx.call_id();
        let descriptor = ctx.descriptor();
        let mut pairs: Vec<(String, String)> = descriptor.call().static_query().to_vec();

        for argument in descriptor.arguments() {
            let ArgRole::Query(name) = argument.role() else {
                continue;
            };
            if let Some(rendered) = render_argument(name, argument).build_context(call)? {
                pairs.extend(rendered.into_values().into_iter().map(|v| (name.clone(), v)));
            }
        }

        if pairs.is_empty() {
            return Ok(());
        }
        let url = request.url_mut().build_context(call)?;
        url.query_pairs_mut().extend_pairs(pairs);
        Ok(())
    }
}
