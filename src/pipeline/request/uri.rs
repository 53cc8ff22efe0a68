use crate::base::callerror::{BuildFailure, CallError};
use crate::base::context::BuildResultExt;
use crate::http::request::RequestAccumulator;
use crate::pipeline::request::RequestStage;
use crate::pipeline::InvocationContext;
use url::Url;

/// Joins the endpoint base URL and the call's sub-path with one `/`.
pub struct UriStage;

impl RequestStage for UriStage {
    fn name(&self) -> &'static str {
        "uri"
    }

    fn apply(
        &self,
        ctx: &InvocationContext<'_>,
        request: &mut RequestAccumulator,
    ) -> Result<(), CallError> {
        let descriptor = ctx.descriptor();
        let mut url = Url::parse(descriptor.endpoint().base_url())
            .map_err(BuildFailure::from)
            .build_context(ctx.call_id())?;

        let path = join_path(url.path(), descriptor.call().path());
        url.set_path(&path);

        request.set_url(url);
        Ok(())
    }
}

/// Joins a base path and a sub-path with exactly one `/` between them.
pub(crate) fn join_path(base: &str, sub: &str) -> String {
    let base = base.trim_end_matches('/');
    let sub = sub.trim_start_matches('/');
    match (base.is_empty(), sub.is_empty()) {
        (true, true) => "/".to_string(),
        (_, true) => base.to_string(),
        _ => format!("{}/{}", base, sub),
    }
}
