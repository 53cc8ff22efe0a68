use crate::base::callerror::CallError;
use crate::base::context::BuildResultExt;
use crate::call::descriptor::ArgRole;
use crate::http::request::RequestAccumulator;
use crate::pipeline::request::{encloses_entity, render_argument, RequestStage};
use crate::pipeline::InvocationContext;
use http::header::CONTENT_TYPE;
use url::form_urlencoded;

pub(crate) const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Url-encoded form body from static and argument form parameters.
/// Only POST, PUT and PATCH requests get a form body.
pub struct FormStage;

impl RequestStage for FormStage {
    fn name(&self) -> &'static str {
        "form"
    }

    fn apply(
        &self,
        ctx: &InvocationContext<'_>,
        request: &mut RequestAccumulator,
    ) -> Result<(), CallError> {
        let descriptor = ctx.descriptor();
        if !encloses_entity(descriptor.method()) {
            return Ok(());
        }

        let call = ctx.call_id();
        let mut form = form_urlencoded::Serializer::new(String::new());
        let mut count = 0usize;
        for (name, value) in descriptor.call().static_form() {
            form.append_pair(name, value);
            count += 1;
        }
        for argument in descriptor.arguments() {
            let ArgRole::Form(name) = argument.role() else {
                continue;
            };
            if let Some(rendered) = render_argument(name, argument).build_context(call)? {
                for value in rendered.into_values() {
                    form.append_pair(name, &value);
                    count += 1;
                }
            }
        }

        if count == 0 {
            return Ok(());
        }
        request.set_body(form.finish());
        if !request.headers().contains(CONTENT_TYPE.as_str()) {
            request
                .append_header(CONTENT_TYPE.as_str(), FORM_CONTENT_TYPE)
                .build_context(call)?;
        }
        Ok(())
    }
}
