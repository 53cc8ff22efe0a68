use crate::base::callerror::{BuildFailure, CallError};
use crate::base::context::BuildResultExt;
use crate::call::descriptor::{ArgRole, CallDescriptor};
use crate::http::request::RequestAccumulator;
use crate::pipeline::request::uri::join_path;
use crate::pipeline::request::{render_argument, RequestStage};
use crate::pipeline::InvocationContext;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Substitutes every `{name}` placeholder with the matching path argument.
///
/// The sub-path template is expanded in one left-to-right pass, so an
/// encoded value is never scanned for placeholders again.
pub struct PathStage;

impl RequestStage for PathStage {
    fn name(&self) -> &'static str {
        "path"
    }

    fn apply(
        &self,
        ctx: &InvocationContext<'_>,
        request: &mut RequestAccumulator,
    ) -> Result<(), CallError> {
        let call = ctx.call_id();
        let descriptor = ctx.descriptor();
        let template = descriptor.call().path();
        if placeholders(template).is_empty() {
            return Ok(());
        }

        let expanded = expand(descriptor, template).build_context(call)?;
        let base = Url::parse(descriptor.endpoint().base_url())
            .map_err(BuildFailure::from)
            .build_context(call)?;
        let url = request.url_mut().build_context(call)?;
        url.set_path(&join_path(base.path(), &expanded));
        Ok(())
    }
}

/// Expands `template`, appending each encoded value exactly once.
fn expand(descriptor: &CallDescriptor, template: &str) -> Result<String, BuildFailure> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some((start, name)) = next_placeholder(rest) {
        out.push_str(&rest[..start]);
        let value = path_value(descriptor, name)?;
        out.extend(utf8_percent_encode(&value, SEGMENT));
        rest = &rest[start + name.len() + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

fn path_value(descriptor: &CallDescriptor, name: &str) -> Result<String, BuildFailure> {
    let argument = descriptor
        .arguments()
        .iter()
        .find(|a| matches!(a.role(), ArgRole::Path(n) if n == name))
        .ok_or_else(|| BuildFailure::UnresolvedPlaceholder(name.to_string()))?;
    let rendered = render_argument(name, argument)?
        .ok_or_else(|| BuildFailure::AbsentPathValue(name.to_string()))?;
    Ok(rendered.into_values().join(","))
}

/// Offset and name of the first non-empty `{name}` in `text`.
fn next_placeholder(text: &str) -> Option<(usize, &str)> {
    let mut from = 0;
    while let Some(open) = text[from..].find('{').map(|i| from + i) {
        let close = open + 1 + text[open + 1..].find('}')?;
        let name = &text[open + 1..close];
        if !name.is_empty() && !name.contains('{') {
            return Some((open, name));
        }
        from = open + 1;
    }
    None
}

/// Placeholder names in template order, without duplicates.
fn placeholders(template: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some((start, name)) = next_placeholder(rest) {
        if !names.contains(&name) {
            names.push(name);
        }
        rest = &rest[start + name.len() + 2..];
    }
    names
}
