use crate::base::callerror::{BoxError, BuildFailure, CallError};
use crate::base::context::{BuildResultExt, CallResultExt, CodecResultExt};
use crate::call::descriptor::{ArgRole, Argument};
use crate::call::shape::AnyValue;
use crate::codec::{ensure_assignable, ContentType, SerializerSelector};
use crate::http::request::RequestAccumulator;
use crate::http::requestbody::{BinaryEncode, RequestBody, StreamBody};
use crate::pipeline::request::{encloses_entity, RequestStage};
use crate::pipeline::InvocationContext;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use std::path::PathBuf;

const OCTET_STREAM: &str = "application/octet-stream";

/// Installs the entity argument as the request body.
///
/// With a resolved serializer the value is serialized first; the payload
/// is then mapped by runtime type: bytes, file path, stream, text, and
/// finally [`BinaryEncode`] values.
pub struct EntityStage;

impl RequestStage for EntityStage {
    fn name(&self) -> &'static str {
        "entity"
    }

    fn apply(
        &self,
        ctx: &InvocationContext<'_>,
        request: &mut RequestAccumulator,
    ) -> Result<(), CallError> {
        let call = ctx.call_id();
        let descriptor = ctx.descriptor();
        let entities: Vec<&Argument> = descriptor
            .arguments_where(|role| *role == ArgRole::Entity)
            .collect();
        if entities.len() > 1 {
            return Err(CallError::build(call, BuildFailure::DuplicateEntity(entities.len())));
        }

        let has_form = !request.body().is_empty();
        let present = entities
            .first()
            .and_then(|arg| arg.value().map(|value| (*arg, value)));
        let Some((argument, value)) = present else {
            let method = descriptor.method();
            if encloses_entity(method) && !has_form {
                return Err(CallError::build(call, BuildFailure::MissingEntity(method.clone())));
            }
            return Ok(());
        };
        if has_form {
            return Err(CallError::build(call, BuildFailure::FormAndEntity));
        }

        let (body, content_type) = match &ctx.behavior().serializer {
            Some(selector) => serialize(ctx, selector, argument, value)?,
            None => match map_payload(value).serialization_context(call)? {
                Some((body, content_type)) => (body, content_type.to_string()),
                None => {
                    let selector = ctx.behavior().required_serializer(call, argument.shape())?;
                    serialize(ctx, &selector, argument, value)?
                }
            },
        };

        request.set_body(body);
        if !request.headers().contains(CONTENT_TYPE.as_str()) {
            request
                .append_header(CONTENT_TYPE.as_str(), &content_type)
                .build_context(call)?;
        }
        Ok(())
    }
}

fn serialize(
    ctx: &InvocationContext<'_>,
    selector: &SerializerSelector,
    argument: &Argument,
    value: &AnyValue,
) -> Result<(RequestBody, String), CallError> {
    let call = ctx.call_id();
    let serializer = ctx
        .registry()
        .resolve_serializer(selector)
        .codec_context(call)?;
    ensure_assignable(call, serializer.name(), &serializer.handles(), argument.shape())?;

    let payload = serializer
        .serialize(argument.shape(), value)
        .serialization_context(call)?;
    let (body, _) = map_payload(&*payload)
        .serialization_context(call)?
        .ok_or_else(|| {
            CallError::build(call, BuildFailure::UnmappableEntity(serializer.name()))
        })?;
    Ok((body, serializer.content_type().to_string()))
}

/// Body and default content type for a payload, by runtime type.
fn map_payload(value: &AnyValue) -> Result<Option<(RequestBody, &'static str)>, BoxError> {
    if let Some(bytes) = value.downcast_ref::<Bytes>() {
        return Ok(Some((RequestBody::Bytes(bytes.clone()), OCTET_STREAM)));
    }
    if let Some(bytes) = value.downcast_ref::<Vec<u8>>() {
        return Ok(Some((bytes.clone().into(), OCTET_STREAM)));
    }
    if let Some(path) = value.downcast_ref::<PathBuf>() {
        return Ok(Some((RequestBody::File(path.clone()), OCTET_STREAM)));
    }
    if let Some(stream) = value.downcast_ref::<StreamBody>() {
        return Ok(Some((RequestBody::Stream(stream.clone()), OCTET_STREAM)));
    }
    if let Some(text) = value.downcast_ref::<String>() {
        return Ok(Some((text.clone().into(), ContentType::Plain.mime())));
    }
    if let Some(text) = value.downcast_ref::<&'static str>() {
        return Ok(Some(((*text).into(), ContentType::Plain.mime())));
    }
    if let Some(binary) = value.downcast_ref::<Box<dyn BinaryEncode>>() {
        return Ok(Some((binary.encode_binary()?.into(), OCTET_STREAM)));
    }
    Ok(None)
}
