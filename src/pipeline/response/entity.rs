use crate::base::callerror::CallError;
use crate::base::context::{CallResultExt, CodecResultExt};
use crate::call::shape::{OwnedValue, ShapeKind};
use crate::codec::ensure_assignable;
use crate::http::response::RawResponse;
use crate::pipeline::InvocationContext;
use http::StatusCode;
use tracing::{debug, warn};

/// Turns the response body into the call's return value.
///
/// Order: non-2xx status fails the call; 204 and 205 yield no value; raw
/// response and raw byte shapes bypass the codecs; everything else goes
/// through the resolved deserializer when a value is expected or the call
/// is async.
#[derive(Debug, Default)]
pub struct ResponseEntityStage;

impl ResponseEntityStage {
    pub fn apply(
        &self,
        ctx: &InvocationContext<'_>,
        response: &RawResponse,
    ) -> Result<Option<OwnedValue>, CallError> {
        let call = ctx.call_id();
        let status = response.status();
        if !status.is_success() {
            warn!(call = %call, status = %status, "Protocol failure");
            return Err(CallError::protocol_failure(call, response.clone()));
        }
        if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            return Ok(None);
        }

        let shape = ctx.descriptor().return_shape();
        match shape.kind() {
            ShapeKind::Response => return Ok(Some(Box::new(response.clone()))),
            ShapeKind::Bytes => return Ok(Some(Box::new(response.body().clone()))),
            _ => {}
        }
        let behavior = ctx.behavior();
        let deserializer = if shape.is_unit() {
            // Async unit calls only decode through a declared deserializer
            // that accepts unit.
            let Some(selector) = behavior.deserializer.as_ref().filter(|_| behavior.is_async)
            else {
                return Ok(None);
            };
            let deserializer = ctx
                .registry()
                .resolve_deserializer(selector)
                .codec_context(call)?;
            if !deserializer.handles().accepts(shape) {
                return Ok(None);
            }
            deserializer
        } else {
            let selector = behavior.required_deserializer(call, shape)?;
            let deserializer = ctx
                .registry()
                .resolve_deserializer(&selector)
                .codec_context(call)?;
            ensure_assignable(call, deserializer.name(), &deserializer.handles(), shape)?;
            deserializer
        };
        debug!(call = %call, codec = deserializer.name(), "Deserializing response");
        deserializer
            .deserialize(shape, response)
            .deserialization_context(call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::resolver::MetadataResolver;
    use crate::call::descriptor::{CallDescriptor, CallFacts, EndpointFacts};
    use crate::call::metadata::{BehaviorSet, Category, Metadata};
    use crate::call::shape::Shape;
    use crate::codec::registry::CodecRegistry;
    use crate::codec::ContentType;
    use bytes::Bytes;
    use http::Method;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct User {
        id: u32,
    }

    fn consume(
        returns: Shape,
        meta: Metadata,
        response: &RawResponse,
    ) -> Result<Option<OwnedValue>, CallError> {
        let d = CallDescriptor::builder(
            EndpointFacts::new("svc", "http://h"),
            CallFacts::new("op", Method::GET, "/"),
        )
        .returns(returns)
        .metadata(meta)
        .build();
        let behavior = MetadataResolver::resolve(&d);
        let registry = CodecRegistry::new();
        ResponseEntityStage.apply(&InvocationContext::new(&d, &behavior, &registry), response)
    }

    fn json() -> Metadata {
        Metadata::new().endpoint(BehaviorSet::new().content(ContentType::Json))
    }

    #[test]
    fn test_deserializes_value() {
        let response = RawResponse::new(StatusCode::OK).with_body(r#"{"id":3}"#);
        let value = consume(Shape::deserialize::<User>(), json(), &response)
            .unwrap()
            .unwrap();
        assert_eq!(*value.downcast::<User>().unwrap(), User { id: 3 });
    }

    #[test]
    fn test_failure_status_keeps_body() {
        let response = RawResponse::new(StatusCode::INTERNAL_SERVER_ERROR).with_body("oops");
        let err = consume(Shape::deserialize::<User>(), json(), &response).unwrap_err();
        assert_eq!(err.response().unwrap().body().as_ref(), b"oops");
    }

    #[test]
    fn test_no_content_skips_deserializer() {
        for status in [StatusCode::NO_CONTENT, StatusCode::RESET_CONTENT] {
            let response = RawResponse::new(status).with_body("not json");
            let value = consume(Shape::deserialize::<User>(), json(), &response).unwrap();
            assert!(value.is_none());
        }
    }

    #[test]
    fn test_raw_shapes_bypass_codecs() {
        let response = RawResponse::new(StatusCode::OK).with_body("raw");
        let value = consume(Shape::bytes(), json(), &response).unwrap().unwrap();
        assert_eq!(*value.downcast::<Bytes>().unwrap(), Bytes::from_static(b"raw"));

        let value = consume(Shape::response(), json(), &response).unwrap().unwrap();
        assert_eq!(value.downcast::<RawResponse>().unwrap().text().unwrap(), "raw");
    }

    #[test]
    fn test_text_uses_implicit_plain() {
        let response = RawResponse::new(StatusCode::OK).with_body("hi");
        let value = consume(Shape::text(), Metadata::new(), &response).unwrap().unwrap();
        assert_eq!(*value.downcast::<String>().unwrap(), "hi");
    }

    #[test]
    fn test_undefined_deserializer() {
        let response = RawResponse::new(StatusCode::OK).with_body("{}");
        let err = consume(
            Shape::deserialize::<User>(),
            json().detach(Category::Deserializer),
            &response,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CallError::UndefinedBehavior {
                category: Category::Deserializer,
                ..
            }
        ));
    }

    #[test]
    fn test_unit_return_is_not_decoded() {
        let response = RawResponse::new(StatusCode::OK).with_body("ignored");
        assert!(consume(Shape::unit(), json(), &response).unwrap().is_none());
    }

    #[test]
    fn test_async_unit_with_incompatible_codec() {
        let response = RawResponse::new(StatusCode::OK).with_body("{}");
        let meta = Metadata::new().call(
            BehaviorSet::new()
                .content(ContentType::Json)
                .asynchronous(),
        );
        assert!(consume(Shape::unit(), meta, &response).unwrap().is_none());
    }
}
