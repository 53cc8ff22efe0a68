//! Response consumption through the public engine surface.

mod common;

use bytes::Bytes;
use common::MockTransport;
use http::header::{HeaderName, HeaderValue};
use http::{Method, StatusCode};
use serde::Deserialize;
use stubnet::call::ArgRole;
use stubnet::{
    Argument, BehaviorSet, CallDescriptor, CallError, CallErrorKind, CallFacts, Category,
    ContentType, Engine, EndpointFacts, HeaderSlot, Metadata, RawResponse, Shape,
};

#[derive(Debug, PartialEq, Deserialize)]
struct Book {
    title: String,
    pages: u32,
}

fn engine() -> Engine {
    Engine::builder()
        .transport(MockTransport::ok(""))
        .build()
        .unwrap()
}

fn descriptor(returns: Shape, meta: Metadata) -> CallDescriptor {
    CallDescriptor::builder(
        EndpointFacts::new("books", "http://h"),
        CallFacts::new("get_book", Method::GET, "/books/1"),
    )
    .returns(returns)
    .metadata(meta)
    .build()
}

fn content(content: ContentType) -> Metadata {
    Metadata::new().endpoint(BehaviorSet::new().content(content))
}

fn header(name: &'static str, value: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(name),
        HeaderValue::from_static(value),
    )
}

// === Header capture ===

#[test]
fn test_repeated_header_fills_successive_slots() {
    let first = HeaderSlot::new();
    let second = HeaderSlot::new();
    let missing = HeaderSlot::new();
    let d = CallDescriptor::builder(
        EndpointFacts::new("books", "http://h"),
        CallFacts::new("get_book", Method::GET, "/books/1"),
    )
    .arg(Argument::response_header("Set-Cookie", first.clone()))
    .arg(Argument::response_header("set-cookie", second.clone()))
    .arg(Argument::response_header("X-Missing", missing.clone()))
    .arg(Argument::absent(
        ArgRole::ResponseHeader("Set-Cookie".into()),
        Shape::of::<HeaderSlot>(),
    ))
    .build();

    let (n, v1) = header("set-cookie", "a=1");
    let (_, v2) = header("set-cookie", "b=2");
    let response = RawResponse::new(StatusCode::OK)
        .with_header(n.clone(), v1)
        .with_header(n, v2);
    engine().consume_response(&d, response).unwrap();

    assert_eq!(first.get().as_deref(), Some("a=1"));
    assert_eq!(second.get().as_deref(), Some("b=2"));
    assert_eq!(missing.get(), None);
}

#[test]
fn test_headers_captured_on_failure() {
    let slot = HeaderSlot::new();
    let d = CallDescriptor::builder(
        EndpointFacts::new("books", "http://h"),
        CallFacts::new("get_book", Method::GET, "/books/1"),
    )
    .arg(Argument::response_header("Retry-After", slot.clone()))
    .build();
    let (n, v) = header("retry-after", "30");
    let response = RawResponse::new(StatusCode::SERVICE_UNAVAILABLE).with_header(n, v);

    let err = engine().consume_response(&d, response).unwrap_err();
    assert!(err.is_protocol_failure());
    assert_eq!(slot.get().as_deref(), Some("30"));
}

// === Status classification ===

#[test]
fn test_non_success_statuses_fail() {
    for status in [
        StatusCode::MOVED_PERMANENTLY,
        StatusCode::BAD_REQUEST,
        StatusCode::INTERNAL_SERVER_ERROR,
    ] {
        let response = RawResponse::new(status).with_body("details");
        let err = engine()
            .consume_response(&descriptor(Shape::text(), Metadata::new()), response)
            .unwrap_err();
        match err {
            CallError::ProtocolFailure { response, .. } => {
                assert_eq!(response.status(), status);
                assert_eq!(response.body().as_ref(), b"details");
            }
            other => panic!("Expected ProtocolFailure, got {other:?}"),
        }
    }
}

#[test]
fn test_failure_check_precedes_raw_shapes() {
    let response = RawResponse::new(StatusCode::NOT_FOUND);
    let err = engine()
        .consume_response(&descriptor(Shape::response(), Metadata::new()), response)
        .unwrap_err();
    assert_eq!(err.kind(), CallErrorKind::ProtocolFailure);
}

// === Raw shapes ===

#[test]
fn test_raw_response_shape() {
    let (n, v) = header("etag", "\"v1\"");
    let response = RawResponse::new(StatusCode::OK)
        .with_header(n, v)
        .with_body("payload");
    let reply = engine()
        .consume_response(&descriptor(Shape::response(), content(ContentType::Json)), response)
        .unwrap();
    let raw = reply.downcast::<RawResponse>().unwrap().unwrap();
    assert_eq!(raw.headers()["etag"], "\"v1\"");
    assert_eq!(raw.body().as_ref(), b"payload");
}

#[test]
fn test_raw_bytes_shape() {
    let response = RawResponse::new(StatusCode::OK).with_body(vec![0u8, 159, 146, 150]);
    let reply = engine()
        .consume_response(&descriptor(Shape::bytes(), Metadata::new()), response)
        .unwrap();
    let body = reply.downcast::<Bytes>().unwrap().unwrap();
    assert_eq!(body.as_ref(), &[0u8, 159, 146, 150]);
}

// === Codecs ===

#[test]
fn test_json_and_xml_decode() {
    let json = RawResponse::new(StatusCode::OK).with_body(r#"{"title":"Dune","pages":412}"#);
    let reply = engine()
        .consume_response(
            &descriptor(Shape::deserialize::<Book>(), content(ContentType::Json)),
            json,
        )
        .unwrap();
    assert_eq!(
        reply.downcast::<Book>().unwrap(),
        Some(Book {
            title: "Dune".into(),
            pages: 412
        })
    );

    let xml = RawResponse::new(StatusCode::OK)
        .with_body("<Book><title>Dune</title><pages>412</pages></Book>");
    let reply = engine()
        .consume_response(
            &descriptor(Shape::deserialize::<Book>(), content(ContentType::Xml)),
            xml,
        )
        .unwrap();
    assert_eq!(reply.downcast::<Book>().unwrap().unwrap().pages, 412);
}

#[test]
fn test_malformed_body_is_deserialization_error() {
    let response = RawResponse::new(StatusCode::OK).with_body("{not json");
    let err = engine()
        .consume_response(
            &descriptor(Shape::deserialize::<Book>(), content(ContentType::Json)),
            response,
        )
        .unwrap_err();
    assert_eq!(err.kind(), CallErrorKind::Deserialization);
}

#[test]
fn test_empty_text_body() {
    let reply = engine()
        .consume_response(
            &descriptor(Shape::text(), Metadata::new()),
            RawResponse::new(StatusCode::OK),
        )
        .unwrap();
    assert_eq!(reply.downcast::<String>().unwrap().as_deref(), Some(""));
}

#[test]
fn test_missing_deserializer() {
    let err = engine()
        .consume_response(
            &descriptor(Shape::deserialize::<Book>(), Metadata::new()),
            RawResponse::new(StatusCode::OK).with_body("{}"),
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
fn test_plain_codec_rejects_structured_shape() {
    let err = engine()
        .consume_response(
            &descriptor(Shape::deserialize::<Book>(), content(ContentType::Plain)),
            RawResponse::new(StatusCode::OK).with_body("Dune"),
        )
        .unwrap_err();
    assert_eq!(err.kind(), CallErrorKind::CodecNotAssignable);
}

#[test]
fn test_unit_return_skips_decoding() {
    let reply = engine()
        .consume_response(
            &descriptor(Shape::unit(), content(ContentType::Json)),
            RawResponse::new(StatusCode::OK).with_body("{not json"),
        )
        .unwrap();
    assert!(reply.value().is_none());
    assert_eq!(reply.response().body().as_ref(), b"{not json");
}
