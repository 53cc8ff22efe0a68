//! Async dispatch tests.

mod common;

use common::{DownTransport, MockTransport};
use http::{Method, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stubnet::call::{OwnedValue, TypeKey};
use stubnet::codec::{DeserializerSelector, Handles};
use stubnet::{
    handler_fn, transport_fn, AsyncOutcome, BehaviorSet, BoxError, CallDescriptor, CallError,
    CallErrorKind, CallFacts, CallState, CompletionHandler, ContentType, Deserializer, Engine,
    EndpointFacts, Metadata, RawResponse, Shape,
};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

fn descriptor(returns: Shape) -> CallDescriptor {
    CallDescriptor::builder(
        EndpointFacts::new("jobs", "http://h"),
        CallFacts::new("status", Method::GET, "/jobs/1"),
    )
    .returns(returns)
    .build()
}

fn engine(transport: MockTransport) -> Engine {
    Engine::builder()
        .transport(transport)
        .runtime_handle(Handle::current())
        .build()
        .unwrap()
}

/// Forwards the outcome to the test.
fn forward() -> (Box<dyn CompletionHandler>, oneshot::Receiver<AsyncOutcome>) {
    let (tx, rx) = oneshot::channel();
    let handler = handler_fn(move |outcome| {
        let _ = tx.send(outcome);
    });
    (handler, rx)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_success_delivers_value() {
    common::init_tracing();
    let engine = engine(MockTransport::ok("running"));
    let (handler, rx) = forward();

    let handle = engine.dispatch_async(descriptor(Shape::text()), Some(handler));
    assert_eq!(handle.call_id().to_string(), "jobs::status");
    assert_eq!(handle.wait().await, CallState::Succeeded);

    match rx.await.unwrap() {
        AsyncOutcome::Success { response, value } => {
            assert_eq!(response.status(), StatusCode::OK);
            let text = value.unwrap().downcast::<String>().unwrap();
            assert_eq!(*text, "running");
        }
        other => panic!("Expected Success, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_protocol_failure_delivers_response() {
    let transport =
        MockTransport::new(RawResponse::new(StatusCode::BAD_GATEWAY).with_body("upstream down"));
    let engine = engine(transport);
    let (handler, rx) = forward();

    let handle = engine.dispatch_async(descriptor(Shape::text()), Some(handler));
    assert_eq!(handle.wait().await, CallState::Failed);
    match rx.await.unwrap() {
        AsyncOutcome::ProtocolFailure(response) => {
            assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
            assert_eq!(response.body().as_ref(), b"upstream down");
        }
        other => panic!("Expected ProtocolFailure, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_transport_error_delivers_error() {
    let engine = Engine::builder()
        .transport(DownTransport)
        .runtime_handle(Handle::current())
        .build()
        .unwrap();
    let (handler, rx) = forward();

    let handle = engine.dispatch_async(descriptor(Shape::text()), Some(handler));
    assert_eq!(handle.wait().await, CallState::Errored);
    match rx.await.unwrap() {
        AsyncOutcome::Error(err) => assert_eq!(err.kind(), CallErrorKind::Transport),
        other => panic!("Expected Error, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_panicking_pipeline_is_contained() {
    let engine = Engine::builder()
        .transport(transport_fn(|_| panic!("socket exploded")))
        .runtime_handle(Handle::current())
        .build()
        .unwrap();
    let (handler, rx) = forward();

    let handle = engine.dispatch_async(descriptor(Shape::text()), Some(handler));
    assert_eq!(handle.wait().await, CallState::Errored);
    match rx.await.unwrap() {
        AsyncOutcome::Error(CallError::Panicked { message, .. }) => {
            assert!(message.contains("socket exploded"));
        }
        other => panic!("Expected Panicked, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_panicking_handler_does_not_affect_later_calls() {
    let engine = engine(MockTransport::ok("fine"));

    let bad = handler_fn(|_| panic!("handler bug"));
    let handle = engine.dispatch_async(descriptor(Shape::text()), Some(bad));
    assert_eq!(handle.wait().await, CallState::Succeeded);

    let (handler, rx) = forward();
    let handle = engine.dispatch_async(descriptor(Shape::text()), Some(handler));
    assert_eq!(handle.wait().await, CallState::Succeeded);
    assert_eq!(rx.await.unwrap().state(), CallState::Succeeded);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fire_and_forget() {
    let transport = MockTransport::ok("");
    let engine = engine(transport.clone());

    let handle = engine.dispatch_async(descriptor(Shape::unit()), None);
    assert_eq!(handle.wait().await, CallState::Succeeded);
    assert_eq!(transport.request_count(), 1);
}

struct Counting {
    successes: Arc<AtomicUsize>,
}

impl CompletionHandler for Counting {
    fn on_success(self: Box<Self>, _response: RawResponse, _value: Option<OwnedValue>) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_handler_runs_once() {
    let transport = MockTransport::ok("x");
    let engine = engine(transport.clone());
    let successes = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let handler: Box<dyn CompletionHandler> = Box::new(Counting {
                successes: Arc::clone(&successes),
            });
            engine.dispatch_async(descriptor(Shape::text()), Some(handler))
        })
        .collect();
    for state in futures::future::join_all(handles.into_iter().map(|h| h.wait())).await {
        assert_eq!(state, CallState::Succeeded);
    }

    assert_eq!(successes.load(Ordering::SeqCst), 32);
    assert_eq!(transport.request_count(), 32);
}

/// Decodes unit responses into their status code.
#[derive(Default)]
struct StatusOnly;

impl Deserializer for StatusOnly {
    fn handles(&self) -> Handles {
        Handles::Exact(TypeKey::of::<()>())
    }

    fn deserialize(
        &self,
        _: &Shape,
        response: &RawResponse,
    ) -> Result<Option<OwnedValue>, BoxError> {
        Ok(Some(Box::new(response.status().as_u16())))
    }
}

fn ping(behavior: BehaviorSet) -> CallDescriptor {
    CallDescriptor::builder(
        EndpointFacts::new("jobs", "http://h"),
        CallFacts::new("ping", Method::GET, "/ping"),
    )
    .returns(Shape::unit())
    .metadata(Metadata::new().call(behavior))
    .build()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_async_unit_calls_decode_through_declared_deserializer() {
    let engine = engine(MockTransport::json(r#"{"ok":true}"#));

    let (handler, rx) = forward();
    let declared =
        ping(BehaviorSet::new().deserializer(DeserializerSelector::custom::<StatusOnly>()));
    engine.dispatch_async(declared, Some(handler)).wait().await;
    match rx.await.unwrap() {
        AsyncOutcome::Success { value, .. } => {
            assert_eq!(*value.unwrap().downcast::<u16>().unwrap(), 200);
        }
        other => panic!("Expected Success, got {other:?}"),
    }

    // A codec that cannot produce unit leaves the value empty.
    for behavior in [BehaviorSet::new().content(ContentType::Json), BehaviorSet::new()] {
        let (handler, rx) = forward();
        engine.dispatch_async(ping(behavior), Some(handler)).wait().await;
        match rx.await.unwrap() {
            AsyncOutcome::Success { value, .. } => assert!(value.is_none()),
            other => panic!("Expected Success, got {other:?}"),
        }
    }
}

#[test]
fn test_sync_unit_call_skips_declared_deserializer() {
    let engine = Engine::builder()
        .transport(MockTransport::ok(""))
        .max_concurrent_calls(1)
        .build()
        .unwrap();
    let declared =
        ping(BehaviorSet::new().deserializer(DeserializerSelector::custom::<StatusOnly>()));
    assert!(engine.invoke(&declared).unwrap().value().is_none());
}

#[test]
fn test_owned_runtime_with_blocking_wait() {
    let transport = MockTransport::ok("done");
    let engine = Engine::builder()
        .transport(transport)
        .max_concurrent_calls(2)
        .build()
        .unwrap();

    let handle = engine.dispatch_async(descriptor(Shape::text()), None);
    assert_eq!(handle.blocking_wait(), CallState::Succeeded);
}

#[test]
fn test_owned_runtime_caps_concurrent_calls() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let transport = {
        let in_flight = Arc::clone(&in_flight);
        let peak = Arc::clone(&peak);
        transport_fn(move |_| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(RawResponse::new(StatusCode::OK).with_body("ok"))
        })
    };
    let engine = Engine::builder()
        .transport(transport)
        .max_concurrent_calls(2)
        .build()
        .unwrap();

    let handles: Vec<_> = (0..6)
        .map(|_| engine.dispatch_async(descriptor(Shape::text()), None))
        .collect();
    for handle in handles {
        assert_eq!(handle.blocking_wait(), CallState::Succeeded);
    }
    assert!(peak.load(Ordering::SeqCst) <= 2);
}
