//! # stubnet
//!
//! A declarative HTTP call engine for Rust.
//!
//! `stubnet` turns a described call (endpoint facts, call facts, typed
//! arguments and behavior metadata) into an HTTP request, hands it to a
//! pluggable transport, and turns the response back into a typed value.
//! It is the runtime behind generated service stubs.
//!
//! ## Features
//!
//! - **Request Pipeline**: URI, headers, path templates, query, form, entity and interceptors
//! - **Response Pipeline**: header capture and entity decoding with status classification
//! - **Codecs**: plain text, JSON and XML built in; custom codecs constructed once and cached
//! - **Behavior Metadata**: endpoint defaults with per-call override, detach and skip
//! - **Async Dispatch**: calls on a worker pool with exactly-once completion delivery
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stubnet::{Argument, CallDescriptor, CallFacts, Engine, EndpointFacts, Shape};
//!
//! let engine = Engine::builder().transport(my_transport).build()?;
//!
//! let descriptor = CallDescriptor::builder(
//!     EndpointFacts::new("users", "http://api.local:8080"),
//!     CallFacts::new("get_user", http::Method::GET, "/users/{id}"),
//! )
//! .returns(Shape::text())
//! .arg(Argument::path("id", 42u32))
//! .build();
//!
//! let body: Option<String> = engine.call(&descriptor)?;
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Errors, error context and call states
//! - [`call`] - Call descriptors, value shapes and behavior metadata
//! - [`codec`] - Serializers, deserializers and the codec registry
//! - [`behavior`] - Metadata resolution and interceptors
//! - [`http`] - Request accumulator, request bodies and raw responses
//! - [`pipeline`] - Request and response stages
//! - [`dispatch`] - Transport seam, invoker and async dispatch
//! - [`engine`] - The engine handle and its builder

pub mod base;
pub mod behavior;
pub mod call;
pub mod codec;
pub mod dispatch;
pub mod engine;
pub mod http;
pub mod pipeline;

pub use base::{BoxError, BuildFailure, CallError, CallErrorKind, CallState, CodecError};
pub use behavior::{interceptor_fn, BasicAuth, Interceptor, InterceptorRef};
pub use call::{
    ArgRole, Argument, BehaviorId, BehaviorSet, CallDescriptor, CallFacts, CallId, Category,
    EndpointFacts, Metadata, Shape,
};
pub use codec::{CodecRegistry, ContentType, Deserializer, Serializer};
pub use dispatch::{handler_fn, AsyncOutcome, CallHandle, CompletionHandler, Transport, transport_fn};
pub use engine::{Engine, EngineBuilder, EngineError};
pub use crate::http::{RawResponse, RequestAccumulator, RequestBody};
pub use pipeline::{HeaderSlot, Reply};
