//! Engine handle with builder pattern.
//!
//! The engine owns the codec registry, the transport and the worker pool for
//! async calls. Generated stubs hold an [`Engine`] and call it directly.
//!
//! # Example
//!
//! ```rust,ignore
//! use stubnet::{Engine, transport_fn, RawResponse};
//!
//! let engine = Engine::builder()
//!     .transport(transport_fn(|req| my_http_send(req)))
//!     .max_concurrent_calls(8)
//!     .build()?;
//!
//! let user: Option<User> = engine.call(&descriptor)?;
//! ```

use crate::base::callerror::CallError;
use crate::call::descriptor::CallDescriptor;
use crate::call::shape::ShapeMismatch;
use crate::codec::registry::CodecRegistry;
use crate::dispatch::asynccall::{AsyncDispatcher, CallHandle, CompletionHandler};
use crate::dispatch::invoker::Invoker;
use crate::dispatch::transport::Transport;
use crate::http::request::RequestAccumulator;
use crate::http::response::RawResponse;
use crate::pipeline::Reply;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime};

const DEFAULT_MAX_CONCURRENT_CALLS: usize = 4;

/// Why an [`Engine`] could not be built.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no transport configured")]
    MissingTransport,
    #[error("failed to start the async runtime")]
    Runtime(#[source] std::io::Error),
}

/// A runtime created by the engine. Shut down without blocking on drop, so
/// the engine may be dropped from async code.
struct OwnedRuntime(Option<Runtime>);

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}

/// Executes call descriptors.
///
/// Use [`Engine::builder()`] to configure and create an engine. Cloning is
/// cheap; clones share the registry, transport and worker pool.
#[derive(Clone)]
pub struct Engine {
    invoker: Arc<Invoker>,
    dispatcher: AsyncDispatcher,
    _runtime: Option<Arc<OwnedRuntime>>,
}

impl Engine {
    /// Create a new engine builder.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn registry(&self) -> &Arc<CodecRegistry> {
        self.invoker.registry()
    }

    /// Run only the request pipeline.
    pub fn build_request(&self, descriptor: &CallDescriptor) -> Result<RequestAccumulator, CallError> {
        self.invoker.build_request(descriptor)
    }

    /// Run only the response pipeline.
    pub fn consume_response(
        &self,
        descriptor: &CallDescriptor,
        response: RawResponse,
    ) -> Result<Reply, CallError> {
        self.invoker.consume_response(descriptor, response)
    }

    /// Synchronous call on the current thread.
    pub fn invoke(&self, descriptor: &CallDescriptor) -> Result<Reply, CallError> {
        self.invoker.run(descriptor, false)
    }

    /// Synchronous call returning the decoded value as `T`.
    pub fn call<T: 'static>(&self, descriptor: &CallDescriptor) -> Result<Option<T>, CallError> {
        self.invoke(descriptor)?
            .downcast::<T>()
            .map_err(|_| CallError::Deserialization {
                call: descriptor.id().clone(),
                source: Box::new(ShapeMismatch {
                    expected: std::any::type_name::<T>(),
                }),
            })
    }

    /// Run the call on a worker; the outcome goes to `handler`, if any.
    pub fn dispatch_async(
        &self,
        descriptor: CallDescriptor,
        handler: Option<Box<dyn CompletionHandler>>,
    ) -> CallHandle {
        self.dispatcher.submit(descriptor, handler)
    }
}

/// Builder for creating an [`Engine`].
#[derive(Default)]
#[must_use]
pub struct EngineBuilder {
    transport: Option<Arc<dyn Transport>>,
    registry: Option<Arc<CodecRegistry>>,
    runtime_handle: Option<Handle>,
    max_concurrent_calls: Option<usize>,
}

impl EngineBuilder {
    /// Set the transport. Required.
    pub fn transport<T: Transport>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Share a codec registry between engines.
    pub fn registry(mut self, registry: Arc<CodecRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Run async calls on an existing runtime instead of an owned one.
    pub fn runtime_handle(mut self, handle: Handle) -> Self {
        self.runtime_handle = Some(handle);
        self
    }

    /// Maximum number of async calls running at once on the owned runtime.
    ///
    /// Calls run on the runtime's blocking pool, so this caps its
    /// `max_blocking_threads`; the runtime itself keeps one scheduler
    /// thread. Ignored when a runtime handle is supplied.
    pub fn max_concurrent_calls(mut self, calls: usize) -> Self {
        self.max_concurrent_calls = Some(calls.max(1));
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<Engine, EngineError> {
        let transport = self.transport.ok_or(EngineError::MissingTransport)?;
        let registry = self.registry.unwrap_or_default();
        let invoker = Arc::new(Invoker::new(registry, transport));

        let (handle, runtime) = match self.runtime_handle {
            Some(handle) => (handle, None),
            None => {
                let calls = self
                    .max_concurrent_calls
                    .unwrap_or(DEFAULT_MAX_CONCURRENT_CALLS);
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(1)
                    .max_blocking_threads(calls)
                    .thread_name("stubnet-worker")
                    .enable_all()
                    .build()
                    .map_err(EngineError::Runtime)?;
                tracing::debug!(max_concurrent_calls = calls, "Started owned runtime");
                (runtime.handle().clone(), Some(Arc::new(OwnedRuntime(Some(runtime)))))
            }
        };

        Ok(Engine {
            dispatcher: AsyncDispatcher::new(Arc::clone(&invoker), handle),
            invoker,
            _runtime: runtime,
        })
    }
}
