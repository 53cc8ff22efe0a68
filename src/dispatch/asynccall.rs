//! Non-blocking calls.
//!
//! Each submitted call runs the whole pipeline on a tokio blocking worker
//! and produces exactly one [`AsyncOutcome`]. The outcome goes to the
//! call's [`CompletionHandler`], if any, and the terminal [`CallState`] is
//! published through the [`CallHandle`].
//!
//! A panicking pipeline becomes [`CallError::Panicked`]; a panicking
//! handler is logged and contained on its worker. Neither affects other
//! calls or the runtime.

use crate::base::callerror::{panic_message, CallError};
use crate::base::callstate::CallState;
use crate::call::descriptor::{CallDescriptor, CallId};
use crate::call::shape::OwnedValue;
use crate::dispatch::invoker::Invoker;
use crate::http::response::RawResponse;
use crate::pipeline::Reply;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// The classified result of an async call.
#[derive(Debug)]
pub enum AsyncOutcome {
    Success {
        response: RawResponse,
        value: Option<OwnedValue>,
    },
    /// Non-2xx status; the response is intact.
    ProtocolFailure(RawResponse),
    Error(CallError),
}

impl AsyncOutcome {
    pub fn state(&self) -> CallState {
        match self {
            AsyncOutcome::Success { .. } => CallState::Succeeded,
            AsyncOutcome::ProtocolFailure(_) => CallState::Failed,
            AsyncOutcome::Error(_) => CallState::Errored,
        }
    }

    fn deliver(self, handler: Box<dyn CompletionHandler>) {
        match self {
            AsyncOutcome::Success { response, value } => handler.on_success(response, value),
            AsyncOutcome::ProtocolFailure(response) => handler.on_failure(response),
            AsyncOutcome::Error(error) => handler.on_error(error),
        }
    }
}

impl From<Result<Reply, CallError>> for AsyncOutcome {
    fn from(result: Result<Reply, CallError>) -> Self {
        match result {
            Ok(reply) => {
                let (response, value) = reply.into_parts();
                AsyncOutcome::Success { response, value }
            }
            Err(CallError::ProtocolFailure { response, .. }) => {
                AsyncOutcome::ProtocolFailure(*response)
            }
            Err(error) => AsyncOutcome::Error(error),
        }
    }
}

/// Receives the outcome of one async call. Consumed on delivery, so it is
/// invoked at most once.
pub trait CompletionHandler: Send + 'static {
    fn on_success(self: Box<Self>, response: RawResponse, value: Option<OwnedValue>);

    fn on_failure(self: Box<Self>, response: RawResponse) {
        tracing::warn!(status = %response.status(), "Unhandled protocol failure");
    }

    fn on_error(self: Box<Self>, error: CallError) {
        tracing::error!(error = %error, "Unhandled call error");
    }
}

/// Handler backed by a closure over the whole outcome. See [`handler_fn`].
pub struct FnHandler<F>(F);

impl<F> CompletionHandler for FnHandler<F>
where
    F: FnOnce(AsyncOutcome) + Send + 'static,
{
    fn on_success(self: Box<Self>, response: RawResponse, value: Option<OwnedValue>) {
        let FnHandler(f) = *self;
        f(AsyncOutcome::Success { response, value })
    }

    fn on_failure(self: Box<Self>, response: RawResponse) {
        let FnHandler(f) = *self;
        f(AsyncOutcome::ProtocolFailure(response))
    }

    fn on_error(self: Box<Self>, error: CallError) {
        let FnHandler(f) = *self;
        f(AsyncOutcome::Error(error))
    }
}

/// Wraps a closure as a boxed [`CompletionHandler`].
pub fn handler_fn<F>(f: F) -> Box<dyn CompletionHandler>
where
    F: FnOnce(AsyncOutcome) + Send + 'static,
{
    Box::new(FnHandler(f))
}

/// Tracks one submitted call.
#[derive(Debug)]
pub struct CallHandle {
    id: CallId,
    state: Arc<AtomicU8>,
    done: oneshot::Receiver<CallState>,
}

impl CallHandle {
    pub fn call_id(&self) -> &CallId {
        &self.id
    }

    pub fn state(&self) -> CallState {
        CallState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Resolves once the outcome has been delivered.
    pub async fn wait(self) -> CallState {
        let CallHandle { state, done, .. } = self;
        match done.await {
            Ok(terminal) => terminal,
            Err(_) => CallState::from_u8(state.load(Ordering::Acquire)),
        }
    }

    /// Blocking variant of [`wait`](Self::wait). Must not be called from
    /// inside the runtime.
    pub fn blocking_wait(self) -> CallState {
        let CallHandle { state, done, .. } = self;
        match done.blocking_recv() {
            Ok(terminal) => terminal,
            Err(_) => CallState::from_u8(state.load(Ordering::Acquire)),
        }
    }
}

/// Runs calls on the blocking pool of a tokio runtime.
#[derive(Clone)]
pub struct AsyncDispatcher {
    invoker: Arc<Invoker>,
    runtime: Handle,
}

impl AsyncDispatcher {
    pub fn new(invoker: Arc<Invoker>, runtime: Handle) -> Self {
        Self { invoker, runtime }
    }

    pub fn submit(
        &self,
        descriptor: CallDescriptor,
        handler: Option<Box<dyn CompletionHandler>>,
    ) -> CallHandle {
        let id = descriptor.id().clone();
        let state = Arc::new(AtomicU8::new(CallState::Submitted.as_u8()));
        let (tx, rx) = oneshot::channel();

        let invoker = Arc::clone(&self.invoker);
        let task_state = Arc::clone(&state);
        tracing::debug!(call = %id, "Submitting async call");

        self.runtime.spawn_blocking(move || {
            task_state.store(CallState::Running.as_u8(), Ordering::Release);
            let call = descriptor.id().clone();

            let result = panic::catch_unwind(AssertUnwindSafe(|| invoker.run(&descriptor, true)))
                .unwrap_or_else(|payload| {
                    Err(CallError::Panicked {
                        call: call.clone(),
                        message: panic_message(payload.as_ref()),
                    })
                });
            let outcome = AsyncOutcome::from(result);
            let terminal = outcome.state();
            task_state.store(terminal.as_u8(), Ordering::Release);
            tracing::debug!(call = %call, state = ?terminal, "Async call finished");

            match handler {
                Some(handler) => {
                    let delivered =
                        panic::catch_unwind(AssertUnwindSafe(move || outcome.deliver(handler)));
                    if let Err(payload) = delivered {
                        tracing::error!(
                            call = %call,
                            panic = %panic_message(payload.as_ref()),
                            "Completion handler panicked"
                        );
                    }
                }
                None => drop(outcome),
            }

            // The caller may have dropped the handle.
            let _ = tx.send(terminal);
        });

        CallHandle {
            id,
            state,
            done: rx,
        }
    }
}
