//! Call execution: the transport seam, the shared invoker, and async
//! dispatch.

pub mod asynccall;
pub mod invoker;
pub mod transport;

pub use asynccall::{
    handler_fn, AsyncDispatcher, AsyncOutcome, CallHandle, CompletionHandler, FnHandler,
};
pub use invoker::Invoker;
pub use transport::{transport_fn, FnTransport, Transport};
