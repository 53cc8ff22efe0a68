//! Ergonomic error context helpers.
//!
//! Provides extension traits for attaching call identity to collaborator
//! errors, turning them into context-rich `CallError` variants.

use crate::base::callerror::{BoxError, BuildFailure, CallError, CodecError};
use crate::call::descriptor::CallId;

/// Extension trait for adding call context to collaborator Results.
pub trait CallResultExt<T> {
    /// Classify a codec error raised while serializing.
    ///
    /// # Example
    /// ```ignore
    /// use stubnet::base::context::CallResultExt;
    ///
    /// let payload = codec.serialize(&shape, value)
    ///     .serialization_context(ctx.call_id())?;
    /// // Error: "users::create: serialization failed"
    /// ```
    fn serialization_context(self, call: &CallId) -> Result<T, CallError>;

    /// Classify a codec error raised while deserializing.
    fn deserialization_context(self, call: &CallId) -> Result<T, CallError>;

    /// Classify an error raised by the transport.
    fn transport_context(self, call: &CallId) -> Result<T, CallError>;
}

impl<T> CallResultExt<T> for Result<T, BoxError> {
    fn serialization_context(self, call: &CallId) -> Result<T, CallError> {
        self.map_err(|source| CallError::Serialization {
            call: call.clone(),
            source,
        })
    }

    fn deserialization_context(self, call: &CallId) -> Result<T, CallError> {
        self.map_err(|source| CallError::Deserialization {
            call: call.clone(),
            source,
        })
    }

    fn transport_context(self, call: &CallId) -> Result<T, CallError> {
        self.map_err(|source| CallError::Transport {
            call: call.clone(),
            source,
        })
    }
}

/// Extension trait for request-build Results.
pub trait BuildResultExt<T> {
    fn build_context(self, call: &CallId) -> Result<T, CallError>;
}

impl<T> BuildResultExt<T> for Result<T, BuildFailure> {
    fn build_context(self, call: &CallId) -> Result<T, CallError> {
        self.map_err(|failure| CallError::build(call, failure))
    }
}

/// Extension trait for codec lookups.
pub trait CodecResultExt<T> {
    fn codec_context(self, call: &CallId) -> Result<T, CallError>;
}

impl<T> CodecResultExt<T> for Result<T, CodecError> {
    fn codec_context(self, call: &CallId) -> Result<T, CallError> {
        self.map_err(|CodecError { codec, source }| CallError::CodecInstantiation {
            call: call.clone(),
            codec,
            source,
        })
    }
}
