use crate::call::descriptor::CallId;
use crate::call::metadata::Category;
use crate::http::response::RawResponse;
use thiserror::Error;

/// Type-erased error used at collaborator boundaries (codecs, interceptors, transports).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why a request could not be built.
#[derive(Debug, Error)]
pub enum BuildFailure {
    #[error("no entity argument for a {0} request")]
    MissingEntity(http::Method),
    #[error("{0} entity arguments, at most one is allowed")]
    DuplicateEntity(usize),
    #[error("both form parameters and an entity were supplied")]
    FormAndEntity,
    #[error("placeholder {{{0}}} has no matching argument")]
    UnresolvedPlaceholder(String),
    #[error("path argument `{0}` has no value")]
    AbsentPathValue(String),
    #[error("`{param}` of type {shape} cannot be rendered as text")]
    NotRenderable { param: String, shape: &'static str },
    #[error("URI has not been composed yet")]
    UriNotComposed,
    #[error("invalid URI: {0}")]
    InvalidUri(#[from] url::ParseError),
    #[error("invalid header `{0}`")]
    InvalidHeader(String),
    #[error("request could not be assembled: {0}")]
    Http(#[from] http::Error),
    #[error("entity of type {0} has no payload mapping")]
    UnmappableEntity(&'static str),
    #[error("interceptor {name} failed")]
    Interceptor {
        name: &'static str,
        #[source]
        source: BoxError,
    },
}

/// A custom codec whose construction failed or panicked.
#[derive(Debug, Error)]
#[error("codec {codec} could not be instantiated")]
pub struct CodecError {
    pub codec: &'static str,
    #[source]
    pub source: BoxError,
}

/// Classified failure of one call.
///
/// Every variant produced while a call is in flight carries the [`CallId`]
/// so a failure can be traced back to the stub method that issued it.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("{call}: request build failed: {failure}")]
    RequestBuild {
        call: CallId,
        #[source]
        failure: BuildFailure,
    },
    #[error("{call}: codec {codec} could not be instantiated")]
    CodecInstantiation {
        call: CallId,
        codec: &'static str,
        #[source]
        source: BoxError,
    },
    #[error("{call}: codec {codec} handles {handles}, not {shape}")]
    CodecNotAssignable {
        call: CallId,
        codec: &'static str,
        handles: String,
        shape: &'static str,
    },
    #[error("{call}: serialization failed")]
    Serialization {
        call: CallId,
        #[source]
        source: BoxError,
    },
    #[error("{call}: deserialization failed")]
    Deserialization {
        call: CallId,
        #[source]
        source: BoxError,
    },
    #[error("{call}: protocol failure with status {}", .response.status())]
    ProtocolFailure {
        call: CallId,
        response: Box<RawResponse>,
    },
    #[error("{call}: no {category} is defined for this call")]
    UndefinedBehavior { call: CallId, category: Category },
    #[error("{call}: transport failed")]
    Transport {
        call: CallId,
        #[source]
        source: BoxError,
    },
    #[error("{call}: panicked: {message}")]
    Panicked { call: CallId, message: String },
}

/// Coarse classification of a [`CallError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallErrorKind {
    RequestBuild,
    CodecInstantiation,
    CodecNotAssignable,
    Serialization,
    Deserialization,
    ProtocolFailure,
    UndefinedBehavior,
    Transport,
    Panicked,
}

impl CallError {
    pub fn build(call: &CallId, failure: BuildFailure) -> Self {
        CallError::RequestBuild {
            call: call.clone(),
            failure,
        }
    }

    pub fn undefined(call: &CallId, category: Category) -> Self {
        CallError::UndefinedBehavior {
            call: call.clone(),
            category,
        }
    }

    pub fn protocol_failure(call: &CallId, response: RawResponse) -> Self {
        CallError::ProtocolFailure {
            call: call.clone(),
            response: Box::new(response),
        }
    }

    pub fn kind(&self) -> CallErrorKind {
        match self {
            CallError::RequestBuild { .. } => CallErrorKind::RequestBuild,
            CallError::CodecInstantiation { .. } => CallErrorKind::CodecInstantiation,
            CallError::CodecNotAssignable { .. } => CallErrorKind::CodecNotAssignable,
            CallError::Serialization { .. } => CallErrorKind::Serialization,
            CallError::Deserialization { .. } => CallErrorKind::Deserialization,
            CallError::ProtocolFailure { .. } => CallErrorKind::ProtocolFailure,
            CallError::UndefinedBehavior { .. } => CallErrorKind::UndefinedBehavior,
            CallError::Transport { .. } => CallErrorKind::Transport,
            CallError::Panicked { .. } => CallErrorKind::Panicked,
        }
    }

    /// The call this error belongs to.
    pub fn call_id(&self) -> Option<&CallId> {
        match self {
            CallError::RequestBuild { call, .. }
            | CallError::CodecInstantiation { call, .. }
            | CallError::CodecNotAssignable { call, .. }
            | CallError::Serialization { call, .. }
            | CallError::Deserialization { call, .. }
            | CallError::ProtocolFailure { call, .. }
            | CallError::UndefinedBehavior { call, .. }
            | CallError::Transport { call, .. }
            | CallError::Panicked { call, .. } => Some(call),
        }
    }

    /// The response retained by a protocol failure.
    pub fn response(&self) -> Option<&RawResponse> {
        match self {
            CallError::ProtocolFailure { response, .. } => Some(&**response),
            _ => None,
        }
    }

    pub fn is_protocol_failure(&self) -> bool {
        matches!(self, CallError::ProtocolFailure { .. })
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
