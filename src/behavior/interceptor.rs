//! Request interceptors.
//!
//! Interceptors run last in the request pipeline, after the URI, headers and
//! body are in place, and may amend anything on the accumulator.

use crate::base::callerror::{BoxError, BuildFailure};
use crate::call::shape::TypeKey;
use crate::http::request::RequestAccumulator;
use crate::pipeline::InvocationContext;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Amends an outgoing request.
pub trait Interceptor: Send + Sync + 'static {
    fn intercept(
        &self,
        ctx: &InvocationContext<'_>,
        request: &mut RequestAccumulator,
    ) -> Result<(), BoxError>;
}

/// A shared interceptor instance tagged with its type identity.
#[derive(Clone)]
pub struct InterceptorRef {
    id: TypeKey,
    instance: Arc<dyn Interceptor>,
}

impl InterceptorRef {
    pub fn new<I: Interceptor>(interceptor: I) -> Self {
        Self {
            id: TypeKey::of::<I>(),
            instance: Arc::new(interceptor),
        }
    }

    pub fn id(&self) -> TypeKey {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.id.name()
    }
}

impl fmt::Debug for InterceptorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InterceptorRef").field(&self.id.name()).finish()
    }
}

/// Ordered interceptors of one call.
pub struct InterceptorChain<'a> {
    interceptors: &'a [InterceptorRef],
}

impl<'a> InterceptorChain<'a> {
    pub fn new(interceptors: &'a [InterceptorRef]) -> Self {
        Self { interceptors }
    }

    /// Runs every interceptor in order; the first failure stops the chain.
    pub fn run(
        &self,
        ctx: &InvocationContext<'_>,
        request: &mut RequestAccumulator,
    ) -> Result<(), BuildFailure> {
        for interceptor in self.interceptors {
            debug!(call = %ctx.call_id(), interceptor = interceptor.name(), "Running interceptor");
            interceptor
                .instance
                .intercept(ctx, request)
                .map_err(|source| BuildFailure::Interceptor {
                    name: interceptor.name(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// Adds `Authorization: Basic <credentials>`.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    username: String,
    password: String,
}

impl BasicAuth {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn header_value(&self) -> String {
        use base64::{engine::general_purpose, Engine as _};
        let creds = format!("{}:{}", self.username, self.password);
        format!("Basic {}", general_purpose::STANDARD.encode(creds))
    }
}

impl Interceptor for BasicAuth {
    fn intercept(
        &self,
        _: &InvocationContext<'_>,
        request: &mut RequestAccumulator,
    ) -> Result<(), BoxError> {
        request.append_header("Authorization", &self.header_value())?;
        Ok(())
    }
}

/// Interceptor backed by a closure. See [`interceptor_fn`].
pub struct FnInterceptor<F>(F);

impl<F> Interceptor for FnInterceptor<F>
where
    F: Fn(&InvocationContext<'_>, &mut RequestAccumulator) -> Result<(), BoxError>
        + Send
        + Sync
        + 'static,
{
    fn intercept(
        &self,
        ctx: &InvocationContext<'_>,
        request: &mut RequestAccumulator,
    ) -> Result<(), BoxError> {
        (self.0)(ctx, request)
    }
}

/// Wraps a closure as an [`Interceptor`].
pub fn interceptor_fn<F>(f: F) -> FnInterceptor<F>
where
    F: Fn(&InvocationContext<'_>, &mut RequestAccumulator) -> Result<(), BoxError>
        + Send
        + Sync
        + 'static,
{
    FnInterceptor(f)
}
