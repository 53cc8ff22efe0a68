//! Per-call behavior: interceptors and the resolution of inherited metadata.

pub mod interceptor;
pub mod resolver;

pub use interceptor::{interceptor_fn, BasicAuth, FnInterceptor, Interceptor, InterceptorChain, InterceptorRef};
pub use resolver::{EffectiveBehavior, MetadataResolver};
