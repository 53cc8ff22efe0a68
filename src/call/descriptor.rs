//! The immutable description of one invocation.

use crate::behavior::interceptor::{Interceptor, InterceptorRef};
use crate::call::metadata::Metadata;
use crate::call::shape::{AnyValue, Shape};
use crate::pipeline::response::HeaderSlot;
use http::Method;
use std::fmt;
use std::sync::Arc;

/// Identifies a call in errors and logs as `endpoint::call`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallId {
    endpoint: Arc<str>,
    call: Arc<str>,
}

impl CallId {
    pub fn new(endpoint: &str, call: &str) -> Self {
        Self {
            endpoint: Arc::from(endpoint),
            call: Arc::from(call),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn call(&self) -> &str {
        &self.call
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.endpoint, self.call)
    }
}

/// Facts shared by every call of an endpoint.
#[derive(Debug, Clone)]
pub struct EndpointFacts {
    name: String,
    base_url: String,
}

impl EndpointFacts {
    /// `base_url` holds scheme, host, optional port and optional root path,
    /// e.g. `http://h:8080/api`. It is parsed when the request is built.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Facts specific to one call declaration.
#[derive(Debug, Clone)]
#[must_use]
pub struct CallFacts {
    name: String,
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
}

impl CallFacts {
    /// `path` is the sub-path template; `{name}` marks a path parameter.
    pub fn new(name: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            path: path.into(),
            query: Vec::new(),
            form: Vec::new(),
        }
    }

    /// Add a static query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Add a static form parameter.
    pub fn form(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((name.into(), value.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn static_query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn static_form(&self) -> &[(String, String)] {
        &self.form
    }
}

/// What a runtime argument is used for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgRole {
    Path(String),
    Query(String),
    Form(String),
    Header(String),
    /// The request body.
    Entity,
    /// An [`InterceptorRef`] supplied at call time.
    Interceptor,
    /// A [`HeaderSlot`] that receives a response header.
    ResponseHeader(String),
}

/// One runtime argument with its declared shape.
#[derive(Clone)]
pub struct Argument {
    role: ArgRole,
    shape: Shape,
    value: Option<Arc<AnyValue>>,
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("role", &self.role)
            .field("shape", &self.shape)
            .field("present", &self.value.is_some())
            .finish()
    }
}

impl Argument {
    /// General constructor for front ends that build shapes themselves.
    pub fn with_shape(role: ArgRole, shape: Shape, value: Option<Arc<AnyValue>>) -> Self {
        Self { role, shape, value }
    }

    /// An argument passed as `None`/null.
    pub fn absent(role: ArgRole, shape: Shape) -> Self {
        Self::with_shape(role, shape, None)
    }

    pub fn path<T>(name: impl Into<String>, value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Self::displayed(ArgRole::Path(name.into()), value)
    }

    pub fn query<T>(name: impl Into<String>, value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Self::displayed(ArgRole::Query(name.into()), value)
    }

    pub fn query_list<T>(name: impl Into<String>, values: Vec<T>) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Self::displayed_list(ArgRole::Query(name.into()), values)
    }

    pub fn form<T>(name: impl Into<String>, value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Self::displayed(ArgRole::Form(name.into()), value)
    }

    pub fn form_list<T>(name: impl Into<String>, values: Vec<T>) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Self::displayed_list(ArgRole::Form(name.into()), values)
    }

    pub fn header<T>(name: impl Into<String>, value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Self::displayed(ArgRole::Header(name.into()), value)
    }

    /// A body sent as-is: bytes, a file path, a stream, text, or a boxed
    /// [`BinaryEncode`](crate::http::requestbody::BinaryEncode).
    pub fn entity<T: Send + Sync + 'static>(value: T) -> Self {
        Self::with_shape(ArgRole::Entity, Shape::of::<T>(), Some(Arc::new(value)))
    }

    /// A body written by the resolved serializer through serde.
    pub fn serde_entity<T>(value: T) -> Self
    where
        T: serde::Serialize + Send + Sync + 'static,
    {
        Self::with_shape(
            ArgRole::Entity,
            Shape::serialize::<T>(),
            Some(Arc::new(value)),
        )
    }

    pub fn interceptor<I: Interceptor>(interceptor: I) -> Self {
        let interceptor = InterceptorRef::new(interceptor);
        Self::with_shape(
            ArgRole::Interceptor,
            Shape::of::<InterceptorRef>(),
            Some(Arc::new(interceptor)),
        )
    }

    pub fn response_header(name: impl Into<String>, slot: HeaderSlot) -> Self {
        Self::with_shape(
            ArgRole::ResponseHeader(name.into()),
            Shape::of::<HeaderSlot>(),
            Some(Arc::new(slot)),
        )
    }

    fn displayed<T>(role: ArgRole, value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Self::with_shape(role, Shape::display::<T>(), Some(Arc::new(value)))
    }

    fn displayed_list<T>(role: ArgRole, values: Vec<T>) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        Self::with_shape(role, Shape::display_list::<T>(), Some(Arc::new(values)))
    }

    pub fn role(&self) -> &ArgRole {
        &self.role
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn value(&self) -> Option<&AnyValue> {
        self.value.as_deref()
    }

    /// The value, if present and of type `T`.
    pub fn value_as<T: 'static>(&self) -> Option<&T> {
        self.value().and_then(|v| v.downcast_ref::<T>())
    }
}

/// Everything the engine needs to perform one call.
#[derive(Debug, Clone)]
pub struct CallDescriptor {
    id: CallId,
    endpoint: EndpointFacts,
    call: CallFacts,
    return_shape: Shape,
    arguments: Vec<Argument>,
    metadata: Metadata,
}

impl CallDescriptor {
    pub fn builder(endpoint: EndpointFacts, call: CallFacts) -> CallDescriptorBuilder {
        CallDescriptorBuilder {
            endpoint,
            call,
            return_shape: Shape::unit(),
            arguments: Vec::new(),
            metadata: Metadata::default(),
        }
    }

    pub fn id(&self) -> &CallId {
        &self.id
    }

    pub fn endpoint(&self) -> &EndpointFacts {
        &self.endpoint
    }

    pub fn call(&self) -> &CallFacts {
        &self.call
    }

    pub fn method(&self) -> &Method {
        self.call.method()
    }

    pub fn return_shape(&self) -> &Shape {
        &self.return_shape
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Arguments whose role satisfies `pred`, in declaration order.
    pub fn arguments_where<'a>(
        &'a self,
        pred: impl Fn(&ArgRole) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Argument> + 'a {
        self.arguments.iter().filter(move |a| pred(&a.role))
    }
}

/// Builder for [`CallDescriptor`].
#[must_use]
pub struct CallDescriptorBuilder {
    endpoint: EndpointFacts,
    call: CallFacts,
    return_shape: Shape,
    arguments: Vec<Argument>,
    metadata: Metadata,
}

impl CallDescriptorBuilder {
    /// Declared return shape; defaults to unit.
    pub fn returns(mut self, shape: Shape) -> Self {
        self.return_shape = shape;
        self
    }

    pub fn arg(mut self, argument: Argument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn args(mut self, arguments: impl IntoIterator<Item = Argument>) -> Self {
        self.arguments.extend(arguments);
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn build(self) -> CallDescriptor {
        CallDescriptor {
            id: CallId::new(self.endpoint.name(), self.call.name()),
            endpoint: self.endpoint,
            call: self.call,
            return_shape: self.return_shape,
            arguments: self.arguments,
            metadata: self.metadata,
        }
    }
}
