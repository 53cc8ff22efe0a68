//! Behavior declared for an endpoint or a single call.
//!
//! The front end fills one [`BehaviorSet`] for the endpoint, one for the
//! call, and lists the call's [`Directive`]s. Nothing is merged here; the
//! precedence rules live in [`crate::behavior::resolver`].

use crate::behavior::interceptor::{Interceptor, InterceptorRef};
use crate::call::shape::TypeKey;
use crate::codec::{ContentType, DeserializerSelector, SelectorKey, SerializerSelector};
use std::fmt;

/// A kind of behavior that can be inherited from the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Headers,
    Interceptors,
    Serializer,
    Deserializer,
    Async,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Headers => "headers",
            Category::Interceptors => "interceptors",
            Category::Serializer => "serializer",
            Category::Deserializer => "deserializer",
            Category::Async => "async",
        };
        f.write_str(name)
    }
}

/// Names one inherited behavior instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BehaviorId {
    /// An interceptor, by type.
    Interceptor(TypeKey),
    /// A static header, by name (case-insensitive).
    Header(String),
    /// A serializer or deserializer, by selector.
    Codec(SelectorKey),
}

impl BehaviorId {
    pub fn interceptor<I: Interceptor>() -> Self {
        BehaviorId::Interceptor(TypeKey::of::<I>())
    }

    pub fn header(name: impl Into<String>) -> Self {
        BehaviorId::Header(name.into())
    }

    pub fn content(content: ContentType) -> Self {
        BehaviorId::Codec(SelectorKey::Content(content))
    }

    pub fn custom_codec<C: 'static>() -> Self {
        BehaviorId::Codec(SelectorKey::Custom(TypeKey::of::<C>()))
    }

    pub(crate) fn names_header(&self, name: &str) -> bool {
        matches!(self, BehaviorId::Header(h) if h.eq_ignore_ascii_case(name))
    }
}

/// A per-call opt-out from endpoint-wide behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Drop everything the endpoint declares in this category.
    Detach(Category),
    /// Drop one named behavior the endpoint declares.
    Skip(BehaviorId),
}

/// Behavior declared at one level (endpoint or call).
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct BehaviorSet {
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) interceptors: Vec<InterceptorRef>,
    pub(crate) serializer: Option<SerializerSelector>,
    pub(crate) deserializer: Option<DeserializerSelector>,
    pub(crate) is_async: bool,
}

impl BehaviorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a static header. Repeated names are kept in order.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn interceptor<I: Interceptor>(mut self, interceptor: I) -> Self {
        self.interceptors.push(InterceptorRef::new(interceptor));
        self
    }

    pub fn interceptor_ref(mut self, interceptor: InterceptorRef) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn serializer(mut self, selector: SerializerSelector) -> Self {
        self.serializer = Some(selector);
        self
    }

    pub fn deserializer(mut self, selector: DeserializerSelector) -> Self {
        self.deserializer = Some(selector);
        self
    }

    /// Declare the same content type for both directions.
    pub fn content(self, content: ContentType) -> Self {
        self.serializer(SerializerSelector::Content(content))
            .deserializer(DeserializerSelector::Content(content))
    }

    /// Mark calls as non-blocking.
    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn interceptors(&self) -> &[InterceptorRef] {
        &self.interceptors
    }

    pub fn serializer_selector(&self) -> Option<&SerializerSelector> {
        self.serializer.as_ref()
    }

    pub fn deserializer_selector(&self) -> Option<&DeserializerSelector> {
        self.deserializer.as_ref()
    }

    pub fn is_async(&self) -> bool {
        self.is_async
    }
}

/// Unmerged metadata of one call.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct Metadata {
    pub(crate) endpoint: BehaviorSet,
    pub(crate) call: BehaviorSet,
    pub(crate) directives: Vec<Directive>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, behavior: BehaviorSet) -> Self {
        self.endpoint = behavior;
        self
    }

    pub fn call(mut self, behavior: BehaviorSet) -> Self {
        self.call = behavior;
        self
    }

    pub fn detach(mut self, category: Category) -> Self {
        self.directives.push(Directive::Detach(category));
        self
    }

    pub fn skip(mut self, id: BehaviorId) -> Self {
        self.directives.push(Directive::Skip(id));
        self
    }

    pub fn endpoint_behavior(&self) -> &BehaviorSet {
        &self.endpoint
    }

    pub fn call_behavior(&self) -> &BehaviorSet {
        &self.call
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn is_detached(&self, category: Category) -> bool {
        self.directives
            .iter()
            .any(|d| matches!(d, Directive::Detach(c) if *c == category))
    }

    pub fn skips(&self) -> impl Iterator<Item = &BehaviorId> {
        self.directives.iter().filter_map(|d| match d {
            Directive::Skip(id) => Some(id),
            Directive::Detach(_) => None,
        })
    }
}
