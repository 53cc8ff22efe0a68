//! Serializers, deserializers and the registry that hands them out.
//!
//! Codecs are selected either by a predefined [`ContentType`] or by the
//! type identity of a custom codec ([`CodecType`]). Every codec declares
//! which values it [`Handles`]; the pipelines check that against the
//! call's declared [`Shape`] before any data is written or read.
//!
//! # Example
//!
//! ```rust,ignore
//! use stubnet::codec::{CodecRegistry, SerializerSelector, ContentType};
//!
//! let registry = CodecRegistry::new();
//! let json = registry.resolve_serializer(&SerializerSelector::Content(ContentType::Json))?;
//! assert_eq!(json.content_type(), "application/json");
//! ```

pub mod json;
pub mod plain;
pub mod registry;
pub mod xml;

pub use json::JsonCodec;
pub use plain::PlainCodec;
pub use registry::CodecRegistry;
pub use xml::XmlCodec;

use crate::base::callerror::{BoxError, CallError};
use crate::call::descriptor::CallId;
use crate::call::shape::{AnyValue, OwnedValue, Shape, TypeKey};
use crate::http::response::RawResponse;
use std::fmt;
use std::sync::Arc;

/// Predefined content types with built-in codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Plain,
    Json,
    Xml,
}

impl ContentType {
    pub fn mime(self) -> &'static str {
        match self {
            ContentType::Plain => "text/plain; charset=utf-8",
            ContentType::Json => "application/json",
            ContentType::Xml => "application/xml",
        }
    }
}

/// The values a codec accepts (serializers) or produces (deserializers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handles {
    /// Exactly one type.
    Exact(TypeKey),
    /// Any shape with a text renderer.
    Renderable,
    /// Any shape serde can write.
    Encodable,
    /// Any shape serde can read.
    Decodable,
}

impl Handles {
    pub fn accepts(&self, shape: &Shape) -> bool {
        match self {
            Handles::Exact(key) => *key == shape.key(),
            Handles::Renderable => shape.is_renderable(),
            Handles::Encodable => shape.encode_hooks().is_some(),
            Handles::Decodable => shape.decode_hooks().is_some(),
        }
    }
}

impl fmt::Display for Handles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handles::Exact(key) => write!(f, "{}", key),
            Handles::Renderable => f.write_str("text-renderable values"),
            Handles::Encodable => f.write_str("serde-serializable values"),
            Handles::Decodable => f.write_str("serde-deserializable values"),
        }
    }
}

/// Turns an application value into a transmittable payload.
///
/// The output is mapped to a request body by its runtime type, exactly like
/// an entity argument sent without a serializer.
pub trait Serializer: Send + Sync + 'static {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn handles(&self) -> Handles;

    /// Value of the `Content-Type` header for the produced payload.
    fn content_type(&self) -> &str;

    fn serialize(&self, shape: &Shape, value: &AnyValue) -> Result<Box<AnyValue>, BoxError>;
}

/// Turns a received payload into an application value.
///
/// An empty body must not be an error: return a defined empty value or
/// `Ok(None)`.
pub trait Deserializer: Send + Sync + 'static {
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn handles(&self) -> Handles;

    fn deserialize(
        &self,
        shape: &Shape,
        response: &RawResponse,
    ) -> Result<Option<OwnedValue>, BoxError>;
}

impl fmt::Debug for dyn Deserializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

type Factory<C> = Arc<dyn Fn() -> Result<Arc<C>, BoxError> + Send + Sync>;

/// A custom codec type and the way to construct it.
pub struct CodecType<C: ?Sized> {
    key: TypeKey,
    make: Factory<C>,
}

impl<C: ?Sized> Clone for CodecType<C> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            make: Arc::clone(&self.make),
        }
    }
}

impl<C: ?Sized> fmt::Debug for CodecType<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CodecType").field(&self.key.name()).finish()
    }
}

impl<C: ?Sized> CodecType<C> {
    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub(crate) fn construct(&self) -> Result<Arc<C>, BoxError> {
        (self.make)()
    }
}

impl CodecType<dyn Serializer> {
    /// Constructed through `Default`.
    pub fn of<T: Serializer + Default>() -> Self {
        Self::with_factory::<T, _>(|| Ok(T::default()))
    }

    /// Constructed through a fallible factory.
    pub fn with_factory<T, F>(factory: F) -> Self
    where
        T: Serializer,
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            key: TypeKey::of::<T>(),
            make: Arc::new(move || factory().map(|c| Arc::new(c) as Arc<dyn Serializer>)),
        }
    }
}

impl CodecType<dyn Deserializer> {
    /// Constructed through `Default`.
    pub fn of<T: Deserializer + Default>() -> Self {
        Self::with_factory::<T, _>(|| Ok(T::default()))
    }

    /// Constructed through a fallible factory.
    pub fn with_factory<T, F>(factory: F) -> Self
    where
        T: Deserializer,
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            key: TypeKey::of::<T>(),
            make: Arc::new(move || factory().map(|c| Arc::new(c) as Arc<dyn Deserializer>)),
        }
    }
}

/// Picks a codec: a predefined content type or a custom type.
pub enum Selector<C: ?Sized> {
    Content(ContentType),
    Custom(CodecType<C>),
}

pub type SerializerSelector = Selector<dyn Serializer>;
pub type DeserializerSelector = Selector<dyn Deserializer>;

/// Comparable identity of a [`Selector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectorKey {
    Content(ContentType),
    Custom(TypeKey),
}

impl<C: ?Sized> Selector<C> {
    pub fn key(&self) -> SelectorKey {
        match self {
            Selector::Content(content) => SelectorKey::Content(*content),
            Selector::Custom(ty) => SelectorKey::Custom(ty.key()),
        }
    }
}

impl<C: ?Sized> Clone for Selector<C> {
    fn clone(&self) -> Self {
        match self {
            Selector::Content(content) => Selector::Content(*content),
            Selector::Custom(ty) => Selector::Custom(ty.clone()),
        }
    }
}

impl<C: ?Sized> fmt::Debug for Selector<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Content(content) => f.debug_tuple("Content").field(content).finish(),
            Selector::Custom(ty) => f.debug_tuple("Custom").field(ty).finish(),
        }
    }
}

impl SerializerSelector {
    pub fn custom<T: Serializer + Default>() -> Self {
        Selector::Custom(CodecType::<dyn Serializer>::of::<T>())
    }
}

impl DeserializerSelector {
    pub fn custom<T: Deserializer + Default>() -> Self {
        Selector::Custom(CodecType::<dyn Deserializer>::of::<T>())
    }
}

/// Fail fast when a codec cannot handle the declared shape.
pub(crate) fn ensure_assignable(
    call: &CallId,
    codec: &'static str,
    handles: &Handles,
    shape: &Shape,
) -> Result<(), CallError> {
    if handles.accepts(shape) {
        Ok(())
    } else {
        Err(CallError::CodecNotAssignable {
            call: call.clone(),
            codec,
            handles: handles.to_string(),
            shape: shape.name(),
        })
    }
}
