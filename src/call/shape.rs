//! Runtime descriptions of declared parameter and return types.
//!
//! A [`Shape`] is what a stub knows statically about a value: its type
//! identity, whether it can be rendered as text, and whether serde can
//! encode or decode it. Codecs and pipeline stages only ever see values as
//! `&dyn Any`, so the shape carries the monomorphized hooks they need.

use crate::base::callerror::BoxError;
use crate::http::response::RawResponse;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// A value travelling through the engine.
pub type AnyValue = dyn Any + Send + Sync;

/// A value produced by a deserializer.
pub type OwnedValue = Box<dyn Any + Send>;

/// Type identity plus a printable name. Equality only looks at the `TypeId`.
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// What the engine does with a value of this shape by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// `()`: nothing is expected back.
    Unit,
    /// `String`: eligible for the implicit plain-text codec.
    Text,
    /// `bytes::Bytes`: the raw response payload, returned unprocessed.
    Bytes,
    /// [`RawResponse`]: the whole response, returned unprocessed.
    Response,
    /// Anything else.
    Value,
}

/// Text form of a parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    One(String),
    Many(Vec<String>),
}

impl Rendered {
    pub fn into_values(self) -> Vec<String> {
        match self {
            Rendered::One(value) => vec![value],
            Rendered::Many(values) => values,
        }
    }
}

type RenderFn = fn(&AnyValue) -> Option<Rendered>;
type EncodeFn = fn(&AnyValue) -> Result<String, BoxError>;
type DecodeFn = fn(&[u8]) -> Result<OwnedValue, BoxError>;

/// A value did not have the type its shape promised.
#[derive(Debug, Error)]
#[error("expected a value of type {expected}")]
pub struct ShapeMismatch {
    pub expected: &'static str,
}

/// Serde encoders for one concrete type.
#[derive(Clone, Copy)]
pub struct EncodeHooks {
    json: EncodeFn,
    xml: EncodeFn,
}

impl EncodeHooks {
    pub fn to_json(&self, value: &AnyValue) -> Result<String, BoxError> {
        (self.json)(value)
    }

    pub fn to_xml(&self, value: &AnyValue) -> Result<String, BoxError> {
        (self.xml)(value)
    }
}

/// Serde decoders for one concrete type.
#[derive(Clone, Copy)]
pub struct DecodeHooks {
    json: DecodeFn,
    xml: DecodeFn,
}

impl DecodeHooks {
    pub fn from_json(&self, payload: &[u8]) -> Result<OwnedValue, BoxError> {
        (self.json)(payload)
    }

    pub fn from_xml(&self, payload: &[u8]) -> Result<OwnedValue, BoxError> {
        (self.xml)(payload)
    }
}

/// Declared type of a parameter or return value.
#[derive(Clone)]
pub struct Shape {
    key: TypeKey,
    kind: ShapeKind,
    render: Option<RenderFn>,
    encode: Option<EncodeHooks>,
    decode: Option<DecodeHooks>,
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("type", &self.key.name)
            .field("kind", &self.kind)
            .field("renderable", &self.render.is_some())
            .field("encodable", &self.encode.is_some())
            .field("decodable", &self.decode.is_some())
            .finish()
    }
}

impl Shape {
    /// Identity only; the kind is inferred from the well-known types.
    pub fn of<T: Any>() -> Self {
        let id = TypeId::of::<T>();
        let kind = if id == TypeId::of::<()>() {
            ShapeKind::Unit
        } else if id == TypeId::of::<String>() {
            ShapeKind::Text
        } else if id == TypeId::of::<Bytes>() {
            ShapeKind::Bytes
        } else if id == TypeId::of::<RawResponse>() {
            ShapeKind::Response
        } else {
            ShapeKind::Value
        };
        Self {
            key: TypeKey::of::<T>(),
            kind,
            render: None,
            encode: None,
            decode: None,
        }
    }

    pub fn unit() -> Self {
        Self::of::<()>()
    }

    /// `String`, renderable and serde-capable.
    pub fn text() -> Self {
        Self::serde::<String>().rendered_by(render_one::<String>)
    }

    pub fn bytes() -> Self {
        Self::of::<Bytes>()
    }

    pub fn response() -> Self {
        Self::of::<RawResponse>()
    }

    /// A scalar rendered through `Display`.
    pub fn display<T: fmt::Display + Any>() -> Self {
        Self::of::<T>().rendered_by(render_one::<T>)
    }

    /// A `Vec<T>` rendered as one text value per element.
    pub fn display_list<T: fmt::Display + Any>() -> Self {
        Self::of::<Vec<T>>().rendered_by(render_many::<T>)
    }

    /// A type serde can write.
    pub fn serialize<T: Serialize + Any>() -> Self {
        Self::of::<T>().with_encode::<T>()
    }

    /// A type serde can read.
    pub fn deserialize<T: DeserializeOwned + Any + Send>() -> Self {
        Self::of::<T>().with_decode::<T>()
    }

    /// A type serde can both write and read.
    pub fn serde<T: Serialize + DeserializeOwned + Any + Send>() -> Self {
        Self::of::<T>().with_encode::<T>().with_decode::<T>()
    }

    fn rendered_by(mut self, render: RenderFn) -> Self {
        self.render = Some(render);
        self
    }

    fn with_encode<T: Serialize + Any>(mut self) -> Self {
        self.encode = Some(EncodeHooks {
            json: encode_json::<T>,
            xml: encode_xml::<T>,
        });
        self
    }

    fn with_decode<T: DeserializeOwned + Any + Send>(mut self) -> Self {
        self.decode = Some(DecodeHooks {
            json: decode_json::<T>,
            xml: decode_xml::<T>,
        });
        self
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn name(&self) -> &'static str {
        self.key.name
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn is_unit(&self) -> bool {
        self.kind == ShapeKind::Unit
    }

    pub fn is_text(&self) -> bool {
        self.kind == ShapeKind::Text
    }

    pub fn is<T: Any>(&self) -> bool {
        self.key.id == TypeId::of::<T>()
    }

    pub fn is_renderable(&self) -> bool {
        self.render.is_some()
    }

    /// Text form of `value`, or `None` if the shape has no renderer or the
    /// value is not of the declared type.
    pub fn render(&self, value: &AnyValue) -> Option<Rendered> {
        self.render.and_then(|render| render(value))
    }

    pub fn encode_hooks(&self) -> Option<&EncodeHooks> {
        self.encode.as_ref()
    }

    pub fn decode_hooks(&self) -> Option<&DecodeHooks> {
        self.decode.as_ref()
    }
}

fn render_one<T: fmt::Display + Any>(value: &AnyValue) -> Option<Rendered> {
    value
        .downcast_ref::<T>()
        .map(|value| Rendered::One(value.to_string()))
}

fn render_many<T: fmt::Display + Any>(value: &AnyValue) -> Option<Rendered> {
    value
        .downcast_ref::<Vec<T>>()
        .map(|values| Rendered::Many(values.iter().map(ToString::to_string).collect()))
}

fn downcast<T: Any>(value: &AnyValue) -> Result<&T, BoxError> {
    value.downcast_ref::<T>().ok_or_else(|| {
        Box::new(ShapeMismatch {
            expected: std::any::type_name::<T>(),
        }) as BoxError
    })
}

fn encode_json<T: Serialize + Any>(value: &AnyValue) -> Result<String, BoxError> {
    Ok(serde_json::to_string(downcast::<T>(value)?)?)
}

fn encode_xml<T: Serialize + Any>(value: &AnyValue) -> Result<String, BoxError> {
    Ok(quick_xml::se::to_string(downcast::<T>(value)?)?)
}

fn decode_json<T: DeserializeOwned + Any + Send>(payload: &[u8]) -> Result<OwnedValue, BoxError> {
    let value: T = serde_json::from_slice(payload)?;
    Ok(Box::new(value))
}

fn decode_xml<T: DeserializeOwned + Any + Send>(payload: &[u8]) -> Result<OwnedValue, BoxError> {
    let text = std::str::from_utf8(payload)?;
    let value: T = quick_xml::de::from_str(text)?;
    Ok(Box::new(value))
}
