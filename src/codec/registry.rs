//! Codec instance cache.
//!
//! Built-in codecs are created with the registry. Custom codecs are created
//! on first use and kept for the registry's lifetime; concurrent first
//! lookups of the same type construct exactly one instance.

use crate::base::callerror::{panic_message, BoxError, CodecError};
use crate::call::shape::TypeKey;
use crate::codec::{
    CodecType, ContentType, Deserializer, DeserializerSelector, JsonCodec, PlainCodec, Selector,
    Serializer, SerializerSelector, XmlCodec,
};
use dashmap::DashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

struct Builtins<C: ?Sized> {
    plain: Arc<C>,
    json: Arc<C>,
    xml: Arc<C>,
}

impl<C: ?Sized> Builtins<C> {
    fn get(&self, content: ContentType) -> Arc<C> {
        match content {
            ContentType::Plain => Arc::clone(&self.plain),
            ContentType::Json => Arc::clone(&self.json),
            ContentType::Xml => Arc::clone(&self.xml),
        }
    }
}

/// Thread-safe registry of serializer and deserializer instances.
pub struct CodecRegistry {
    serializers: Builtins<dyn Serializer>,
    deserializers: Builtins<dyn Deserializer>,
    custom_serializers: DashMap<TypeKey, Arc<dyn Serializer>>,
    custom_deserializers: DashMap<TypeKey, Arc<dyn Deserializer>>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("custom_serializers", &self.custom_serializers.len())
            .field("custom_deserializers", &self.custom_deserializers.len())
            .finish()
    }
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self {
            serializers: Builtins {
                plain: Arc::new(PlainCodec),
                json: Arc::new(JsonCodec),
                xml: Arc::new(XmlCodec),
            },
            deserializers: Builtins {
                plain: Arc::new(PlainCodec),
                json: Arc::new(JsonCodec),
                xml: Arc::new(XmlCodec),
            },
            custom_serializers: DashMap::new(),
            custom_deserializers: DashMap::new(),
        }
    }

    pub fn resolve_serializer(
        &self,
        selector: &SerializerSelector,
    ) -> Result<Arc<dyn Serializer>, CodecError> {
        match selector {
            Selector::Content(content) => Ok(self.serializers.get(*content)),
            Selector::Custom(ty) => cached(&self.custom_serializers, ty),
        }
    }

    pub fn resolve_deserializer(
        &self,
        selector: &DeserializerSelector,
    ) -> Result<Arc<dyn Deserializer>, CodecError> {
        match selector {
            Selector::Content(content) => Ok(self.deserializers.get(*content)),
            Selector::Custom(ty) => cached(&self.custom_deserializers, ty),
        }
    }

    /// Number of custom codec instances created so far.
    pub fn custom_len(&self) -> usize {
        self.custom_serializers.len() + self.custom_deserializers.len()
    }
}

fn cached<C: ?Sized>(
    cache: &DashMap<TypeKey, Arc<C>>,
    ty: &CodecType<C>,
) -> Result<Arc<C>, CodecError> {
    let key = ty.key();
    if let Some(hit) = cache.get(&key) {
        return Ok(Arc::clone(hit.value()));
    }

    // The entry lock is held while constructing, so racing callers wait for
    // this instance instead of building their own.
    let entry = cache
        .entry(key)
        .or_try_insert_with(|| construct(ty))
        .map_err(|source| CodecError {
            codec: key.name(),
            source,
        })?;
    Ok(Arc::clone(entry.value()))
}

fn construct<C: ?Sized>(ty: &CodecType<C>) -> Result<Arc<C>, BoxError> {
    debug!(codec = ty.key().name(), "Instantiating codec");
    match panic::catch_unwind(AssertUnwindSafe(|| ty.construct())) {
        Ok(result) => result,
        Err(payload) => Err(panic_message(payload.as_ref()).into()),
    }
}
