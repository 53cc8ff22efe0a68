//! Plain-text codec.
//!
//! Serializes anything with a text rendering; deserializes into `String`.
//! This is also the implicit codec for text-shaped values when no codec is
//! declared at any level.

use crate::base::callerror::BoxError;
use crate::call::shape::{AnyValue, OwnedValue, Rendered, Shape, ShapeMismatch, TypeKey};
use crate::codec::{ContentType, Deserializer, Handles, Serializer};
use crate::http::response::RawResponse;

/// Built-in `text/plain` codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainCodec;

impl Serializer for PlainCodec {
    fn name(&self) -> &'static str {
        "PlainCodec"
    }

    fn handles(&self) -> Handles {
        Handles::Renderable
    }

    fn content_type(&self) -> &str {
        ContentType::Plain.mime()
    }

    fn serialize(&self, shape: &Shape, value: &AnyValue) -> Result<Box<AnyValue>, BoxError> {
        let text = match shape.render(value) {
            Some(Rendered::One(text)) => text,
            Some(Rendered::Many(values)) => values.join(","),
            None => {
                return Err(Box::new(ShapeMismatch {
                    expected: shape.name(),
                }))
            }
        };
        Ok(Box::new(text))
    }
}

impl Deserializer for PlainCodec {
    fn name(&self) -> &'static str {
        "PlainCodec"
    }

    fn handles(&self) -> Handles {
        Handles::Exact(TypeKey::of::<String>())
    }

    fn deserialize(&self, _: &Shape, response: &RawResponse) -> Result<Option<OwnedValue>, BoxError> {
        // Empty bodies decode to "".
        let text = std::str::from_utf8(response.body())?;
        Ok(Some(Box::new(text.to_owned())))
    }
}
