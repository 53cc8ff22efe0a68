//! JSON codec backed by `serde_json`.

use crate::base::callerror::BoxError;
use crate::call::shape::{AnyValue, OwnedValue, Shape, ShapeMismatch};
use crate::codec::{ContentType, Deserializer, Handles, Serializer};
use crate::http::response::RawResponse;

/// Built-in `application/json` codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonCodec;

impl Serializer for JsonCodec {
    fn name(&self) -> &'static str {
        "JsonCodec"
    }

    fn handles(&self) -> Handles {
        Handles::Encodable
    }

    fn content_type(&self) -> &str {
        ContentType::Json.mime()
    }

    fn serialize(&self, shape: &Shape, value: &AnyValue) -> Result<Box<AnyValue>, BoxError> {
        let hooks = shape.encode_hooks().ok_or(ShapeMismatch {
            expected: shape.name(),
        })?;
        Ok(Box::new(hooks.to_json(value)?))
    }
}

impl Deserializer for JsonCodec {
    fn name(&self) -> &'static str {
        "JsonCodec"
    }

    fn handles(&self) -> Handles {
        Handles::Decodable
    }

    fn deserialize(&self, shape: &Shape, response: &RawResponse) -> Result<Option<OwnedValue>, BoxError> {
        let body = response.body();
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        let hooks = shape.decode_hooks().ok_or(ShapeMismatch {
            expected: shape.name(),
        })?;
        hooks.from_json(body).map(Some)
    }
}
