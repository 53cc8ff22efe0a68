//! XML codec backed by `quick-xml`'s serde support.
//!
//! The root element is named after the serialized type.

use crate::base::callerror::BoxError;
use crate::call::shape::{AnyValue, OwnedValue, Shape, ShapeMismatch};
use crate::codec::{ContentType, Deserializer, Handles, Serializer};
use crate::http::response::RawResponse;

/// Built-in `application/xml` codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlCodec;

impl Serializer for XmlCodec {
    fn name(&self) -> &'static str {
        "XmlCodec"
    }

    fn handles(&self) -> Handles {
        Handles::Encodable
    }

    fn content_type(&self) -> &str {
        ContentType::Xml.mime()
    }

    fn serialize(&self, shape: &Shape, value: &AnyValue) -> Result<Box<AnyValue>, BoxError> {
        let hooks = shape.encode_hooks().ok_or(ShapeMismatch {
            expected: shape.name(),
        })?;
        Ok(Box::new(hooks.to_xml(value)?))
    }
}

impl Deserializer for XmlCodec {
    fn name(&self) -> &'static str {
        "XmlCodec"
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
        hooks.from_xml(body).map(Some)
    }
}
