//! Request body installed by the form or entity stage.

use crate::base::callerror::BoxError;
use bytes::Bytes;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// A value that knows how to write itself as an opaque binary payload.
pub trait BinaryEncode: Send + Sync {
    fn encode_binary(&self) -> Result<Vec<u8>, BoxError>;
}

type Reader = Box<dyn Read + Send>;

/// A readable stream sent as the body. The reader can be taken once;
/// clones share the same reader.
#[derive(Clone)]
pub struct StreamBody {
    reader: Arc<Mutex<Option<Reader>>>,
}

impl StreamBody {
    pub fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            reader: Arc::new(Mutex::new(Some(Box::new(reader)))),
        }
    }

    /// Take the reader. Later calls (on any clone) return `None`.
    pub fn take(&self) -> Option<Reader> {
        match self.reader.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl fmt::Debug for StreamBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StreamBody")
    }
}

/// Request body for HTTP methods that send data.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body (GET, HEAD, DELETE).
    #[default]
    Empty,
    /// Body with raw bytes.
    Bytes(Bytes),
    /// Contents of a file, read by the transport.
    File(PathBuf),
    /// A stream, drained by the transport.
    Stream(StreamBody),
}

impl From<String> for RequestBody {
    fn from(s: String) -> Self {
        RequestBody::Bytes(Bytes::from(s))
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(v: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(v))
    }
}

impl From<&str> for RequestBody {
    fn from(s: &str) -> Self {
        RequestBody::Bytes(Bytes::from(s.to_owned()))
    }
}

impl From<Bytes> for RequestBody {
    fn from(b: Bytes) -> Self {
        RequestBody::Bytes(b)
    }
}

impl From<PathBuf> for RequestBody {
    fn from(p: PathBuf) -> Self {
        RequestBody::File(p)
    }
}

impl From<StreamBody> for RequestBody {
    fn from(s: StreamBody) -> Self {
        RequestBody::Stream(s)
    }
}

impl RequestBody {
    /// Check if no body is installed.
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    /// Length in bytes when known up front.
    pub fn len(&self) -> Option<usize> {
        match self {
            RequestBody::Empty => Some(0),
            RequestBody::Bytes(b) => Some(b.len()),
            RequestBody::File(_) | RequestBody::Stream(_) => None,
        }
    }

    /// In-memory payload, if any.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            RequestBody::Bytes(b) => Some(b),
            _ => None,
        }
    }
}
