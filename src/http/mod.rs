pub mod orderedheaders;
pub mod request;
pub mod requestbody;
pub mod response;

// Re-exports for convenience
pub use orderedheaders::OrderedHeaderMap;
pub use request::RequestAccumulator;
pub use requestbody::{BinaryEncode, RequestBody, StreamBody};
pub use response::RawResponse;
