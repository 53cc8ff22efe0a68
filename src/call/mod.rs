//! Call descriptions handed to the engine by the front end.
//!
//! - [`descriptor`]: the immutable [`CallDescriptor`] and its parts
//! - [`shape`]: runtime stand-ins for declared parameter/return types
//! - [`metadata`]: unmerged endpoint and call behavior plus directives

pub mod descriptor;
pub mod metadata;
pub mod shape;

pub use descriptor::{
    ArgRole, Argument, CallDescriptor, CallDescriptorBuilder, CallFacts, CallId, EndpointFacts,
};
pub use metadata::{BehaviorId, BehaviorSet, Category, Directive, Metadata};
pub use shape::{AnyValue, OwnedValue, Rendered, Shape, ShapeKind, TypeKey};
