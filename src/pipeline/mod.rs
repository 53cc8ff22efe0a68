//! Request and response pipelines.
//!
//! Both pipelines see the call through an [`InvocationContext`]: the
//! descriptor, the resolved behavior, and the codec registry.

pub mod request;
pub mod response;

pub use request::{RequestPipeline, RequestStage};
pub use response::{HeaderSlot, Reply, ResponsePipeline};

use crate::behavior::resolver::EffectiveBehavior;
use crate::call::descriptor::{CallDescriptor, CallId};
use crate::codec::registry::CodecRegistry;

/// Read-only view of one call while its pipelines run.
#[derive(Clone, Copy)]
pub struct InvocationContext<'a> {
    descriptor: &'a CallDescriptor,
    behavior: &'a EffectiveBehavior,
    registry: &'a CodecRegistry,
}

impl<'a> InvocationContext<'a> {
    pub fn new(
        descriptor: &'a CallDescriptor,
        behavior: &'a EffectiveBehavior,
        registry: &'a CodecRegistry,
    ) -> Self {
        Self {
            descriptor,
            behavior,
            registry,
        }
    }

    pub fn descriptor(&self) -> &'a CallDescriptor {
        self.descriptor
    }

    pub fn behavior(&self) -> &'a EffectiveBehavior {
        self.behavior
    }

    pub fn registry(&self) -> &'a CodecRegistry {
        self.registry
    }

    pub fn call_id(&self) -> &'a CallId {
        self.descriptor.id()
    }
}
