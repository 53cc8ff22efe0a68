//! Merges endpoint-level and call-level metadata into one effective view.
//!
//! Precedence:
//! - call-level beats endpoint-level within a category;
//! - `Detach(category)` drops every endpoint entry of that category;
//! - `Skip(id)` drops the one endpoint entry it names;
//! - list categories concatenate endpoint, call, then runtime entries;
//! - codecs are singletons. A missing codec is an error only where one is
//!   required, except that text shapes fall back to plain text.

use crate::base::callerror::CallError;
use crate::behavior::interceptor::InterceptorRef;
use crate::call::descriptor::{ArgRole, CallDescriptor, CallId};
use crate::call::metadata::{BehaviorId, Category, Metadata};
use crate::call::shape::Shape;
use crate::codec::{ContentType, DeserializerSelector, Selector, SerializerSelector};

/// The behavior that applies to one call, computed fresh per invocation.
#[derive(Debug, Clone, Default)]
pub struct EffectiveBehavior {
    pub headers: Vec<(String, String)>,
    pub interceptors: Vec<InterceptorRef>,
    pub serializer: Option<SerializerSelector>,
    pub deserializer: Option<DeserializerSelector>,
    pub is_async: bool,
}

impl EffectiveBehavior {
    /// The serializer to use, or plain text for text shapes.
    pub fn required_serializer(
        &self,
        call: &CallId,
        shape: &Shape,
    ) -> Result<SerializerSelector, CallError> {
        match &self.serializer {
            Some(selector) => Ok(selector.clone()),
            None if shape.is_text() => Ok(Selector::Content(ContentType::Plain)),
            None => Err(CallError::undefined(call, Category::Serializer)),
        }
    }

    /// The deserializer to use, or plain text for text shapes.
    pub fn required_deserializer(
        &self,
        call: &CallId,
        shape: &Shape,
    ) -> Result<DeserializerSelector, CallError> {
        match &self.deserializer {
            Some(selector) => Ok(selector.clone()),
            None if shape.is_text() => Ok(Selector::Content(ContentType::Plain)),
            None => Err(CallError::undefined(call, Category::Deserializer)),
        }
    }
}

/// Stateless metadata resolution.
pub struct MetadataResolver;

impl MetadataResolver {
    pub fn resolve(descriptor: &CallDescriptor) -> EffectiveBehavior {
        EffectiveBehavior {
            headers: Self::resolve_headers(descriptor),
            interceptors: Self::resolve_interceptors(descriptor),
            serializer: Self::resolve_serializer(descriptor),
            deserializer: Self::resolve_deserializer(descriptor),
            is_async: Self::resolve_async(descriptor),
        }
    }

    pub fn resolve_headers(descriptor: &CallDescriptor) -> Vec<(String, String)> {
        let meta = descriptor.metadata();
        let mut headers = Vec::new();
        if !meta.is_detached(Category::Headers) {
            headers.extend(
                meta.endpoint
                    .headers
                    .iter()
                    .filter(|(name, _)| !meta.skips().any(|id| id.names_header(name)))
                    .cloned(),
            );
        }
        headers.extend(meta.call.headers.iter().cloned());
        headers
    }

    pub fn resolve_interceptors(descriptor: &CallDescriptor) -> Vec<InterceptorRef> {
        let meta = descriptor.metadata();
        let mut interceptors = Vec::new();
        if !meta.is_detached(Category::Interceptors) {
            interceptors.extend(
                meta.endpoint
                    .interceptors
                    .iter()
                    .filter(|i| !skipped(meta, &BehaviorId::Interceptor(i.id())))
                    .cloned(),
            );
        }
        interceptors.extend(meta.call.interceptors.iter().cloned());
        interceptors.extend(
            descriptor
                .arguments_where(|role| *role == ArgRole::Interceptor)
                .filter_map(|arg| arg.value_as::<InterceptorRef>())
                .cloned(),
        );
        interceptors
    }

    pub fn resolve_serializer(descriptor: &CallDescriptor) -> Option<SerializerSelector> {
        let meta = descriptor.metadata();
        meta.call.serializer.clone().or_else(|| {
            inherited(meta, Category::Serializer, meta.endpoint.serializer.as_ref())
        })
    }

    pub fn resolve_deserializer(descriptor: &CallDescriptor) -> Option<DeserializerSelector> {
        let meta = descriptor.metadata();
        meta.call.deserializer.clone().or_else(|| {
            inherited(meta, Category::Deserializer, meta.endpoint.deserializer.as_ref())
        })
    }

    pub fn resolve_async(descriptor: &CallDescriptor) -> bool {
        let meta = descriptor.metadata();
        meta.call.is_async || (meta.endpoint.is_async && !meta.is_detached(Category::Async))
    }
}

fn skipped(meta: &Metadata, id: &BehaviorId) -> bool {
    meta.skips().any(|skip| skip == id)
}

fn inherited<C: ?Sized>(
    meta: &Metadata,
    category: Category,
    selector: Option<&Selector<C>>,
) -> Option<Selector<C>> {
    if meta.is_detached(category) {
        return None;
    }
    selector
        .filter(|s| !skipped(meta, &BehaviorId::Codec(s.key())))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::descriptor::{CallFacts, EndpointFacts};
    use crate::call::metadata::BehaviorSet;
    use crate::codec::SelectorKey;
    use http::Method;

    fn descriptor(meta: Metadata) -> CallDescriptor {
        CallDescriptor::builder(
            EndpointFacts::new("svc", "http://h"),
            CallFacts::new("op", Method::GET, "/"),
        )
        .metadata(meta)
        .build()
    }

    #[test]
    fn test_call_level_codec_wins() {
        let d = descriptor(
            Metadata::new()
                .endpoint(BehaviorSet::new().content(ContentType::Xml))
                .call(BehaviorSet::new().serializer(Selector::Content(ContentType::Json))),
        );
        let b = MetadataResolver::resolve(&d);
        assert_eq!(
            b.serializer.map(|s| s.key()),
            Some(SelectorKey::Content(ContentType::Json))
        );
        assert_eq!(
            b.deserializer.map(|s| s.key()),
            Some(SelectorKey::Content(ContentType::Xml))
        );
    }

    #[test]
    fn test_header_merge_order_and_skip() {
        let d = descriptor(
            Metadata::new()
                .endpoint(BehaviorSet::new().header("A", "1").header("B", "2"))
                .call(BehaviorSet::new().header("A", "3"))
                .skip(BehaviorId::header("b")),
        );
        let headers = MetadataResolver::resolve_headers(&d);
        assert_eq!(
            headers,
            vec![("A".to_string(), "1".to_string()), ("A".to_string(), "3".to_string())]
        );
    }

    #[test]
    fn test_detach_keeps_call_level() {
        let d = descriptor(
            Metadata::new()
                .endpoint(BehaviorSet::new().header("A", "1"))
                .call(BehaviorSet::new().header("C", "2"))
                .detach(Category::Headers),
        );
        let headers = MetadataResolver::resolve_headers(&d);
        assert_eq!(headers, vec![("C".to_string(), "2".to_string())]);
    }

    #[test]
    fn test_skip_codec_by_selector() {
        let d = descriptor(
            Metadata::new()
                .endpoint(BehaviorSet::new().content(ContentType::Json))
                .skip(BehaviorId::content(ContentType::Json)),
        );
        assert!(MetadataResolver::resolve_serializer(&d).is_none());
        assert!(MetadataResolver::resolve_deserializer(&d).is_none());
    }

    #[test]
    fn test_async_detach() {
        let d = descriptor(
            Metadata::new()
                .endpoint(BehaviorSet::new().asynchronous())
                .detach(Category::Async),
        );
        assert!(!MetadataResolver::resolve_async(&d));

        let d = descriptor(Metadata::new().endpoint(BehaviorSet::new().asynchronous()));
        assert!(MetadataResolver::resolve_async(&d));
    }

    #[test]
    fn test_text_falls_back_to_plain() {
        let call = CallId::new("svc", "op");
        let behavior = EffectiveBehavior::default();
        let selector = behavior.required_deserializer(&call, &Shape::text()).unwrap();
        assert_eq!(selector.key(), SelectorKey::Content(ContentType::Plain));

        let err = behavior
            .required_serializer(&call, &Shape::of::<u32>())
            .unwrap_err();
        assert!(matches!(
            err,
            CallError::UndefinedBehavior {
                category: Category::Serializer,
                ..
            }
        ));
    }
}
