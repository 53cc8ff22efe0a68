use crate::call::descriptor::ArgRole;
use crate::http::response::RawResponse;
use crate::pipeline::InvocationContext;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Receives one response header value for the caller.
#[derive(Debug, Clone, Default)]
pub struct HeaderSlot(Arc<Mutex<Option<String>>>);

impl HeaderSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The captured value, if the response carried the header.
    pub fn get(&self) -> Option<String> {
        match self.0.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub(crate) fn fill(&self, value: String) {
        match self.0.lock() {
            Ok(mut guard) => *guard = Some(value),
            Err(poisoned) => *poisoned.into_inner() = Some(value),
        }
    }
}

/// Copies response headers into the call's capture slots.
///
/// Each slot takes the first not-yet-claimed value of its header, so two
/// slots naming the same header receive successive values.
#[derive(Debug, Default)]
pub struct ResponseHeaderStage;

impl ResponseHeaderStage {
    pub fn apply(&self, ctx: &InvocationContext<'_>, response: &RawResponse) {
        let mut pool: Vec<(&str, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str(), value.to_string()))
            })
            .collect();

        for argument in ctx.descriptor().arguments() {
            let ArgRole::ResponseHeader(name) = argument.role() else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            let Some(slot) = argument.value_as::<HeaderSlot>() else {
                continue;
            };
            if let Some(index) = pool.iter().position(|(n, _)| n.eq_ignore_ascii_case(name)) {
                let (_, value) = pool.remove(index);
                debug!(call = %ctx.call_id(), header = %name, "Captured response header");
                slot.fill(value);
            }
        }
    }
}
