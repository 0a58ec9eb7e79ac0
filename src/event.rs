//! Lifecycle event input
//!
//! The tuple an interception provider delivers once per reference-count
//! operation: object identity, class chain, method kind, and the raw stack
//! trace lines captured at the call site. The provider guarantees per-object
//! chronological order and delivers each notification before the underlying
//! operation takes effect.

use crate::method::LifecycleMethod;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-owning identity of a tracked object.
///
/// A raw address or handle value, only ever compared or formatted for
/// display. It is never dereferenced, and it guarantees nothing about the
/// referent's continued existence after the destroy notification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// One lifecycle notification from the interception provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    /// Identity of the object the operation targets.
    pub object: ObjectId,
    /// Class chain, most-derived first. The head is the exact class used
    /// for callback dispatch; leak monitoring matches any element.
    pub class_chain: Vec<String>,
    /// Which memory management method fired.
    pub method: LifecycleMethod,
    /// Raw symbolic backtrace lines, untrimmed.
    pub raw_stack: Vec<String>,
}

impl LifecycleEvent {
    pub fn new(
        object: ObjectId,
        class: impl Into<String>,
        method: LifecycleMethod,
        raw_stack: Vec<String>,
    ) -> Self {
        Self {
            object,
            class_chain: vec![class.into()],
            method,
            raw_stack,
        }
    }

    /// Append superclass names to the chain, in ascending order.
    pub fn with_ancestors<I, S>(mut self, ancestors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_chain.extend(ancestors.into_iter().map(Into::into));
        self
    }

    /// The exact (most-derived) class of the object.
    pub fn class(&self) -> &str {
        self.class_chain.first().map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_display_is_hex() {
        assert_eq!(ObjectId(0x8105400).to_string(), "0x8105400");
        assert_eq!(ObjectId(0).to_string(), "0x0");
    }

    #[test]
    fn test_event_class_is_chain_head() {
        let event = LifecycleEvent::new(
            ObjectId(1),
            "MyView",
            LifecycleMethod::Create,
            Vec::new(),
        )
        .with_ancestors(["View", "Responder"]);
        assert_eq!(event.class(), "MyView");
        assert_eq!(event.class_chain, vec!["MyView", "View", "Responder"]);
    }

    #[test]
    fn test_event_without_ancestors_has_single_entry_chain() {
        let event = LifecycleEvent::new(ObjectId(2), "Widget", LifecycleMethod::Retain, Vec::new());
        assert_eq!(event.class_chain.len(), 1);
        assert_eq!(event.class(), "Widget");
    }
}
