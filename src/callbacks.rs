//! Callback registry and dispatch
//!
//! Per tracked class, per lifecycle method, an ordered list of registered
//! callbacks. Insertion order is dispatch order; duplicate registration is
//! permitted and fires twice. Dispatch is synchronous and holds no reference
//! to the tracked object itself: callbacks receive the tracker and the
//! sanitized stack.
//!
//! A callback error is not caught here: dispatch stops at the first failure
//! and propagates it, leaving the propagation policy to the caller.

use crate::frame::StackFrame;
use crate::method::LifecycleMethod;
use crate::tracker::ObjectTracker;
use anyhow::Result;
use std::collections::HashMap;

/// A registered lifecycle callback.
///
/// The call stack provided here is sanitized: the capture machinery's own
/// leading frames and any denylisted symbols are already removed.
pub type LifecycleCallback = Box<dyn FnMut(&ObjectTracker, &[StackFrame]) -> Result<()> + Send>;

/// Ordered callback lists keyed by (class, method).
#[derive(Default)]
pub struct CallbackRegistry {
    classes: HashMap<String, HashMap<LifecycleMethod, Vec<LifecycleCallback>>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback to the class/method list. No upper bound, no dedup.
    pub fn register(&mut self, class: &str, method: LifecycleMethod, callback: LifecycleCallback) {
        self.classes
            .entry(class.to_string())
            .or_default()
            .entry(method)
            .or_default()
            .push(callback);
    }

    /// Clear the list for one class/method pair.
    pub fn unregister(&mut self, class: &str, method: LifecycleMethod) {
        if let Some(methods) = self.classes.get_mut(class) {
            methods.remove(&method);
            if methods.is_empty() {
                self.classes.remove(class);
            }
        }
    }

    /// Clear every list for one class.
    pub fn unregister_class(&mut self, class: &str) {
        self.classes.remove(class);
    }

    /// Clear the entire registry.
    pub fn clear(&mut self) {
        self.classes.clear();
    }

    /// True when any method of this class has a registered callback.
    pub fn has_callbacks(&self, class: &str) -> bool {
        self.classes
            .get(class)
            .is_some_and(|methods| methods.values().any(|list| !list.is_empty()))
    }

    /// Number of callbacks registered for one class/method pair.
    pub fn callback_count(&self, class: &str, method: LifecycleMethod) -> usize {
        self.classes
            .get(class)
            .and_then(|methods| methods.get(&method))
            .map_or(0, Vec::len)
    }

    /// Invoke every callback for the exact class/method, in registration
    /// order. The first callback error aborts the remaining callbacks for
    /// this event and is returned to the caller.
    pub fn dispatch(
        &mut self,
        class: &str,
        method: LifecycleMethod,
        tracker: &ObjectTracker,
        stack: &[StackFrame],
    ) -> Result<()> {
        let Some(list) = self
            .classes
            .get_mut(class)
            .and_then(|methods| methods.get_mut(&method))
        else {
            return Ok(());
        };
        for callback in list.iter_mut() {
            callback(tracker, stack)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ObjectId;
    use anyhow::bail;
    use std::sync::{Arc, Mutex};

    fn tracker() -> ObjectTracker {
        ObjectTracker::new(ObjectId(0x99), "Widget")
    }

    fn recording_callback(log: &Arc<Mutex<Vec<String>>>, tag: &str) -> LifecycleCallback {
        let log = Arc::clone(log);
        let tag = tag.to_string();
        Box::new(move |_, _| {
            log.lock().unwrap().push(tag.clone());
            Ok(())
        })
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        registry.register("Widget", LifecycleMethod::Retain, recording_callback(&log, "a"));
        registry.register("Widget", LifecycleMethod::Retain, recording_callback(&log, "b"));
        registry
            .dispatch("Widget", LifecycleMethod::Retain, &tracker(), &[])
            .unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_duplicate_registration_fires_twice() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        registry.register("Widget", LifecycleMethod::Create, recording_callback(&log, "x"));
        registry.register("Widget", LifecycleMethod::Create, recording_callback(&log, "x"));
        registry
            .dispatch("Widget", LifecycleMethod::Create, &tracker(), &[])
            .unwrap();
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_dispatch_matches_exact_class_and_method() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        registry.register("Widget", LifecycleMethod::Retain, recording_callback(&log, "w"));
        registry
            .dispatch("Other", LifecycleMethod::Retain, &tracker(), &[])
            .unwrap();
        registry
            .dispatch("Widget", LifecycleMethod::Release, &tracker(), &[])
            .unwrap();
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_error_aborts_remaining_callbacks() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        registry.register("Widget", LifecycleMethod::Release, recording_callback(&log, "first"));
        registry.register(
            "Widget",
            LifecycleMethod::Release,
            Box::new(|_, _| bail!("sink unavailable")),
        );
        registry.register("Widget", LifecycleMethod::Release, recording_callback(&log, "last"));

        let err = registry
            .dispatch("Widget", LifecycleMethod::Release, &tracker(), &[])
            .unwrap_err();
        assert!(err.to_string().contains("sink unavailable"));
        assert_eq!(*log.lock().unwrap(), vec!["first"]);
    }

    #[test]
    fn test_unregister_clears_one_method() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        registry.register("Widget", LifecycleMethod::Retain, recording_callback(&log, "r"));
        registry.register("Widget", LifecycleMethod::Release, recording_callback(&log, "l"));
        registry.unregister("Widget", LifecycleMethod::Retain);
        assert_eq!(registry.callback_count("Widget", LifecycleMethod::Retain), 0);
        assert_eq!(registry.callback_count("Widget", LifecycleMethod::Release), 1);
        assert!(registry.has_callbacks("Widget"));
    }

    #[test]
    fn test_unregister_class_clears_all_methods() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        registry.register("Widget", LifecycleMethod::Retain, recording_callback(&log, "r"));
        registry.register("Widget", LifecycleMethod::Destroy, recording_callback(&log, "d"));
        registry.unregister_class("Widget");
        assert!(!registry.has_callbacks("Widget"));
    }

    #[test]
    fn test_clear_empties_everything() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        registry.register("Widget", LifecycleMethod::Retain, recording_callback(&log, "r"));
        registry.register("Gadget", LifecycleMethod::Create, recording_callback(&log, "c"));
        registry.clear();
        assert!(!registry.has_callbacks("Widget"));
        assert!(!registry.has_callbacks("Gadget"));
    }

    #[test]
    fn test_callback_receives_tracker_and_stack() {
        let seen = Arc::new(Mutex::new(None));
        let seen_clone = Arc::clone(&seen);
        let mut registry = CallbackRegistry::new();
        registry.register(
            "Widget",
            LifecycleMethod::Retain,
            Box::new(move |tracker, stack| {
                *seen_clone.lock().unwrap() = Some((tracker.object, stack.len()));
                Ok(())
            }),
        );
        let frames = vec![StackFrame::parse("0   app   0x00001000 main + 1")];
        registry
            .dispatch("Widget", LifecycleMethod::Retain, &tracker(), &frames)
            .unwrap();
        assert_eq!(*seen.lock().unwrap(), Some((ObjectId(0x99), 1)));
    }
}
