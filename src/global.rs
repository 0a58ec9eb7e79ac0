//! Process-wide tracking state
//!
//! A single [`TrackerEngine`] behind one mutex, initialized on first use.
//! The lock is held for a notification's entire processing (tracker update,
//! monitor append, callback dispatch), so callbacks always observe a
//! consistent snapshot and notifications for different objects never
//! interleave their state transitions. A callback that blocks indefinitely
//! blocks all subsequent notifications process-wide; determinism is chosen
//! over throughput here.
//!
//! Typical debugging session:
//!
//! ```
//! use rastro::event::{LifecycleEvent, ObjectId};
//! use rastro::global;
//! use rastro::method::LifecycleMethod;
//!
//! global::monitor_class("MyView");
//! global::set_enabled(true);
//!
//! // ... the interception provider feeds events ...
//! # global::notify(&LifecycleEvent::new(
//! #     ObjectId(0x1000), "MyView", LifecycleMethod::Create, vec![],
//! # )).unwrap();
//!
//! for monitor in global::alive_monitors() {
//!     eprintln!("still alive: <{}: {}>", monitor.class(), monitor.object());
//! }
//! # global::reset();
//! ```

use crate::callbacks::LifecycleCallback;
use crate::engine::TrackerEngine;
use crate::event::{LifecycleEvent, ObjectId};
use crate::method::LifecycleMethod;
use crate::monitor::LifecycleMonitor;
use crate::tracker::{ObjectTracker, TrackerError};
use std::sync::{Mutex, MutexGuard, OnceLock};

static ENGINE: OnceLock<Mutex<TrackerEngine>> = OnceLock::new();

fn engine() -> MutexGuard<'static, TrackerEngine> {
    ENGINE
        .get_or_init(|| Mutex::new(TrackerEngine::new()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Deliver one lifecycle notification to the process-wide engine.
///
/// The full pipeline runs under the global lock before this returns.
pub fn notify(event: &LifecycleEvent) -> Result<(), TrackerError> {
    engine().notify(event)
}

/// True when tracking is enabled.
pub fn enabled() -> bool {
    engine().enabled()
}

/// Enable or disable tracking globally. Notifications already past the
/// check still complete.
pub fn set_enabled(value: bool) {
    engine().set_enabled(value);
}

/// The stack depth cap applied to all captures.
pub fn stack_trace_depth() -> usize {
    engine().stack_trace_depth()
}

pub fn set_stack_trace_depth(depth: usize) {
    engine().set_stack_trace_depth(depth);
}

/// Configure how many leading frames of each raw stack belong to the
/// interception machinery.
pub fn set_self_frame_count(count: usize) {
    engine().set_self_frame_count(count);
}

/// Replace the denylist of symbols dropped during sanitization.
pub fn set_ignored_symbols<I, S>(symbols: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    engine().set_ignored_symbols(symbols);
}

/// Register a callback for one class/method.
pub fn add_callback(class: &str, method: LifecycleMethod, callback: LifecycleCallback) {
    engine().add_callback(class, method, callback);
}

/// Log a condensed one-line trace for every memory management call the
/// class makes.
pub fn add_condensed_log_callbacks(class: &str, call_stack_depth: usize) {
    engine().add_condensed_log_callbacks(class, call_stack_depth);
}

/// Log a full multi-line trace for every memory management call the class
/// makes.
pub fn add_full_log_callbacks(class: &str, call_stack_depth: usize) {
    engine().add_full_log_callbacks(class, call_stack_depth);
}

/// Remove callbacks for one class/method.
pub fn remove_callbacks(class: &str, method: LifecycleMethod) {
    engine().remove_callbacks(class, method);
}

/// Remove all callbacks registered for a class.
pub fn remove_class_callbacks(class: &str) {
    engine().remove_class_callbacks(class);
}

/// Remove all callbacks for all classes.
pub fn remove_all_callbacks() {
    engine().remove_all_callbacks();
}

/// Monitor a class for leak tracking.
pub fn monitor_class(class: &str) {
    engine().monitor_class(class);
}

/// Snapshot of every monitor whose object is still alive, in creation order.
pub fn alive_monitors() -> Vec<LifecycleMonitor> {
    engine().alive_monitors()
}

/// Snapshot of the current tracker for an object, if tracked.
pub fn tracker_for(object: ObjectId) -> Option<ObjectTracker> {
    engine().tracker_for(object).cloned()
}

/// Tear down all process-wide state: trackers, monitors, callbacks, and
/// configuration return to their initial values and tracking is disabled.
/// Useful between debugging sessions and in tests.
pub fn reset() {
    *engine() = TrackerEngine::new();
}
