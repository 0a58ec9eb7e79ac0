//! The notification pipeline
//!
//! [`TrackerEngine`] owns every piece of bookkeeping state: the sanitizer
//! configuration, the tracker directory, the callback registry, and the leak
//! registry. One call to [`TrackerEngine::notify`] carries a lifecycle event
//! through the full pipeline:
//!
//! 1. enabled-flag check (disabled tracking is a no-op)
//! 2. interest check (tracked already, callbacks registered, or monitored)
//! 3. stack sanitization
//! 4. tracker update (stealth-create synthesis when needed)
//! 5. MMOperation construction with post-operation counts
//! 6. lifecycle monitor append
//! 7. callback dispatch, in registration order
//!
//! The engine itself is single-threaded state; the process-wide facade in
//! [`crate::global`] wraps it in one mutex held for a notification's full
//! processing, so dispatch always sees a consistent snapshot.

use crate::callbacks::{CallbackRegistry, LifecycleCallback};
use crate::event::{LifecycleEvent, ObjectId};
use crate::frame::StackFrame;
use crate::leaks::LeakRegistry;
use crate::method::LifecycleMethod;
use crate::monitor::{LifecycleMonitor, MMOperation};
use crate::render;
use crate::sanitizer::CallStackSanitizer;
use crate::tracker::{Anomaly, ObjectTracker, TrackerDirectory, TrackerError};

/// The event-capture and bookkeeping engine.
///
/// Tracking starts disabled; nothing is recorded until
/// [`TrackerEngine::set_enabled`] turns it on.
#[derive(Default)]
pub struct TrackerEngine {
    enabled: bool,
    sanitizer: CallStackSanitizer,
    directory: TrackerDirectory,
    callbacks: CallbackRegistry,
    leaks: LeakRegistry,
}

impl TrackerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable tracking globally. While disabled, notifications
    /// are dropped at the top of the pipeline: no trackers are created, no
    /// callbacks fire, no monitors accumulate.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Depth cap applied to every captured stack, regardless of per-callback
    /// requests.
    pub fn stack_trace_depth(&self) -> usize {
        self.sanitizer.max_depth()
    }

    pub fn set_stack_trace_depth(&mut self, depth: usize) {
        self.sanitizer.set_max_depth(depth);
    }

    /// How many leading frames of every raw stack belong to the capture
    /// machinery. The interception provider supplies this constant.
    pub fn self_frame_count(&self) -> usize {
        self.sanitizer.self_frame_count()
    }

    pub fn set_self_frame_count(&mut self, count: usize) {
        self.sanitizer.set_self_frame_count(count);
    }

    /// Replace the denylist of administratively-uninteresting symbols.
    pub fn set_ignored_symbols<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sanitizer.set_ignored_symbols(symbols);
    }

    /// Register a callback for one class/method. Callbacks fire in
    /// registration order; duplicates fire twice.
    pub fn add_callback(&mut self, class: &str, method: LifecycleMethod, callback: LifecycleCallback) {
        self.callbacks.register(class, method, callback);
    }

    /// Register callbacks on all six methods that log a condensed one-line
    /// trace for every memory management call the class makes.
    pub fn add_condensed_log_callbacks(&mut self, class: &str, call_stack_depth: usize) {
        for method in LifecycleMethod::ALL {
            self.callbacks
                .register(class, method, condensed_log_callback(method, call_stack_depth));
        }
    }

    /// Register callbacks on all six methods that log a full multi-line
    /// stack trace for every memory management call the class makes.
    pub fn add_full_log_callbacks(&mut self, class: &str, call_stack_depth: usize) {
        for method in LifecycleMethod::ALL {
            self.callbacks
                .register(class, method, full_log_callback(method, call_stack_depth));
        }
    }

    /// Remove callbacks for one class/method.
    pub fn remove_callbacks(&mut self, class: &str, method: LifecycleMethod) {
        self.callbacks.unregister(class, method);
    }

    /// Remove all callbacks registered for a class.
    pub fn remove_class_callbacks(&mut self, class: &str) {
        self.callbacks.unregister_class(class);
    }

    /// Remove all callbacks for all classes.
    pub fn remove_all_callbacks(&mut self) {
        self.callbacks.clear();
    }

    /// Monitor a class: every subsequent object whose class chain matches
    /// gets a lifecycle monitor created alongside its tracker.
    pub fn monitor_class(&mut self, class: impl Into<String>) {
        self.leaks.monitor_class(class);
    }

    /// Snapshot of every monitor whose object has not yet been destroyed,
    /// in creation order.
    pub fn alive_monitors(&self) -> Vec<LifecycleMonitor> {
        self.leaks.alive_monitors()
    }

    /// The current tracker for an object, if it is being tracked.
    pub fn tracker_for(&self, object: ObjectId) -> Option<&ObjectTracker> {
        self.directory.tracker_for(object)
    }

    /// Number of objects currently tracked.
    pub fn tracked_count(&self) -> usize {
        self.directory.len()
    }

    /// Process one lifecycle notification.
    ///
    /// Returns [`TrackerError::DuplicateTracker`] for a create notification
    /// on an identity already tracked, a logic fault in the interception
    /// provider. Counting anomalies are not errors; they are recorded on the
    /// operation and reported through the log channel.
    pub fn notify(&mut self, event: &LifecycleEvent) -> Result<(), TrackerError> {
        if !self.enabled {
            return Ok(());
        }

        let already_tracked = self.directory.tracker_for(event.object).is_some();
        let wants_callbacks = self.callbacks.has_callbacks(event.class());
        let monitored = self.leaks.is_monitored(&event.class_chain);
        if !already_tracked && !wants_callbacks && !monitored {
            return Ok(());
        }

        let stack = self.sanitizer.sanitize(&event.raw_stack);

        if matches!(
            event.method,
            LifecycleMethod::Create | LifecycleMethod::StealthCreate
        ) {
            if already_tracked {
                return Err(TrackerError::DuplicateTracker(event.object));
            }
            self.begin_tracking(event, event.method, &stack, monitored);
            return Ok(());
        }

        // First sighting of this object mid-lifecycle: synthesize the
        // tracking start before applying the actual event.
        if !already_tracked {
            self.begin_tracking(event, LifecycleMethod::StealthCreate, &stack, monitored);
        }

        let Some(tracker) = self.directory.tracker_for_mut(event.object) else {
            return Ok(());
        };
        let anomaly = tracker.apply(event.method);
        let tracker = tracker.clone();
        if let Some(anomaly) = anomaly {
            report_anomaly(&tracker, anomaly);
        }

        let operation = MMOperation {
            method: event.method,
            stack: stack.clone(),
            retain_count: tracker.retain_count,
            deferred_release_count: tracker.deferred_release_count,
            anomaly,
        };
        if let Some(monitor) = self.leaks.monitor_mut(event.object) {
            monitor.record(&tracker, operation);
        }

        if event.method == LifecycleMethod::Destroy {
            self.directory.remove_tracker(event.object);
            self.leaks.remove_alive(event.object);
        }

        self.dispatch(&tracker, event.method, &stack);
        Ok(())
    }

    /// Create the tracker, record the create/stealth-create operation, and
    /// open a lifecycle monitor when the class is monitored.
    fn begin_tracking(
        &mut self,
        event: &LifecycleEvent,
        method: LifecycleMethod,
        stack: &[StackFrame],
        monitored: bool,
    ) {
        let Ok(tracker) = self.directory.create_tracker(event.object, event.class()) else {
            return;
        };
        tracker.apply(method);
        let tracker = tracker.clone();

        let operation = MMOperation {
            method,
            stack: stack.to_vec(),
            retain_count: tracker.retain_count,
            deferred_release_count: tracker.deferred_release_count,
            anomaly: None,
        };
        if monitored {
            let mut monitor = LifecycleMonitor::new(&tracker);
            monitor.record(&tracker, operation);
            self.leaks.insert(monitor);
        }

        self.dispatch(&tracker, method, stack);
    }

    /// Dispatch to registered callbacks. The tracker's state update has
    /// already happened; a callback fault only skips the callbacks behind
    /// it for this one event.
    fn dispatch(&mut self, tracker: &ObjectTracker, method: LifecycleMethod, stack: &[StackFrame]) {
        if let Err(error) = self
            .callbacks
            .dispatch(&tracker.class, method, tracker, stack)
        {
            tracing::warn!(
                target: "rastro",
                "{} callback for <{}: {}> failed, remaining callbacks skipped: {:#}",
                method,
                tracker.class,
                tracker.object,
                error
            );
        }
    }
}

fn report_anomaly(tracker: &ObjectTracker, anomaly: Anomaly) {
    match anomaly {
        Anomaly::ReleaseBelowZero => tracing::warn!(
            target: "rastro",
            "<{}: {}> release with retain count already 0",
            tracker.class,
            tracker.object
        ),
        Anomaly::RetainedAtDestroy => tracing::warn!(
            target: "rastro",
            "<{}: {}> destroyed with retain count {}",
            tracker.class,
            tracker.object,
            tracker.retain_count
        ),
    }
}

fn condensed_log_callback(method: LifecycleMethod, depth: usize) -> LifecycleCallback {
    Box::new(move |tracker, stack| {
        tracing::info!(target: "rastro", "{}", render::condensed_line(tracker, method, stack, depth));
        Ok(())
    })
}

fn full_log_callback(method: LifecycleMethod, depth: usize) -> LifecycleCallback {
    Box::new(move |tracker, stack| {
        tracing::info!(target: "rastro", "{}", render::full_lines(tracker, method, stack, depth));
        Ok(())
    })
}
