//! Lifecycle monitoring
//!
//! An [`MMOperation`] is the immutable record of one memory management
//! operation: method kind, sanitized call stack, and the counts as they read
//! immediately after the operation completes. A [`LifecycleMonitor`]
//! accumulates the ordered operation sequence for one object across its full
//! lifetime, and stays inspectable after the object is destroyed.

use crate::frame::StackFrame;
use crate::method::LifecycleMethod;
use crate::tracker::{Anomaly, ObjectTracker};
use crate::event::ObjectId;
use serde::{Deserialize, Serialize};

/// One memory management operation, with call stack. Created once, at
/// notification time, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MMOperation {
    /// The memory management method used.
    pub method: LifecycleMethod,
    /// The sanitized call stack leading up to the method call.
    pub stack: Vec<StackFrame>,
    /// Retain count immediately after this operation completes.
    pub retain_count: i32,
    /// Pending deferred-release count immediately after this operation.
    pub deferred_release_count: i32,
    /// Counting anomaly this operation exposed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<Anomaly>,
}

impl MMOperation {
    pub fn effective_retain_count(&self) -> i32 {
        self.retain_count - self.deferred_release_count
    }
}

/// Monitors an object during its lifecycle.
///
/// Holds the latest tracker state and the append-only operation history.
/// The monitor outlives its tracker: after the destroy operation is appended
/// the directory discards the tracker, but snapshots of the monitor remain
/// valid for inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleMonitor {
    /// Latest known tracker state for the monitored object.
    pub tracker: ObjectTracker,
    /// All memory management operations recorded for this object, in order.
    pub operations: Vec<MMOperation>,
    destroyed: bool,
}

impl LifecycleMonitor {
    pub fn new(tracker: &ObjectTracker) -> Self {
        Self {
            tracker: tracker.clone(),
            operations: Vec::new(),
            destroyed: false,
        }
    }

    /// Append one operation and refresh the tracker state it reflects.
    pub fn record(&mut self, tracker: &ObjectTracker, operation: MMOperation) {
        self.tracker = tracker.clone();
        if operation.method == LifecycleMethod::Destroy {
            self.destroyed = true;
        }
        self.operations.push(operation);
    }

    /// Identity of the monitored object.
    pub fn object(&self) -> ObjectId {
        self.tracker.object
    }

    /// Class of the monitored object.
    pub fn class(&self) -> &str {
        &self.tracker.class
    }

    /// True once the destroy operation has been recorded.
    pub fn destroyed(&self) -> bool {
        self.destroyed
    }

    /// True when any recorded operation exposed a counting anomaly.
    pub fn has_anomalies(&self) -> bool {
        self.operations.iter().any(|op| op.anomaly.is_some())
    }
}
