//! Object trackers and the tracker directory
//!
//! One [`ObjectTracker`] per currently-tracked object holds the authoritative
//! retain and pending-deferred-release counters. Notifications arrive before
//! the underlying operation is applied to the real object, so the tracker
//! computes the post-operation counts itself rather than reading an external
//! count.
//!
//! The [`TrackerDirectory`] is the identity map from object handle to
//! tracker. It synthesizes "stealth" trackers for objects first observed
//! mid-lifecycle and discards trackers when the destroy notification is
//! processed.

use crate::event::ObjectId;
use crate::method::LifecycleMethod;
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Logic faults in the interception provider, surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// A create notification arrived for an identity already tracked.
    /// Overwriting would silently lose that object's history.
    #[error("a tracker is already registered for object {0}")]
    DuplicateTracker(ObjectId),
}

/// Counting anomalies surfaced while applying a notification.
///
/// Anomalies are diagnostic signals, not failures: the tracker still updates
/// and processing continues, since surfacing exactly these imbalances is the
/// point of the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anomaly {
    /// A release arrived with the retain count already at zero.
    ReleaseBelowZero,
    /// The destroy notification arrived with a non-zero retain count.
    RetainedAtDestroy,
}

/// Tracks one object through its lifecycle, maintaining the retain count
/// and the pending deferred-release count.
///
/// Counts are post-operation values: after a retain notification the retain
/// count already includes that retain, even though the real operation has
/// not yet run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTracker {
    /// Identity of the tracked object. Never dereferenced.
    pub object: ObjectId,
    /// Exact class of the tracked object.
    pub class: String,
    /// Current retain count.
    pub retain_count: i32,
    /// Current number of pending deferred releases.
    pub deferred_release_count: i32,
}

impl ObjectTracker {
    /// A fresh tracker starts at (0, 0); the create or stealth-create
    /// notification brings it to (1, 0).
    pub fn new(object: ObjectId, class: impl Into<String>) -> Self {
        Self {
            object,
            class: class.into(),
            retain_count: 0,
            deferred_release_count: 0,
        }
    }

    /// The retain count once all pending deferred releases resolve.
    pub fn effective_retain_count(&self) -> i32 {
        self.retain_count - self.deferred_release_count
    }

    /// Apply one notification, returning any counting anomaly it exposed.
    ///
    /// The retain count never goes below zero: a release at zero is recorded
    /// as [`Anomaly::ReleaseBelowZero`] and the count stays clamped.
    pub fn apply(&mut self, method: LifecycleMethod) -> Option<Anomaly> {
        match method {
            LifecycleMethod::Create | LifecycleMethod::StealthCreate => {
                self.retain_count = 1;
                self.deferred_release_count = 0;
                None
            }
            LifecycleMethod::Retain => {
                self.retain_count += 1;
                None
            }
            LifecycleMethod::Release => {
                if self.retain_count == 0 {
                    Some(Anomaly::ReleaseBelowZero)
                } else {
                    self.retain_count -= 1;
                    None
                }
            }
            LifecycleMethod::DeferredRelease => {
                self.deferred_release_count += 1;
                None
            }
            LifecycleMethod::Destroy => {
                if self.retain_count != 0 {
                    Some(Anomaly::RetainedAtDestroy)
                } else {
                    None
                }
            }
        }
    }
}

/// Process-wide identity map from object handle to its tracker.
#[derive(Debug, Default)]
pub struct TrackerDirectory {
    trackers: FnvHashMap<u64, ObjectTracker>,
}

impl TrackerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup only; no creation.
    pub fn tracker_for(&self, object: ObjectId) -> Option<&ObjectTracker> {
        self.trackers.get(&object.0)
    }

    pub fn tracker_for_mut(&mut self, object: ObjectId) -> Option<&mut ObjectTracker> {
        self.trackers.get_mut(&object.0)
    }

    /// Create and register a tracker at counts (0, 0). Errors if one
    /// already exists for this identity.
    pub fn create_tracker(
        &mut self,
        object: ObjectId,
        class: &str,
    ) -> Result<&mut ObjectTracker, TrackerError> {
        match self.trackers.entry(object.0) {
            std::collections::hash_map::Entry::Occupied(_) => {
                Err(TrackerError::DuplicateTracker(object))
            }
            std::collections::hash_map::Entry::Vacant(entry) => {
                Ok(entry.insert(ObjectTracker::new(object, class)))
            }
        }
    }

    /// Deregister and return the tracker. Called exactly once, at destroy
    /// notification time.
    pub fn remove_tracker(&mut self, object: ObjectId) -> Option<ObjectTracker> {
        self.trackers.remove(&object.0)
    }

    /// Return the existing tracker, or create one for an object first
    /// observed mid-lifecycle. The flag reports whether this was a stealth
    /// creation.
    pub fn ensure_tracker(
        &mut self,
        object: ObjectId,
        class: &str,
    ) -> (&mut ObjectTracker, bool) {
        let mut created = false;
        let tracker = self.trackers.entry(object.0).or_insert_with(|| {
            created = true;
            ObjectTracker::new(object, class)
        });
        (tracker, created)
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }
}
