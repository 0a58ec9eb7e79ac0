//! Leak registry
//!
//! Keeps a lifecycle monitor for every tracked object of a monitored class
//! that has not yet been destroyed. Objects enter the alive pool on create
//! or stealth create and leave it when the destroy notification is
//! processed. Whatever remains in the pool after a suspected code path has
//! run is a leak candidate, and its monitor shows every memory management
//! operation the object went through.

use crate::event::ObjectId;
use crate::monitor::LifecycleMonitor;
use fnv::FnvHashMap;
use std::collections::HashSet;

/// Process-wide pool of lifecycle monitors for objects still alive.
#[derive(Debug, Default)]
pub struct LeakRegistry {
    /// Classes whose objects get a lifecycle monitor.
    monitored: HashSet<String>,
    /// Alive pool, keyed by object identity.
    alive: FnvHashMap<u64, LifecycleMonitor>,
    /// Identities in creation order, for ordered snapshots.
    creation_order: Vec<ObjectId>,
}

impl LeakRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class whose objects are to have their lifecycles monitored.
    pub fn monitor_class(&mut self, class: impl Into<String>) {
        self.monitored.insert(class.into());
    }

    /// True when any element of the class chain is monitored.
    pub fn is_monitored(&self, class_chain: &[String]) -> bool {
        class_chain.iter().any(|class| self.monitored.contains(class))
    }

    /// True when at least one class is monitored.
    pub fn monitors_anything(&self) -> bool {
        !self.monitored.is_empty()
    }

    /// Add a monitor to the alive pool at create/stealth-create time.
    pub fn insert(&mut self, monitor: LifecycleMonitor) {
        let object = monitor.object();
        if self.alive.insert(object.0, monitor).is_none() {
            self.creation_order.push(object);
        }
    }

    /// The monitor for an alive object, for appending operations.
    pub fn monitor_mut(&mut self, object: ObjectId) -> Option<&mut LifecycleMonitor> {
        self.alive.get_mut(&object.0)
    }

    /// Drop an object from the alive pool at destroy time. Snapshots taken
    /// earlier stay valid; the pool entry is gone.
    pub fn remove_alive(&mut self, object: ObjectId) -> Option<LifecycleMonitor> {
        let removed = self.alive.remove(&object.0);
        if removed.is_some() {
            self.creation_order.retain(|id| *id != object);
        }
        removed
    }

    /// Point-in-time snapshot of every monitor whose object is still alive,
    /// in creation order.
    pub fn alive_monitors(&self) -> Vec<LifecycleMonitor> {
        self.creation_order
            .iter()
            .filter_map(|id| self.alive.get(&id.0))
            .cloned()
            .collect()
    }

    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }
}
