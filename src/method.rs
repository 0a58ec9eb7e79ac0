//! Memory management method kinds
//!
//! The six lifecycle notifications an interception provider can deliver.
//! `StealthCreate` marks a tracking start synthesized for an object whose
//! creation was never observed (some runtimes bypass the hooked allocation
//! path).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference-count-affecting memory management method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleMethod {
    /// Normal object creation, observed by the provider.
    Create,
    /// Synthesized creation for an object first seen mid-lifecycle.
    StealthCreate,
    /// Reference count increment.
    Retain,
    /// Reference count decrement.
    Release,
    /// A release deferred to a later drain point (e.g. autorelease pools).
    DeferredRelease,
    /// Object destruction; tracking ends here.
    Destroy,
}

impl LifecycleMethod {
    /// Every method kind, in notification-handling order.
    pub const ALL: [LifecycleMethod; 6] = [
        LifecycleMethod::Create,
        LifecycleMethod::StealthCreate,
        LifecycleMethod::Retain,
        LifecycleMethod::Release,
        LifecycleMethod::DeferredRelease,
        LifecycleMethod::Destroy,
    ];

    /// Fixed-width label used in log lines. Stealth creates render in
    /// parentheses so they stand out from normal creates.
    pub fn label(&self) -> &'static str {
        match self {
            LifecycleMethod::Create => "CREATE  ",
            LifecycleMethod::StealthCreate => "(CREATE)",
            LifecycleMethod::Retain => "RETAIN  ",
            LifecycleMethod::Release => "RELEASE ",
            LifecycleMethod::DeferredRelease => "DEFER   ",
            LifecycleMethod::Destroy => "DESTROY ",
        }
    }

    /// Plain method name, as used in JSON output.
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleMethod::Create => "Create",
            LifecycleMethod::StealthCreate => "StealthCreate",
            LifecycleMethod::Retain => "Retain",
            LifecycleMethod::Release => "Release",
            LifecycleMethod::DeferredRelease => "DeferredRelease",
            LifecycleMethod::Destroy => "Destroy",
        }
    }
}

impl fmt::Display for LifecycleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
