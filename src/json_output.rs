//! JSON output format for lifecycle histories
//!
//! Machine-readable snapshots of leak reports and per-object operation
//! histories, for piping into other tooling.

use crate::frame::StackFrame;
use crate::monitor::{LifecycleMonitor, MMOperation};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A single stack frame in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonStackFrame {
    /// Position in the original stack trace.
    pub ordinal: u32,
    /// Library, framework, or process the frame is from.
    pub library: String,
    /// Frame address, hex-formatted.
    pub address: String,
    /// Full call signature (or the raw line for unparsed frames).
    pub call: String,
    /// Byte offset within the function or method.
    pub offset: u32,
}

/// One memory management operation in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonOperation {
    /// Method name (e.g., "Create", "Retain").
    pub method: String,
    /// Retain count after the operation.
    pub retain_count: i32,
    /// Pending deferred-release count after the operation.
    pub deferred_release_count: i32,
    /// Retain count once pending deferred releases resolve.
    pub effective_retain_count: i32,
    /// Counting anomaly this operation exposed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<String>,
    /// Sanitized call stack.
    pub stack: Vec<JsonStackFrame>,
}

/// One lifecycle monitor in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonMonitor {
    /// Object identity, hex-formatted.
    pub object: String,
    /// Exact class of the object.
    pub class: String,
    /// Current retain count.
    pub retain_count: i32,
    /// Current pending deferred-release count.
    pub deferred_release_count: i32,
    /// Current effective retain count.
    pub effective_retain_count: i32,
    /// Full operation history, in order.
    pub operations: Vec<JsonOperation>,
}

/// A point-in-time leak report: every monitor still in the alive pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonLeakReport {
    /// Number of monitored objects still alive.
    pub alive_count: usize,
    pub monitors: Vec<JsonMonitor>,
}

impl From<&StackFrame> for JsonStackFrame {
    fn from(frame: &StackFrame) -> Self {
        Self {
            ordinal: frame.ordinal,
            library: frame.library.clone(),
            address: format!("0x{:x}", frame.address),
            call: frame.call(),
            offset: frame.offset,
        }
    }
}

impl From<&MMOperation> for JsonOperation {
    fn from(op: &MMOperation) -> Self {
        Self {
            method: op.method.name().to_string(),
            retain_count: op.retain_count,
            deferred_release_count: op.deferred_release_count,
            effective_retain_count: op.effective_retain_count(),
            anomaly: op.anomaly.map(|a| format!("{a:?}")),
            stack: op.stack.iter().map(JsonStackFrame::from).collect(),
        }
    }
}

impl From<&LifecycleMonitor> for JsonMonitor {
    fn from(monitor: &LifecycleMonitor) -> Self {
        Self {
            object: monitor.object().to_string(),
            class: monitor.class().to_string(),
            retain_count: monitor.tracker.retain_count,
            deferred_release_count: monitor.tracker.deferred_release_count,
            effective_retain_count: monitor.tracker.effective_retain_count(),
            operations: monitor.operations.iter().map(JsonOperation::from).collect(),
        }
    }
}

/// Build a leak report from an `alive_monitors()` snapshot.
pub fn leak_report(monitors: &[LifecycleMonitor]) -> JsonLeakReport {
    JsonLeakReport {
        alive_count: monitors.len(),
        monitors: monitors.iter().map(JsonMonitor::from).collect(),
    }
}

impl JsonLeakReport {
    /// Compact single-line JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Pretty-printed JSON with indentation.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
