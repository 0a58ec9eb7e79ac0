//! Text rendering for lifecycle operations
//!
//! Two formats, matching the two built-in log callback flavors:
//! - condensed: one line per operation, call signatures comma-joined
//! - full: a header line followed by one line per stack frame
//!
//! The two counts in a rendered line are the retain count and, in
//! parentheses, the effective retain count (retain count minus pending
//! deferred releases), both as they read after the operation completes.
//! Destroy lines render blank counts; the object no longer has any.

use crate::frame::StackFrame;
use crate::method::LifecycleMethod;
use crate::sanitizer;
use crate::tracker::ObjectTracker;

/// One condensed log line, truncating the stack to `depth` frames.
///
/// Example: `<MyView: 0x8105400> RETAIN  :  2 ( 2) (do_work,main)`
pub fn condensed_line(
    tracker: &ObjectTracker,
    method: LifecycleMethod,
    stack: &[StackFrame],
    depth: usize,
) -> String {
    let shown = &stack[..stack.len().min(depth)];
    let calls = sanitizer::condensed(shown);
    match method {
        LifecycleMethod::Destroy => format!(
            "<{}: {}> {}:         ({})",
            tracker.class,
            tracker.object,
            method.label(),
            calls
        ),
        _ => format!(
            "<{}: {}> {}: {:2} ({:2}) ({})",
            tracker.class,
            tracker.object,
            method.label(),
            tracker.retain_count,
            tracker.effective_retain_count(),
            calls
        ),
    }
}

/// The full multi-line format: header plus one line per frame, truncated to
/// `depth` frames.
pub fn full_lines(
    tracker: &ObjectTracker,
    method: LifecycleMethod,
    stack: &[StackFrame],
    depth: usize,
) -> String {
    let mut out = header_line(tracker, method);
    for frame in &stack[..stack.len().min(depth)] {
        out.push('\n');
        out.push_str(&frame_line(frame));
    }
    out
}

fn header_line(tracker: &ObjectTracker, method: LifecycleMethod) -> String {
    match method {
        LifecycleMethod::Destroy => {
            format!("<{}: {}> {}:", tracker.class, tracker.object, method.label())
        }
        _ => format!(
            "<{}: {}> {}: {:2} ({:2})",
            tracker.class,
            tracker.object,
            method.label(),
            tracker.retain_count,
            tracker.effective_retain_count()
        ),
    }
}

/// One frame in the full format. Frames that failed structured parsing
/// render their raw text verbatim.
pub fn frame_line(frame: &StackFrame) -> String {
    if !frame.is_parsed() {
        return frame.raw.clone();
    }
    format!(
        "{:<3} {:<35} 0x{:08x} {} + {}",
        frame.ordinal,
        frame.library,
        frame.address,
        frame.call(),
        frame.offset
    )
}
