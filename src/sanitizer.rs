//! Call stack sanitization
//!
//! Turns the raw line sequence delivered with a lifecycle notification into
//! the cleaned frame sequence attached to recorded operations. Rules, applied
//! in order:
//! 1. Drop the leading frames internal to the capture machinery itself
//!    (the provider knows how many of its own frames sit atop every event).
//! 2. Drop frames whose parsed symbol is on the configured denylist
//!    (low-level refcount primitives that add no diagnostic value).
//! 3. Truncate to the configured maximum depth.

use crate::frame::StackFrame;
use std::collections::HashSet;

/// Default maximum number of frames kept per sanitized stack.
pub const DEFAULT_STACK_DEPTH: usize = 10;

/// Sanitizes raw backtrace lines into [`StackFrame`] sequences.
#[derive(Debug, Clone)]
pub struct CallStackSanitizer {
    /// Leading frames internal to the interception machinery, always dropped.
    self_frame_count: usize,
    /// Symbols dropped wherever they appear in a stack.
    ignored_symbols: HashSet<String>,
    /// Hard cap on sanitized stack depth.
    max_depth: usize,
}

impl Default for CallStackSanitizer {
    fn default() -> Self {
        Self {
            self_frame_count: 0,
            ignored_symbols: HashSet::new(),
            max_depth: DEFAULT_STACK_DEPTH,
        }
    }
}

impl CallStackSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn self_frame_count(&self) -> usize {
        self.self_frame_count
    }

    /// Set how many leading frames belong to the capture machinery.
    pub fn set_self_frame_count(&mut self, count: usize) {
        self.self_frame_count = count;
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn set_max_depth(&mut self, depth: usize) {
        self.max_depth = depth;
    }

    /// Replace the symbol denylist.
    pub fn set_ignored_symbols<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_symbols = symbols.into_iter().map(Into::into).collect();
    }

    /// Sanitize one raw stack: skip self frames, parse, drop denylisted
    /// symbols, cap depth. Frame order is preserved throughout.
    pub fn sanitize(&self, raw_lines: &[String]) -> Vec<StackFrame> {
        raw_lines
            .iter()
            .skip(self.self_frame_count)
            .map(|line| StackFrame::parse(line))
            .filter(|frame| !self.is_ignored(frame))
            .take(self.max_depth)
            .collect()
    }

    fn is_ignored(&self, frame: &StackFrame) -> bool {
        frame
            .selector_name
            .as_deref()
            .is_some_and(|symbol| self.ignored_symbols.contains(symbol))
    }
}

/// Condensed single-line rendering: the ordered call signatures only,
/// comma-joined. Independent of the multi-line rendering in `render`.
pub fn condensed(frames: &[StackFrame]) -> String {
    frames
        .iter()
        .map(StackFrame::call)
        .collect::<Vec<_>>()
        .join(",")
}
