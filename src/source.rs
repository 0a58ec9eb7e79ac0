//! Live call-stack capture
//!
//! The core consumes raw symbolic lines handed over by the interception
//! provider; it never captures stacks itself. [`StackSource`] is the
//! capability interface a provider implements, and [`BacktraceSource`] is
//! the built-in implementation for in-process providers, walking the current
//! thread's stack and formatting each frame in the symbolic grammar the
//! parser expects.
//!
//! Symbolication is best-effort: frames that cannot be resolved render a
//! `???` symbol, which the parser degrades gracefully.

use backtrace::Backtrace;

/// A source of raw symbolic backtrace lines.
pub trait StackSource {
    /// Capture the current call stack, skipping `skip_frames` leading
    /// frames and returning at most `max_frames` lines.
    fn capture(&self, max_frames: usize, skip_frames: usize) -> Vec<String>;
}

/// Stack source backed by the `backtrace` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktraceSource;

impl BacktraceSource {
    pub fn new() -> Self {
        Self
    }
}

impl StackSource for BacktraceSource {
    fn capture(&self, max_frames: usize, skip_frames: usize) -> Vec<String> {
        let module = module_name();
        let trace = Backtrace::new();
        trace
            .frames()
            .iter()
            .skip(skip_frames)
            .take(max_frames)
            .enumerate()
            .map(|(ordinal, frame)| {
                let ip = frame.ip() as usize as u64;
                let (symbol, offset) = frame
                    .symbols()
                    .first()
                    .map(|sym| {
                        let name = sym
                            .name()
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| "???".to_string());
                        let offset = sym
                            .addr()
                            .map(|addr| ip.saturating_sub(addr as usize as u64))
                            .unwrap_or(0);
                        (name, offset)
                    })
                    .unwrap_or_else(|| ("???".to_string(), 0));
                format!("{ordinal:<3} {module:<35} 0x{ip:016x} {symbol} + {offset}")
            })
            .collect()
    }
}

fn module_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "<unknown>".to_string())
}
