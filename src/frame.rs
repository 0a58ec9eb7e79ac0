//! Symbolic backtrace line parsing
//!
//! Parses one line of a symbolic backtrace into a structured [`StackFrame`].
//! The expected grammar is what `backtrace_symbols()`-style sources emit:
//!
//! ```text
//! <ordinal> <module> <hex-address> <symbol-description> + <offset>
//! ```
//!
//! where `<symbol-description>` is either a bracketed call signature
//! (`-[Class selector:]` / `+[Class selector:]`) or a bare function name.
//! Parsing never fails: a line matching neither shape degrades to a frame
//! carrying only the raw text and best-effort fields.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static TRACE_LINE_RE: OnceLock<Regex> = OnceLock::new();
static BRACKETED_CALL_RE: OnceLock<Regex> = OnceLock::new();

fn trace_line_re() -> &'static Regex {
    TRACE_LINE_RE.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\s+(\S+)\s+(0[xX][0-9a-fA-F]+)\s+(.+?)\s+\+\s+(\d+)\s*$")
            .expect("trace line regex is valid")
    })
}

fn bracketed_call_re() -> &'static Regex {
    BRACKETED_CALL_RE.get_or_init(|| {
        Regex::new(r"^([+-])\[(\S+)\s+([^\]]+)\]$").expect("bracketed call regex is valid")
    })
}

/// A single stack trace entry, recording all information about one line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    /// This entry's position in the original stack trace.
    pub ordinal: u32,
    /// Which library, framework, or process the entry is from.
    pub library: String,
    /// The address in memory. A raw numeric value, never dereferenced.
    pub address: u64,
    /// The class implicated in the call, for bracketed signatures.
    pub object_class: Option<String>,
    /// True when the call is a type-level (class) selector.
    pub is_class_level_selector: bool,
    /// The selector (or function, if bare) being called.
    pub selector_name: Option<String>,
    /// Byte offset within the function or method.
    pub offset: u32,
    /// The original unparsed line, kept verbatim.
    pub raw: String,
}

impl StackFrame {
    /// Parse one backtrace line. Malformed input yields a frame with only
    /// the raw text and whatever leading ordinal could be salvaged.
    pub fn parse(line: &str) -> StackFrame {
        let Some(caps) = trace_line_re().captures(line) else {
            return StackFrame {
                ordinal: leading_ordinal(line),
                raw: line.to_string(),
                ..StackFrame::default()
            };
        };

        let ordinal = caps[1].parse().unwrap_or(0);
        let library = caps[2].to_string();
        let address = u64::from_str_radix(&caps[3][2..], 16).unwrap_or(0);
        let offset = caps[5].parse().unwrap_or(0);

        let (object_class, is_class_level_selector, selector_name) =
            match bracketed_call_re().captures(&caps[4]) {
                Some(call) => (
                    Some(call[2].to_string()),
                    &call[1] == "+",
                    Some(call[3].to_string()),
                ),
                None => (None, false, Some(caps[4].to_string())),
            };

        StackFrame {
            ordinal,
            library,
            address,
            object_class,
            is_class_level_selector,
            selector_name,
            offset,
            raw: line.to_string(),
        }
    }

    /// The full call signature of the selector or function.
    ///
    /// Examples: `-[NSString stringWithFormat:]`, `+[MyClass classMethod:]`,
    /// `some_c_function`. Falls back to the raw line for unparsed frames.
    pub fn call(&self) -> String {
        match (&self.object_class, &self.selector_name) {
            (Some(class), Some(selector)) => {
                let level = if self.is_class_level_selector { "+" } else { "-" };
                format!("{level}[{class} {selector}]")
            }
            (None, Some(selector)) => selector.clone(),
            _ => self.raw.clone(),
        }
    }

    /// True when structured parsing succeeded for this line.
    pub fn is_parsed(&self) -> bool {
        self.selector_name.is_some()
    }
}

fn leading_ordinal(line: &str) -> u32 {
    line.split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .unwrap_or(0)
}
