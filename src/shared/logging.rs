//! Minimal structured line logging, in the teacher's file-backed idiom:
//! one append-only log line per event, caller supplies the fields.
//! The core never logs to stdout directly so library consumers can
//! choose where request-scoped diagnostics go.

use std::fmt::Write as _;
use std::sync::Mutex;

static SINK: Mutex<Vec<String>> = Mutex::new(Vec::new());

/// Appends a `key=value` formatted line to the in-process log sink.
/// Intended for warnings raised when a component falls back after an
/// LLM transport or parse error (spec.md §7) — never for routine
/// per-request trace logging, which would be the caller's concern.
pub fn warn(component: &str, fields: &[(&str, &str)]) {
    let mut line = format!("level=warn component={component}");
    for (key, value) in fields {
        let _ = write!(line, " {key}={value}");
    }
    if let Ok(mut sink) = SINK.lock() {
        sink.push(line);
    }
}

/// Drains and returns all log lines recorded so far. Exposed for tests
/// and for an out-of-scope HTTP layer that wants to surface fallback
/// diagnostics in `queryInfo`.
pub fn drain() -> Vec<String> {
    match SINK.lock() {
        Ok(mut sink) => std::mem::take(&mut sink),
        Err(_) => Vec::new(),
    }
}
