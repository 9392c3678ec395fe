//! Diagnostic tracing for API calls
//!
//! Each connector emits one formatted line per failed request, or per request
//! when the process-wide trace level is raised above [`TraceLevel::NonSuccess`].
//! A connector may carry at most one subscriber ([`DiagSink`]); without one,
//! lines go to the `tracing` log sink (warn for failures, debug otherwise).

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

/// How much request detail to trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum TraceLevel {
    /// Only non-2xx responses (default)
    NonSuccess = 0,
    /// Every request
    All = 1,
    /// Every request, reserved for additional detail
    Verbose = 2,
}

/// Subscriber for diagnostic lines: connector instance number plus the
/// formatted line, delivered synchronously from the dispatching task.
pub type DiagSink = Arc<dyn Fn(u64, &str) + Send + Sync>;

static TRACE_LEVEL: AtomicU8 = AtomicU8::new(TraceLevel::NonSuccess as u8);
static SIMPLIFY_LOGGED_URIS: AtomicBool = AtomicBool::new(true);

/// Set the process-wide trace level
pub fn set_trace_level(level: TraceLevel) {
    TRACE_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Current process-wide trace level
pub fn trace_level() -> TraceLevel {
    match TRACE_LEVEL.load(Ordering::Relaxed) {
        0 => TraceLevel::NonSuccess,
        1 => TraceLevel::All,
        _ => TraceLevel::Verbose,
    }
}

/// Toggle rewriting of encoded slashes in logged URIs (logging only; the
/// request URI on the wire is never touched)
pub fn set_simplify_logged_uris(enabled: bool) {
    SIMPLIFY_LOGGED_URIS.store(enabled, Ordering::Relaxed);
}

/// Whether logged URIs have `%2F` rewritten to `/`
pub fn simplify_logged_uris() -> bool {
    SIMPLIFY_LOGGED_URIS.load(Ordering::Relaxed)
}

/// URI as it should appear in diagnostic lines
pub fn uri_for_logging(raw_uri: &str) -> String {
    if simplify_logged_uris() {
        raw_uri.replace("%2F", "/")
    } else {
        raw_uri.to_string()
    }
}

/// Deliver one diagnostic line to the sink, or to the default log sink
pub(crate) fn emit(sink: Option<&DiagSink>, instance: u64, line: &str, failure: bool) {
    match sink {
        Some(sink) => sink(instance, line),
        None => {
            if failure {
                tracing::warn!(target: "eldocs::diag", instance, "{}", line);
            } else {
                tracing::debug!(target: "eldocs::diag", instance, "{}", line);
            }
        }
    }
}
