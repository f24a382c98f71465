// ============================================================================
// spark-scope - Diagnostics
// Injectable sink for faults that are swallowed rather than propagated
// ============================================================================
//
// Watcher, async-task, and post-digest faults are isolated at the point
// of invocation: one faulty callback must not abort the pass or corrupt
// sibling watchers. Those faults land here instead of escaping to the
// caller. The default sink logs through `tracing`; hosts can install
// their own with `Scope::set_sink`.
// ============================================================================

use std::any::Any;
use std::fmt;

// =============================================================================
// FAULT SITES
// =============================================================================

/// Where a swallowed fault originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultSite {
    /// A watch function or its listener, during a digest pass.
    Watcher,
    /// An expression queued via `eval_async`, during the queue drain.
    AsyncTask,
    /// A callback queued via `post_digest`, after digest stability.
    PostDigest,
    /// A digest started by the deferred-task facility (its error has no
    /// caller to return to).
    ScheduledDigest,
}

impl fmt::Display for FaultSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultSite::Watcher => write!(f, "watcher"),
            FaultSite::AsyncTask => write!(f, "async task"),
            FaultSite::PostDigest => write!(f, "post-digest callback"),
            FaultSite::ScheduledDigest => write!(f, "scheduled digest"),
        }
    }
}

// =============================================================================
// SINK
// =============================================================================

/// Receiver for swallowed faults.
///
/// Implementations must not panic; a panicking sink would defeat the
/// isolation it exists to provide.
pub trait DiagnosticSink {
    /// Record one fault. `message` is the panic payload (for callback
    /// faults) or the error display (for a failed scheduled digest).
    fn report(&self, site: FaultSite, message: &str);
}

/// Default sink: structured logging via `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, site: FaultSite, message: &str) {
        tracing::error!(target: "spark_scope", site = %site, "{message}");
    }
}

// =============================================================================
// PANIC PAYLOADS
// =============================================================================

/// Extract a readable message from a `catch_unwind` payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================
