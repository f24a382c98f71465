// ============================================================================
// spark-scope - Type Definitions
// Callback aliases and the digest/apply phase tag
// ============================================================================

use std::fmt;

use crate::core::value::Value;
use crate::primitives::scope::Scope;

// =============================================================================
// PHASE
// =============================================================================

/// Which reconciliation entry point is currently running on a scope.
///
/// A scope carries at most one active phase at a time; `digest` and
/// `apply` both refuse to start while any phase is set. The tag exists so
/// `eval_async` can tell whether a digest is already imminent (no need to
/// defer one of its own) and so reentrancy errors can name the offender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Inside a `digest` cycle.
    Digest,
    /// Inside an `apply` call (the mutate-then-digest entry point).
    Apply,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Digest => write!(f, "digest"),
            Phase::Apply => write!(f, "apply"),
        }
    }
}

// =============================================================================
// CALLBACK ALIASES
// =============================================================================

/// A watch function: a pure accessor computing the observed value from
/// whatever state the host exposes on the scope.
pub type WatchFn = Box<dyn Fn(&Scope) -> Value>;

/// A change listener, invoked with `(new_value, old_value, scope)`.
///
/// On a watcher's first-ever evaluation both arguments are the new value,
/// so consumers see "unchanged" semantics on initialization.
pub type ListenerFn = Box<dyn Fn(&Value, &Value, &Scope)>;

/// A group listener, invoked with the entire new/old slot arrays whenever
/// any member of a watch group changes.
pub type GroupListenerFn = Box<dyn Fn(&[Value], &[Value], &Scope)>;

/// An expression queued by `eval_async`, evaluated against the scope no
/// later than the start of the next digest.
pub type AsyncExprFn = Box<dyn FnOnce(&Scope)>;

/// A callback queued by `post_digest`, run exactly once after the next
/// digest reaches a stable state.
pub type PostDigestFn = Box<dyn FnOnce()>;

/// Deregistration capability returned by `watch`/`watch_group`.
///
/// Invoking it removes exactly the watcher(s) it was created for; if they
/// are already gone (or the scope has been dropped) it does nothing.
pub type UnwatchFn = Box<dyn FnOnce()>;

// =============================================================================
// TESTS
// =============================================================================
