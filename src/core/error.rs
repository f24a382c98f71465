// ============================================================================
// spark-scope - Errors
// The two structural failures that escape to callers
// ============================================================================
//
// Everything else that can go wrong - a panicking watch function,
// listener, async expression, or post-digest callback - is caught at the
// invocation site and reported through the diagnostic sink instead of
// propagating. See `core::diagnostics`.
// ============================================================================

use thiserror::Error;

use crate::core::types::Phase;

/// Errors raised by `digest` and `apply`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ScopeError {
    /// `digest` or `apply` was called while a phase was already active.
    ///
    /// Nested reconciliation is disallowed; the payload names the phase
    /// that was running when the reentrant call arrived.
    #[error("{0} already in progress")]
    PhaseInProgress(Phase),

    /// The digest loop ran its full iteration budget and the watchers
    /// were still producing changes.
    ///
    /// This is the oscillation guard: two watchers that keep re-triggering
    /// each other have no stable fixed point, and the digest gives up
    /// rather than looping forever. The phase is cleared before this is
    /// returned, so the scope remains usable.
    #[error("{0} digest iterations reached without the scope stabilizing")]
    IterationLimitExceeded(u32),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(
            ScopeError::PhaseInProgress(Phase::Digest).to_string(),
            "digest already in progress"
        );
        assert_eq!(
            ScopeError::IterationLimitExceeded(10).to_string(),
            "10 digest iterations reached without the scope stabilizing"
        );
    }
}
