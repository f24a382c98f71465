// ============================================================================
// spark-scope - Constants
// Budgets bounding the digest loop and the deferred-task drain
// ============================================================================

/// Maximum number of dirty passes a single digest may run.
///
/// Dirty checking has no acyclic-dependency guarantee: two watchers that
/// keep re-triggering each other would otherwise loop forever. Once this
/// many passes have all come back dirty, the next dirty pass aborts the
/// digest with [`ScopeError::IterationLimitExceeded`].
///
/// [`ScopeError::IterationLimitExceeded`]: crate::core::error::ScopeError::IterationLimitExceeded
pub const MAX_DIGEST_ITERATIONS: u32 = 10;

/// Maximum number of deferred tasks a single [`tick`] will drain.
///
/// Tasks may enqueue further tasks while draining; this caps a task that
/// keeps rescheduling itself.
///
/// [`tick`]: crate::reactivity::scheduling::tick
pub const MAX_TICK_TASKS: u32 = 1000;
