// ============================================================================
// spark-scope - Reactivity Module
// The digest loop, equality policy, and deferred scheduling
// ============================================================================

pub mod digest;
pub mod equality;
pub mod scheduling;

// Re-export equality functions
pub use self::equality::{
    are_equal, deep_equals, identity_equals, safe_equals_f64, safe_not_equal_f64,
};

// Re-export scheduling functions
pub use self::scheduling::{pending_deferred, tick, DeferredTask, Scheduler, TickScheduler};
