// ============================================================================
// spark-scope - Core Module
// Fundamental types, values, errors, and diagnostics for the scope engine
// ============================================================================

pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod types;
pub mod value;

// Re-export commonly used items
pub use self::constants::*;
pub use self::diagnostics::{DiagnosticSink, FaultSite, TracingSink};
pub use self::error::ScopeError;
pub use self::types::{
    AsyncExprFn, GroupListenerFn, ListenerFn, Phase, PostDigestFn, UnwatchFn, WatchFn,
};
pub use self::value::Value;
