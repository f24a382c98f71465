// ============================================================================
// spark-scope - Primitives Module
// The scope itself and watcher registration
// ============================================================================

pub mod scope;
pub mod watcher;

// Re-export for convenience
pub use self::scope::Scope;
