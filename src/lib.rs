// ============================================================================
// spark-scope - A Dirty-Checking Scope Library for Rust
// ============================================================================
//
// A scope is a mutable key-value context plus a digest engine: register
// watch functions computing values from the scope, mutate state, then
// digest - every watcher is re-evaluated until a full pass produces no
// changes, invoking listeners for each change along the way. Coarse-
// grained change detection: no dependency graph, no ordering between
// watchers, just a bounded fixed-point loop.
// ============================================================================

pub mod core;
pub mod primitives;
pub mod reactivity;

// Re-export core items at crate root for ergonomic access
pub use self::core::constants;
pub use self::core::diagnostics::{DiagnosticSink, FaultSite, TracingSink};
pub use self::core::error::ScopeError;
pub use self::core::types::{
    AsyncExprFn, GroupListenerFn, ListenerFn, Phase, PostDigestFn, UnwatchFn, WatchFn,
};
pub use self::core::value::Value;

// Re-export the scope itself
pub use self::primitives::scope::Scope;

// Re-export reactivity functions
pub use self::reactivity::equality::{
    are_equal, deep_equals, identity_equals, safe_equals_f64, safe_not_equal_f64,
};
pub use self::reactivity::scheduling::{
    pending_deferred, tick, DeferredTask, Scheduler, TickScheduler,
};

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting_listener(counter: Rc<Cell<i64>>) -> impl Fn(&Value, &Value, &Scope) + 'static {
        move |_, _, _| counter.set(counter.get() + 1)
    }

    // =========================================================================
    // The canonical watch / digest / apply / unwatch lifecycle
    // =========================================================================

    #[test]
    fn watch_digest_apply_unwatch_lifecycle() {
        let scope = Scope::new();
        let counter = Rc::new(Cell::new(0));

        let unwatch = scope.watch(|s| s.get("first_value"), counting_listener(counter.clone()));

        // Nothing fires before the first digest
        assert_eq!(counter.get(), 0);

        // First digest: the init fire, even though the field is absent
        scope.digest().unwrap();
        assert_eq!(counter.get(), 1);

        // apply = mutate then reconcile automatically
        scope.set("first_value", "abcd");
        scope.apply().unwrap();
        assert_eq!(counter.get(), 2);

        // Deregistered watchers never fire again
        unwatch();
        scope.set("first_value", "no longer observed");
        scope.digest().unwrap();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn watch_group_lifecycle() {
        let scope = Scope::new();
        let counter = Rc::new(Cell::new(0));

        let counter_clone = counter.clone();
        let unwatch = scope.watch_group(
            vec![
                Box::new(|s: &Scope| s.get("second_value")) as WatchFn,
                Box::new(|s: &Scope| s.get("third_value")),
            ],
            move |_, _, _| counter_clone.set(counter_clone.get() + 1),
        );

        // Init pass: one full-group call per member
        scope.digest().unwrap();
        assert_eq!(counter.get(), 2);

        // One member changed: one more full-group call
        scope.set("second_value", "John Parker");
        scope.digest().unwrap();
        assert_eq!(counter.get(), 3);

        // Removing the group silences both members
        unwatch();
        scope.set("second_value", "Jenifer Parker");
        scope.set("third_value", "Peter Parker");
        scope.digest().unwrap();
        assert_eq!(counter.get(), 3);
    }

    // =========================================================================
    // Digest semantics
    // =========================================================================

    #[test]
    fn constant_watch_fires_exactly_once_across_digests() {
        let scope = Scope::new();
        let counter = Rc::new(Cell::new(0));
        let _unwatch = scope.watch(|_| Value::Int(42), counting_listener(counter.clone()));

        scope.digest().unwrap();
        scope.digest().unwrap();
        scope.digest().unwrap();
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn digest_inside_a_listener_is_rejected() {
        let scope = Scope::new();
        let nested = Rc::new(Cell::new(None));

        let nested_clone = nested.clone();
        let _unwatch = scope.watch(
            |s| s.get("x"),
            move |_, _, s| nested_clone.set(Some(s.digest())),
        );

        scope.digest().unwrap();
        assert_eq!(
            nested.get(),
            Some(Err(ScopeError::PhaseInProgress(Phase::Digest)))
        );
    }

    #[test]
    fn digest_on_an_empty_scope_is_fine() {
        let scope = Scope::new();
        scope.digest().unwrap();
        assert_eq!(scope.phase(), None);
    }

    // =========================================================================
    // Deferred evaluation
    // =========================================================================

    #[test]
    fn eval_async_schedules_a_standalone_digest() {
        let scope = Scope::new();
        let counter = Rc::new(Cell::new(0));
        let _unwatch = scope.watch(|s| s.get("a"), counting_listener(counter.clone()));

        scope.eval_async(|s| s.set("a", 5));
        assert_eq!(counter.get(), 0);
        assert_eq!(pending_deferred(), 1);

        tick();
        assert_eq!(counter.get(), 1);
        assert_eq!(scope.get("a"), Value::Int(5));
    }

    #[test]
    fn scheduled_digest_is_a_no_op_when_already_drained() {
        let scope = Scope::new();
        let counter = Rc::new(Cell::new(0));
        let _unwatch = scope.watch(|s| s.get("a"), counting_listener(counter.clone()));

        scope.eval_async(|s| s.set("a", 5));
        // A direct digest drains the queue before the deferred task fires
        scope.digest().unwrap();
        assert_eq!(counter.get(), 1);

        tick();
        // The deferred task found an empty queue and did nothing
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn post_digest_runs_exactly_once_after_stability() {
        let scope = Scope::new();
        let ran = Rc::new(Cell::new(0));

        let ran_clone = ran.clone();
        scope.post_digest(move || ran_clone.set(ran_clone.get() + 1));

        scope.digest().unwrap();
        assert_eq!(ran.get(), 1);

        scope.digest().unwrap();
        assert_eq!(ran.get(), 1);
    }
}
