// ============================================================================
// spark-scope - Watcher Registration
//
// watch / watch_with_equals / watch_group and their deregistration
// capabilities.
// ============================================================================
//
// A watcher pairs a watch function with a listener, an equality mode, and
// the value observed on the previous pass. Registration order is
// evaluation order within a digest pass. Every registration returns an
// UnwatchFn that removes exactly that watcher instance, by identity.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::core::types::{ListenerFn, UnwatchFn, WatchFn};
use crate::core::value::Value;
use crate::primitives::scope::Scope;

// =============================================================================
// WATCHER RECORD
// =============================================================================

/// What a watcher saw on the previous pass.
///
/// `Uninit` is the never-evaluated sentinel: it is distinct from every
/// real value (including `Null`), is never exposed to listeners, and
/// guarantees the first evaluation always fires with `old == new`.
pub(crate) enum LastValue {
    Uninit,
    Seen(Value),
}

/// One registered watcher, owned exclusively by the scope that registered
/// it.
pub(crate) struct Watcher {
    pub(crate) watch_fn: WatchFn,
    pub(crate) listener_fn: ListenerFn,
    /// Deep (structural) comparison when true, identity otherwise.
    pub(crate) value_eq: bool,
    pub(crate) last: RefCell<LastValue>,
    /// Cleared on deregistration so a watcher removed mid-pass is skipped.
    pub(crate) active: Cell<bool>,
}

// =============================================================================
// REGISTRATION
// =============================================================================

impl Scope {
    /// Register a watcher with identity-based comparison.
    ///
    /// The watch function is re-evaluated on every digest pass; the
    /// listener fires with `(new, old, scope)` whenever the result
    /// differs from the previous pass. On the very first evaluation the
    /// listener fires with `old == new`. Pass an empty closure as the
    /// listener to force evaluation without observing changes.
    ///
    /// Returns a deregistration function; see [`UnwatchFn`].
    ///
    /// # Example
    ///
    /// ```
    /// use spark_scope::Scope;
    ///
    /// let scope = Scope::new();
    /// scope.set("count", 0);
    ///
    /// let unwatch = scope.watch(
    ///     |s| s.get("count"),
    ///     |new, old, _s| println!("{old} -> {new}"),
    /// );
    ///
    /// scope.digest().unwrap();
    /// unwatch();
    /// ```
    pub fn watch<W, L>(&self, watch_fn: W, listener_fn: L) -> UnwatchFn
    where
        W: Fn(&Scope) -> Value + 'static,
        L: Fn(&Value, &Value, &Scope) + 'static,
    {
        self.watch_with_equals(watch_fn, listener_fn, false)
    }

    /// Register a watcher with an explicit equality mode.
    ///
    /// With `value_eq` set, values are compared structurally (deep,
    /// NaN-aware) and the stored previous value is deep-cloned so a watch
    /// function mutating a container in place is never compared against
    /// itself. Without it, comparison is by identity: primitives by value
    /// (NaN equal to NaN), containers by pointer.
    pub fn watch_with_equals<W, L>(&self, watch_fn: W, listener_fn: L, value_eq: bool) -> UnwatchFn
    where
        W: Fn(&Scope) -> Value + 'static,
        L: Fn(&Value, &Value, &Scope) + 'static,
    {
        let watcher = Rc::new(Watcher {
            watch_fn: Box::new(watch_fn),
            listener_fn: Box::new(listener_fn),
            value_eq,
            last: RefCell::new(LastValue::Uninit),
            active: Cell::new(true),
        });
        self.inner().watchers.borrow_mut().push(Rc::clone(&watcher));

        let weak = self.downgrade();
        Box::new(move || {
            watcher.active.set(false);
            if let Some(inner) = weak.upgrade() {
                let mut watchers = inner.watchers.borrow_mut();
                if let Some(index) = watchers.iter().position(|w| Rc::ptr_eq(w, &watcher)) {
                    watchers.remove(index);
                }
            }
        })
    }

    /// Watch several expressions with one shared listener.
    ///
    /// Each member gets its own watcher whose private listener records
    /// that member's latest new/old value into shared per-index arrays
    /// and then invokes the group listener with the *entire* arrays -
    /// every member change triggers a full-group call, not just that
    /// member's slot. An empty input registers nothing and returns a
    /// no-op deregistration function.
    ///
    /// The returned function deregisters every member, in registration
    /// order.
    ///
    /// # Example
    ///
    /// ```
    /// use spark_scope::{Scope, WatchFn};
    ///
    /// let scope = Scope::new();
    /// scope.set("first", "Ada");
    /// scope.set("last", "Lovelace");
    ///
    /// let _unwatch = scope.watch_group(
    ///     vec![
    ///         Box::new(|s: &Scope| s.get("first")) as WatchFn,
    ///         Box::new(|s: &Scope| s.get("last")),
    ///     ],
    ///     |news, _olds, _s| println!("{} {}", news[0], news[1]),
    /// );
    ///
    /// scope.digest().unwrap();
    /// ```
    pub fn watch_group<L>(&self, watch_fns: Vec<WatchFn>, listener_fn: L) -> UnwatchFn
    where
        L: Fn(&[Value], &[Value], &Scope) + 'static,
    {
        if watch_fns.is_empty() {
            return Box::new(|| {});
        }

        let len = watch_fns.len();
        let new_values = Rc::new(RefCell::new(vec![Value::Null; len]));
        let old_values = Rc::new(RefCell::new(vec![Value::Null; len]));
        let listener = Rc::new(listener_fn);

        let unwatchers: Vec<UnwatchFn> = watch_fns
            .into_iter()
            .enumerate()
            .map(|(i, watch_fn)| {
                let new_values = Rc::clone(&new_values);
                let old_values = Rc::clone(&old_values);
                let listener = Rc::clone(&listener);
                self.watch(watch_fn, move |new, old, scope| {
                    new_values.borrow_mut()[i] = new.clone();
                    old_values.borrow_mut()[i] = old.clone();
                    // Snapshot the slots before the call: the group
                    // listener may re-enter registration paths.
                    let new_snapshot = new_values.borrow().clone();
                    let old_snapshot = old_values.borrow().clone();
                    listener(&new_snapshot, &old_snapshot, scope);
                })
            })
            .collect();

        Box::new(move || {
            for unwatch in unwatchers {
                unwatch();
            }
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
