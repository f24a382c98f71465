// ============================================================================
// spark-scope - Scope
//
// The shared mutable context plus its digest engine state.
// ============================================================================
//
// A Scope owns the named observed state, the watcher registry, the two
// FIFO work queues, and the phase flag. External code mutates fields and
// then calls `digest` (directly) or `apply` (mutate-then-digest). The
// digest loop itself lives in `reactivity::digest`; watcher registration
// in `primitives::watcher`.
//
// Key operations:
// - get/set/remove - the ad-hoc named fields holding application data
// - eval/eval_with - lowest-level evaluation hook, no phase, no digest
// - apply/apply_with - evaluate then unconditionally reconcile
// - eval_async - fold an expression into the next digest, scheduling a
//   standalone one through the deferred-task facility if none is imminent
// - post_digest - run a callback once, after the next digest stabilizes
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use crate::core::diagnostics::{DiagnosticSink, FaultSite, TracingSink};
use crate::core::error::ScopeError;
use crate::core::types::{AsyncExprFn, Phase, PostDigestFn};
use crate::core::value::Value;
use crate::primitives::watcher::Watcher;
use crate::reactivity::scheduling::{Scheduler, TickScheduler};

// =============================================================================
// SCOPE INNER
// =============================================================================

/// Internal scope state, shared by every handle cloned from one `Scope`.
pub(crate) struct ScopeInner {
    /// Named fields holding the observed application data.
    pub(crate) fields: RefCell<HashMap<String, Value>>,

    /// Registered watchers; insertion order is evaluation order.
    pub(crate) watchers: RefCell<Vec<Rc<Watcher>>>,

    /// Expressions awaiting evaluation at the start of the next digest.
    pub(crate) async_queue: RefCell<VecDeque<AsyncExprFn>>,

    /// Callbacks awaiting a stable digest.
    pub(crate) post_digest_queue: RefCell<VecDeque<PostDigestFn>>,

    /// Set for the duration of a single digest or apply call.
    pub(crate) phase: Cell<Option<Phase>>,

    /// Receiver for swallowed callback faults.
    pub(crate) sink: RefCell<Rc<dyn DiagnosticSink>>,

    /// Deferred-task facility used by `eval_async`.
    pub(crate) scheduler: RefCell<Rc<dyn Scheduler>>,
}

// =============================================================================
// SCOPE (Public handle)
// =============================================================================

/// A mutable key-value context plus a dirty-checking digest engine.
///
/// Cloning a `Scope` clones the handle, not the state: all clones share
/// the same fields, watchers, and queues. The engine is single-threaded
/// and cooperative; nothing here is `Send`.
///
/// # Example
///
/// ```
/// use spark_scope::{Scope, Value};
///
/// let scope = Scope::new();
/// scope.set("name", "world");
///
/// let _unwatch = scope.watch(
///     |s| s.get("name"),
///     |new, _old, _s| println!("hello {new}"),
/// );
///
/// scope.digest().unwrap();
/// ```
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

impl Scope {
    /// Create a scope with no fields, no watchers, and empty queues.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                fields: RefCell::new(HashMap::new()),
                watchers: RefCell::new(Vec::new()),
                async_queue: RefCell::new(VecDeque::new()),
                post_digest_queue: RefCell::new(VecDeque::new()),
                phase: Cell::new(None),
                sink: RefCell::new(Rc::new(TracingSink)),
                scheduler: RefCell::new(Rc::new(TickScheduler)),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Rc<ScopeInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Rc<ScopeInner> {
        &self.inner
    }

    pub(crate) fn downgrade(&self) -> Weak<ScopeInner> {
        Rc::downgrade(&self.inner)
    }

    // =========================================================================
    // FIELDS
    // =========================================================================

    /// Read a named field. Absent fields read as [`Value::Null`].
    ///
    /// The returned value is a shallow clone: container values share
    /// identity with what the scope holds, so in-place mutation through
    /// the handle is visible to watchers.
    pub fn get(&self, key: &str) -> Value {
        self.inner
            .fields
            .borrow()
            .get(key)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Write a named field.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.fields.borrow_mut().insert(key.into(), value.into());
    }

    /// Remove a named field, returning its previous value if it existed.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.fields.borrow_mut().remove(key)
    }

    /// Whether a named field exists (even if it holds `Null`).
    pub fn contains(&self, key: &str) -> bool {
        self.inner.fields.borrow().contains_key(key)
    }

    // =========================================================================
    // PHASE
    // =========================================================================

    /// The phase currently running on this scope, if any.
    pub fn phase(&self) -> Option<Phase> {
        self.inner.phase.get()
    }

    /// Mark a phase as started; rejects nested digest/apply.
    pub(crate) fn begin_phase(&self, phase: Phase) -> Result<(), ScopeError> {
        if let Some(active) = self.inner.phase.get() {
            return Err(ScopeError::PhaseInProgress(active));
        }
        self.inner.phase.set(Some(phase));
        Ok(())
    }

    /// Mark the active phase as finished.
    pub(crate) fn clear_phase(&self) {
        self.inner.phase.set(None);
    }

    // =========================================================================
    // DIAGNOSTICS & SCHEDULING INJECTION
    // =========================================================================

    /// Replace the diagnostic sink receiving swallowed callback faults.
    pub fn set_sink(&self, sink: impl DiagnosticSink + 'static) {
        *self.inner.sink.borrow_mut() = Rc::new(sink);
    }

    pub(crate) fn sink(&self) -> Rc<dyn DiagnosticSink> {
        Rc::clone(&self.inner.sink.borrow())
    }

    /// Replace the deferred-task facility used by [`Scope::eval_async`].
    ///
    /// The default [`TickScheduler`] queues onto a thread-local list
    /// drained by [`tick`](crate::reactivity::scheduling::tick); hosts
    /// with their own event loop can install an adapter here.
    pub fn set_scheduler(&self, scheduler: impl Scheduler + 'static) {
        *self.inner.scheduler.borrow_mut() = Rc::new(scheduler);
    }

    pub(crate) fn scheduler(&self) -> Rc<dyn Scheduler> {
        Rc::clone(&self.inner.scheduler.borrow())
    }

    // =========================================================================
    // EVALUATION
    // =========================================================================

    /// Synchronously evaluate an expression against this scope.
    ///
    /// The lowest-level hook: no phase management, no digest.
    pub fn eval<R>(&self, expr: impl FnOnce(&Scope) -> R) -> R {
        expr(self)
    }

    /// Like [`Scope::eval`], passing additional locals through to the
    /// expression alongside the scope.
    pub fn eval_with<R, L>(&self, expr: impl FnOnce(&Scope, &L) -> R, locals: &L) -> R {
        expr(self, locals)
    }

    /// Reconcile the scope after out-of-band mutation: a digest bracketed
    /// by the apply phase, with no expression to evaluate.
    ///
    /// # Errors
    ///
    /// [`ScopeError::PhaseInProgress`] if a digest or apply is already
    /// running; any error the digest itself produces.
    pub fn apply(&self) -> Result<(), ScopeError> {
        self.apply_with(|_| ()).map(|()| ())
    }

    /// Evaluate `expr`, then unconditionally digest - even if `expr`
    /// panicked.
    ///
    /// The apply phase is entered before evaluation (rejecting reentrant
    /// calls) and cleared before the digest starts. A digest error takes
    /// precedence; otherwise a panic from `expr` resumes after the digest
    /// has run.
    pub fn apply_with<R>(&self, expr: impl FnOnce(&Scope) -> R) -> Result<R, ScopeError> {
        self.begin_phase(Phase::Apply)?;
        let result = catch_unwind(AssertUnwindSafe(|| expr(self)));
        self.clear_phase();
        let digested = self.digest();
        match result {
            Ok(value) => digested.map(|()| value),
            Err(payload) => {
                digested?;
                resume_unwind(payload)
            }
        }
    }

    // =========================================================================
    // DEFERRED WORK
    // =========================================================================

    /// Queue an expression to be evaluated no later than the start of the
    /// next digest, and at most once.
    ///
    /// If no phase is active and the queue was empty before this call, a
    /// deferred task is scheduled that digests on its own - so the
    /// expression runs soon even if nobody else ever calls `digest`. The
    /// task is a no-op if a digest has already drained the queue by the
    /// time it fires, and its own digest errors go to the diagnostic sink
    /// (there is no caller to return them to).
    pub fn eval_async(&self, expr: impl FnOnce(&Scope) + 'static) {
        let needs_schedule =
            self.inner.phase.get().is_none() && self.inner.async_queue.borrow().is_empty();

        if needs_schedule {
            let weak = self.downgrade();
            self.scheduler().defer(Box::new(move || {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let scope = Scope::from_inner(inner);
                if scope.inner.async_queue.borrow().is_empty() {
                    return;
                }
                if let Err(err) = scope.digest() {
                    scope
                        .sink()
                        .report(FaultSite::ScheduledDigest, &err.to_string());
                }
            }));
        }

        self.inner.async_queue.borrow_mut().push_back(Box::new(expr));
    }

    /// Queue a callback to run exactly once, after the next digest
    /// reaches a stable (change-free) state.
    pub fn post_digest(&self, f: impl FnOnce() + 'static) {
        self.inner.post_digest_queue.borrow_mut().push_back(Box::new(f));
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
