// ============================================================================
// spark-scope - Digest Loop
// Repeatedly scan all watchers until a full pass produces no changes
// ============================================================================
//
// There is no dependency graph here: every pass re-evaluates every
// watcher unconditionally, in registration order, and the loop runs until
// a pass comes back clean. A fixed iteration budget guards against two
// watchers that perpetually re-trigger each other - the digest always
// returns control rather than looping forever.
//
// Fault isolation: any panic raised by a watch function, listener, async
// expression, or post-digest callback is caught at the point of
// invocation and reported to the scope's diagnostic sink. One faulty
// watcher cannot abort the pass or corrupt sibling watchers' state.
// ============================================================================

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use crate::core::constants::MAX_DIGEST_ITERATIONS;
use crate::core::diagnostics::{panic_message, FaultSite};
use crate::core::error::ScopeError;
use crate::core::types::Phase;
use crate::primitives::scope::Scope;
use crate::primitives::watcher::{LastValue, Watcher};
use crate::reactivity::equality::are_equal;

// =============================================================================
// PHASE GUARD
// =============================================================================

/// Clears the phase on every exit path, early error returns included.
struct PhaseGuard<'a> {
    scope: &'a Scope,
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.scope.clear_phase();
    }
}

// =============================================================================
// DIGEST
// =============================================================================

impl Scope {
    /// Run the digest cycle to a stable state.
    ///
    /// Each iteration drains the async queue (FIFO, one evaluation per
    /// entry) and then runs one full watcher pass; the loop repeats while
    /// the pass was dirty, bounded by
    /// [`MAX_DIGEST_ITERATIONS`](crate::core::constants::MAX_DIGEST_ITERATIONS).
    /// Once stability is reached, the post-digest queue is drained - each
    /// callback invoked exactly once, in order.
    ///
    /// # Errors
    ///
    /// [`ScopeError::PhaseInProgress`] on a reentrant call;
    /// [`ScopeError::IterationLimitExceeded`] when the watchers never
    /// stabilize. In both cases the phase is cleared before returning, so
    /// the scope remains usable; on the iteration-limit path the
    /// post-digest queue is left intact for the next successful digest.
    pub fn digest(&self) -> Result<(), ScopeError> {
        self.begin_phase(Phase::Digest)?;
        {
            let _guard = PhaseGuard { scope: self };
            let mut ttl = MAX_DIGEST_ITERATIONS;
            loop {
                self.drain_async_queue();
                if !self.digest_once() {
                    break;
                }
                if ttl == 0 {
                    return Err(ScopeError::IterationLimitExceeded(MAX_DIGEST_ITERATIONS));
                }
                ttl -= 1;
            }
        }
        self.drain_post_digest_queue();
        Ok(())
    }

    /// One full pass over the registry. Returns whether any watcher
    /// observed a change.
    pub(crate) fn digest_once(&self) -> bool {
        // Snapshot the registry so listeners can register or deregister
        // watchers without aliasing the borrow; deregistered watchers are
        // skipped via their active flag, newly registered ones are picked
        // up on the next pass.
        let watchers: Vec<Rc<Watcher>> = self.inner().watchers.borrow().clone();

        let mut dirty = false;
        for watcher in watchers {
            if !watcher.active.get() {
                continue;
            }
            match catch_unwind(AssertUnwindSafe(|| self.check_watcher(&watcher))) {
                Ok(changed) => dirty |= changed,
                Err(payload) => {
                    self.sink()
                        .report(FaultSite::Watcher, &panic_message(&*payload));
                }
            }
        }
        dirty
    }

    /// Evaluate one watcher: compare, notify, record.
    fn check_watcher(&self, watcher: &Watcher) -> bool {
        let new_value = (watcher.watch_fn)(self);

        let previous = match &*watcher.last.borrow() {
            LastValue::Uninit => None,
            LastValue::Seen(old) => Some(old.clone()),
        };

        let changed = match &previous {
            // First-ever evaluation always fires
            None => true,
            Some(old) => !are_equal(&new_value, old, watcher.value_eq),
        };

        if changed {
            // On the first evaluation the listener sees old == new, so
            // consumers get "unchanged" semantics instead of a spurious
            // diff against a value that never existed
            let effective_old = previous.as_ref().unwrap_or(&new_value);
            (watcher.listener_fn)(&new_value, effective_old, self);
        }

        // Recorded even when unchanged; deep-cloned under value equality
        // so the stored copy never aliases a container the watch function
        // mutates in place
        *watcher.last.borrow_mut() = LastValue::Seen(if watcher.value_eq {
            new_value.deep_clone()
        } else {
            new_value
        });

        changed
    }

    /// Evaluate queued async expressions, FIFO, one at a time.
    pub(crate) fn drain_async_queue(&self) {
        loop {
            let task = self.inner().async_queue.borrow_mut().pop_front();
            let Some(task) = task else { break };
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| task(self))) {
                self.sink()
                    .report(FaultSite::AsyncTask, &panic_message(&*payload));
            }
        }
    }

    /// Run queued post-digest callbacks, FIFO, each exactly once.
    pub(crate) fn drain_post_digest_queue(&self) {
        loop {
            let callback = self.inner().post_digest_queue.borrow_mut().pop_front();
            let Some(callback) = callback else { break };
            if let Err(payload) = catch_unwind(AssertUnwindSafe(callback)) {
                self.sink()
                    .report(FaultSite::PostDigest, &panic_message(&*payload));
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
