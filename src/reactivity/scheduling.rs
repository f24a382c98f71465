// ============================================================================
// spark-scope - Deferred Scheduling
// The "run soon" facility backing eval_async's standalone digests
// ============================================================================
//
// In a browser runtime the deferred digest would ride a zero-delay
// macrotask. Rust has no ambient event loop, so the default scheduler
// queues onto a thread-local list that the host drains explicitly with
// `tick()` - the same explicit-flush trade the rest of this library
// makes. Hosts that do own an event loop can install their own
// `Scheduler` on the scope and submit the callback wherever they like;
// anything providing single deferred callback submission suffices.
//
// Once a task is scheduled it will run - there is no cancellation. A
// deferred digest whose queue was drained in the interim simply does
// nothing.
// ============================================================================

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::core::constants::MAX_TICK_TASKS;

// =============================================================================
// SCHEDULER
// =============================================================================

/// A unit of deferred work.
pub type DeferredTask = Box<dyn FnOnce()>;

/// A host facility accepting single deferred callback submissions.
///
/// The contract is ordering, not concurrency: a deferred task runs later,
/// on the same thread, never overlapping an in-progress digest.
pub trait Scheduler {
    /// Submit a callback to run outside the current call stack.
    fn defer(&self, task: DeferredTask);
}

// =============================================================================
// TICK SCHEDULER (Default)
// =============================================================================

thread_local! {
    /// Tasks awaiting the next `tick` on this thread.
    static DEFERRED_QUEUE: RefCell<VecDeque<DeferredTask>> =
        const { RefCell::new(VecDeque::new()) };
}

/// Default scheduler: a thread-local FIFO drained by [`tick`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TickScheduler;

impl Scheduler for TickScheduler {
    fn defer(&self, task: DeferredTask) {
        DEFERRED_QUEUE.with(|queue| queue.borrow_mut().push_back(task));
    }
}

/// Number of tasks currently awaiting [`tick`] on this thread.
pub fn pending_deferred() -> usize {
    DEFERRED_QUEUE.with(|queue| queue.borrow().len())
}

/// Run every pending deferred task, in submission order.
///
/// Tasks submitted while draining run in the same tick. The drain is
/// capped at [`MAX_TICK_TASKS`](crate::core::constants::MAX_TICK_TASKS);
/// exceeding it panics, since it means a task keeps rescheduling itself.
///
/// # Example
///
/// ```
/// use spark_scope::{tick, Scope, Value};
///
/// let scope = Scope::new();
/// scope.eval_async(|s| s.set("greeting", "hello"));
///
/// // Nothing has run yet; the digest rides the deferred task
/// assert_eq!(scope.get("greeting"), Value::Null);
///
/// tick();
/// assert_eq!(scope.get("greeting"), Value::from("hello"));
/// ```
pub fn tick() {
    let mut drained = 0u32;
    loop {
        let task = DEFERRED_QUEUE.with(|queue| queue.borrow_mut().pop_front());
        let Some(task) = task else { break };

        drained += 1;
        if drained > MAX_TICK_TASKS {
            panic!(
                "Maximum deferred task count exceeded. This can happen when a \
                 deferred task keeps rescheduling itself."
            );
        }

        task();
    }
}

// =============================================================================
// TESTS
// =============================================================================
