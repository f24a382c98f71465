// End-to-end watcher lifecycle: registration, cascading convergence,
// deregistration (including mid-pass), and equality modes working
// together on one scope.

use spark_scope::{Scope, ScopeError, UnwatchFn, Value, WatchFn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[test]
fn cascading_derivations_converge_in_one_digest() {
    let scope = Scope::new();
    scope.set("celsius", 25);

    // celsius -> fahrenheit -> label, three watchers deep
    let _a = scope.watch(
        |s| s.get("celsius"),
        |new, _, s| {
            let c = new.as_int().unwrap_or(0);
            s.set("fahrenheit", c * 9 / 5 + 32);
        },
    );
    let _b = scope.watch(
        |s| s.get("fahrenheit"),
        |new, _, s| {
            s.set("label", format!("{new}F"));
        },
    );
    let label_changes = Rc::new(Cell::new(0));
    let label_clone = label_changes.clone();
    let _c = scope.watch(
        |s| s.get("label"),
        move |_, _, _| label_clone.set(label_clone.get() + 1),
    );

    scope.digest().unwrap();
    assert_eq!(scope.get("label"), Value::from("77F"));
    assert_eq!(label_changes.get(), 1);

    scope.set("celsius", 100);
    scope.apply().unwrap();
    assert_eq!(scope.get("label"), Value::from("212F"));
    assert_eq!(label_changes.get(), 2);
}

#[test]
fn listener_can_deregister_a_sibling_mid_pass() {
    let scope = Scope::new();

    let victim_fired = Rc::new(Cell::new(0));
    let victim_unwatch: Rc<Cell<Option<UnwatchFn>>> = Rc::new(Cell::new(None));

    // The first watcher's init fire removes the third watcher before the
    // pass reaches it
    let slot = victim_unwatch.clone();
    let _assassin = scope.watch(
        |s| s.get("x"),
        move |_, _, _| {
            if let Some(unwatch) = slot.take() {
                unwatch();
            }
        },
    );

    let victim_clone = victim_fired.clone();
    let unwatch = scope.watch(
        |s| s.get("x"),
        move |_, _, _| victim_clone.set(victim_clone.get() + 1),
    );
    victim_unwatch.set(Some(unwatch));

    scope.digest().unwrap();
    // Deregistered during the same pass, before its first evaluation
    assert_eq!(victim_fired.get(), 0);

    scope.set("x", 1);
    scope.digest().unwrap();
    assert_eq!(victim_fired.get(), 0);
}

#[test]
fn listener_can_deregister_itself() {
    let scope = Scope::new();
    scope.set("x", 0);

    let fired = Rc::new(Cell::new(0));
    let self_unwatch: Rc<Cell<Option<UnwatchFn>>> = Rc::new(Cell::new(None));

    let fired_clone = fired.clone();
    let slot = self_unwatch.clone();
    let unwatch = scope.watch(
        |s| s.get("x"),
        move |_, _, _| {
            fired_clone.set(fired_clone.get() + 1);
            if let Some(unwatch) = slot.take() {
                unwatch();
            }
        },
    );
    self_unwatch.set(Some(unwatch));

    scope.digest().unwrap();
    assert_eq!(fired.get(), 1);

    scope.set("x", 1);
    scope.digest().unwrap();
    assert_eq!(fired.get(), 1, "a one-shot watcher must not fire again");
}

#[test]
fn equality_modes_coexist_on_one_field() {
    let scope = Scope::new();
    scope.set("items", Value::list([1, 2]));

    let by_identity = Rc::new(Cell::new(0));
    let by_value = Rc::new(Cell::new(0));

    let identity_clone = by_identity.clone();
    let _i = scope.watch(
        |s| s.get("items"),
        move |_, _, _| identity_clone.set(identity_clone.get() + 1),
    );
    let value_clone = by_value.clone();
    let _v = scope.watch_with_equals(
        |s| s.get("items"),
        move |_, _, _| value_clone.set(value_clone.get() + 1),
        true,
    );

    scope.digest().unwrap();
    assert_eq!((by_identity.get(), by_value.get()), (1, 1));

    // In-place mutation: same identity, different structure
    scope
        .get("items")
        .as_list()
        .unwrap()
        .borrow_mut()
        .push(Value::Int(3));
    scope.digest().unwrap();
    assert_eq!((by_identity.get(), by_value.get()), (1, 2));

    // Replacement with a structurally equal fresh list: different
    // identity, same structure
    scope.set("items", Value::list([1, 2, 3]));
    scope.digest().unwrap();
    assert_eq!((by_identity.get(), by_value.get()), (2, 2));
}

#[test]
fn listeners_see_genuine_old_values_after_init() {
    let scope = Scope::new();
    scope.set("n", 1);

    let transitions = Rc::new(RefCell::new(Vec::new()));
    let transitions_clone = Rc::clone(&transitions);
    let _unwatch = scope.watch(
        |s| s.get("n"),
        move |new, old, _| {
            transitions_clone
                .borrow_mut()
                .push((old.as_int().unwrap(), new.as_int().unwrap()));
        },
    );

    scope.digest().unwrap();
    scope.set("n", 2);
    scope.digest().unwrap();
    scope.set("n", 5);
    scope.digest().unwrap();

    // Init fire reports old == new; later fires report the real previous
    assert_eq!(*transitions.borrow(), vec![(1, 1), (1, 2), (2, 5)]);
}

#[test]
fn group_members_share_one_pair_of_slot_arrays() {
    let scope = Scope::new();
    scope.set("a", 1);
    scope.set("b", 2);

    let last_seen = Rc::new(RefCell::new((Vec::new(), Vec::new())));
    let seen_clone = Rc::clone(&last_seen);
    let _unwatch = scope.watch_group(
        vec![
            Box::new(|s: &Scope| s.get("a")) as WatchFn,
            Box::new(|s: &Scope| s.get("b")),
        ],
        move |news, olds, _| {
            *seen_clone.borrow_mut() = (news.to_vec(), olds.to_vec());
        },
    );

    scope.digest().unwrap();

    // Change only member 1; the group listener still receives member 0's
    // slot, untouched since its last change
    scope.set("b", 20);
    scope.digest().unwrap();

    let (news, olds) = last_seen.borrow().clone();
    assert_eq!(news, vec![Value::Int(1), Value::Int(20)]);
    assert_eq!(olds, vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn a_failed_digest_leaves_the_scope_reusable() {
    let scope = Scope::new();
    scope.set("a", 0);
    scope.set("b", 0);

    let unwatch_a = scope.watch(
        |s| s.get("a"),
        |_, _, s| {
            let b = s.get("b").as_int().unwrap_or(0);
            s.set("b", b + 1);
        },
    );
    let unwatch_b = scope.watch(
        |s| s.get("b"),
        |_, _, s| {
            let a = s.get("a").as_int().unwrap_or(0);
            s.set("a", a + 1);
        },
    );

    assert!(matches!(
        scope.digest(),
        Err(ScopeError::IterationLimitExceeded(_))
    ));
    assert_eq!(scope.phase(), None);

    // Remove the oscillators; the scope digests normally again
    unwatch_a();
    unwatch_b();

    let fired = Rc::new(Cell::new(0));
    let fired_clone = fired.clone();
    let _unwatch = scope.watch(
        |s| s.get("a"),
        move |_, _, _| fired_clone.set(fired_clone.get() + 1),
    );
    scope.digest().unwrap();
    assert_eq!(fired.get(), 1);
}
