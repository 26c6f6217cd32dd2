//! Assertion helpers for verifying lattice and analysis laws.
//!
//! These check properties over a given set of sample elements and collect all
//! violations into a single report, so you can see every failing law at once
//! rather than fixing them one at a time.
//!
//! # Example
//!
//! ```
//! use kirin_test_utils::lattice::assert_bounded_lattice_laws;
//! use kirin_test_utils::Height;
//!
//! // Pass representative elements from your lattice.
//! // Bottom and top are tested automatically.
//! assert_bounded_lattice_laws(&[Height::new(0), Height::new(3)]);
//! ```

use kirin_callgraph::Program;
use kirin_fixpoint::Analysis;
use kirin_fixpoint::lattice::{HasBottom, HasTop, Lattice, Widen};
use std::fmt::{Debug, Write};

/// Collect violations into a `Vec<String>`, then panic with a combined report
/// if any were found.
fn report(violations: Vec<String>) {
    if violations.is_empty() {
        return;
    }
    let mut msg = format!("{} law violation(s):\n", violations.len());
    for (i, v) in violations.iter().enumerate() {
        let _ = writeln!(msg, "  {}. {}", i + 1, v);
    }
    panic!("{msg}");
}

/// Check that `join` is commutative, associative, and idempotent over the
/// given elements.
pub fn assert_join_laws<L: Lattice + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_join_laws(elements, &mut violations);
    report(violations);
}

/// Check that `a.is_subseteq(&b)` holds exactly when `a.join(&b) == b`.
pub fn assert_ordering_consistent<L: Lattice + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_ordering_consistent(elements, &mut violations);
    report(violations);
}

/// Check join laws and ordering consistency together.
pub fn assert_lattice_laws<L: Lattice + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_join_laws(elements, &mut violations);
    check_ordering_consistent(elements, &mut violations);
    report(violations);
}

/// Check all lattice laws plus bottom and top element laws. Bottom and top
/// are added to `elements` automatically.
pub fn assert_bounded_lattice_laws<L: HasBottom + HasTop + PartialEq + Debug>(elements: &[L]) {
    let elements: Vec<L> = elements
        .iter()
        .map(|element| element.join(&L::bottom()))
        .chain([L::bottom(), L::top()])
        .collect();
    let mut violations = Vec::new();
    check_join_laws(&elements, &mut violations);
    check_ordering_consistent(&elements, &mut violations);
    check_bottom_laws(&elements, &mut violations);
    check_top_laws(&elements, &mut violations);
    report(violations);
}

/// Check that `widen` is an upper bound of both of its operands.
pub fn assert_widen_laws<L: Widen + PartialEq + Debug>(elements: &[L]) {
    let mut violations = Vec::new();
    check_widen_upper_bound(elements, &mut violations);
    report(violations);
}

/// Check the algebraic contracts of an [`Analysis`] over sample models at
/// `iteration`, using `reached_fixpoint(i, b, a)` as the order `a ⊑ b`:
/// reflexivity, and that `join` and `widen` are upper bounds of both
/// operands. The empty model is added to `models` automatically.
pub fn assert_analysis_laws<P: Program, A: Analysis<P>>(
    analysis: &A,
    iteration: usize,
    models: &[A::Model],
) {
    let below = |a: &A::Model, b: &A::Model| analysis.reached_fixpoint(iteration, b, a);
    let models: Vec<A::Model> = models
        .iter()
        .cloned()
        .chain([analysis.empty_model()])
        .collect();

    let mut v = Vec::new();
    for a in &models {
        if !below(a, a) {
            v.push(format!("reached_fixpoint not reflexive on {a:?}"));
        }
        for b in &models {
            let joined = analysis.join(iteration, a, b);
            if !below(a, &joined) || !below(b, &joined) {
                v.push(format!(
                    "join not an upper bound: join({a:?}, {b:?}) = {joined:?}"
                ));
            }
            let widened = analysis.widen(iteration, a, b);
            if !below(a, &widened) || !below(b, &widened) {
                v.push(format!(
                    "widen not an upper bound: widen({a:?}, {b:?}) = {widened:?}"
                ));
            }
        }
    }
    report(v);
}

// ---- internal helpers that push violations instead of panicking ----

fn check_join_laws<L: Lattice + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    for a in elements {
        // idempotent
        if a.join(a) != *a {
            v.push(format!("join not idempotent: {a:?}.join({a:?}) != {a:?}"));
        }
        for b in elements {
            // commutative
            if a.join(b) != b.join(a) {
                v.push(format!(
                    "join not commutative: {a:?}.join({b:?}) != {b:?}.join({a:?})"
                ));
            }
            // associative
            for c in elements {
                if a.join(b).join(c) != a.join(&b.join(c)) {
                    v.push(format!(
                        "join not associative: ({a:?}.join({b:?})).join({c:?}) != {a:?}.join({b:?}.join({c:?}))"
                    ));
                }
            }
        }
    }
}

fn check_ordering_consistent<L: Lattice + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    for a in elements {
        for b in elements {
            let sub = a.is_subseteq(b);
            let join_agrees = a.join(b) == *b;
            if sub != join_agrees {
                v.push(format!(
                    "ordering inconsistent with join: {a:?}.is_subseteq({b:?}) = {sub}, \
                     but {a:?}.join({b:?}) == {b:?} is {join_agrees}"
                ));
            }
        }
    }
}

fn check_bottom_laws<L: HasBottom + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    let bot = L::bottom();
    for x in elements {
        if !bot.is_subseteq(x) {
            v.push(format!(
                "bottom not below element: bottom().is_subseteq({x:?}) = false"
            ));
        }
        if bot.join(x) != *x {
            v.push(format!(
                "bottom identity violated: bottom().join({x:?}) != {x:?}"
            ));
        }
    }
}

fn check_top_laws<L: HasTop + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    let top = L::top();
    for x in elements {
        if !x.is_subseteq(&top) {
            v.push(format!(
                "element not below top: {x:?}.is_subseteq(top()) = false"
            ));
        }
        if top.join(x) != top {
            v.push(format!(
                "top annihilation violated: top().join({x:?}) != top()"
            ));
        }
    }
}

fn check_widen_upper_bound<L: Widen + PartialEq + Debug>(elements: &[L], v: &mut Vec<String>) {
    for a in elements {
        for b in elements {
            let widened = a.widen(b);
            if !a.is_subseteq(&widened) || !b.is_subseteq(&widened) {
                v.push(format!(
                    "widen not an upper bound: {a:?}.widen({b:?}) = {widened:?}"
                ));
            }
        }
    }
}
