//! Property tests for assignment, copy, random access and loopbacks.

use mctrace_core::prelude::*;
use mctrace_trace::{SectionMask, Trace, TraceError};
use proptest::prelude::*;
use std::rc::Rc;

const N_VALUES: u32 = 4;

/// Table with `n_state` state vars, one input var, one frozen var and
/// `N_VALUES` scalar values.
fn table(n_state: usize) -> (Rc<dyn SymbolTable>, Vec<Symbol>) {
    let mut st = ModelSymbolTable::new();
    let mut syms: Vec<Symbol> = (0..n_state)
        .map(|k| {
            st.declare(&format!("s{k}"), SymbolDecl::new(SymbCategory::StateVar))
                .unwrap()
        })
        .collect();
    syms.push(st.declare("in", SymbolDecl::new(SymbCategory::InputVar)).unwrap());
    syms.push(st.declare("fz", SymbolDecl::new(SymbCategory::FrozenVar)).unwrap());
    for v in 0..N_VALUES {
        st.intern_value(&v.to_string());
    }
    (Rc::new(st), syms)
}

/// Builds a trace whose state at step `k` is `states[k]` (one value per state var).
fn trace_of(table: &Rc<dyn SymbolTable>, syms: &[Symbol], states: &[Vec<u32>]) -> Trace {
    let mut t = Trace::create(Rc::clone(table), None, TraceType::Counterexample, syms, true)
        .unwrap();
    for (k, state) in states.iter().enumerate() {
        let step = if k == 0 {
            t.first_step()
        } else {
            t.append_step().unwrap()
        };
        for (var, v) in syms.iter().zip(state) {
            t.put_value(step, *var, Value(*v)).unwrap();
        }
    }
    t
}

prop_compose! {
    fn arb_states(max_steps: usize, width: usize)
        (len in 1usize..=max_steps)
        (states in prop::collection::vec(prop::collection::vec(0u32..N_VALUES, width), len))
        -> Vec<Vec<u32>> { states }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    // Property: every write is readable, rewrites of the same value succeed
    // and rewrites of another value are refused.
    #[test]
    fn put_then_get(states in arb_states(8, 3), other in 0u32..N_VALUES) {
        let (table, syms) = table(3);
        let mut t = trace_of(&table, &syms, &states);
        let steps: Vec<_> = t.steps().collect();
        for (step, state) in steps.iter().zip(&states) {
            for (var, v) in syms.iter().zip(state) {
                prop_assert_eq!(t.get_value(*step, *var), Ok(Some(Value(*v))));
                prop_assert_eq!(t.put_value(*step, *var, Value(*v)), Ok(true));
                let res = t.put_value(*step, *var, Value(other));
                if other == *v {
                    prop_assert!(res.is_ok());
                } else {
                    let is_conflict = matches!(res, Err(TraceError::ConflictingAssignment { .. }));
                    prop_assert!(is_conflict);
                }
            }
        }
    }

    // Property: a full volatile copy equals its source, frozen or not.
    #[test]
    fn copy_equals_source(states in arb_states(8, 2), freeze in any::<bool>()) {
        let (table, syms) = table(2);
        let mut t = trace_of(&table, &syms, &states);
        if freeze {
            t.freeze();
        }
        let c = t.copy(t.last_step(), true).unwrap();
        prop_assert!(t.equals(&c));
        prop_assert_eq!(c.is_frozen(), freeze);
        prop_assert_eq!(c.length(), t.length());
    }

    // Property: ith_step agrees with the step iterator and with step_index.
    #[test]
    fn ith_step_matches_iteration(n in 0usize..40) {
        let (table, syms) = table(1);
        let mut t = Trace::create(table, None, TraceType::Execution, &syms, true).unwrap();
        for _ in 0..n {
            t.append_step().unwrap();
        }
        prop_assert_eq!(t.length(), n);
        for (k, step) in t.steps().enumerate() {
            prop_assert_eq!(t.ith_step(k + 1), Ok(step));
            prop_assert_eq!(t.step_index(step), Ok(k + 1));
        }
        let is_out_of_range = matches!(t.ith_step(n + 2), Err(TraceError::StepOutOfRange { .. }));
        prop_assert!(is_out_of_range);
    }

    // Property: frozen loopback flags are state equality with the last step.
    #[test]
    fn loopbacks_are_state_equality(states in arb_states(10, 2)) {
        let (table, syms) = table(2);
        let mut t = trace_of(&table, &syms, &states);
        t.freeze();
        let last = states.len() - 1;
        for (k, step) in t.steps().enumerate() {
            let expected = k != last && states[k] == states[last];
            prop_assert_eq!(t.is_loopback(step), Ok(expected));
        }
    }

    // Property: concatenating at a shared state sums lengths and keeps every value.
    #[test]
    fn concat_sums_lengths(a in arb_states(6, 2), tail in arb_states(6, 2)) {
        let (table, syms) = table(2);
        let mut b_states = vec![a[a.len() - 1].clone()];
        b_states.extend(tail);
        let ta = trace_of(&table, &syms, &a);
        let tb = trace_of(&table, &syms, &b_states);
        let (la, lb) = (ta.length(), tb.length());

        let t = ta.concat(tb).unwrap();
        prop_assert_eq!(t.length(), la + lb);
        let expected: Vec<_> = a.iter().chain(b_states.iter().skip(1)).collect();
        for (step, state) in t.steps().zip(expected) {
            let got: Vec<u32> = t
                .step_values(step, SectionMask::S_VARS)
                .unwrap()
                .map(|(_, v)| v.0)
                .collect();
            prop_assert_eq!(&got, state);
        }
    }
}
