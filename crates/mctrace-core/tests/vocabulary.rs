//! Labels and the in-memory symbol table, exercised through the public API.

use mctrace_core::prelude::*;
use mctrace_core::{LabelError, TraceLabel};
use proptest::prelude::*;

prop_compose! {
    /// A 1-based `(trace, state)` pair as a user would type it.
    fn typed_label()(trace in 1i32..10_000, state in -10_000i32..10_000) -> (i32, i32) {
        (trace, state)
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    /// Parsing stores 0-based components and displaying restores the text.
    #[test]
    fn label_text_is_stable((trace, state) in typed_label()) {
        let text = format!("{trace}.{state}");
        let label: TraceLabel = text.parse().unwrap();
        prop_assert_eq!(label.trace, trace - 1);
        prop_assert_eq!(label.state, state - 1);
        prop_assert_eq!(label.to_string(), text);
    }

    /// Spaces around the separator are tolerated.
    #[test]
    fn label_tolerates_spaces((trace, state) in typed_label()) {
        let spaced: TraceLabel = format!("  {trace} . {state} ").parse().unwrap();
        let tight: TraceLabel = format!("{trace}.{state}").parse().unwrap();
        prop_assert_eq!(spaced, tight);
    }

    /// Scalar values are well typed exactly when they belong to the domain.
    #[test]
    fn equality_typing_follows_domain(domain in prop::collection::btree_set(0u8..20, 1..6), probe in 0u8..20) {
        let mut st = ModelSymbolTable::new();
        let names: Vec<String> = domain.iter().map(u8::to_string).collect();
        let x = st
            .declare("x", SymbolDecl::new(SymbCategory::StateVar).with_domain(names))
            .unwrap();
        let v = st.intern_value(&probe.to_string());
        let ok = st.type_checker().is_well_formed(&Expr::Equal(x, v));
        prop_assert_eq!(ok, domain.contains(&probe));
    }
}

#[test]
fn malformed_labels_are_rejected() {
    assert!(matches!("-1.2".parse::<TraceLabel>(), Err(LabelError::TraceNumber(_))));
    assert!(matches!("1".parse::<TraceLabel>(), Err(LabelError::MissingDot(_))));
    assert!(matches!("1.".parse::<TraceLabel>(), Err(LabelError::StateNumber(_))));
    assert!(matches!("1.2x".parse::<TraceLabel>(), Err(LabelError::Trailing(_))));
}

#[test]
fn set_values_only_type_membership() {
    let mut st = ModelSymbolTable::new();
    let x = st.declare("x", SymbolDecl::new(SymbCategory::StateVar)).unwrap();
    let set = st.intern_set_value("{1, 2}");
    let one = st.intern_value("1");
    let tc = st.type_checker();
    assert!(tc.is_well_formed(&Expr::SetIn(x, set)));
    assert!(!tc.is_well_formed(&Expr::Equal(x, set)));
    assert!(!tc.is_well_formed(&Expr::SetIn(x, one)));
    assert!(st.is_set_value(set));
}

#[test]
fn layer_classes_are_per_class() {
    let mut st = ModelSymbolTable::new();
    st.add_layer_to_class("tableau", ARTIFACTS_LAYERS_CLASS);
    assert!(st.is_layer_in_class("tableau", ARTIFACTS_LAYERS_CLASS));
    assert!(!st.is_layer_in_class("model", ARTIFACTS_LAYERS_CLASS));
    assert!(!st.is_layer_in_class("tableau", "other"));
}
