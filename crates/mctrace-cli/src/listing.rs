//! Plain-text listing of a trace.
//!
//! ```text
//! Trace Description: <generic trace>
//! Trace Type: Counterexample
//!   -- Loop starts here
//!   -> State: 1.1 <-
//!     x = 0
//!   -> Input: 1.2 <-
//!     go = 1
//!   -> State: 1.2 <-
//!     x = 1
//! ```

use crate::profile::ListingProfile;
use anyhow::{bail, Result};
use mctrace_core::{Symbol, SymbolTable, TraceLabel, Value};
use mctrace_trace::{SectionMask, StepId, Trace};
use std::collections::HashMap;
use std::io::Write;

/// Display name of `symbol`.
fn symbol_name(table: &dyn SymbolTable, symbol: Symbol) -> String {
    table
        .symbol_name(symbol)
        .map_or_else(|| symbol.to_string(), str::to_owned)
}

/// Display text of `value`.
fn value_text(table: &dyn SymbolTable, value: Value) -> String {
    table
        .value_name(value)
        .map_or_else(|| value.to_string(), str::to_owned)
}

/// 0-based trace number used in labels.
fn trace_number(trace: &Trace) -> i32 {
    trace
        .id()
        .map_or(0, |id| i32::try_from(id).unwrap_or(i32::MAX))
}

/// Label of the step at 1-based `position`.
#[must_use]
pub fn label_of(trace: &Trace, position: usize) -> TraceLabel {
    let state = i32::try_from(position).unwrap_or(i32::MAX) - 1;
    TraceLabel::new(trace_number(trace), state)
}

/// Resolve a label to a step of `trace`. The trace part must name `trace`;
/// negative states count back from the last step (`N.-1` is the last one).
pub fn resolve_label(trace: &Trace, label: TraceLabel) -> Result<StepId> {
    let number = trace_number(trace);
    if label.trace != number {
        bail!(
            "label {label} names trace {}, but the loaded trace is {}",
            i64::from(label.trace) + 1,
            i64::from(number) + 1
        );
    }
    let steps = i64::try_from(trace.length() + 1)?;
    let state = i64::from(label.state) + 1;
    let position = if state < 0 { steps + 1 + state } else { state };
    let position = usize::try_from(position)
        .map_err(|_| anyhow::anyhow!("state {label} is before the first step"))?;
    Ok(trace.ith_step(position)?)
}

/// 1-based positions of every loopback step.
#[must_use]
pub fn loopback_positions(trace: &Trace) -> Vec<usize> {
    trace
        .steps()
        .enumerate()
        .filter(|(_, s)| trace.is_loopback(*s).unwrap_or(false))
        .map(|(k, _)| k + 1)
        .collect()
}

struct Printer<'a, W> {
    out: &'a mut W,
    trace: &'a Trace,
    profile: &'a ListingProfile,
    last_shown: HashMap<Symbol, Value>,
}

impl<W: Write> Printer<'_, W> {
    fn masks(&self) -> (SectionMask, SectionMask, SectionMask) {
        let p = self.profile;
        if p.show_defines {
            let combo = if p.show_defines_with_next {
                SectionMask::COMBINATORIAL
            } else {
                SectionMask::SI_DEFINES
            };
            (combo, SectionMask::I_SYMBOLS, SectionMask::SF_SYMBOLS)
        } else {
            (SectionMask::NONE, SectionMask::I_VARS, SectionMask::SF_VARS)
        }
    }

    /// Prints the assignment unless hidden or unchanged.
    fn assignment(&mut self, symbol: Symbol, value: Value) -> Result<()> {
        let trace = self.trace;
        let table = trace.symbol_table().as_ref();
        let name = symbol_name(table, symbol);
        if self.profile.hides(&name) {
            return Ok(());
        }
        if self.profile.changes_only && self.last_shown.insert(symbol, value) == Some(value) {
            return Ok(());
        }
        writeln!(self.out, "    {name} = {}", value_text(table, value))?;
        Ok(())
    }

    fn step(&mut self, step: StepId, position: usize) -> Result<()> {
        let (combo, inputs, states) = self.masks();
        let trace = self.trace;
        let label = label_of(trace, position);

        for (s, v) in trace.step_values(step, combo)? {
            self.assignment(s, v)?;
        }

        let mut header = false;
        for (s, v) in trace.step_values(step, inputs)? {
            if !header {
                writeln!(self.out, "  -> Input: {label} <-")?;
                header = true;
            }
            self.assignment(s, v)?;
        }

        if trace.is_loopback(step)? {
            writeln!(self.out, "  -- Loop starts here")?;
        }
        writeln!(self.out, "  -> State: {label} <-")?;
        for (s, v) in trace.step_values(step, states)? {
            self.assignment(s, v)?;
        }
        Ok(())
    }
}

/// Writes the listing of `trace` restricted to the profile's step range.
pub fn print_plain<W: Write>(out: &mut W, trace: &Trace, profile: &ListingProfile) -> Result<()> {
    writeln!(out, "Trace Description: {}", trace.description())?;
    writeln!(out, "Trace Type: {}", trace.trace_type())?;

    let steps = trace.length() + 1;
    let from = profile.from.unwrap_or(1).max(1);
    let to = profile.to.unwrap_or(steps).min(steps);

    let mut printer = Printer {
        out,
        trace,
        profile,
        last_shown: HashMap::new(),
    };
    for (k, step) in trace.steps().enumerate() {
        let position = k + 1;
        if (from..=to).contains(&position) {
            printer.step(step, position)?;
        }
    }
    Ok(())
}

/// Writes a single state (with its incoming inputs).
pub fn print_state<W: Write>(
    out: &mut W,
    trace: &Trace,
    step: StepId,
    profile: &ListingProfile,
) -> Result<()> {
    let position = trace.step_index(step)?;
    let mut printer = Printer {
        out,
        trace,
        profile,
        last_shown: HashMap::new(),
    };
    printer.step(step, position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelFile;

    const SRC: &str = r#"{
        "type": "counterexample",
        "symbols": [
            { "name": "x", "category": "state_var" },
            { "name": "_aux", "category": "state_var" },
            { "name": "go", "category": "input_var" },
            { "name": "d", "category": "state_define" }
        ],
        "steps": [
            { "x": "0", "_aux": "0", "d": "0" },
            { "x": "1", "_aux": "0", "go": "1", "d": "1" },
            { "x": "0", "_aux": "0", "go": "0", "d": "0" }
        ]
    }"#;

    fn render(profile: &ListingProfile) -> String {
        let trace = ModelFile::from_json(SRC).unwrap().build().unwrap();
        let mut buf = Vec::new();
        print_plain(&mut buf, &trace, profile).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn plain_listing_marks_loops() {
        let text = render(&ListingProfile::default());
        let expected = "\
Trace Description: <generic trace>
Trace Type: Counterexample
  -- Loop starts here
  -> State: 1.1 <-
    x = 0
    _aux = 0
  -> Input: 1.2 <-
    go = 1
  -> State: 1.2 <-
    x = 1
    _aux = 0
  -> Input: 1.3 <-
    go = 0
  -> State: 1.3 <-
    x = 0
    _aux = 0
";
        assert_eq!(text, expected);
    }

    #[test]
    fn profile_controls_defines_hiding_and_range() {
        let profile = ListingProfile {
            show_defines: true,
            hiding_prefix: Some("_".into()),
            changes_only: true,
            from: Some(2),
            ..ListingProfile::default()
        };
        let text = render(&profile);
        assert!(!text.contains("State: 1.1"));
        assert!(!text.contains("_aux"));
        assert!(text.contains("    d = 1\n"));
        // x changes at every step, d too, so both are listed at step 3
        assert!(text.ends_with("  -> State: 1.3 <-\n    x = 0\n    d = 0\n"));
    }

    #[test]
    fn labels_resolve_from_both_ends() {
        let trace = ModelFile::from_json(SRC).unwrap().build().unwrap();
        let last = resolve_label(&trace, "1.-1".parse().unwrap()).unwrap();
        assert_eq!(last, trace.last_step());
        let first = resolve_label(&trace, "1.1".parse().unwrap()).unwrap();
        assert_eq!(first, trace.first_step());
        assert!(resolve_label(&trace, "1.9".parse().unwrap()).is_err());
        let err = resolve_label(&trace, "7.3".parse().unwrap()).unwrap_err();
        assert!(err.to_string().contains("names trace 7"));
        assert_eq!(label_of(&trace, 3).to_string(), "1.3");
        assert_eq!(loopback_positions(&trace), vec![1]);
    }
}
