//! Canonical core types used across the mctrace workspace.
//!
//! These live in `mctrace-core` and are re-exported at the crate root so other
//! crates can import via `mctrace_core::Symbol`, `mctrace_core::TraceType`, etc.
//!
//! Symbols and values are *opaque handles*: equality is handle identity, and
//! only the symbol table knows what a handle denotes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle of a declared symbol (variable, define or constant).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(pub u32);

impl Symbol {
    /// Raw index of the handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque handle of a symbolic value assigned to a symbol.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Value(pub u32);

impl Value {
    /// Raw index of the handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Category a symbol table assigns to a symbol.
///
/// Defines are bucketed by which of the {state, input, next-state} contexts
/// their free variables span.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SymbCategory {
    /// Time-invariant variable.
    FrozenVar,
    /// State variable.
    StateVar,
    /// Input variable.
    InputVar,
    /// Constant (stored with the state defines).
    Constant,
    /// Define over state variables only.
    StateDefine,
    /// Define over input variables only.
    InputDefine,
    /// Define over state and input variables.
    StateInputDefine,
    /// Define over next-state variables only.
    NextDefine,
    /// Define over state and next-state variables.
    StateNextDefine,
    /// Define over input and next-state variables.
    InputNextDefine,
    /// Define over state, input and next-state variables.
    StateInputNextDefine,
    /// Not a symbol of the table.
    Invalid,
}

impl SymbCategory {
    /// Whether the category denotes a variable (frozen, state or input).
    #[inline]
    #[must_use]
    pub const fn is_var(self) -> bool {
        matches!(self, Self::FrozenVar | Self::StateVar | Self::InputVar)
    }

    /// Whether the category denotes one of the define buckets.
    #[inline]
    #[must_use]
    pub const fn is_define(self) -> bool {
        matches!(
            self,
            Self::StateDefine
                | Self::InputDefine
                | Self::StateInputDefine
                | Self::NextDefine
                | Self::StateNextDefine
                | Self::InputNextDefine
                | Self::StateInputNextDefine
        )
    }

    /// Human-readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FrozenVar => "frozen variable",
            Self::StateVar => "state variable",
            Self::InputVar => "input variable",
            Self::Constant => "constant",
            Self::StateDefine => "state define",
            Self::InputDefine => "input define",
            Self::StateInputDefine => "state-input define",
            Self::NextDefine => "next define",
            Self::StateNextDefine => "state-next define",
            Self::InputNextDefine => "input-next define",
            Self::StateInputNextDefine => "state-input-next define",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for SymbCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of run a trace records.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TraceType {
    /// Reserved; no specific kind.
    #[default]
    Unspecified,
    /// Counterexample to a property (loopbacks meaningful).
    Counterexample,
    /// Simulation run (loopbacks have no semantics).
    Simulation,
    /// Execution of a trace against a model.
    Execution,
}

impl TraceType {
    /// Display name used by listings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "Unspecified",
            Self::Counterexample => "Counterexample",
            Self::Simulation => "Simulation",
            Self::Execution => "Execution",
        }
    }
}

impl fmt::Display for TraceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
