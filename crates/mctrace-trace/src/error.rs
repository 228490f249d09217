//! Error type for trace operations.
//!
//! Every variant is a violated precondition: the trace refuses the operation
//! and leaves its contents untouched. Soft validation (type-checker verdicts,
//! completeness gaps) is never reported through this type.

use crate::section::Section;
use mctrace_core::{Symbol, Value};
use thiserror::Error;

/// Failure of a trace operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TraceError {
    /// Read or category query for a symbol outside the trace language.
    #[error("symbol {symbol} is not in the trace language")]
    NotInLanguage {
        /// Offending symbol.
        symbol: Symbol,
    },

    /// Two traces are defined over different languages.
    #[error("trace languages differ")]
    LanguageMismatch,

    /// A slot already holds a different value.
    #[error("conflicting assignment for {symbol}: holds {existing}, got {attempted}")]
    ConflictingAssignment {
        /// Symbol owning the slot.
        symbol: Symbol,
        /// Value already stored.
        existing: Value,
        /// Value that was rejected.
        attempted: Value,
    },

    /// Variable sections are read-only while the trace is frozen.
    #[error("cannot write to the {section} section of a frozen trace")]
    FrozenSection {
        /// Section that was targeted.
        section: Section,
    },

    /// Operation requires a frozen trace.
    #[error("trace is not frozen")]
    NotFrozen,

    /// Operation requires a thawed trace.
    #[error("trace is frozen")]
    Frozen,

    /// Operation requires an unregistered trace.
    #[error("trace is registered (id = {id})")]
    Registered {
        /// Registration id of the trace.
        id: u32,
    },

    /// Transition sections do not exist at the first step.
    #[error("the {section} section has no incoming transition at the first step")]
    NoIncomingTransition {
        /// Section that was targeted.
        section: Section,
    },

    /// Step position outside `1..=len+1`.
    #[error("step {index} is out of range (trace has {steps} steps)")]
    StepOutOfRange {
        /// Requested 1-based position.
        index: usize,
        /// Number of steps in the trace.
        steps: usize,
    },

    /// Step handle does not belong to this trace.
    #[error("step handle {0} does not belong to this trace")]
    UnknownStep(usize),

    /// The symbol table reported an invalid category for a candidate symbol.
    #[error("symbol {symbol} has an invalid category")]
    InvalidSymbol {
        /// Offending symbol.
        symbol: Symbol,
    },

    /// The registration id is reserved.
    #[error("trace id {id} is reserved")]
    ReservedId {
        /// Rejected id.
        id: u32,
    },
}

/// Convenience alias used throughout the crate.
pub type TraceResult<T> = Result<T, TraceError>;
