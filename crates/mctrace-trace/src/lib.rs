//! In-memory execution traces for model checkers.
//!
//! A [`Trace`] records a run of a finite-state transition system: a chain of
//! steps, each holding the values of state and input variables, plus the
//! values of derived defines and of time-invariant (frozen) variables.
//!
//! - `section`: the ten storage classes of a symbol and the iteration masks.
//! - `storage`: single-assignment value arrays, one per section.
//! - `frame`: step frames and the define frames shared by adjacent steps.
//! - `lookup`: language selection and symbol to `(section, offset)` index.
//! - `trace`: lifecycle, assignment, copy/concat, freeze and loopbacks.
//! - `iter`: step, step-content and symbol iterators.
//!
//! ```rust
//! use mctrace_core::prelude::*;
//! use mctrace_trace::{SectionMask, Trace};
//! use std::rc::Rc;
//!
//! let mut st = ModelSymbolTable::new();
//! let x = st.declare("x", SymbolDecl::new(SymbCategory::StateVar)).unwrap();
//! let one = st.intern_value("1");
//! let mut trace = Trace::create(Rc::new(st), None, TraceType::Counterexample, &[x], true).unwrap();
//! let s = trace.first_step();
//! assert!(trace.put_value(s, x, one).unwrap());
//! let values: Vec<_> = trace.step_values(s, SectionMask::S_VARS).unwrap().collect();
//! assert_eq!(values, vec![(x, one)]);
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

/// Error type and result alias.
pub mod error;
/// Step frames, define frames and the frozen frame.
mod frame;
/// Step, step-content and symbol iterators.
pub mod iter;
/// Language filtering and the symbol lookup index.
pub mod lookup;
/// Sections and section masks.
pub mod section;
/// Sectioned single-assignment storage.
pub mod storage;
/// The trace itself.
pub mod trace;

pub use error::{TraceError, TraceResult};
pub use frame::StepId;
pub use iter::{StepValues, Steps, SymbolsIter};
pub use lookup::LanguageFilter;
pub use section::{Section, SectionMask};
pub use trace::{Completeness, Gap, Trace, DEFAULT_DESCRIPTION, RESERVED_TRACE_ID};
