//! mctrace-core: the symbol-level vocabulary shared by the trace engine.
//!
//! This crate defines the **stable boundary** between a trace store and the
//! rest of a model checker:
//! - opaque handles for symbols and values (`Symbol`, `Value`),
//! - the categorization of symbols into variables and define buckets
//!   (`SymbCategory`) and the kind of a run (`TraceType`),
//! - the collaborator traits a trace consults at construction and on writes
//!   (`SymbolTable`, `TypeChecker`),
//! - an in-memory reference table (`ModelSymbolTable`) used by tests and the CLI,
//! - `TraceLabel`, the `trace.state` addressing used by commands.
//!
//! ```rust
//! use mctrace_core::prelude::*;
//!
//! let mut st = ModelSymbolTable::new();
//! let x = st.declare("x", SymbolDecl::new(SymbCategory::StateVar)).unwrap();
//! assert_eq!(st.category(x), SymbCategory::StateVar);
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Small, explicit allowlist to keep docs readable and APIs ergonomic.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

/// `trace.state` labels parsed from user input.
pub mod label;
/// Symbol-table and type-checker collaborator traits plus the in-memory table.
pub mod symbols;
/// Canonical handle and enum types shared across the workspace.
pub mod types;

// ---- Re-exports for workspace compatibility ----
pub use label::*;
pub use symbols::*;
pub use types::*;

/// Commonly-used items for quick imports.
///
/// ```rust
/// use mctrace_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::symbols::{
        Expr, ModelSymbolTable, SymbolDecl, SymbolTable, TypeChecker, ARTIFACTS_LAYERS_CLASS,
    };
    pub use crate::types::*;
}
