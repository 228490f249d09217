//! Library side of the `mctrace` command-line driver.
//!
//! - `model`: JSON model descriptions (symbols, layers, steps) turned into a
//!   symbol table and a populated [`mctrace_trace::Trace`].
//! - `profile`: TOML listing profiles.
//! - `listing`: the plain-text state/input listing.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(missing_docs, clippy::unwrap_used, clippy::expect_used)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Plain-text trace listing.
pub mod listing;
/// JSON model descriptions.
pub mod model;
/// TOML listing profiles.
pub mod profile;
