//! TOML listing profiles.
//!
//! ```toml
//! show_defines = true
//! show_defines_with_next = false
//! hiding_prefix = "__"
//! changes_only = false
//! from = 2
//! to = 5
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Options of the plain listing. Every field is optional in the file.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ListingProfile {
    /// Print defines next to variables.
    pub show_defines: bool,
    /// With `show_defines`, also print defines over next-state variables.
    pub show_defines_with_next: bool,
    /// Hide symbols whose name starts with this prefix.
    pub hiding_prefix: Option<String>,
    /// Only print assignments whose value changed since last printed.
    pub changes_only: bool,
    /// First 1-based step to print.
    pub from: Option<usize>,
    /// Last 1-based step to print.
    pub to: Option<usize>,
}

impl ListingProfile {
    /// Parse a profile from TOML text.
    pub fn from_toml(src: &str) -> Result<Self> {
        toml::from_str(src).context("parse listing profile")
    }

    /// Read a profile file.
    pub fn load(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("read profile {}", path.display()))?;
        Self::from_toml(&src).with_context(|| format!("in {}", path.display()))
    }

    /// Whether `name` is hidden by the prefix rule.
    #[must_use]
    pub fn hides(&self, name: &str) -> bool {
        self.hiding_prefix
            .as_deref()
            .is_some_and(|p| !p.is_empty() && name.starts_with(p))
    }
}
