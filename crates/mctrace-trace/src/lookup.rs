//! Trace language and lookup index.
//!
//! The language is computed once from a candidate symbol list by asking the
//! symbol table about every symbol. The resulting [`LookupIndex`] maps each
//! symbol to `(section, offset)`, keeps the per-section buckets used for
//! reverse lookup, and remembers each symbol's layer.

use crate::error::{TraceError, TraceResult};
use crate::section::Section;
use mctrace_core::{SymbCategory, Symbol, SymbolTable, ARTIFACTS_LAYERS_CLASS};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Rules deciding which candidate symbols enter a trace language.
///
/// Encoding bits and array-typed symbols are always excluded; symbols whose
/// layer belongs to the artifact layer class are excluded as well.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LanguageFilter {
    artifacts_class: String,
}

impl Default for LanguageFilter {
    fn default() -> Self {
        Self {
            artifacts_class: ARTIFACTS_LAYERS_CLASS.to_owned(),
        }
    }
}

impl LanguageFilter {
    /// Filter using `class` as the artifact layer class.
    #[must_use]
    pub fn with_artifacts_class(class: impl Into<String>) -> Self {
        Self {
            artifacts_class: class.into(),
        }
    }

    /// Layer class whose layers are excluded.
    #[must_use]
    pub fn artifacts_class(&self) -> &str {
        &self.artifacts_class
    }

    /// Section of `symbol` if it belongs in a trace language.
    pub fn admit(&self, table: &dyn SymbolTable, symbol: Symbol) -> TraceResult<Option<Section>> {
        if table.is_encoding_bit(symbol) || table.is_array(symbol) {
            return Ok(None);
        }
        let category = table.category(symbol);
        let section =
            Section::of_category(category).ok_or(TraceError::InvalidSymbol { symbol })?;
        if table
            .layer_of(symbol)
            .is_some_and(|layer| table.is_layer_in_class(layer, &self.artifacts_class))
        {
            return Ok(None);
        }
        Ok(Some(section))
    }
}

/// Symbol to `(section, offset)` maps plus the ordered language.
#[derive(Clone, Debug, Default)]
pub(crate) struct LookupIndex {
    language: Vec<Symbol>,
    s_vars: Vec<Symbol>,
    sf_vars: Vec<Symbol>,
    i_vars: Vec<Symbol>,
    buckets: [Vec<Symbol>; Section::COUNT],
    slots: HashMap<Symbol, (Section, usize)>,
    layers: HashMap<Symbol, String>,
}

impl LookupIndex {
    /// Filter `candidates` through `table` and index the survivors.
    pub(crate) fn build(
        table: &dyn SymbolTable,
        candidates: &[Symbol],
        filter: &LanguageFilter,
    ) -> TraceResult<Self> {
        let mut index = Self::default();
        for &symbol in candidates {
            let Some(section) = filter.admit(table, symbol)? else {
                debug!(%symbol, "symbol excluded from trace language");
                continue;
            };
            if index.slots.contains_key(&symbol) {
                debug!(%symbol, "duplicate candidate ignored");
                continue;
            }
            let bucket = &mut index.buckets[section.index()];
            index.slots.insert(symbol, (section, bucket.len()));
            bucket.push(symbol);
            if let Some(layer) = table.layer_of(symbol) {
                index.layers.insert(symbol, layer.to_owned());
            }
            index.language.push(symbol);
            debug!(%symbol, %section, "symbol added to trace language");
        }

        if index.language.is_empty() {
            warn!("trace has empty language");
        }

        for &symbol in &index.language {
            match table.category(symbol) {
                SymbCategory::StateVar => {
                    index.s_vars.push(symbol);
                    index.sf_vars.push(symbol);
                }
                SymbCategory::FrozenVar => index.sf_vars.push(symbol),
                SymbCategory::InputVar => index.i_vars.push(symbol),
                _ => {}
            }
        }
        Ok(index)
    }

    pub(crate) fn slot(&self, symbol: Symbol) -> Option<(Section, usize)> {
        self.slots.get(&symbol).copied()
    }

    pub(crate) fn contains(&self, symbol: Symbol) -> bool {
        self.slots.contains_key(&symbol)
    }

    pub(crate) fn bucket(&self, section: Section) -> &[Symbol] {
        &self.buckets[section.index()]
    }

    pub(crate) fn section_len(&self, section: Section) -> usize {
        self.buckets[section.index()].len()
    }

    /// Symbol stored at `offset` of `section`.
    pub(crate) fn symbol_at(&self, section: Section, offset: usize) -> Option<Symbol> {
        self.buckets[section.index()].get(offset).copied()
    }

    pub(crate) fn language(&self) -> &[Symbol] {
        &self.language
    }

    pub(crate) fn s_vars(&self) -> &[Symbol] {
        &self.s_vars
    }

    pub(crate) fn sf_vars(&self) -> &[Symbol] {
        &self.sf_vars
    }

    pub(crate) fn i_vars(&self) -> &[Symbol] {
        &self.i_vars
    }

    pub(crate) fn layer_of(&self, symbol: Symbol) -> Option<&str> {
        self.layers.get(&symbol).map(String::as_str)
    }

    /// Same symbols, regardless of order.
    pub(crate) fn same_language(&self, other: &Self) -> bool {
        // equal cardinality makes one-way inclusion sufficient
        self.language.len() == other.language.len()
            && self.language.iter().all(|s| other.contains(*s))
    }

    /// Same symbols at the same offsets.
    pub(crate) fn same_layout(&self, other: &Self) -> bool {
        self.buckets == other.buckets
    }

    /// Logs the bucket of every section.
    pub(crate) fn log_alloc_stats(&self, table: &dyn SymbolTable) {
        for section in Section::ALL {
            let names: Vec<&str> = self
                .bucket(section)
                .iter()
                .map(|s| table.symbol_name(*s).unwrap_or("?"))
                .collect();
            debug!(
                %section,
                count = names.len(),
                symbols = %names.join(" "),
                "trace allocation"
            );
        }
    }
}
