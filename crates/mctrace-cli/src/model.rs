//! JSON model descriptions.
//!
//! A description declares the symbols of a model (what a model compiler
//! would hand to the trace store) and, optionally, the assignments of one
//! run:
//!
//! ```json
//! {
//!   "description": "AG !(x = 1)",
//!   "type": "counterexample",
//!   "artifact_layers": ["tableau"],
//!   "symbols": [
//!     { "name": "x", "category": "state_var", "domain": ["0", "1"] },
//!     { "name": "go", "category": "input_var" }
//!   ],
//!   "steps": [ { "x": "0" }, { "go": "1", "x": "1" } ],
//!   "loopbacks": [1]
//! }
//! ```
//!
//! Values starting with `{` are interned as set values.

use anyhow::{bail, Context, Result};
use mctrace_core::{ModelSymbolTable, SymbolDecl, TraceType, ARTIFACTS_LAYERS_CLASS};
use mctrace_trace::Trace;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;
use tracing::{info, warn};

/// One declared symbol.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct NamedDecl {
    /// Symbol name.
    pub name: String,
    /// Declaration details.
    #[serde(flatten)]
    pub decl: SymbolDecl,
}

/// A parsed model description.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct ModelFile {
    /// Trace description.
    #[serde(default)]
    pub description: Option<String>,
    /// Kind of run.
    #[serde(rename = "type", default)]
    pub trace_type: TraceType,
    /// Registration id of the trace (trace number in listings).
    #[serde(default)]
    pub id: Option<u32>,
    /// Layers registered in the artifact layer class.
    #[serde(default)]
    pub artifact_layers: Vec<String>,
    /// Declared symbols, in candidate order.
    pub symbols: Vec<NamedDecl>,
    /// Assignments, one map per step.
    #[serde(default)]
    pub steps: Vec<BTreeMap<String, String>>,
    /// 1-based steps to mark as loopbacks after freezing.
    #[serde(default)]
    pub loopbacks: Vec<usize>,
}

impl ModelFile {
    /// Parse a description from JSON text.
    pub fn from_json(src: &str) -> Result<Self> {
        serde_json::from_str(src).context("parse model description")
    }

    /// Read and parse a description file.
    pub fn load(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("read model {}", path.display()))?;
        Self::from_json(&src).with_context(|| format!("in {}", path.display()))
    }

    /// Symbol table holding the declared symbols and every value used by
    /// the steps.
    pub fn symbol_table(&self) -> Result<ModelSymbolTable> {
        let mut st = ModelSymbolTable::new();
        for sym in &self.symbols {
            st.declare(&sym.name, sym.decl.clone())
                .with_context(|| format!("declare '{}'", sym.name))?;
        }
        for layer in &self.artifact_layers {
            st.add_layer_to_class(layer, ARTIFACTS_LAYERS_CLASS);
        }
        for value in self.steps.iter().flat_map(BTreeMap::values) {
            if value.starts_with('{') {
                st.intern_set_value(value);
            } else {
                st.intern_value(value);
            }
        }
        Ok(st)
    }

    /// Build the trace: declare, assign every step, then freeze.
    pub fn build(&self) -> Result<Trace> {
        let st = self.symbol_table()?;
        let candidates: Vec<_> = st.declared().collect();
        let table = Rc::new(st);
        let mut trace = Trace::create(
            table.clone(),
            self.description.as_deref(),
            self.trace_type,
            &candidates,
            true,
        )
        .context("create trace")?;

        for (k, assignments) in self.steps.iter().enumerate() {
            let step = if k == 0 {
                trace.first_step()
            } else {
                trace.append_step()?
            };
            for (name, value) in assignments {
                let Some(symbol) = table.lookup(name) else {
                    bail!("step {}: unknown symbol '{name}'", k + 1);
                };
                let Some(value) = table.value(value) else {
                    bail!("step {}: unknown value '{value}'", k + 1);
                };
                if !trace.in_language(symbol) {
                    warn!(step = k + 1, symbol = %name, "not in the trace language, skipped");
                    continue;
                }
                let well_typed = trace
                    .put_value(step, symbol, value)
                    .with_context(|| format!("step {}: assign '{name}'", k + 1))?;
                if !well_typed {
                    warn!(step = k + 1, symbol = %name, "ill-typed assignment");
                }
            }
        }

        trace.freeze();
        for &position in &self.loopbacks {
            let step = trace
                .ith_step(position)
                .with_context(|| format!("loopback at step {position}"))?;
            trace.force_loopback(step)?;
        }
        if let Some(id) = self.id {
            trace.register(id)?;
        }

        info!(
            symbols = trace.symbols().len(),
            length = trace.length(),
            "trace built"
        );
        Ok(trace)
    }
}
