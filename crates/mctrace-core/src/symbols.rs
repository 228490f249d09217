//! Symbol-table and type-checker collaborators.
//!
//! A trace never interprets symbols itself. At construction it asks a
//! [`SymbolTable`] to categorize every candidate symbol, to name its layer and
//! to tell encoding bits and array-typed defines apart; on every write it asks
//! the table's [`TypeChecker`] whether the implied `symbol = value` (or
//! `symbol in value`) expression is well formed.
//!
//! [`ModelSymbolTable`] is a small in-memory implementation of both traits.

use crate::types::{SymbCategory, Symbol, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Layer class whose layers hold artifacts (e.g. tableau auxiliaries) that
/// never belong to a trace language.
pub const ARTIFACTS_LAYERS_CLASS: &str = "artifacts";

/// Expression submitted to the type checker for a single assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Expr {
    /// `symbol = value`
    Equal(Symbol, Value),
    /// `symbol in value` (set-valued assignment)
    SetIn(Symbol, Value),
}

impl Expr {
    /// Symbol on the left-hand side.
    #[inline]
    #[must_use]
    pub const fn symbol(&self) -> Symbol {
        match *self {
            Self::Equal(s, _) | Self::SetIn(s, _) => s,
        }
    }

    /// Value on the right-hand side.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> Value {
        match *self {
            Self::Equal(_, v) | Self::SetIn(_, v) => v,
        }
    }
}

/// Well-formedness oracle.
pub trait TypeChecker {
    /// Returns `true` iff `expr` type checks.
    fn is_well_formed(&self, expr: &Expr) -> bool;
}

/// Symbol table as seen by a trace.
pub trait SymbolTable: fmt::Debug {
    /// Category of `symbol` ([`SymbCategory::Invalid`] if unknown).
    fn category(&self, symbol: Symbol) -> SymbCategory;

    /// Name of the layer `symbol` was declared in.
    fn layer_of(&self, symbol: Symbol) -> Option<&str>;

    /// Whether `layer` is registered in layer class `class`.
    fn is_layer_in_class(&self, layer: &str, class: &str) -> bool;

    /// Whether `symbol` is an encoding-only sub-bit of some variable.
    fn is_encoding_bit(&self, symbol: Symbol) -> bool;

    /// Whether `symbol` has array type.
    fn is_array(&self, symbol: Symbol) -> bool;

    /// Whether `value` denotes a set (assignments become memberships).
    fn is_set_value(&self, value: Value) -> bool;

    /// Type checker bound to this table.
    fn type_checker(&self) -> &dyn TypeChecker;

    /// Private copy of the table, used by non-volatile traces.
    fn duplicate(&self) -> Rc<dyn SymbolTable>;

    /// Printable name of `symbol`, if known.
    fn symbol_name(&self, symbol: Symbol) -> Option<&str>;

    /// Printable name of `value`, if known.
    fn value_name(&self, value: Value) -> Option<&str>;
}

/// Declaration of one symbol in a [`ModelSymbolTable`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SymbolDecl {
    /// Category of the symbol.
    pub category: SymbCategory,
    /// Layer the symbol lives in.
    #[serde(default = "default_layer")]
    pub layer: String,
    /// Array-typed symbol.
    #[serde(default)]
    pub is_array: bool,
    /// Encoding-only sub-bit.
    #[serde(default)]
    pub is_bit: bool,
    /// Admissible values (`None` accepts any scalar value).
    #[serde(default)]
    pub domain: Option<Vec<String>>,
}

fn default_layer() -> String {
    "model".to_owned()
}

impl SymbolDecl {
    /// Declaration in the default `model` layer, scalar, unrestricted domain.
    #[must_use]
    pub fn new(category: SymbCategory) -> Self {
        Self {
            category,
            layer: default_layer(),
            is_array: false,
            is_bit: false,
            domain: None,
        }
    }

    /// Place the symbol in `layer`.
    #[must_use]
    pub fn in_layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = layer.into();
        self
    }

    /// Restrict admissible values.
    #[must_use]
    pub fn with_domain<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domain = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Mark as array typed.
    #[must_use]
    pub const fn array(mut self) -> Self {
        self.is_array = true;
        self
    }

    /// Mark as encoding bit.
    #[must_use]
    pub const fn bit(mut self) -> Self {
        self.is_bit = true;
        self
    }
}

/// Errors raised while populating a [`ModelSymbolTable`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeclareError {
    /// A symbol with this name already exists.
    #[error("symbol '{0}' is already declared")]
    Duplicate(String),
    /// Category `Invalid` cannot be declared.
    #[error("symbol '{0}' cannot be declared with the invalid category")]
    InvalidCategory(String),
}

#[derive(Clone, Debug)]
struct SymbolEntry {
    name: String,
    category: SymbCategory,
    layer: String,
    is_array: bool,
    is_bit: bool,
    domain: Option<BTreeSet<Value>>,
}

#[derive(Clone, Debug)]
struct ValueEntry {
    name: String,
    is_set: bool,
}

/// In-memory symbol table with interned symbol and value names.
#[derive(Clone, Debug, Default)]
pub struct ModelSymbolTable {
    symbols: Vec<SymbolEntry>,
    symbol_ids: HashMap<String, Symbol>,
    values: Vec<ValueEntry>,
    value_ids: HashMap<String, Value>,
    layer_classes: HashMap<String, BTreeSet<String>>,
}

impl ModelSymbolTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name`, returning its handle.
    pub fn declare(&mut self, name: &str, decl: SymbolDecl) -> Result<Symbol, DeclareError> {
        if self.symbol_ids.contains_key(name) {
            return Err(DeclareError::Duplicate(name.to_owned()));
        }
        if decl.category == SymbCategory::Invalid {
            return Err(DeclareError::InvalidCategory(name.to_owned()));
        }
        let domain = decl
            .domain
            .map(|vs| vs.iter().map(|v| self.intern_value(v)).collect());
        let id = Symbol(u32::try_from(self.symbols.len()).unwrap_or(u32::MAX));
        self.symbols.push(SymbolEntry {
            name: name.to_owned(),
            category: decl.category,
            layer: decl.layer,
            is_array: decl.is_array,
            is_bit: decl.is_bit,
            domain,
        });
        self.symbol_ids.insert(name.to_owned(), id);
        Ok(id)
    }

    /// Handle of a declared symbol.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.symbol_ids.get(name).copied()
    }

    /// All declared symbols in declaration order.
    pub fn declared(&self) -> impl Iterator<Item = Symbol> + '_ {
        (0..self.symbols.len()).map(|i| Symbol(u32::try_from(i).unwrap_or(u32::MAX)))
    }

    /// Intern a scalar value by name.
    pub fn intern_value(&mut self, name: &str) -> Value {
        self.intern(name, false)
    }

    /// Intern a set value by name (e.g. `{1, 2}`).
    pub fn intern_set_value(&mut self, name: &str) -> Value {
        self.intern(name, true)
    }

    /// Handle of an already interned value.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<Value> {
        self.value_ids.get(name).copied()
    }

    /// Register `layer` in layer class `class`.
    pub fn add_layer_to_class(&mut self, layer: &str, class: &str) {
        self.layer_classes
            .entry(class.to_owned())
            .or_default()
            .insert(layer.to_owned());
    }

    fn intern(&mut self, name: &str, is_set: bool) -> Value {
        if let Some(v) = self.value_ids.get(name) {
            return *v;
        }
        let id = Value(u32::try_from(self.values.len()).unwrap_or(u32::MAX));
        self.values.push(ValueEntry { name: name.to_owned(), is_set });
        self.value_ids.insert(name.to_owned(), id);
        id
    }

    fn entry(&self, symbol: Symbol) -> Option<&SymbolEntry> {
        self.symbols.get(symbol.index())
    }
}

impl TypeChecker for ModelSymbolTable {
    fn is_well_formed(&self, expr: &Expr) -> bool {
        let Some(entry) = self.entry(expr.symbol()) else {
            return false;
        };
        let Some(value) = self.values.get(expr.value().index()) else {
            return false;
        };
        match expr {
            Expr::Equal(_, v) => {
                !value.is_set && entry.domain.as_ref().map_or(true, |d| d.contains(v))
            }
            Expr::SetIn(..) => value.is_set,
        }
    }
}

impl SymbolTable for ModelSymbolTable {
    fn category(&self, symbol: Symbol) -> SymbCategory {
        self.entry(symbol)
            .map_or(SymbCategory::Invalid, |e| e.category)
    }

    fn layer_of(&self, symbol: Symbol) -> Option<&str> {
        self.entry(symbol).map(|e| e.layer.as_str())
    }

    fn is_layer_in_class(&self, layer: &str, class: &str) -> bool {
        self.layer_classes
            .get(class)
            .is_some_and(|layers| layers.contains(layer))
    }

    fn is_encoding_bit(&self, symbol: Symbol) -> bool {
        self.entry(symbol).is_some_and(|e| e.is_bit)
    }

    fn is_array(&self, symbol: Symbol) -> bool {
        self.entry(symbol).is_some_and(|e| e.is_array)
    }

    fn is_set_value(&self, value: Value) -> bool {
        self.values.get(value.index()).is_some_and(|v| v.is_set)
    }

    fn type_checker(&self) -> &dyn TypeChecker {
        self
    }

    fn duplicate(&self) -> Rc<dyn SymbolTable> {
        Rc::new(self.clone())
    }

    fn symbol_name(&self, symbol: Symbol) -> Option<&str> {
        self.entry(symbol).map(|e| e.name.as_str())
    }

    fn value_name(&self, value: Value) -> Option<&str> {
        self.values.get(value.index()).map(|v| v.name.as_str())
    }
}
