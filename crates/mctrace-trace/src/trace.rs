//! The trace: construction, assignment, copy/concat, freeze and loopbacks.

use crate::error::{TraceError, TraceResult};
use crate::frame::{DefineFrame, DefineId, FrozenFrame, StepFrame, StepId};
use crate::iter::{StepValues, Steps, SymbolsIter};
use crate::lookup::{LanguageFilter, LookupIndex};
use crate::section::{Section, SectionMask};
use crate::storage::{SectionStorage, SlotConflict};
use mctrace_core::{Expr, SymbCategory, Symbol, SymbolTable, TraceType, Value};
use std::rc::Rc;
use tracing::{debug, warn};

/// Description given to traces created without one.
pub const DEFAULT_DESCRIPTION: &str = "<generic trace>";

/// Id that can never be used to register a trace.
pub const RESERVED_TRACE_ID: u32 = u32::MAX;

#[derive(Clone, Debug, PartialEq, Eq)]
enum TraceState {
    Thawed,
    /// One cached loopback flag per step arena entry.
    Frozen { loopbacks: Vec<bool> },
}

/// A gap found by [`Trace::is_complete_vars`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gap {
    /// The symbol is not in the trace language.
    NotInLanguage(Symbol),
    /// The symbol is in the language but is not a variable.
    NotAVariable(Symbol),
    /// No value at the given 1-based step.
    Unassigned {
        /// 1-based step position.
        step: usize,
        /// Unassigned variable.
        symbol: Symbol,
    },
}

/// Result of a completeness check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Completeness {
    gaps: Vec<Gap>,
}

impl Completeness {
    /// No gap was found.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.gaps.is_empty()
    }

    /// Gaps in step order.
    #[must_use]
    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }
}

/// Execution trace of a transition system.
///
/// A trace of length `n` has `n + 1` steps. Steps are addressed with
/// [`StepId`] handles obtained from [`first_step`](Self::first_step),
/// [`append_step`](Self::append_step), [`ith_step`](Self::ith_step) or the
/// [`steps`](Self::steps) iterator.
#[derive(Debug)]
pub struct Trace {
    table: Rc<dyn SymbolTable>,
    volatile: bool,
    index: Rc<LookupIndex>,
    frozen_frame: FrozenFrame,
    steps: Vec<StepFrame>,
    defines: Vec<DefineFrame>,
    first: StepId,
    last: StepId,
    length: usize,
    trace_type: TraceType,
    description: String,
    id: Option<u32>,
    state: TraceState,
}

impl Trace {
    /// Creates an empty trace over the language selected from `candidates`.
    ///
    /// With `volatile` the trace shares `table`; otherwise it keeps a private
    /// duplicate. Fails with [`TraceError::InvalidSymbol`] when the table
    /// cannot categorize a candidate.
    pub fn create(
        table: Rc<dyn SymbolTable>,
        description: Option<&str>,
        trace_type: TraceType,
        candidates: &[Symbol],
        volatile: bool,
    ) -> TraceResult<Self> {
        Self::create_filtered(
            table,
            description,
            trace_type,
            candidates,
            volatile,
            &LanguageFilter::default(),
        )
    }

    /// Like [`create`](Self::create) with an explicit language filter.
    pub fn create_filtered(
        table: Rc<dyn SymbolTable>,
        description: Option<&str>,
        trace_type: TraceType,
        candidates: &[Symbol],
        volatile: bool,
        filter: &LanguageFilter,
    ) -> TraceResult<Self> {
        let table = if volatile { table } else { table.duplicate() };
        let index = LookupIndex::build(table.as_ref(), candidates, filter)?;
        index.log_alloc_stats(table.as_ref());
        Ok(Self::with_index(
            table,
            volatile,
            Rc::new(index),
            trace_type,
            description.unwrap_or(DEFAULT_DESCRIPTION).to_owned(),
        ))
    }

    fn with_index(
        table: Rc<dyn SymbolTable>,
        volatile: bool,
        index: Rc<LookupIndex>,
        trace_type: TraceType,
        description: String,
    ) -> Self {
        let frozen_frame = FrozenFrame::new(index.section_len(Section::FrozenVar));
        let mut trace = Self {
            table,
            volatile,
            index,
            frozen_frame,
            steps: Vec::new(),
            defines: Vec::new(),
            first: StepId(0),
            last: StepId(0),
            length: 0,
            trace_type,
            description,
            id: None,
            state: TraceState::Thawed,
        };
        let fwd = trace.new_define_frame();
        let first = trace.new_step_frame(fwd);
        trace.first = first;
        trace.last = first;
        trace
    }

    fn new_define_frame(&mut self) -> DefineId {
        self.defines.push(DefineFrame::default());
        DefineId(self.defines.len() - 1)
    }

    fn new_step_frame(&mut self, fwd: DefineId) -> StepId {
        self.steps.push(StepFrame::new(
            self.index.section_len(Section::StateVar),
            self.index.section_len(Section::InputVar),
            fwd,
        ));
        StepId(self.steps.len() - 1)
    }

    fn frame(&self, step: StepId) -> TraceResult<&StepFrame> {
        self.steps.get(step.0).ok_or(TraceError::UnknownStep(step.0))
    }

    fn ensure_thawed(&self) -> TraceResult<()> {
        match self.state {
            TraceState::Thawed => Ok(()),
            TraceState::Frozen { .. } => Err(TraceError::Frozen),
        }
    }

    // ---- metadata --------------------------------------------------------

    /// Number of transitions (steps minus one).
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Replace the description; `None` restores the default.
    pub fn set_description(&mut self, description: Option<&str>) {
        self.description = description.unwrap_or(DEFAULT_DESCRIPTION).to_owned();
    }

    /// Kind of run recorded.
    #[must_use]
    pub const fn trace_type(&self) -> TraceType {
        self.trace_type
    }

    /// Change the kind of run recorded.
    pub fn set_trace_type(&mut self, trace_type: TraceType) {
        self.trace_type = trace_type;
    }

    /// Whether the symbol table is shared with the creator.
    #[must_use]
    pub const fn is_volatile(&self) -> bool {
        self.volatile
    }

    /// Symbol table this trace consults.
    #[must_use]
    pub fn symbol_table(&self) -> &Rc<dyn SymbolTable> {
        &self.table
    }

    /// Record the id under which an external manager keeps this trace.
    pub fn register(&mut self, id: u32) -> TraceResult<()> {
        if id == RESERVED_TRACE_ID {
            return Err(TraceError::ReservedId { id });
        }
        debug!(id, "trace is now registered");
        self.id = Some(id);
        Ok(())
    }

    /// Forget the registration id.
    pub fn unregister(&mut self) {
        debug!(id = ?self.id, "trace is now unregistered");
        self.id = None;
    }

    /// Whether the trace carries a registration id.
    #[must_use]
    pub const fn is_registered(&self) -> bool {
        self.id.is_some()
    }

    /// Registration id, if registered.
    #[must_use]
    pub const fn id(&self) -> Option<u32> {
        self.id
    }

    // ---- language ---------------------------------------------------------

    /// Language in construction order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        self.index.language()
    }

    /// State variables of the language.
    #[must_use]
    pub fn state_vars(&self) -> &[Symbol] {
        self.index.s_vars()
    }

    /// State and frozen variables of the language.
    #[must_use]
    pub fn state_frozen_vars(&self) -> &[Symbol] {
        self.index.sf_vars()
    }

    /// Input variables of the language.
    #[must_use]
    pub fn input_vars(&self) -> &[Symbol] {
        self.index.i_vars()
    }

    /// Whether `symbol` belongs to the language.
    #[must_use]
    pub fn in_language(&self, symbol: Symbol) -> bool {
        self.index.contains(symbol)
    }

    /// Whether every symbol of `symbols` belongs to the language.
    #[must_use]
    pub fn covers_language(&self, symbols: &[Symbol]) -> bool {
        symbols.iter().all(|s| self.index.contains(*s))
    }

    /// Layer `symbol` was declared in, if it is in the language.
    #[must_use]
    pub fn layer_of(&self, symbol: Symbol) -> Option<&str> {
        self.index.layer_of(symbol)
    }

    /// Category of a language symbol as seen by the trace.
    ///
    /// Constants report [`SymbCategory::StateDefine`], the section they are
    /// stored in.
    pub fn symbol_category(&self, symbol: Symbol) -> TraceResult<SymbCategory> {
        self.index
            .slot(symbol)
            .map(|(section, _)| section.category())
            .ok_or(TraceError::NotInLanguage { symbol })
    }

    // ---- steps --------------------------------------------------------------

    /// First step (the initial state).
    #[must_use]
    pub const fn first_step(&self) -> StepId {
        self.first
    }

    /// Last step.
    #[must_use]
    pub const fn last_step(&self) -> StepId {
        self.last
    }

    /// Successor of `step`.
    #[must_use]
    pub fn next_step(&self, step: StepId) -> Option<StepId> {
        self.steps.get(step.0).and_then(|f| f.next)
    }

    /// Predecessor of `step`.
    #[must_use]
    pub fn prev_step(&self, step: StepId) -> Option<StepId> {
        self.steps.get(step.0).and_then(|f| f.prev)
    }

    /// All steps, first to last.
    #[must_use]
    pub fn steps(&self) -> Steps<'_> {
        Steps::new(self)
    }

    /// Step at 1-based position `i` in `1..=length+1`.
    ///
    /// Walks from whichever end of the chain is closer.
    pub fn ith_step(&self, i: usize) -> TraceResult<StepId> {
        let steps = self.length + 1;
        if i == 0 || i > steps {
            return Err(TraceError::StepOutOfRange { index: i, steps });
        }
        Ok(self.walk_to(i).0)
    }

    /// Step at position `i` and the number of links followed to reach it.
    fn walk_to(&self, i: usize) -> (StepId, usize) {
        let forward = i - 1;
        let backward = self.length + 1 - i;
        let (mut cur, hops, toward_head) = if forward <= backward {
            (self.first, forward, false)
        } else {
            (self.last, backward, true)
        };
        for _ in 0..hops {
            let link = if toward_head {
                self.steps[cur.0].prev
            } else {
                self.steps[cur.0].next
            };
            match link {
                Some(s) => cur = s,
                None => break,
            }
        }
        (cur, hops)
    }

    /// 1-based position of `step`.
    pub fn step_index(&self, step: StepId) -> TraceResult<usize> {
        let mut cur = self.frame(step)?;
        let mut index = 1;
        while let Some(prev) = cur.prev {
            index += 1;
            cur = &self.steps[prev.0];
        }
        Ok(index)
    }

    /// Appends a step after the last one and returns it.
    ///
    /// The new step's backward define frame is the old last step's forward
    /// frame.
    pub fn append_step(&mut self) -> TraceResult<StepId> {
        self.ensure_thawed()?;
        let fwd = self.new_define_frame();
        let step = self.new_step_frame(fwd);
        let last = self.last;
        let bwd = self.steps[last.0].fwd;
        self.steps[last.0].next = Some(step);
        let frame = &mut self.steps[step.0];
        frame.prev = Some(last);
        frame.bwd = Some(bwd);
        self.last = step;
        self.length += 1;
        Ok(step)
    }

    // ---- values ---------------------------------------------------------------

    /// Storage of `section` at `step`, if materialized.
    pub(crate) fn section_storage(&self, step: StepId, section: Section) -> Option<&SectionStorage> {
        let frame = self.steps.get(step.0)?;
        match section {
            Section::FrozenVar => Some(&self.frozen_frame.vars),
            Section::StateVar => Some(&frame.state),
            Section::InputVar => Some(&frame.input),
            s if s.is_forward_define() => self.defines[frame.fwd.0].get(s),
            s => frame.bwd.and_then(|d| self.defines[d.0].get(s)),
        }
    }

    /// Storage of `section` at `step`, materializing define sections.
    fn section_storage_mut(
        &mut self,
        step: StepId,
        section: Section,
    ) -> TraceResult<&mut SectionStorage> {
        let n = self.index.section_len(section);
        let frame = self
            .steps
            .get_mut(step.0)
            .ok_or(TraceError::UnknownStep(step.0))?;
        match section {
            Section::FrozenVar => Ok(&mut self.frozen_frame.vars),
            Section::StateVar => Ok(&mut frame.state),
            Section::InputVar => Ok(&mut frame.input),
            s => {
                let id = if s.is_forward_define() {
                    frame.fwd
                } else {
                    frame
                        .bwd
                        .ok_or(TraceError::NoIncomingTransition { section: s })?
                };
                Ok(self.defines[id.0].materialize(s, n))
            }
        }
    }

    fn conflict_error(&self, section: Section, conflict: SlotConflict) -> TraceError {
        self.index
            .symbol_at(section, conflict.offset)
            .map_or(TraceError::LanguageMismatch, |symbol| {
                TraceError::ConflictingAssignment {
                    symbol,
                    existing: conflict.existing,
                    attempted: conflict.attempted,
                }
            })
    }

    /// Assigns `value` to `symbol` at `step`.
    ///
    /// Symbols outside the language are ignored (`Ok(false)`). Otherwise the
    /// value is stored and the result is the type checker's verdict on
    /// `symbol = value` (or `symbol in value` for set values); an ill-typed
    /// assignment is still stored.
    pub fn put_value(&mut self, step: StepId, symbol: Symbol, value: Value) -> TraceResult<bool> {
        let Some((section, offset)) = self.index.slot(symbol) else {
            return Ok(false);
        };
        self.frame(step)?;
        if section.is_var() && !matches!(self.state, TraceState::Thawed) {
            return Err(TraceError::FrozenSection { section });
        }
        if let Err(conflict) = self.section_storage_mut(step, section)?.write(offset, value) {
            return Err(self.conflict_error(section, conflict));
        }

        let expr = if self.table.is_set_value(value) {
            Expr::SetIn(symbol, value)
        } else {
            Expr::Equal(symbol, value)
        };
        let well_formed = self.table.type_checker().is_well_formed(&expr);
        if !well_formed {
            debug!(?expr, "suspicious assignment");
        }
        Ok(well_formed)
    }

    /// Value of `symbol` at `step` (`None` when unassigned).
    ///
    /// Frozen variables have one value for the whole trace. Transition
    /// defines are unassigned at the first step.
    pub fn get_value(&self, step: StepId, symbol: Symbol) -> TraceResult<Option<Value>> {
        let (section, offset) = self
            .index
            .slot(symbol)
            .ok_or(TraceError::NotInLanguage { symbol })?;
        self.frame(step)?;
        Ok(self
            .section_storage(step, section)
            .and_then(|s| s.read(offset)))
    }

    /// Whether `symbol` has a value at `step`.
    pub fn is_assigned(&self, step: StepId, symbol: Symbol) -> TraceResult<bool> {
        self.get_value(step, symbol).map(|v| v.is_some())
    }

    /// Assigned `(symbol, value)` pairs of the sections in `mask` at `step`.
    pub fn step_values(&self, step: StepId, mask: SectionMask) -> TraceResult<StepValues<'_>> {
        self.frame(step)?;
        Ok(StepValues::new(self, step, mask))
    }

    /// Language symbols of the sections in `mask`.
    #[must_use]
    pub fn symbols_iter(&self, mask: SectionMask) -> SymbolsIter<'_> {
        SymbolsIter::new(&self.index, mask)
    }

    pub(crate) fn lookup(&self) -> &LookupIndex {
        &self.index
    }

    // ---- whole-trace predicates ---------------------------------------------

    /// No transition and nothing assigned to frozen/state symbols at the
    /// first step.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
            && StepValues::new(self, self.first, SectionMask::SF_SYMBOLS)
                .next()
                .is_none()
    }

    fn value_in(&self, step: StepId, section: Section, symbol: Symbol) -> Option<Value> {
        let (_, offset) = self.index.slot(symbol)?;
        self.section_storage(step, section)?.read(offset)
    }

    fn same_values(&self, step: StepId, other: &Self, other_step: StepId, section: Section) -> bool {
        self.index
            .bucket(section)
            .iter()
            .all(|s| self.value_in(step, section, *s) == other.value_in(other_step, section, *s))
    }

    /// Same length, language, frozen values, and per-step state and input
    /// values and loopback flags.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.length != other.length || !self.index.same_language(&other.index) {
            return false;
        }
        if !self.same_values(self.first, other, other.first, Section::FrozenVar) {
            return false;
        }
        self.steps().zip(other.steps()).all(|(a, b)| {
            self.same_values(a, other, b, Section::InputVar)
                && self.same_values(a, other, b, Section::StateVar)
                && self.is_loopback(a).ok() == other.is_loopback(b).ok()
        })
    }

    /// Checks that every variable of `vars` is assigned at every step.
    ///
    /// Input variables are not required at the first step. With `report`
    /// each gap is also logged.
    #[must_use]
    pub fn is_complete_vars(&self, vars: &[Symbol], report: bool) -> Completeness {
        let mut gaps = Vec::new();
        let mut checked = Vec::with_capacity(vars.len());
        for &symbol in vars {
            match self.index.slot(symbol) {
                None => gaps.push(Gap::NotInLanguage(symbol)),
                Some((section, _)) if !section.is_var() => gaps.push(Gap::NotAVariable(symbol)),
                Some((section, _)) => checked.push((symbol, section)),
            }
        }

        for (position, step) in self.steps().enumerate() {
            for &(symbol, section) in &checked {
                let skip = match section {
                    Section::InputVar => step == self.first,
                    // one value for all steps, checked once
                    Section::FrozenVar => step != self.first,
                    _ => false,
                };
                if !skip && self.value_in(step, section, symbol).is_none() {
                    gaps.push(Gap::Unassigned {
                        step: position + 1,
                        symbol,
                    });
                }
            }
        }

        if report {
            for gap in &gaps {
                match gap {
                    Gap::NotInLanguage(s) => {
                        warn!(symbol = %self.display_symbol(*s), "variable does not belong to trace language");
                    }
                    Gap::NotAVariable(s) => {
                        warn!(symbol = %self.display_symbol(*s), "symbol is not a variable");
                    }
                    Gap::Unassigned { step, symbol } => {
                        warn!(step, symbol = %self.display_symbol(*symbol), "trace is missing a value for variable");
                    }
                }
            }
        }
        Completeness { gaps }
    }

    fn display_symbol(&self, symbol: Symbol) -> String {
        self.table
            .symbol_name(symbol)
            .map_or_else(|| symbol.to_string(), str::to_owned)
    }

    // ---- freeze / loopback ------------------------------------------------------

    /// Whether loopback flags are cached and variables are read-only.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        matches!(self.state, TraceState::Frozen { .. })
    }

    /// Whether the trace accepts new steps and variable assignments.
    #[must_use]
    pub const fn is_thawed(&self) -> bool {
        matches!(self.state, TraceState::Thawed)
    }

    /// Caches loopback flags and makes variables read-only. Freezing a frozen
    /// trace keeps its flags.
    pub fn freeze(&mut self) {
        if self.is_thawed() {
            let loopbacks = (0..self.steps.len())
                .map(|i| StepId(i) != self.last && self.test_loopback(StepId(i)))
                .collect();
            self.state = TraceState::Frozen { loopbacks };
            debug!(id = ?self.id, "trace is now frozen");
        }
    }

    /// Installs `loopbacks` as the cached flags.
    fn freeze_with(&mut self, loopbacks: Vec<bool>) {
        self.state = TraceState::Frozen { loopbacks };
        debug!(id = ?self.id, "trace is now frozen");
    }

    /// Drops cached loopback flags.
    pub fn thaw(&mut self) {
        if self.is_frozen() {
            debug!(id = ?self.id, "trace is now thawed");
        }
        self.state = TraceState::Thawed;
    }

    /// Whether the state at `step` equals the state at the last step.
    fn test_loopback(&self, step: StepId) -> bool {
        self.steps[step.0].state == self.steps[self.last.0].state
    }

    /// Whether `step` starts a loop closing at the last step.
    ///
    /// Always false for the last step and for simulations. A frozen trace
    /// answers from its cached flags.
    pub fn is_loopback(&self, step: StepId) -> TraceResult<bool> {
        self.frame(step)?;
        if self.trace_type == TraceType::Simulation || step == self.last {
            return Ok(false);
        }
        Ok(match &self.state {
            TraceState::Thawed => self.test_loopback(step),
            TraceState::Frozen { loopbacks } => loopbacks.get(step.0).copied().unwrap_or(false),
        })
    }

    /// Marks `step` as a loopback of a frozen trace, warning when its state
    /// differs from the last one.
    pub fn force_loopback(&mut self, step: StepId) -> TraceResult<()> {
        self.frame(step)?;
        let agrees = self.test_loopback(step);
        let TraceState::Frozen { loopbacks } = &mut self.state else {
            return Err(TraceError::NotFrozen);
        };
        if !agrees {
            warn!(%step, "state is not a loopback state");
        }
        if let Some(flag) = loopbacks.get_mut(step.0) {
            *flag = true;
        }
        Ok(())
    }

    // ---- copy / concat --------------------------------------------------------------

    /// Copies the steps from the first up to and including `until`.
    ///
    /// The copy shares this trace's language. A frozen source yields a frozen
    /// copy carrying the source's loopback flags.
    pub fn copy(&self, until: StepId, volatile: bool) -> TraceResult<Self> {
        self.frame(until)?;
        let table = if volatile {
            Rc::clone(&self.table)
        } else {
            self.table.duplicate()
        };
        let mut dst = Self::with_index(
            table,
            volatile,
            Rc::clone(&self.index),
            self.trace_type,
            self.description.clone(),
        );
        dst.frozen_frame.vars.copy_from(&self.frozen_frame.vars);

        let mut pairs = Vec::with_capacity(self.steps.len());
        let (mut src, mut dst_step) = (self.first, dst.first);
        loop {
            for section in Section::ALL.into_iter().filter(|s| *s != Section::FrozenVar) {
                if let Some(storage) = self.section_storage(src, section) {
                    dst.section_storage_mut(dst_step, section)?.copy_from(storage);
                }
            }
            pairs.push((src, dst_step));
            match self.steps[src.0].next {
                Some(next) if src != until => {
                    src = next;
                    dst_step = dst.append_step()?;
                }
                _ => break,
            }
        }

        if let TraceState::Frozen { loopbacks } = &self.state {
            let mut copied = vec![false; dst.steps.len()];
            for (s, d) in pairs {
                copied[d.0] = loopbacks.get(s.0).copied().unwrap_or(false);
            }
            dst.freeze_with(copied);
        }
        dst.index.log_alloc_stats(dst.table.as_ref());
        Ok(dst)
    }

    /// Re-addresses every stored value from this trace's layout to `to`.
    fn relayout(&mut self, to: &Rc<LookupIndex>) -> TraceResult<()> {
        let from = Rc::clone(&self.index);
        let convert = |storage: &SectionStorage, section: Section| -> TraceResult<SectionStorage> {
            let mut out = SectionStorage::allocate(to.section_len(section));
            for (offset, value) in storage.assigned() {
                let symbol = from
                    .symbol_at(section, offset)
                    .ok_or(TraceError::LanguageMismatch)?;
                match to.slot(symbol) {
                    Some((s, o)) if s == section => {
                        out.write(o, value)
                            .map_err(|c| TraceError::ConflictingAssignment {
                                symbol,
                                existing: c.existing,
                                attempted: c.attempted,
                            })?;
                    }
                    _ => return Err(TraceError::LanguageMismatch),
                }
            }
            Ok(out)
        };

        self.frozen_frame.vars = convert(&self.frozen_frame.vars, Section::FrozenVar)?;
        for frame in &mut self.steps {
            frame.state = convert(&frame.state, Section::StateVar)?;
            frame.input = convert(&frame.input, Section::InputVar)?;
        }
        for frame in &mut self.defines {
            let converted = frame
                .materialized()
                .map(|(section, storage)| convert(storage, section).map(|s| (section, s)))
                .collect::<TraceResult<Vec<_>>>()?;
            for (section, storage) in converted {
                frame.replace(section, storage);
            }
        }
        self.index = Rc::clone(to);
        Ok(())
    }

    /// Appends `other` to this trace.
    ///
    /// The last step of `self` and the first step of `other` describe the
    /// same state: their values are merged, as are the frozen values. Any
    /// slot holding different values on both sides is an error. `other` must
    /// be unregistered and have the same language. The result is thawed.
    pub fn concat(mut self, mut other: Self) -> TraceResult<Self> {
        self.thaw();
        if !self.index.same_language(&other.index) {
            return Err(TraceError::LanguageMismatch);
        }
        if let Some(id) = other.id {
            return Err(TraceError::Registered { id });
        }
        if !Rc::ptr_eq(&self.index, &other.index) && !self.index.same_layout(&other.index) {
            other.relayout(&self.index)?;
        }

        let lhs = self.last;
        let rhs = other.first;
        let lhs_fwd = self.steps[lhs.0].fwd;
        let rhs_fwd = other.steps[rhs.0].fwd;

        // check every merge before touching anything
        let pairs = [
            (Section::FrozenVar, &self.frozen_frame.vars, &other.frozen_frame.vars),
            (Section::StateVar, &self.steps[lhs.0].state, &other.steps[rhs.0].state),
            (Section::InputVar, &self.steps[lhs.0].input, &other.steps[rhs.0].input),
        ];
        for (section, mine, theirs) in pairs {
            if let Some(c) = mine.first_conflict(theirs) {
                return Err(self.conflict_error(section, c));
            }
        }
        for (section, theirs) in other.defines[rhs_fwd.0].materialized() {
            if let Some(c) = self.defines[lhs_fwd.0]
                .get(section)
                .and_then(|mine| mine.first_conflict(theirs))
            {
                return Err(self.conflict_error(section, c));
            }
        }

        self.frozen_frame.vars.merge_from(&other.frozen_frame.vars);
        {
            let (mine, theirs) = (&mut self.steps[lhs.0], &other.steps[rhs.0]);
            mine.state.merge_from(&theirs.state);
            mine.input.merge_from(&theirs.input);
        }
        for (section, theirs) in other.defines[rhs_fwd.0].materialized() {
            let n = self.index.section_len(section);
            self.defines[lhs_fwd.0]
                .materialize(section, n)
                .merge_from(theirs);
        }

        // splice: other's first frame is replaced by self's last one
        let Self {
            steps: other_steps,
            defines: other_defines,
            length: other_length,
            ..
        } = other;

        let define_map: Vec<DefineId> = other_defines
            .into_iter()
            .enumerate()
            .map(|(i, frame)| {
                if i == rhs_fwd.0 {
                    lhs_fwd
                } else {
                    self.defines.push(frame);
                    DefineId(self.defines.len() - 1)
                }
            })
            .collect();

        let mut order = Vec::with_capacity(other_steps.len());
        let mut step_map = vec![lhs; other_steps.len()];
        let mut cur = other_steps[rhs.0].next;
        while let Some(s) = cur {
            step_map[s.0] = StepId(self.steps.len() + order.len());
            order.push(s);
            cur = other_steps[s.0].next;
        }

        let mut pool: Vec<Option<StepFrame>> = other_steps.into_iter().map(Some).collect();
        for s in &order {
            let Some(mut frame) = pool[s.0].take() else {
                continue;
            };
            frame.prev = frame.prev.map(|p| step_map[p.0]);
            frame.next = frame.next.map(|n| step_map[n.0]);
            frame.fwd = define_map[frame.fwd.0];
            frame.bwd = frame.bwd.map(|d| define_map[d.0]);
            self.steps.push(frame);
        }

        if let (Some(head), Some(tail)) = (order.first(), order.last()) {
            self.steps[lhs.0].next = Some(step_map[head.0]);
            self.last = step_map[tail.0];
        }
        self.length += other_length;
        debug!(length = self.length, "traces concatenated");
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mctrace_core::{ModelSymbolTable, SymbolDecl};

    struct Fixture {
        table: Rc<ModelSymbolTable>,
        x: Symbol,
        y: Symbol,
        i: Symbol,
        f: Symbol,
        sd: Symbol,
        nd: Symbol,
    }

    fn fixture() -> Fixture {
        let mut st = ModelSymbolTable::new();
        let x = st.declare("x", SymbolDecl::new(SymbCategory::StateVar)).unwrap();
        let y = st.declare("y", SymbolDecl::new(SymbCategory::StateVar)).unwrap();
        let i = st.declare("i", SymbolDecl::new(SymbCategory::InputVar)).unwrap();
        let f = st.declare("f", SymbolDecl::new(SymbCategory::FrozenVar)).unwrap();
        let sd = st.declare("sd", SymbolDecl::new(SymbCategory::StateDefine)).unwrap();
        let nd = st.declare("nd", SymbolDecl::new(SymbCategory::NextDefine)).unwrap();
        for v in 0..4 {
            st.intern_value(&v.to_string());
        }
        Fixture {
            table: Rc::new(st),
            x,
            y,
            i,
            f,
            sd,
            nd,
        }
    }

    impl Fixture {
        fn trace(&self, ty: TraceType) -> Trace {
            Trace::create(
                self.table.clone(),
                None,
                ty,
                &[self.x, self.y, self.i, self.f, self.sd, self.nd],
                true,
            )
            .unwrap()
        }
    }

    #[test]
    fn new_trace_has_one_blank_step() {
        let fx = fixture();
        let t = fx.trace(TraceType::Counterexample);
        assert_eq!(t.length(), 0);
        assert_eq!(t.first_step(), t.last_step());
        assert_eq!(t.description(), DEFAULT_DESCRIPTION);
        assert!(t.is_thawed());
        assert!(t.is_empty());
        assert!(!t.is_registered());
        assert_eq!(t.get_value(t.first_step(), fx.x), Ok(None));
    }

    #[test]
    fn backward_frame_aliases_predecessor_forward_frame() {
        let fx = fixture();
        let mut t = fx.trace(TraceType::Counterexample);
        let s1 = t.first_step();
        let s2 = t.append_step().unwrap();
        assert!(t.steps[s1.0].bwd.is_none());
        assert_eq!(t.steps[s2.0].bwd, Some(t.steps[s1.0].fwd));

        // a next define written through step 2 lives in step 1's own frame
        t.put_value(s2, fx.nd, Value(1)).unwrap();
        let fwd1 = t.steps[s1.0].fwd;
        assert_eq!(
            t.defines[fwd1.0].get(Section::NextDefine).and_then(|s| s.read(0)),
            Some(Value(1))
        );
    }

    #[test]
    fn transition_defines_need_a_predecessor() {
        let fx = fixture();
        let mut t = fx.trace(TraceType::Counterexample);
        let s1 = t.first_step();
        assert_eq!(
            t.put_value(s1, fx.nd, Value(0)),
            Err(TraceError::NoIncomingTransition {
                section: Section::NextDefine
            })
        );
        assert_eq!(t.get_value(s1, fx.nd), Ok(None));
    }

    #[test]
    fn single_assignment_and_language_misses() {
        let fx = fixture();
        let mut t = fx.trace(TraceType::Counterexample);
        let s = t.first_step();
        assert_eq!(t.put_value(s, fx.x, Value(1)), Ok(true));
        assert_eq!(t.put_value(s, fx.x, Value(1)), Ok(true));
        assert_eq!(
            t.put_value(s, fx.x, Value(2)),
            Err(TraceError::ConflictingAssignment {
                symbol: fx.x,
                existing: Value(1),
                attempted: Value(2)
            })
        );
        assert_eq!(t.put_value(s, Symbol(500), Value(0)), Ok(false));
        assert_eq!(
            t.get_value(s, Symbol(500)),
            Err(TraceError::NotInLanguage { symbol: Symbol(500) })
        );
    }

    #[test]
    fn frozen_trace_rejects_variable_writes_but_not_defines() {
        let fx = fixture();
        let mut t = fx.trace(TraceType::Counterexample);
        let s = t.first_step();
        t.freeze();
        assert_eq!(
            t.put_value(s, fx.x, Value(1)),
            Err(TraceError::FrozenSection {
                section: Section::StateVar
            })
        );
        assert_eq!(t.put_value(s, fx.sd, Value(1)), Ok(true));
        assert_eq!(t.append_step(), Err(TraceError::Frozen));
    }

    #[test]
    fn frozen_values_are_shared_by_all_steps() {
        let fx = fixture();
        let mut t = fx.trace(TraceType::Counterexample);
        let s2 = t.append_step().unwrap();
        t.put_value(s2, fx.f, Value(3)).unwrap();
        assert_eq!(t.get_value(t.first_step(), fx.f), Ok(Some(Value(3))));
    }

    #[test]
    fn ith_step_walks_from_the_nearer_end() {
        let fx = fixture();
        let mut t = fx.trace(TraceType::Counterexample);
        let mut ids = vec![t.first_step()];
        for _ in 0..9 {
            ids.push(t.append_step().unwrap());
        }
        for (k, id) in ids.iter().enumerate() {
            let i = k + 1;
            let (got, hops) = t.walk_to(i);
            assert_eq!(got, *id);
            assert!(hops <= t.length() / 2 + 1);
            assert_eq!(t.step_index(*id), Ok(i));
        }
        assert_eq!(t.walk_to(10).1, 0);
        assert!(matches!(t.ith_step(0), Err(TraceError::StepOutOfRange { .. })));
        assert!(matches!(t.ith_step(11), Err(TraceError::StepOutOfRange { .. })));
    }

    #[test]
    fn force_loopback_requires_frozen() {
        let fx = fixture();
        let mut t = fx.trace(TraceType::Counterexample);
        let s1 = t.first_step();
        t.put_value(s1, fx.x, Value(0)).unwrap();
        let s2 = t.append_step().unwrap();
        t.put_value(s2, fx.x, Value(1)).unwrap();
        assert_eq!(t.force_loopback(s1), Err(TraceError::NotFrozen));
        t.freeze();
        assert_eq!(t.is_loopback(s1), Ok(false));
        t.force_loopback(s1).unwrap();
        assert_eq!(t.is_loopback(s1), Ok(true));
        t.thaw();
        assert_eq!(t.is_loopback(s1), Ok(false));
    }

    #[test]
    fn simulations_have_no_loopbacks() {
        let fx = fixture();
        let mut t = fx.trace(TraceType::Simulation);
        let s1 = t.first_step();
        t.append_step().unwrap();
        assert_eq!(t.is_loopback(s1), Ok(false));
    }

    #[test]
    fn registration() {
        let fx = fixture();
        let mut t = fx.trace(TraceType::Execution);
        assert_eq!(
            t.register(RESERVED_TRACE_ID),
            Err(TraceError::ReservedId {
                id: RESERVED_TRACE_ID
            })
        );
        t.register(7).unwrap();
        assert_eq!(t.id(), Some(7));
        t.unregister();
        assert!(!t.is_registered());
    }

    #[test]
    fn copy_keeps_materialized_defines() {
        let fx = fixture();
        let mut t = fx.trace(TraceType::Counterexample);
        let s2 = t.append_step().unwrap();
        t.put_value(s2, fx.nd, Value(2)).unwrap();
        t.put_value(s2, fx.sd, Value(1)).unwrap();
        let c = t.copy(t.last_step(), false).unwrap();
        assert!(!c.is_volatile());
        let c2 = c.last_step();
        assert_eq!(c.get_value(c2, fx.nd), Ok(Some(Value(2))));
        assert_eq!(c.get_value(c2, fx.sd), Ok(Some(Value(1))));
        assert!(Rc::ptr_eq(&c.index, &t.index));
    }

    #[test]
    fn concat_relayouts_traces_built_in_another_order() {
        let fx = fixture();
        let mut a = Trace::create(fx.table.clone(), None, TraceType::Counterexample, &[fx.x, fx.y], true)
            .unwrap();
        let mut b = Trace::create(fx.table.clone(), None, TraceType::Counterexample, &[fx.y, fx.x], true)
            .unwrap();
        a.put_value(a.first_step(), fx.x, Value(1)).unwrap();
        let b1 = b.first_step();
        b.put_value(b1, fx.y, Value(0)).unwrap();
        let b2 = b.append_step().unwrap();
        b.put_value(b2, fx.x, Value(2)).unwrap();

        let t = a.concat(b).unwrap();
        assert_eq!(t.length(), 1);
        let s1 = t.first_step();
        assert_eq!(t.get_value(s1, fx.x), Ok(Some(Value(1))));
        assert_eq!(t.get_value(s1, fx.y), Ok(Some(Value(0))));
        assert_eq!(t.get_value(t.last_step(), fx.x), Ok(Some(Value(2))));
    }

    #[test]
    fn relayout_moves_values_and_defines_to_the_new_slots() {
        let fx = fixture();
        let target = fx.trace(TraceType::Counterexample);
        let mut t = Trace::create(
            fx.table.clone(),
            None,
            TraceType::Counterexample,
            &[fx.nd, fx.f, fx.y, fx.x, fx.sd, fx.i],
            true,
        )
        .unwrap();
        let s1 = t.first_step();
        t.put_value(s1, fx.y, Value(3)).unwrap();
        t.put_value(s1, fx.f, Value(1)).unwrap();
        t.put_value(s1, fx.sd, Value(2)).unwrap();
        let s2 = t.append_step().unwrap();
        t.put_value(s2, fx.x, Value(0)).unwrap();
        t.put_value(s2, fx.nd, Value(1)).unwrap();
        assert!(!t.index.same_layout(&target.index));

        t.relayout(&target.index).unwrap();
        assert!(Rc::ptr_eq(&t.index, &target.index));
        assert_eq!(t.get_value(s1, fx.y), Ok(Some(Value(3))));
        assert_eq!(t.get_value(s1, fx.x), Ok(None));
        assert_eq!(t.get_value(s2, fx.f), Ok(Some(Value(1))));
        assert_eq!(t.get_value(s1, fx.sd), Ok(Some(Value(2))));
        assert_eq!(t.get_value(s2, fx.x), Ok(Some(Value(0))));
        assert_eq!(t.get_value(s2, fx.nd), Ok(Some(Value(1))));
    }

    #[test]
    fn concat_rejects_registered_and_foreign_traces() {
        let fx = fixture();
        let a = fx.trace(TraceType::Counterexample);
        let mut b = fx.trace(TraceType::Counterexample);
        b.register(1).unwrap();
        assert_eq!(a.concat(b).unwrap_err(), TraceError::Registered { id: 1 });

        let a = fx.trace(TraceType::Counterexample);
        let c = Trace::create(fx.table.clone(), None, TraceType::Counterexample, &[fx.x], true)
            .unwrap();
        assert_eq!(a.concat(c).unwrap_err(), TraceError::LanguageMismatch);
    }

    #[test]
    fn concat_merges_frontier_defines_and_rebinds_backward_frame() {
        let fx = fixture();
        let mut a = fx.trace(TraceType::Counterexample);
        let a2 = a.append_step().unwrap();
        a.put_value(a2, fx.sd, Value(1)).unwrap();

        let mut b = fx.trace(TraceType::Counterexample);
        let b2 = b.append_step().unwrap();
        b.put_value(b2, fx.nd, Value(3)).unwrap();

        let t = a.concat(b).unwrap();
        assert_eq!(t.length(), 2);
        let joint = t.ith_step(2).unwrap();
        let after = t.ith_step(3).unwrap();
        assert_eq!(t.get_value(joint, fx.sd), Ok(Some(Value(1))));
        assert_eq!(t.get_value(after, fx.nd), Ok(Some(Value(3))));
        assert_eq!(t.steps[after.0].bwd, Some(t.steps[joint.0].fwd));
        assert_eq!(t.prev_step(after), Some(joint));
        assert_eq!(t.steps().count(), 3);
        assert_eq!(t.steps().rev().count(), 3);
    }

    #[test]
    fn completeness_reports_every_gap() {
        let fx = fixture();
        let mut t = fx.trace(TraceType::Counterexample);
        let s1 = t.first_step();
        t.put_value(s1, fx.x, Value(0)).unwrap();
        t.put_value(s1, fx.f, Value(0)).unwrap();
        let s2 = t.append_step().unwrap();
        t.put_value(s2, fx.x, Value(1)).unwrap();

        let ok = t.is_complete_vars(&[fx.x, fx.f], false);
        assert!(ok.is_complete());

        let gaps = t.is_complete_vars(&[fx.x, fx.i, fx.sd, Symbol(99)], true);
        assert_eq!(
            gaps.gaps(),
            &[
                Gap::NotAVariable(fx.sd),
                Gap::NotInLanguage(Symbol(99)),
                Gap::Unassigned {
                    step: 2,
                    symbol: fx.i
                },
            ]
        );
    }
}
