//! Iteration protocols over a trace.
//!
//! - [`Steps`]: the temporal chain, in both directions.
//! - [`StepValues`]: assigned `(symbol, value)` pairs at one step, section by
//!   section.
//! - [`SymbolsIter`]: declared language symbols of selected sections.

use crate::frame::StepId;
use crate::lookup::LookupIndex;
use crate::section::{Section, SectionMask};
use crate::trace::Trace;
use mctrace_core::{Symbol, Value};
use std::iter::FusedIterator;

/// Steps of a trace, first to last (or back to front with `.rev()`).
#[derive(Clone, Debug)]
pub struct Steps<'a> {
    trace: &'a Trace,
    front: Option<StepId>,
    back: Option<StepId>,
    remaining: usize,
}

impl<'a> Steps<'a> {
    pub(crate) fn new(trace: &'a Trace) -> Self {
        Self {
            trace,
            front: Some(trace.first_step()),
            back: Some(trace.last_step()),
            remaining: trace.length() + 1,
        }
    }
}

impl Iterator for Steps<'_> {
    type Item = StepId;

    fn next(&mut self) -> Option<StepId> {
        if self.remaining == 0 {
            return None;
        }
        let step = self.front?;
        self.remaining -= 1;
        self.front = self.trace.next_step(step);
        Some(step)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for Steps<'_> {
    fn next_back(&mut self) -> Option<StepId> {
        if self.remaining == 0 {
            return None;
        }
        let step = self.back?;
        self.remaining -= 1;
        self.back = self.trace.prev_step(step);
        Some(step)
    }
}

impl ExactSizeIterator for Steps<'_> {}
impl FusedIterator for Steps<'_> {}

/// Assigned values of the selected sections at one step.
///
/// Sections are visited in storage order; within a section, symbols in
/// offset order. Sections that were never materialized at this step yield
/// nothing.
#[derive(Clone, Debug)]
pub struct StepValues<'a> {
    trace: &'a Trace,
    step: StepId,
    mask: SectionMask,
    cursor: usize,
    offset: usize,
}

impl<'a> StepValues<'a> {
    pub(crate) const fn new(trace: &'a Trace, step: StepId, mask: SectionMask) -> Self {
        Self {
            trace,
            step,
            mask,
            cursor: 0,
            offset: 0,
        }
    }
}

impl Iterator for StepValues<'_> {
    type Item = (Symbol, Value);

    fn next(&mut self) -> Option<(Symbol, Value)> {
        while let Some(&section) = Section::ALL.get(self.cursor) {
            if self.mask.contains(section) {
                if let Some(storage) = self.trace.section_storage(self.step, section) {
                    while self.offset < storage.len() {
                        let offset = self.offset;
                        self.offset += 1;
                        if let (Some(value), Some(symbol)) = (
                            storage.read(offset),
                            self.trace.lookup().symbol_at(section, offset),
                        ) {
                            return Some((symbol, value));
                        }
                    }
                }
            }
            self.cursor += 1;
            self.offset = 0;
        }
        None
    }
}

impl FusedIterator for StepValues<'_> {}

/// Language symbols of the selected sections, in section then offset order.
#[derive(Clone, Debug)]
pub struct SymbolsIter<'a> {
    index: &'a LookupIndex,
    mask: SectionMask,
    cursor: usize,
    offset: usize,
}

impl<'a> SymbolsIter<'a> {
    pub(crate) const fn new(index: &'a LookupIndex, mask: SectionMask) -> Self {
        Self {
            index,
            mask,
            cursor: 0,
            offset: 0,
        }
    }
}

impl Iterator for SymbolsIter<'_> {
    type Item = Symbol;

    fn next(&mut self) -> Option<Symbol> {
        while let Some(&section) = Section::ALL.get(self.cursor) {
            if self.mask.contains(section) {
                if let Some(symbol) = self.index.symbol_at(section, self.offset) {
                    self.offset += 1;
                    return Some(symbol);
                }
            }
            self.cursor += 1;
            self.offset = 0;
        }
        None
    }
}

impl FusedIterator for SymbolsIter<'_> {}
