//! Frames: the frozen frame, per-step variable frames and define frames.
//!
//! Steps and define frames live in two arenas owned by the trace and refer to
//! each other by index. Each step owns one define frame (`fwd`) and aliases
//! its predecessor's (`bwd`), so a single define frame is reachable from two
//! adjacent steps:
//!
//! ```text
//!   step k                 step k+1
//!   fwd ──► DefineFrame ◄── bwd
//!           S, I, SI defines of step k
//!           N, SN, IN, SIN defines of the transition k -> k+1
//! ```

use crate::section::Section;
use crate::storage::SectionStorage;
use std::fmt;

/// Handle of a step within one trace.
///
/// Handles are only meaningful for the trace that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(pub(crate) usize);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step#{}", self.0)
    }
}

/// Index of a define frame in the trace's define arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct DefineId(pub(crate) usize);

/// Values of the frozen variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct FrozenFrame {
    pub(crate) vars: SectionStorage,
}

impl FrozenFrame {
    pub(crate) fn new(n_frozen: usize) -> Self {
        Self {
            vars: SectionStorage::allocate(n_frozen),
        }
    }
}

/// One node of the temporal chain.
#[derive(Clone, Debug)]
pub(crate) struct StepFrame {
    pub(crate) prev: Option<StepId>,
    pub(crate) next: Option<StepId>,
    pub(crate) state: SectionStorage,
    pub(crate) input: SectionStorage,
    pub(crate) fwd: DefineId,
    pub(crate) bwd: Option<DefineId>,
}

impl StepFrame {
    pub(crate) fn new(n_state: usize, n_input: usize, fwd: DefineId) -> Self {
        Self {
            prev: None,
            next: None,
            state: SectionStorage::allocate(n_state),
            input: SectionStorage::allocate(n_input),
            fwd,
            bwd: None,
        }
    }
}

const N_DEFINE_SECTIONS: usize = 7;

/// Up to seven lazily materialized define sections.
#[derive(Clone, Debug, Default)]
pub(crate) struct DefineFrame {
    sections: [Option<SectionStorage>; N_DEFINE_SECTIONS],
}

impl DefineFrame {
    fn slot(section: Section) -> usize {
        debug_assert!(section.is_define(), "{section} is not a define section");
        section.index() - Section::StateDefine.index()
    }

    pub(crate) fn get(&self, section: Section) -> Option<&SectionStorage> {
        self.sections[Self::slot(section)].as_ref()
    }

    /// Section storage, allocated with `n` slots on first access.
    pub(crate) fn materialize(&mut self, section: Section, n: usize) -> &mut SectionStorage {
        self.sections[Self::slot(section)].get_or_insert_with(|| SectionStorage::allocate(n))
    }

    pub(crate) fn replace(&mut self, section: Section, storage: SectionStorage) {
        self.sections[Self::slot(section)] = Some(storage);
    }

    /// Materialized sections with their storage.
    pub(crate) fn materialized(&self) -> impl Iterator<Item = (Section, &SectionStorage)> + '_ {
        Section::ALL
            .into_iter()
            .filter(|s| s.is_define())
            .filter_map(move |s| self.get(s).map(|st| (s, st)))
    }
}
