//! Trace sections and iteration masks.
//!
//! A section is the storage class of a symbol: the three variable kinds plus
//! the seven define buckets. Each section has a bit in [`SectionMask`]; the
//! bit of section `i` is `1 << (i + 1)` so that the named masks keep their
//! traditional values (`S_VARS = 0x4`, `COMBINATORIAL = 0x7c0`, ...).

use mctrace_core::SymbCategory;
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Storage class of a symbol within a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    /// Frozen variables (one value for the whole trace).
    FrozenVar,
    /// State variables.
    StateVar,
    /// Input variables.
    InputVar,
    /// Defines over state variables (and constants).
    StateDefine,
    /// Defines over input variables.
    InputDefine,
    /// Defines over state and input variables.
    StateInputDefine,
    /// Defines over next-state variables.
    NextDefine,
    /// Defines over state and next-state variables.
    StateNextDefine,
    /// Defines over input and next-state variables.
    InputNextDefine,
    /// Defines over state, input and next-state variables.
    StateInputNextDefine,
}

impl Section {
    /// Number of sections.
    pub const COUNT: usize = 10;

    /// All sections in storage order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::FrozenVar,
        Self::StateVar,
        Self::InputVar,
        Self::StateDefine,
        Self::InputDefine,
        Self::StateInputDefine,
        Self::NextDefine,
        Self::StateNextDefine,
        Self::InputNextDefine,
        Self::StateInputNextDefine,
    ];

    /// Position in [`Section::ALL`].
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Mask bit of this section.
    #[inline]
    #[must_use]
    pub const fn bit(self) -> u32 {
        1 << (self as u32 + 1)
    }

    /// Section a symbol of `category` is stored in. Constants live with the
    /// state defines; `Invalid` has no section.
    #[must_use]
    pub const fn of_category(category: SymbCategory) -> Option<Self> {
        Some(match category {
            SymbCategory::FrozenVar => Self::FrozenVar,
            SymbCategory::StateVar => Self::StateVar,
            SymbCategory::InputVar => Self::InputVar,
            SymbCategory::Constant | SymbCategory::StateDefine => Self::StateDefine,
            SymbCategory::InputDefine => Self::InputDefine,
            SymbCategory::StateInputDefine => Self::StateInputDefine,
            SymbCategory::NextDefine => Self::NextDefine,
            SymbCategory::StateNextDefine => Self::StateNextDefine,
            SymbCategory::InputNextDefine => Self::InputNextDefine,
            SymbCategory::StateInputNextDefine => Self::StateInputNextDefine,
            SymbCategory::Invalid => return None,
        })
    }

    /// Category reported for symbols stored in this section.
    #[must_use]
    pub const fn category(self) -> SymbCategory {
        match self {
            Self::FrozenVar => SymbCategory::FrozenVar,
            Self::StateVar => SymbCategory::StateVar,
            Self::InputVar => SymbCategory::InputVar,
            Self::StateDefine => SymbCategory::StateDefine,
            Self::InputDefine => SymbCategory::InputDefine,
            Self::StateInputDefine => SymbCategory::StateInputDefine,
            Self::NextDefine => SymbCategory::NextDefine,
            Self::StateNextDefine => SymbCategory::StateNextDefine,
            Self::InputNextDefine => SymbCategory::InputNextDefine,
            Self::StateInputNextDefine => SymbCategory::StateInputNextDefine,
        }
    }

    /// Frozen, state or input variable section.
    #[inline]
    #[must_use]
    pub const fn is_var(self) -> bool {
        matches!(self, Self::FrozenVar | Self::StateVar | Self::InputVar)
    }

    /// One of the seven define buckets.
    #[inline]
    #[must_use]
    pub const fn is_define(self) -> bool {
        !self.is_var()
    }

    /// Define bucket stored in the step's own (forward) define frame.
    #[inline]
    #[must_use]
    pub const fn is_forward_define(self) -> bool {
        matches!(
            self,
            Self::StateDefine | Self::InputDefine | Self::StateInputDefine
        )
    }

    /// Define bucket spanning the incoming transition, read through the
    /// step's backward define frame.
    #[inline]
    #[must_use]
    pub const fn is_transition_define(self) -> bool {
        matches!(
            self,
            Self::NextDefine
                | Self::StateNextDefine
                | Self::InputNextDefine
                | Self::StateInputNextDefine
        )
    }

    /// Short name used in logs and listings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FrozenVar => "frozen variables",
            Self::StateVar => "state variables",
            Self::InputVar => "input variables",
            Self::StateDefine => "state defines",
            Self::InputDefine => "input defines",
            Self::StateInputDefine => "state-input defines",
            Self::NextDefine => "next defines",
            Self::StateNextDefine => "state-next defines",
            Self::InputNextDefine => "input-next defines",
            Self::StateInputNextDefine => "state-input-next defines",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of sections selected for iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SectionMask(u32);

impl SectionMask {
    /// No section.
    pub const NONE: Self = Self(0);
    /// Frozen variables.
    pub const F_VARS: Self = Self(0x2);
    /// State variables.
    pub const S_VARS: Self = Self(0x4);
    /// Input variables.
    pub const I_VARS: Self = Self(0x8);
    /// State and frozen variables.
    pub const SF_VARS: Self = Self(0x6);
    /// Every variable section.
    pub const ALL_VARS: Self = Self(0xe);
    /// State defines.
    pub const S_DEFINES: Self = Self(0x10);
    /// Input defines.
    pub const I_DEFINES: Self = Self(0x20);
    /// State-input defines.
    pub const SI_DEFINES: Self = Self(0x40);
    /// Next defines.
    pub const N_DEFINES: Self = Self(0x80);
    /// State-next defines.
    pub const SN_DEFINES: Self = Self(0x100);
    /// Input-next defines.
    pub const IN_DEFINES: Self = Self(0x200);
    /// State-input-next defines.
    pub const SIN_DEFINES: Self = Self(0x400);
    /// Frozen and state variables plus state defines.
    pub const SF_SYMBOLS: Self = Self(0x16);
    /// State variables plus state defines.
    pub const S_SYMBOLS: Self = Self(0x14);
    /// Input variables plus input defines.
    pub const I_SYMBOLS: Self = Self(0x28);
    /// Defines involving both ends of a transition.
    pub const COMBINATORIAL: Self = Self(0x7c0);
    /// Defines involving inputs or next-state variables.
    pub const TRANSITIONAL: Self = Self(0x7e0);
    /// Every section.
    pub const ALL: Self = Self(0x7fe);

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Mask of a single section.
    #[inline]
    #[must_use]
    pub const fn of(section: Section) -> Self {
        Self(section.bit())
    }

    /// Whether `section` is selected.
    #[inline]
    #[must_use]
    pub const fn contains(self, section: Section) -> bool {
        self.0 & section.bit() != 0
    }

    /// Whether no section is selected.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 & Self::ALL.0 == 0
    }

    /// Selected sections in storage order.
    pub fn sections(self) -> impl Iterator<Item = Section> {
        Section::ALL.into_iter().filter(move |s| self.contains(*s))
    }
}

impl BitOr for SectionMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SectionMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for SectionMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl From<Section> for SectionMask {
    fn from(section: Section) -> Self {
        Self::of(section)
    }
}
