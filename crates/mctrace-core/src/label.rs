//! `trace.state` labels.
//!
//! Users address a state as `"N.M"` with 1-based numbers; internally both
//! components are 0-based. The state component may be negative (relative
//! addressing is resolved by the caller).

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A `(trace, state)` address, 0-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraceLabel {
    /// 0-based trace number (`-1` only for the textual trace `0`).
    pub trace: i32,
    /// 0-based state number.
    pub state: i32,
}

impl TraceLabel {
    /// Label from 0-based components.
    #[must_use]
    pub const fn new(trace: i32, state: i32) -> Self {
        Self { trace, state }
    }
}

/// Reasons a label string is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LabelError {
    /// Trace component missing, negative or out of range.
    #[error("invalid trace number in label '{0}'")]
    TraceNumber(String),
    /// The `.` separator is missing.
    #[error("missing '.' in label '{0}'")]
    MissingDot(String),
    /// State component missing or out of range.
    #[error("invalid state number in label '{0}'")]
    StateNumber(String),
    /// Garbage after the state number.
    #[error("unexpected trailing characters in label '{0}'")]
    Trailing(String),
}

/// Splits the leading (optionally signed) decimal integer off `s`.
fn split_int(s: &str) -> (&str, &str) {
    let bytes = s.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    s.split_at(end)
}

impl FromStr for TraceLabel {
    type Err = LabelError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (num, rest) = split_int(input.trim_start());
        let trace: i64 = num
            .parse()
            .map_err(|_| LabelError::TraceNumber(input.to_owned()))?;
        if trace < 0 || trace > i64::from(i32::MAX) {
            return Err(LabelError::TraceNumber(input.to_owned()));
        }

        let rest = rest
            .trim_start_matches(' ')
            .strip_prefix('.')
            .ok_or_else(|| LabelError::MissingDot(input.to_owned()))?;

        let (num, rest) = split_int(rest.trim_start());
        let state: i32 = num
            .parse()
            .map_err(|_| LabelError::StateNumber(input.to_owned()))?;

        if !rest.trim_end_matches(' ').is_empty() {
            return Err(LabelError::Trailing(input.to_owned()));
        }

        // Both bounds were checked above; the subtraction cannot overflow.
        let trace = i32::try_from(trace - 1).map_err(|_| LabelError::TraceNumber(input.to_owned()))?;
        let state = state
            .checked_sub(1)
            .ok_or_else(|| LabelError::StateNumber(input.to_owned()))?;
        Ok(Self { trace, state })
    }
}

impl fmt::Display for TraceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}",
            i64::from(self.trace) + 1,
            i64::from(self.state) + 1
        )
    }
}
