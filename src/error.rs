use core::fmt;

use crate::program::InstPtr;

/// An error that occurred while constructing a [`Program`](crate::Program)
/// or a matching engine over one.
///
/// Construction errors always point at a defect in the caller (usually the
/// compiler feeding this crate), never at the haystack.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BuildError {
    /// An instruction is malformed: a branch target or the start point is
    /// outside the program, a capture slot is out of range, or the slot
    /// count is odd.
    InvalidProgram {
        /// The offending instruction, or the program length for errors that
        /// are not tied to a single instruction.
        pc: InstPtr,
        /// What exactly is wrong.
        reason: &'static str,
    },
    /// The program has a shape this engine cannot run. The lazy DFA reports
    /// this for programs containing zero-width assertions, which only the
    /// NFA simulation evaluates.
    Unsupported {
        /// What the engine cannot handle.
        reason: &'static str,
    },
}

impl BuildError {
    pub(crate) fn invalid(pc: InstPtr, reason: &'static str) -> BuildError {
        BuildError::InvalidProgram { pc, reason }
    }

    pub(crate) fn unsupported(reason: &'static str) -> BuildError {
        BuildError::Unsupported { reason }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            BuildError::InvalidProgram { pc, reason } => {
                write!(f, "invalid program at pc {}: {}", pc, reason)
            }
            BuildError::Unsupported { reason } => {
                write!(f, "unsupported program: {}", reason)
            }
        }
    }
}

impl std::error::Error for BuildError {}

/// An error that occurred during a search.
///
/// Searches are infallible on the happy path; errors arise only from the
/// lazy DFA's resource guard and from strict UTF-8 validation. Neither
/// corrupts the matcher, which may be reused afterwards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MatchError {
    /// The lazy DFA grew past its configured state limit. The search is
    /// abandoned, but the same program can be rerun on the NFA simulation;
    /// the execution driver does so automatically.
    TooManyStates {
        /// The limit that was exceeded.
        limit: usize,
    },
    /// The haystack is not valid UTF-8 and strict validation was requested.
    /// Without strict validation, invalid bytes decode as U+0000 and advance
    /// one byte.
    InvalidUtf8 {
        /// Byte offset of the first invalid sequence.
        offset: usize,
    },
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MatchError::TooManyStates { limit } => {
                write!(f, "lazy DFA exceeded its state limit of {}", limit)
            }
            MatchError::InvalidUtf8 { offset } => {
                write!(f, "invalid UTF-8 in haystack at byte offset {}", offset)
            }
        }
    }
}

impl std::error::Error for MatchError {}
