use std::fmt;

use super::error::EvalError;
use super::patch::PatchDocument;

/// Outcome of applying one rule to one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The selectors did not select the object.
    NoMatch,
    /// The selectors matched but the object already carries the payload.
    MatchNoChange,
    MatchWithPatch(PatchDocument),
    Error(EvalError),
}

impl Decision {
    #[must_use]
    pub fn is_match(&self) -> bool {
        matches!(self, Self::MatchNoChange | Self::MatchWithPatch(_))
    }

    #[must_use]
    pub fn patch(&self) -> Option<&PatchDocument> {
        match self {
            Self::MatchWithPatch(patch) => Some(patch),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&EvalError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EvalError> for Decision {
    fn from(err: EvalError) -> Self {
        Self::Error(err)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch => f.write_str("no match"),
            Self::MatchNoChange => f.write_str("match, no change"),
            Self::MatchWithPatch(patch) => write!(f, "match, patch {patch}"),
            Self::Error(err) => write!(f, "error: {err}"),
        }
    }
}
