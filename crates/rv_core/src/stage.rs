//! Event lifecycle stages.
//!
//! Transitions are strictly linear and admin-gated; `results` is terminal.
//! The wire names below are stable strings observed by adapters (notably in
//! `wrong_stage` error payloads) and must not change.

use std::fmt;
use std::str::FromStr;

use crate::errors::ParseError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Discrete lifecycle position of an event.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Stage {
    Creation,
    Registration,
    AttachmentUpload,
    Voting,
    Results,
}

impl Stage {
    /// All stages in lifecycle order.
    pub const ALL: [Stage; 5] = [
        Stage::Creation,
        Stage::Registration,
        Stage::AttachmentUpload,
        Stage::Voting,
        Stage::Results,
    ];

    /// Stable wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Creation => "creation",
            Stage::Registration => "registration",
            Stage::AttachmentUpload => "attachment_upload",
            Stage::Voting => "voting",
            Stage::Results => "results",
        }
    }

    /// The only stage reachable from `self`, if any.
    pub fn successor(self) -> Option<Stage> {
        match self {
            Stage::Creation => Some(Stage::Registration),
            Stage::Registration => Some(Stage::AttachmentUpload),
            Stage::AttachmentUpload => Some(Stage::Voting),
            Stage::Voting => Some(Stage::Results),
            Stage::Results => None,
        }
    }

    /// Linear-only rule: a transition is legal iff `target` is the immediate
    /// successor.
    pub fn can_advance_to(self, target: Stage) -> bool {
        self.successor() == Some(target)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Results)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creation" => Ok(Stage::Creation),
            "registration" => Ok(Stage::Registration),
            "attachment_upload" => Ok(Stage::AttachmentUpload),
            "voting" => Ok(Stage::Voting),
            "results" => Ok(Stage::Results),
            _ => Err(ParseError::InvalidToken),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_are_strictly_linear() {
        for pair in Stage::ALL.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]));
            assert!(!pair[1].can_advance_to(pair[0]));
        }
        // No skips, no self-loops.
        assert!(!Stage::Creation.can_advance_to(Stage::AttachmentUpload));
        assert!(!Stage::Voting.can_advance_to(Stage::Voting));
        assert!(Stage::Results.successor().is_none());
        assert!(Stage::Results.is_terminal());
    }

    #[test]
    fn wire_names_round_trip() {
        for s in Stage::ALL {
            assert_eq!(s.as_str().parse::<Stage>().unwrap(), s);
        }
        assert_eq!(Stage::AttachmentUpload.as_str(), "attachment_upload");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_uses_wire_names() {
        let j = serde_json::to_string(&Stage::AttachmentUpload).unwrap();
        assert_eq!(j, "\"attachment_upload\"");
        let back: Stage = serde_json::from_str(&j).unwrap();
        assert_eq!(back, Stage::AttachmentUpload);
    }
}
