//! Food-listing lifecycle.
//!
//! [`ListingStatus`] is a strict forward-only state machine:
//!
//! ```text
//! REQUESTED ──assign──► ASSIGNED ──deliver──► DISTRIBUTED
//! ```
//!
//! No transition skips a state and none reverses. `DISTRIBUTED` is terminal.
//! The database layer applies a transition with a conditional update on
//! [`Transition::from_status`], so the check here and the write agree.

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};

/// Lifecycle status of a food listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    /// Posted by a donor, waiting for a volunteer.
    Requested,
    /// A volunteer is bound and will collect the food.
    Assigned,
    /// Collected and handed out.
    Distributed,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Assigned => "ASSIGNED",
            Self::Distributed => "DISTRIBUTED",
        }
    }

    /// Parse a status name, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "REQUESTED" => Some(Self::Requested),
            "ASSIGNED" => Some(Self::Assigned),
            "DISTRIBUTED" => Some(Self::Distributed),
            _ => None,
        }
    }

    /// Validate `transition` against the current status and return the new one.
    pub fn apply(self, transition: Transition) -> Result<ListingStatus> {
        if self == transition.from_status() {
            Ok(transition.to_status())
        } else {
            Err(AppError::InvalidState(format!(
                "cannot {} a listing that is {} (expected {})",
                transition.verb(),
                self.as_str(),
                transition.from_status().as_str()
            )))
        }
    }
}

impl std::fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An admin-driven change of a listing's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Bind a volunteer: REQUESTED → ASSIGNED.
    Assign,
    /// Mark as delivered: ASSIGNED → DISTRIBUTED.
    Deliver,
}

impl Transition {
    /// The only status this transition may start from.
    pub fn from_status(&self) -> ListingStatus {
        match self {
            Self::Assign => ListingStatus::Requested,
            Self::Deliver => ListingStatus::Assigned,
        }
    }

    pub fn to_status(&self) -> ListingStatus {
        match self {
            Self::Assign => ListingStatus::Assigned,
            Self::Deliver => ListingStatus::Distributed,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::Deliver => "deliver",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_path_is_requested_assigned_distributed() {
        let assigned = ListingStatus::Requested.apply(Transition::Assign).unwrap();
        assert_eq!(assigned, ListingStatus::Assigned);
        let distributed = assigned.apply(Transition::Deliver).unwrap();
        assert_eq!(distributed, ListingStatus::Distributed);
    }

    #[test]
    fn deliver_from_requested_is_invalid() {
        match ListingStatus::Requested.apply(Transition::Deliver) {
            Err(AppError::InvalidState(msg)) => {
                assert!(msg.contains("REQUESTED"));
                assert!(msg.contains("expected ASSIGNED"));
            }
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn nothing_leaves_distributed() {
        for t in [Transition::Assign, Transition::Deliver] {
            assert!(matches!(
                ListingStatus::Distributed.apply(t),
                Err(AppError::InvalidState(_))
            ));
        }
    }

    #[test]
    fn assign_twice_is_invalid() {
        assert!(matches!(
            ListingStatus::Assigned.apply(Transition::Assign),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn parse_round_trips_names() {
        assert_eq!(ListingStatus::parse("assigned"), Some(ListingStatus::Assigned));
        assert_eq!(
            ListingStatus::parse(" DISTRIBUTED "),
            Some(ListingStatus::Distributed)
        );
        assert_eq!(ListingStatus::parse("delivered"), None);
        assert_eq!(ListingStatus::Requested.to_string(), "REQUESTED");
    }

    #[test]
    fn serde_uses_upper_case_names() {
        let json = serde_json::to_string(&ListingStatus::Assigned).unwrap();
        assert_eq!(json, "\"ASSIGNED\"");
        let back: ListingStatus = serde_json::from_str("\"REQUESTED\"").unwrap();
        assert_eq!(back, ListingStatus::Requested);
    }
}
