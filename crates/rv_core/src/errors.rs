//! Error surface of the engine.
//!
//! Every kind maps to a stable snake_case tag via [`Error::kind`]; HTTP
//! adapters translate tags to status codes and render `Display` for the
//! human message. `detail()` carries the structured payload some kinds
//! attach (current stage, violated rule, missing entity).

use std::collections::BTreeMap;

use thiserror::Error;

use crate::stage::Stage;

/// Parse failures for identity newtypes and wire enums.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ParseError {
    #[error("invalid token")]
    InvalidToken,
    #[error("invalid hex digest")]
    InvalidHex,
}

/// Structured detail attached to an error payload.
pub type Detail = BTreeMap<String, String>;

pub type Result<T> = std::result::Result<T, Error>;

/// Domain errors surfaced by the core. The core recovers from none of these;
/// it reports.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("operation not permitted in stage {current}")]
    WrongStage { current: Stage },

    #[error("user {user} may not perform this operation")]
    Forbidden { user: String },

    #[error("user {user} is not a participant of event {event}")]
    NotRegistered { user: String, event: String },

    #[error("user {user} is already a participant of event {event}")]
    AlreadyRegistered { user: String, event: String },

    #[error("a ballot already exists for assignment {assignment}")]
    DuplicateVote { assignment: String },

    #[error("participant {user} already uploaded a proposal for event {event}")]
    DuplicateAttachment { user: String, event: String },

    #[error("event {event} already has a voting configuration")]
    ConfigExists { event: String },

    #[error("invalid voting configuration: {rule}")]
    ConfigInvalid { rule: String },

    #[error("assignments already exist for event {event}")]
    AssignmentsExist { event: String },

    #[error("no feasible assignment: {reason}")]
    InfeasibleAssignment { reason: String },

    #[error("rankings are not a permutation of the assigned set: {reason}")]
    RankingNotPermutation { reason: String },

    #[error("assignment does not belong to the submitting participant")]
    AssignmentMismatch,

    #[error("attachment {attachment} does not belong to event {event}")]
    CrossEventAttachment { attachment: String, event: String },

    #[error("participant {user} owns attachment {attachment}")]
    ConflictOfInterest { user: String, attachment: String },

    #[error("attachment rejected: {reason}")]
    InvalidAttachment { reason: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable kind tag observable at the service boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::WrongStage { .. } => "wrong_stage",
            Error::Forbidden { .. } => "forbidden",
            Error::NotRegistered { .. } => "not_registered",
            Error::AlreadyRegistered { .. } => "already_registered",
            Error::DuplicateVote { .. } => "duplicate_vote",
            Error::DuplicateAttachment { .. } => "duplicate_attachment",
            Error::ConfigExists { .. } => "config_exists",
            Error::ConfigInvalid { .. } => "config_invalid",
            Error::AssignmentsExist { .. } => "assignments_exist",
            Error::InfeasibleAssignment { .. } => "infeasible_assignment",
            Error::RankingNotPermutation { .. } => "ranking_not_permutation",
            Error::AssignmentMismatch => "assignment_mismatch",
            Error::CrossEventAttachment { .. } => "cross_event_attachment",
            Error::ConflictOfInterest { .. } => "conflict_of_interest",
            Error::InvalidAttachment { .. } => "invalid_attachment",
            Error::Storage(_) => "storage_error",
            Error::Internal(_) => "internal",
        }
    }

    /// Structured payload for the boundary; empty for kinds whose message
    /// says everything.
    pub fn detail(&self) -> Detail {
        let mut d = Detail::new();
        match self {
            Error::NotFound { entity, id } => {
                d.insert("entity".into(), (*entity).into());
                d.insert("id".into(), id.clone());
            }
            Error::WrongStage { current } => {
                d.insert("current_stage".into(), current.as_str().into());
            }
            Error::ConfigInvalid { rule } => {
                d.insert("rule".into(), rule.clone());
            }
            Error::CrossEventAttachment { attachment, event } => {
                d.insert("attachment".into(), attachment.clone());
                d.insert("event".into(), event.clone());
            }
            Error::ConflictOfInterest { user, attachment } => {
                d.insert("user".into(), user.clone());
                d.insert("attachment".into(), attachment.clone());
            }
            _ => {}
        }
        d
    }
}
