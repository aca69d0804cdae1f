//! rv_core — Core types, event stages, error kinds, and deterministic RNG.
//!
//! This crate is **I/O-free**. It defines the stable types and APIs shared by
//! the rest of the engine (`rv_algo`, `rv_store`, `rv_engine`, `rv_report`,
//! `rv_cli`):
//!
//! - Identity newtypes: `EventId`, `UserId`, `AttachmentId`, `AssignmentId`,
//!   `VoteId`, plus `Sha256` for result digests
//! - The event `Stage` machine (strictly linear lifecycle)
//! - Domain entities as flat records connected by identities
//! - The error surface with stable `kind()` strings
//! - Seedable RNG (ChaCha20) for assignment draws
//! - Deterministic ordering helpers
//!
//! Serialization derives are gated behind the `serde` feature (default-on).

#![forbid(unsafe_code)]

pub mod determinism;
pub mod entities;
pub mod errors;
pub mod ids;
pub mod rng;
pub mod stage;

/// Commonly used items, importable as `use rv_core::prelude::*`.
pub mod prelude {
    pub use crate::entities::{
        Assignment, Attachment, AttachmentResult, Event, Participation, Role, Totals, User,
        Vote, VotingConfig, VotingResults,
    };
    pub use crate::errors::{Error, Result};
    pub use crate::ids::{AssignmentId, AttachmentId, EventId, Sha256, UserId, VoteId};
    pub use crate::stage::Stage;
}
