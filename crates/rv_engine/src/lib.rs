//! rv_engine — stage-gated service layer of the review-voting engine.
//!
//! [`VotingService`] wraps a [`rv_store::Store`] and exposes the operations
//! adapters call: event lifecycle, participant registration, proposal upload,
//! voting configuration, assignment generation, ballot intake, and results
//! computation. Every operation re-reads the event's stage from the store
//! inside its serialization scope — a stage value passed in by an adapter is
//! never trusted.
//!
//! Mutating operations that stamp an instant take `now` as an argument; the
//! engine itself never reads a clock, which keeps recomputation reproducible.

#![forbid(unsafe_code)]

use rv_core::entities::{Event, Role, User};
use rv_core::errors::{Error, Result};
use rv_core::ids::EventId;
use rv_core::stage::Stage;
use rv_store::Store;

mod locks;

pub mod assign;
pub mod attachments;
pub mod ballot;
pub mod config;
pub mod lifecycle;
pub mod results;

pub use attachments::NewAttachment;
pub use ballot::RankingEntry;
pub use config::ConfigPreview;

/// The service fronting one store. Cheap to share behind an `Arc`; the only
/// process-wide state is the per-event lock map.
pub struct VotingService<S: Store> {
    store: S,
    locks: locks::EventLocks,
}

impl<S: Store> VotingService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: locks::EventLocks::new(),
        }
    }

    /// Direct read access for adapters (listings, lookups).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current, store-read event record.
    pub(crate) fn load_event(&self, id: &EventId) -> Result<Event> {
        Ok(self.store.event(id)?)
    }

    /// Gate an operation on the stage just read from the store.
    pub(crate) fn expect_stage(event: &Event, stage: Stage) -> Result<()> {
        if event.stage == stage {
            Ok(())
        } else {
            Err(Error::WrongStage {
                current: event.stage,
            })
        }
    }

    /// Admin gate: admins and the event author pass.
    pub(crate) fn require_admin(actor: &User, event: &Event) -> Result<()> {
        if actor.role == Role::Admin || actor.id == event.author {
            Ok(())
        } else {
            Err(Error::Forbidden {
                user: actor.id.to_string(),
            })
        }
    }
}

/// Derive a short stable id token from the parts that make it unique.
/// Tokens cap at 64 chars, so compound keys are fingerprinted instead of
/// concatenated.
pub(crate) fn derive_id(prefix: &str, parts: &[&str]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    for p in parts {
        hasher.update(p.as_bytes());
        hasher.update([0u8]);
    }
    let digest = hex::encode(hasher.finalize());
    format!("{prefix}-{}", &digest[..16])
}
