//! rv_store — persistence contracts and the reference in-memory store.
//!
//! The engine consumes storage only through the traits in [`contracts`]:
//! reads on [`Store`], writes on a [`StoreTx`] obtained from `begin()` that
//! commits atomically or rolls back on drop. [`memory::MemoryStore`] is the
//! reference implementation, used by tests and the CLI; a relational backend
//! implements the same traits against its own transaction primitive.

#![forbid(unsafe_code)]

use thiserror::Error;

pub mod contracts;
pub mod memory;

pub use contracts::{Page, Store, StoreTx};
pub use memory::MemoryStore;

/// Unified storage error. `NotFound` keeps enough structure to surface as
/// the domain `not_found`; everything else wraps into `storage_error`.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("uniqueness violated: {0}")]
    Unique(String),

    #[error("check constraint violated: {0}")]
    Check(String),

    #[error("backend failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for rv_core::errors::Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { entity, id } => rv_core::errors::Error::NotFound { entity, id },
            other => rv_core::errors::Error::Storage(other.to_string()),
        }
    }
}
