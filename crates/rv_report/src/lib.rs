//! rv_report — presentation layer over computed results.
//!
//! The model in [`structure`] is pure data mapped from a `VotingResults`
//! record; renderers never recompute scores or ranks, they only format what
//! the engine persisted. Number formatting happens in the mapper so every
//! renderer emits identical digits.

#![forbid(unsafe_code)]

pub mod structure;

#[cfg(feature = "render_json")]
pub mod render_json;
#[cfg(feature = "render_text")]
pub mod render_text;

pub use structure::{build_model, QualityRow, RankingRow, ReportModel};

#[cfg(feature = "render_json")]
pub use render_json::render_report_json;
#[cfg(feature = "render_text")]
pub use render_text::render_report_text;
