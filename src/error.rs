//! Fatal error kinds for a region analysis.
//!
//! Fatal errors abort the region: [`crate::pipeline::Pipeline::run`] returns
//! `Err` and emits no partial output. Non-fatal findings travel through the
//! [`crate::diagnostics::Diagnostics`] channel instead.

use crate::flowline::FlowlineId;
use thiserror::Error;

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that aborts a region.
#[derive(Debug, Error)]
pub enum Error {
    /// A flowline id was inserted twice within one basin.
    #[error("duplicate flowline id {0}")]
    DuplicateId(FlowlineId),

    /// The same id appeared in more than one basin during a region merge.
    #[error("flowline id {id} appears in both basin {first} and basin {second}")]
    DuplicateAcrossBasins {
        id: FlowlineId,
        first: String,
        second: String,
    },

    /// An operation referenced an id not present in the store.
    #[error("unknown flowline id {0}")]
    UnknownId(FlowlineId),

    /// Inputs disagree on their coordinate reference system.
    #[error("CRS mismatch: expected {expected}, found {found}")]
    CrsMismatch { expected: String, found: String },

    /// A flowline geometry is missing or shorter than the 1 cm minimum.
    #[error("flowline {id} has empty or degenerate geometry")]
    EmptyGeometry { id: FlowlineId },

    /// A join references an id that is neither present nor the sentinel.
    #[error("join ({upstream}, {downstream}) references an unknown flowline id")]
    InvalidJoin {
        upstream: FlowlineId,
        downstream: FlowlineId,
    },

    /// The join graph contains a cycle not marked as a loop feature.
    #[error("non-loop cycle detected through flowline {0}")]
    CycleDetected(FlowlineId),

    /// The cutter minted an id that already exists in the store.
    #[error("minted id {0} collides with an existing flowline id")]
    IdCollision(FlowlineId),

    /// An allocation was refused; the region does not fit in memory.
    #[error("out of memory while buffering region inputs")]
    OutOfMemory,
}
