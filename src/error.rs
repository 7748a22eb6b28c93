//! Error taxonomy for the mapping engine and its surrounding pipeline.

use thiserror::Error;

use stack_table::{ArenaError, ContainerError, TableError};

/// Errors surfaced by [`crate::engine::StackEngine`] query and mutation methods.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Arena(#[from] ArenaError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("plane={0} does not exist")]
    AbsentPlane(u32),

    #[error("superpixel (plane={z}, spid={spid}) does not exist")]
    AbsentSuperpixel { z: u32, spid: u32 },

    #[error("segment={0} does not exist")]
    AbsentSegment(u32),

    #[error("body={0} does not exist")]
    AbsentBody(u32),

    #[error("the zero segment has no single plane")]
    ZeroSegmentHasNoPlane,

    #[error("cannot assign superpixel to the zero segment")]
    ZeroSegmentAssignment,

    #[error("cannot assign segments to the zero body")]
    ZeroBodyAssignment,

    #[error("segment is on plane={segment_plane}, attempted to add superpixel on plane={attempted_plane}")]
    PlaneMismatch {
        segment_plane: u32,
        attempted_plane: u32,
    },

    #[error("planes must be contiguous from {zmin} to {zmax}, plane={missing} is missing")]
    NonContiguousPlanes { zmin: u32, zmax: u32, missing: u32 },

    #[error("dataset name '{0}' under /superpixel is not a valid plane index")]
    MalformedPlaneName(String),
}

/// Errors surfaced by [`crate::construct::construct`].
#[derive(Debug, Error)]
pub enum ConstructError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("bounds table has no rows; cannot determine plane extents")]
    EmptyBounds,

    #[error("plane range [{zmin}..={zmax}] is missing plane={missing}")]
    NonContiguousPlanes { zmin: u32, zmax: u32, missing: u32 },

    #[error("segid={segid} is mapped to a body more than once in the bodies table")]
    DuplicateSegmentBody { segid: u32 },

    #[error("segid={segid} has superpixels on both plane={first_plane} and plane={second_plane}")]
    SegmentSpansMultiplePlanes {
        segid: u32,
        first_plane: u32,
        second_plane: u32,
    },
}

/// Errors surfaced by [`crate::text`] ingest parsing.
#[derive(Debug, Error)]
pub enum TextError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("line {line}: expected {expected} whitespace separated unsigned integers, found {found}")]
    WrongColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: '{text}' is not a valid unsigned 32-bit integer")]
    NotAnInteger { line: usize, text: String },
}

/// Top level error aggregating every component, used by the CLI binaries.
#[derive(Debug, Error)]
pub enum StackError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Construct(#[from] ConstructError),

    #[error(transparent)]
    Text(#[from] TextError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
