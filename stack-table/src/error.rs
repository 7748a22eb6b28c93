//! Error types for the storage primitives.

use thiserror::Error;

/// Errors that can occur operating on a [`crate::Table`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("row={row} col={col} out of range (rows={rows}, columns={columns})")]
    OutOfRange {
        row: u32,
        col: u32,
        rows: u32,
        columns: u32,
    },

    #[error("growing by {requested} rows would exceed MAX_ROWS ({max})")]
    CapacityExceeded { requested: u64, max: u32 },

    #[error("truncate target {target} exceeds allocated capacity {capacity}")]
    TruncateExceedsCapacity { target: u32, capacity: u32 },
}

/// Errors that can occur operating on an [`crate::Arena`].
#[derive(Debug, Error)]
pub enum ArenaError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("list starting at index={index} has no END_OF_LIST terminator within bounds")]
    MissingTerminator { index: u32 },
}

/// Errors that can occur reading or writing a [`crate::ContainerReader`]/[`crate::ContainerWriter`].
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a stack container (bad magic bytes)")]
    BadMagic,

    #[error("unsupported hdf-stack-version={found}, expected 1")]
    VersionMismatch { found: u32 },

    #[error("dataset '{name}' not found in container")]
    UnknownDataset { name: String },

    #[error("container is truncated or corrupt: {reason}")]
    Truncated { reason: &'static str },

    #[error(transparent)]
    Table(#[from] TableError),
}
