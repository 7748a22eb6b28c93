//! # stack-table
//!
//! Low level storage primitives shared by every part of the stack engine:
//! a growable dense table of `u32` cells, an append-only list-of-lists
//! arena built on top of it, and a small self-describing binary container
//! format for persisting named tables to disk.

pub(crate) mod arena;
pub(crate) mod container;
pub(crate) mod error;
pub(crate) mod table;

// Externally exposed types.
pub use arena::Arena;
pub use container::{ContainerReader, ContainerWriter};
pub use error::{ArenaError, ContainerError, TableError};
pub use table::{EMPTY, MAX_ROWS, RESERVED_IDS, Table};
