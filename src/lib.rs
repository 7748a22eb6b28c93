//! # stack
//!
//! A three-level superpixel/segment/body mapping engine for stacks of 2D
//! image planes: in-memory storage, bulk construction from tabular text
//! ingest, consistency verification with optional repair, persistence to a
//! versioned binary container, and mesh export.

pub mod construct;
pub mod engine;
pub mod error;
pub mod stl;
pub mod text;
pub mod verify;

pub use engine::{Bounds, StackEngine};
pub use error::{ConstructError, EngineError, StackError, TextError};
pub use verify::{Issue, VerifyReport};
