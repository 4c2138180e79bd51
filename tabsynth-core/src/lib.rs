//! Core data structures and contracts for tabsynth pipelines
//!
//! This crate provides the typed table model, the reversible [`Transformer`]
//! contract every column encoding satisfies, and the versioned artifact files
//! that pipeline stages exchange through an experiment directory.

#![warn(missing_docs)]

pub mod column;
pub mod error;
pub mod frame;
pub mod io;
pub mod schema;
pub mod transform;

// Re-export key types for convenience
pub use column::{Column, ColumnData, Value};
pub use error::{Error, Result};
pub use frame::DataFrame;
pub use io::{load_artifact, save_artifact, write_atomic, ArtifactKind};
pub use schema::{ColumnKind, DataType, Field, Schema};
pub use transform::{Transformer, TransformerWrapper};
