//! Error types for tabsynth pipelines

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for tabsynth operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for tabsynth operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// One or more required artifacts are absent from the experiment directory
    #[error("Missing required artifact(s): {}", display_paths(.files))]
    MissingArtifact {
        /// Every file that was expected but not found
        files: Vec<PathBuf>,
    },

    /// Columns and transformer assignments disagree with the supplied data
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A column could not be given any transformer
    #[error("No transformer can be assigned to column '{column}': {reason}")]
    UnassignableColumn {
        /// The offending column
        column: String,
        /// Why no transformer fits
        reason: String,
    },

    /// A persisted artifact is corrupt or incompatible with this build
    #[error("Failed to deserialize '{}': {reason}", .path.display())]
    Deserialization {
        /// Path of the artifact that failed to load
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Data type mismatch
    #[error("Data type mismatch: {0}")]
    TypeMismatch(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Transformation error
    #[error("Transformation error: {0}")]
    TransformationError(String),
}

fn display_paths(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
