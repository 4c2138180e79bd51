//! Error types for pipeline stages

use thiserror::Error;

/// Error type for pipeline stages
#[derive(Error, Debug)]
pub enum Error {
    /// Core library error
    #[error("Core error: {0}")]
    Core(#[from] tabsynth_core::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV format error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// YAML metadata or configuration error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A raw value could not be read as its column's type
    #[error("Format error: {0}")]
    Format(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A caller-supplied stage step failed
    #[error("{stage} step failed: {source}")]
    External {
        /// Stage whose step failed
        stage: &'static str,
        /// The caller's error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Logging could not be initialized
    #[error("Logging error: {0}")]
    Logging(String),
}

impl Error {
    /// The underlying core error, if this wraps one
    pub fn as_core(&self) -> Option<&tabsynth_core::Error> {
        match self {
            Error::Core(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for pipeline stages
pub type Result<T> = std::result::Result<T, Error>;
