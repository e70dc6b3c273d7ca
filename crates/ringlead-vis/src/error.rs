//! Error types for ringlead-vis.

use thiserror::Error;

/// Result type for visualization and experiment operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running experiments or exporting timelines.
#[derive(Debug, Error)]
pub enum Error {
    /// The election itself failed
    #[error("Election error: {0}")]
    Election(#[from] ringlead_election::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Experiment configuration rejected before running
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
