//! Error types for Layerline.

use thiserror::Error;

/// Main error type for Layerline operations.
#[derive(Error, Debug)]
pub enum LayerlineError {
    /// Operation attempted on a closed timeline, clip or reader.
    #[error("not open: {0}")]
    NotOpen(String),

    /// Frame, pixel or sample index outside the valid bounds.
    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A reader failed to produce a frame.
    #[error("resource error in '{source_name}': {message}")]
    Resource {
        source_name: String,
        message: String,
    },

    /// The caller abandoned the computation before it finished.
    #[error("frame {0} cancelled")]
    Cancelled(i64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LayerlineError {
    pub fn not_open(msg: impl Into<String>) -> Self {
        Self::NotOpen(msg.into())
    }

    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Self::OutOfRange(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn resource(source_name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Resource {
            source_name: source_name.into(),
            message: msg.into(),
        }
    }

    /// True for [`LayerlineError::NotOpen`].
    pub fn is_not_open(&self) -> bool {
        matches!(self, Self::NotOpen(_))
    }

    /// True for [`LayerlineError::OutOfRange`].
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange(_))
    }
}

/// Result type alias for Layerline operations.
pub type Result<T> = std::result::Result<T, LayerlineError>;
