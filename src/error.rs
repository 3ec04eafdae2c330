//! Error types for cell packing and geocoding.

use thiserror::Error;

/// Errors surfaced by token parsing, packing, decoding and geocoding.
#[derive(Error, Debug)]
pub enum CellPackError {
    /// A token is not a valid S2 cell token.
    #[error("Invalid cell token {token:?} at position {position}: {reason}")]
    InvalidToken {
        token: String,
        position: usize,
        reason: String,
    },

    /// Invalid coordinates or ring passed to a coverer.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Geometry of the wrong type (e.g. a LineString where a Polygon is required).
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Packed byte string that does not follow the wire format.
    #[error("Malformed packed cells: {0}")]
    Malformed(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CellPackError {
    pub(crate) fn invalid_token(
        token: impl Into<String>,
        position: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidToken {
            token: token.into(),
            position,
            reason: reason.into(),
        }
    }
}

/// Result type for cellpack operations.
pub type Result<T> = std::result::Result<T, CellPackError>;
