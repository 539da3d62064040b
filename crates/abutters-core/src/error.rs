//! Error types for Abutters

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::models::{Generation, QueryClass, QueryKind};

#[derive(Debug, Error)]
pub enum AbuttersError {
    // Geometry errors
    #[error("Invalid geometry: {reason}")]
    InvalidGeometry { reason: String },

    #[error("Invalid buffer distance {value}: {reason}")]
    InvalidDistance { value: f64, reason: String },

    // Selection errors
    #[error("No parcel selected. Select a parcel before buffering")]
    NoSelection,

    // Query errors
    #[error("{query} query failed: {reason}")]
    QueryFailed { query: QueryKind, reason: String },

    #[error("Discarded stale {class} result from generation {generation}")]
    StaleResult {
        class: QueryClass,
        generation: Generation,
    },

    #[error("Orchestrator is no longer running")]
    OrchestratorClosed,

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Export errors
    #[error("Export failed: {0}")]
    Export(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AbuttersError {
    pub fn query_failed(query: QueryKind, reason: impl Into<String>) -> Self {
        Self::QueryFailed { query, reason: reason.into() }
    }

    pub fn invalid_geometry(reason: impl Into<String>) -> Self {
        Self::InvalidGeometry { reason: reason.into() }
    }

    /// Classification published to state consumers, if this error is one
    /// that consumers are meant to see.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            AbuttersError::InvalidGeometry { .. } => Some(ErrorKind::InvalidGeometry),
            AbuttersError::InvalidDistance { .. } => Some(ErrorKind::InvalidDistance),
            AbuttersError::NoSelection => Some(ErrorKind::NoSelection),
            AbuttersError::QueryFailed { query, .. } => Some(ErrorKind::QueryFailed(*query)),
            _ => None,
        }
    }
}

/// Error classification exposed in published state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidGeometry,
    InvalidDistance,
    NoSelection,
    QueryFailed(QueryKind),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidGeometry => write!(f, "invalid parcel geometry"),
            ErrorKind::InvalidDistance => write!(f, "invalid buffer distance"),
            ErrorKind::NoSelection => write!(f, "no parcel selected"),
            ErrorKind::QueryFailed(query) => write!(f, "{} query failed", query),
        }
    }
}

pub type Result<T> = std::result::Result<T, AbuttersError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surfaced_kinds() {
        assert_eq!(AbuttersError::NoSelection.kind(), Some(ErrorKind::NoSelection));
        assert_eq!(
            AbuttersError::query_failed(QueryKind::Intersects, "timeout").kind(),
            Some(ErrorKind::QueryFailed(QueryKind::Intersects))
        );
    }

    #[test]
    fn test_stale_result_is_never_surfaced() {
        let err = AbuttersError::StaleResult {
            class: QueryClass::Selection,
            generation: Generation(3),
        };
        assert_eq!(err.kind(), None);
        assert!(err.to_string().contains("generation 3"));
    }
}
