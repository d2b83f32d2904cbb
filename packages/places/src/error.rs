//! Error types for place enrichment

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure of the external geocoding collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeocodeError {
    #[error("geocoder unavailable while looking up {name:?}: {reason}")]
    Unavailable { name: String, reason: String },

    #[error("lookup of {name:?} timed out")]
    Timeout { name: String },

    #[error("invalid gazetteer: {0}")]
    InvalidGazetteer(String),
}

impl GeocodeError {
    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for GeocodeError {
    fn from(e: serde_json::Error) -> Self {
        GeocodeError::InvalidGazetteer(e.to_string())
    }
}

/// Why a place stayed unresolved
#[derive(Debug, Clone, PartialEq)]
pub enum UnresolvedReason {
    NotFound,
    Failed(Arc<GeocodeError>),
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::NotFound => f.write_str("no match"),
            UnresolvedReason::Failed(err) => write!(f, "{}", err),
        }
    }
}

/// A place left without coordinates after an enrichment pass
///
/// Recoverable: its marks are `Unresolved` and the next pass retries.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("place {name:?} unresolved: {reason}")]
pub struct EnrichmentUnresolved {
    pub name: String,
    pub reason: UnresolvedReason,
}
