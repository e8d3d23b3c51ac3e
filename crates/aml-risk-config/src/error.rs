use std::path::PathBuf;

use aml_risk_core::RiskError;
use thiserror::Error;

/// Failures while obtaining a configuration snapshot.
///
/// [`crate::CachedConfigSource`] absorbs all of these by installing the
/// fallback configuration; they only surface through the fetchers.
#[derive(Debug, Error)]
pub enum ConfigSourceError {
    #[error("configuration request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("configuration service at {url} answered {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read configuration file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed configuration payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] RiskError),
}
