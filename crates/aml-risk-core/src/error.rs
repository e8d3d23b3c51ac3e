use thiserror::Error;

/// Errors raised inside the risk engine.
///
/// None of these reach the caller of [`crate::RiskEngine::evaluate`]: an
/// unmapped tier degrades to a zero score and invalid configurations are
/// rejected before they become a snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskError {
    #[error("configuration error: risk level '{level}' has no score_mapping entry")]
    UnmappedLevel { level: String },

    #[error("invalid risk configuration: {0}")]
    InvalidConfig(String),
}

impl RiskError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
