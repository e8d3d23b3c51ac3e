use std::sync::Arc;

use crate::config::RiskConfig;

/// Source of the configuration snapshot used by one evaluation.
///
/// Implementations must hand out complete, validated snapshots. Swapping a
/// snapshot while evaluations are running is allowed as long as every call
/// to `current` observes either the old or the new `Arc`.
pub trait ConfigProvider: Send + Sync {
    fn current(&self) -> Arc<RiskConfig>;
}

/// Provider that always returns the same snapshot.
#[derive(Clone, Debug)]
pub struct StaticConfigProvider {
    config: Arc<RiskConfig>,
}

impl StaticConfigProvider {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl Default for StaticConfigProvider {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}

impl From<Arc<RiskConfig>> for StaticConfigProvider {
    fn from(config: Arc<RiskConfig>) -> Self {
        Self { config }
    }
}

impl ConfigProvider for StaticConfigProvider {
    fn current(&self) -> Arc<RiskConfig> {
        Arc::clone(&self.config)
    }
}

impl<P: ConfigProvider + ?Sized> ConfigProvider for Arc<P> {
    fn current(&self) -> Arc<RiskConfig> {
        (**self).current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_provider_shares_one_snapshot() {
        let provider = StaticConfigProvider::default();
        let a = provider.current();
        let b = provider.current();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
