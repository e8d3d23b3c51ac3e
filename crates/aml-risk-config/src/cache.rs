//! TTL cache in front of a [`ConfigFetcher`].
//!
//! The current snapshot lives in an [`ArcSwap`], so evaluations running
//! during a refresh read either the previous or the new configuration, never
//! a mix. Refreshes are serialised by an async mutex: concurrent callers
//! that find the snapshot stale wait for the in-flight refresh instead of
//! issuing their own request.

use std::sync::Arc;
use std::time::Duration;

use aml_risk_core::{ConfigProvider, RiskConfig};
use arc_swap::ArcSwap;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::ConfigSourceError;
use crate::fetcher::ConfigFetcher;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug)]
struct Snapshot {
    config: Arc<RiskConfig>,
    /// `None` until the first refresh attempt.
    loaded_at: Option<Instant>,
    fallback: bool,
}

impl Snapshot {
    fn fallback(loaded_at: Option<Instant>) -> Self {
        Self {
            config: Arc::new(RiskConfig::default()),
            loaded_at,
            fallback: true,
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.loaded_at.is_some_and(|at| at.elapsed() < ttl)
    }
}

pub struct CachedConfigSource<F> {
    fetcher: F,
    ttl: Duration,
    snapshot: ArcSwap<Snapshot>,
    refresh_lock: Mutex<()>,
}

impl<F: ConfigFetcher> CachedConfigSource<F> {
    /// Starts out serving the fallback configuration until the first fetch.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            ttl: DEFAULT_CACHE_TTL,
            snapshot: ArcSwap::from_pointee(Snapshot::fallback(None)),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached snapshot, refreshed first when older than the TTL.
    pub async fn fetch(&self) -> Arc<RiskConfig> {
        let snapshot = self.snapshot.load();
        if snapshot.is_fresh(self.ttl) {
            return Arc::clone(&snapshot.config);
        }
        drop(snapshot);

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited.
        let snapshot = self.snapshot.load();
        if snapshot.is_fresh(self.ttl) {
            return Arc::clone(&snapshot.config);
        }
        drop(snapshot);

        self.reload().await
    }

    /// Refetch regardless of the snapshot's age.
    pub async fn refresh(&self) -> Arc<RiskConfig> {
        let _guard = self.refresh_lock.lock().await;
        self.reload().await
    }

    /// Whether the snapshot being served is the built-in fallback.
    pub fn is_fallback(&self) -> bool {
        self.snapshot.load().fallback
    }

    async fn reload(&self) -> Arc<RiskConfig> {
        let now = Instant::now();
        let snapshot = match self.load_validated().await {
            Ok(config) => {
                info!(
                    source = %self.fetcher.describe(),
                    version = %config.version,
                    "risk configuration loaded"
                );
                Snapshot {
                    config: Arc::new(config),
                    loaded_at: Some(now),
                    fallback: false,
                }
            }
            Err(err) => {
                warn!(
                    source = %self.fetcher.describe(),
                    error = %err,
                    "risk configuration unavailable, using built-in fallback"
                );
                Snapshot::fallback(Some(now))
            }
        };

        let config = Arc::clone(&snapshot.config);
        self.snapshot.store(Arc::new(snapshot));
        debug!(ttl_secs = self.ttl.as_secs(), "configuration snapshot swapped");
        config
    }

    async fn load_validated(&self) -> Result<RiskConfig, ConfigSourceError> {
        let payload = self.fetcher.fetch().await?;
        Ok(RiskConfig::try_from(payload)?)
    }
}

impl<F: ConfigFetcher> ConfigProvider for CachedConfigSource<F> {
    /// Snapshot as of the last refresh; never blocks or fetches.
    fn current(&self) -> Arc<RiskConfig> {
        Arc::clone(&self.snapshot.load().config)
    }
}
