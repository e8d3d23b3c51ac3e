use std::path::{Path, PathBuf};
use std::time::Duration;

use aml_risk_core::RiskConfigPayload;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::ConfigSourceError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads the raw configuration payload. Validation is left to the caller.
#[async_trait]
pub trait ConfigFetcher: Send + Sync {
    async fn fetch(&self) -> Result<RiskConfigPayload, ConfigSourceError>;

    /// Where the payload comes from, for logs.
    fn describe(&self) -> String;
}

/// GET against the configuration service.
pub struct HttpConfigFetcher {
    client: Client,
    url: String,
}

impl HttpConfigFetcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ConfigSourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ConfigFetcher for HttpConfigFetcher {
    async fn fetch(&self) -> Result<RiskConfigPayload, ConfigSourceError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ConfigSourceError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        debug!(url = %self.url, bytes = body.len(), "configuration fetched");
        Ok(serde_json::from_slice(&body)?)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// JSON file on disk, same shape as the service payload.
#[derive(Clone, Debug)]
pub struct FileConfigFetcher {
    path: PathBuf,
}

impl FileConfigFetcher {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ConfigFetcher for FileConfigFetcher {
    async fn fetch(&self) -> Result<RiskConfigPayload, ConfigSourceError> {
        let body = tokio::fs::read(&self.path)
            .await
            .map_err(|source| ConfigSourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aml_risk_core::RiskConfig;
    use std::io::Write;

    #[tokio::test]
    async fn file_fetcher_reads_payload() {
        let payload = RiskConfig::default().to_payload();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&payload).unwrap().as_bytes())
            .unwrap();

        let fetched = FileConfigFetcher::new(file.path()).fetch().await.unwrap();
        assert_eq!(fetched, payload);
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = FileConfigFetcher::new(dir.path().join("absent.json"));
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, ConfigSourceError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[tokio::test]
    async fn garbage_file_is_decode_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = FileConfigFetcher::new(file.path()).fetch().await.unwrap_err();
        assert!(matches!(err, ConfigSourceError::Decode(_)));
    }

    #[tokio::test]
    async fn unusable_url_is_transport_error() {
        let fetcher = HttpConfigFetcher::new("not a url", DEFAULT_REQUEST_TIMEOUT).unwrap();
        let err = fetcher.fetch().await.unwrap_err();
        assert!(matches!(err, ConfigSourceError::Transport(_)));
        assert_eq!(fetcher.describe(), "not a url");
    }
}
