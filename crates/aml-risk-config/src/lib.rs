//! # aml-risk-config
//!
//! Configuration source for the AML risk engine. A [`ConfigFetcher`] reads
//! the raw payload from the configuration service (or a file), and
//! [`CachedConfigSource`] keeps a validated snapshot for a TTL, falling back
//! to [`aml_risk_core::RiskConfig::default`] whenever a refresh fails.

#![deny(unsafe_code)]

pub mod cache;
pub mod error;
pub mod fetcher;

pub use cache::{CachedConfigSource, DEFAULT_CACHE_TTL};
pub use error::ConfigSourceError;
pub use fetcher::{ConfigFetcher, FileConfigFetcher, HttpConfigFetcher, DEFAULT_REQUEST_TIMEOUT};
