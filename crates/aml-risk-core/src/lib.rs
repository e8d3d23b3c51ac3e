//! # aml-risk-core
//!
//! Deterministic AML risk computation for the movement history of a single
//! gaming account.
//!
//! ## Pipeline
//!
//! - **Classifier**: labels each movement from its free-text reason
//! - **Reconciler**: pairs withdrawal cancellations with the withdrawals they reverse
//! - **Aggregation**: volume summaries and day / ISO week / month buckets
//! - **Thresholds**: compares buckets against configured ceilings → base tier
//! - **Patterns**: structuring, bonus concentration, live casino concentration
//! - **Escalation**: at most one hop through the configured escalation matrix
//! - **Score**: final tier → numeric score
//!
//! The engine is synchronous and holds no global state. Configuration is an
//! injected [`ConfigProvider`]; fetching and caching live in `aml-risk-config`.

#![deny(unsafe_code)]

pub mod aggregation;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod escalation;
pub mod patterns;
pub mod provider;
pub mod reconciler;
pub mod score;
pub mod thresholds;
pub mod types;

pub use aggregation::{bucket_totals, summarize, BucketTotals};
pub use classifier::{KeywordClassifier, KeywordTable, MovementClassifier, MovementKind};
pub use config::{
    BaseLevels, EscalationRule, MotivationConfig, MotivationWeight, RiskConfig, RiskConfigPayload,
    RiskLevels, VolumeThresholds,
};
pub use engine::{RiskEngine, RiskResult};
pub use error::RiskError;
pub use escalation::{escalate, AggravantClass, Escalation, EscalationMatrix};
pub use patterns::AggravatingSignals;
pub use provider::{ConfigProvider, StaticConfigProvider};
pub use reconciler::{reconcile, Reconciliation};
pub use thresholds::{evaluate_thresholds, ThresholdOutcome};
pub use types::{
    AccessLogEntry, Direction, EvaluationRequest, FractionationGroup, Granularity, MethodVolume,
    MotivationTrigger, Movement, PeakWindow, RiskLevel, VolumeSummary,
};
