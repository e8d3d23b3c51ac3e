//! Evaluation entry point.
//!
//! [`RiskEngine::evaluate`] reads one configuration snapshot from its
//! provider and runs the pipeline classify → reconcile → aggregate →
//! thresholds → patterns → escalate → score. The work itself lives in
//! [`RiskEngine::evaluate_with`], which takes the snapshot explicitly.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::aggregation::{bucket_totals, summarize};
use crate::classifier::{KeywordClassifier, MovementClassifier, MovementKind};
use crate::config::RiskConfig;
use crate::escalation::escalate;
use crate::patterns::{self, AggravatingSignals};
use crate::provider::ConfigProvider;
use crate::reconciler::reconcile;
use crate::score::score_or_zero;
use crate::thresholds::evaluate_thresholds;
use crate::types::{Direction, EvaluationRequest, MotivationTrigger, RiskLevel, VolumeSummary};

/// Verdict for one account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskResult {
    pub score: i64,
    pub level: RiskLevel,
    /// Tier before escalation.
    pub base_level: RiskLevel,
    /// Ordered, without duplicates.
    pub motivations: Vec<String>,
    pub signals: AggravatingSignals,
    pub deposit_summary: Option<VolumeSummary>,
    pub withdrawal_summary: Option<VolumeSummary>,
    /// Motivation text → the bucket that raised it.
    pub motivation_triggers: BTreeMap<String, MotivationTrigger>,
    pub config_version: String,
}

pub struct RiskEngine<C = KeywordClassifier> {
    provider: Arc<dyn ConfigProvider>,
    classifier: C,
}

impl RiskEngine<KeywordClassifier> {
    pub fn new(provider: Arc<dyn ConfigProvider>) -> Self {
        Self {
            provider,
            classifier: KeywordClassifier::default(),
        }
    }
}

impl<C: MovementClassifier> RiskEngine<C> {
    /// Replace the classification strategy, e.g. with another locale's table.
    pub fn with_classifier<D: MovementClassifier>(self, classifier: D) -> RiskEngine<D> {
        RiskEngine {
            provider: self.provider,
            classifier,
        }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Evaluate against the provider's current snapshot.
    pub fn evaluate(&self, request: &EvaluationRequest) -> RiskResult {
        let config = self.provider.current();
        self.evaluate_with(&config, request)
    }

    pub fn evaluate_with(&self, config: &RiskConfig, request: &EvaluationRequest) -> RiskResult {
        if request.movements.is_empty() {
            return self.empty_verdict(config);
        }

        let kinds: Vec<MovementKind> = request
            .movements
            .iter()
            .map(|m| self.classifier.classify(m.reason.as_deref()))
            .collect();

        let reconciled = reconcile(&request.movements, &kinds);

        let deposit_summary =
            summarize(Direction::Deposits, &reconciled.deposits, &self.classifier);
        let withdrawal_summary =
            summarize(Direction::Withdrawals, &reconciled.withdrawals, &self.classifier);

        let thresholds = evaluate_thresholds(
            config,
            &bucket_totals(&reconciled.deposits),
            &bucket_totals(&reconciled.withdrawals),
        );

        let signals = patterns::detect(config, request, &kinds, &self.classifier);
        let escalation = escalate(config, &thresholds.base_level, &signals);

        let mut seen = BTreeSet::new();
        let motivations: Vec<String> = thresholds
            .motivations
            .into_iter()
            .chain(escalation.motivations)
            .filter(|text| seen.insert(text.clone()))
            .collect();

        let score = score_or_zero(&config.risk_levels, &escalation.level);

        debug!(
            movements = request.movements.len(),
            access_logs = request.access_logs.len(),
            reversed = reconciled.reversed_count(),
            "evaluation inputs"
        );
        info!(
            level = %escalation.level,
            base_level = %thresholds.base_level,
            score,
            motivations = motivations.len(),
            config_version = %config.version,
            "risk evaluated"
        );

        RiskResult {
            score,
            level: escalation.level,
            base_level: thresholds.base_level,
            motivations,
            signals,
            deposit_summary,
            withdrawal_summary,
            motivation_triggers: thresholds.triggers,
            config_version: config.version.clone(),
        }
    }

    fn empty_verdict(&self, config: &RiskConfig) -> RiskResult {
        let level = config.risk_levels.base_levels.default.clone();
        let score = score_or_zero(&config.risk_levels, &level);
        info!(level = %level, score, "no movements, default verdict");
        RiskResult {
            score,
            base_level: level.clone(),
            level,
            motivations: Vec::new(),
            signals: AggravatingSignals::default(),
            deposit_summary: None,
            withdrawal_summary: None,
            motivation_triggers: BTreeMap::new(),
            config_version: config.version.clone(),
        }
    }
}
