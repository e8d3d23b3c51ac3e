//! Risk configuration: the validated domain snapshot and its wire payload.
//!
//! The payload mirrors the JSON served by the configuration service
//! (`volumeThresholds`, `riskMotivations`, `riskLevels`). Conversion into
//! [`RiskConfig`] validates it, so the engine only ever sees consistent
//! snapshots. [`RiskConfig::default`] is the documented fallback.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::RiskError;
use crate::types::{Granularity, RiskLevel};

pub const MOTIVATION_STRUCTURING: &str = "frazionate";
pub const MOTIVATION_BONUS: &str = "bonus_concentration";
pub const MOTIVATION_CASINO_LIVE: &str = "casino_live";

pub const DEFAULT_BONUS_THRESHOLD_PCT: f64 = 10.0;
pub const DEFAULT_CASINO_LIVE_THRESHOLD_PCT: f64 = 40.0;

pub const FALLBACK_CONFIG_VERSION: &str = "builtin-fallback";

/// How a motivation participates in the verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotivationWeight {
    /// Volume thresholds; decide the base tier.
    Base,
    Major,
    Minor,
}

/// Volume ceilings in cents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeThresholds {
    pub daily_minor: i64,
    pub weekly_minor: i64,
    pub monthly_minor: i64,
}

impl VolumeThresholds {
    pub fn for_granularity(&self, granularity: Granularity) -> i64 {
        match granularity {
            Granularity::Daily => self.daily_minor,
            Granularity::Weekly => self.weekly_minor,
            Granularity::Monthly => self.monthly_minor,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MotivationConfig {
    /// Display name used in motivation texts.
    pub name: String,
    pub weight: MotivationWeight,
    pub threshold_percentage: Option<f64>,
    pub enabled: bool,
}

impl MotivationConfig {
    fn new(name: &str, weight: MotivationWeight, threshold_percentage: Option<f64>) -> Self {
        Self {
            name: name.to_string(),
            weight,
            threshold_percentage,
            enabled: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseLevels {
    pub monthly_exceeded: RiskLevel,
    pub weekly_or_daily_exceeded: RiskLevel,
    pub default: RiskLevel,
}

/// Outgoing escalation edges of one tier.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EscalationRule {
    pub major_aggravants: Option<RiskLevel>,
    pub minor_aggravants: Option<RiskLevel>,
    pub any_aggravants: Option<RiskLevel>,
}

impl EscalationRule {
    fn targets(&self) -> impl Iterator<Item = &RiskLevel> {
        [
            self.major_aggravants.as_ref(),
            self.minor_aggravants.as_ref(),
            self.any_aggravants.as_ref(),
        ]
        .into_iter()
        .flatten()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RiskLevels {
    pub base_levels: BaseLevels,
    pub escalation_rules: BTreeMap<RiskLevel, EscalationRule>,
    pub score_mapping: BTreeMap<RiskLevel, i64>,
}

/// Immutable configuration snapshot for one evaluation.
#[derive(Clone, Debug, PartialEq)]
pub struct RiskConfig {
    pub version: String,
    pub volume_thresholds: VolumeThresholds,
    pub motivations: BTreeMap<String, MotivationConfig>,
    pub risk_levels: RiskLevels,
}

impl RiskConfig {
    pub fn motivation(&self, key: &str) -> Option<&MotivationConfig> {
        self.motivations.get(key)
    }

    /// A motivation missing from the snapshot counts as disabled.
    pub fn is_enabled(&self, key: &str) -> bool {
        self.motivation(key).is_some_and(|m| m.enabled)
    }

    pub fn threshold_percentage(&self, key: &str, default: f64) -> f64 {
        self.motivation(key)
            .and_then(|m| m.threshold_percentage)
            .unwrap_or(default)
    }

    /// Display name of a motivation, falling back to its key.
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.motivation(key).map(|m| m.name.as_str()).unwrap_or(key)
    }

    pub fn score_of(&self, level: &RiskLevel) -> Option<i64> {
        self.risk_levels.score_mapping.get(level).copied()
    }

    /// Check the invariants the engine relies on.
    ///
    /// Every referenced tier must have a score, and no escalation edge may
    /// lead to a lower score than its source.
    pub fn validate(&self) -> Result<(), RiskError> {
        let thresholds = &self.volume_thresholds;
        for (name, value) in [
            ("daily", thresholds.daily_minor),
            ("weekly", thresholds.weekly_minor),
            ("monthly", thresholds.monthly_minor),
        ] {
            if value < 0 {
                return Err(RiskError::invalid(format!("{name} threshold is negative")));
            }
        }

        let levels = &self.risk_levels;
        if levels.score_mapping.is_empty() {
            return Err(RiskError::invalid("score_mapping is empty"));
        }

        let mapped = |level: &RiskLevel, context: &str| -> Result<i64, RiskError> {
            self.score_of(level).ok_or_else(|| {
                RiskError::invalid(format!("{context} level '{level}' has no score"))
            })
        };

        mapped(&levels.base_levels.monthly_exceeded, "monthly_exceeded")?;
        mapped(&levels.base_levels.weekly_or_daily_exceeded, "weekly_or_daily_exceeded")?;
        mapped(&levels.base_levels.default, "default")?;

        for (source, rule) in &levels.escalation_rules {
            let source_score = mapped(source, "escalation source")?;
            for target in rule.targets() {
                let target_score = mapped(target, "escalation target")?;
                if target_score < source_score {
                    return Err(RiskError::invalid(format!(
                        "escalation {source} -> {target} lowers the score ({source_score} -> {target_score})"
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn to_payload(&self) -> RiskConfigPayload {
        RiskConfigPayload::from(self)
    }
}

fn default_motivations() -> BTreeMap<String, MotivationConfig> {
    use MotivationWeight::{Base, Major, Minor};
    BTreeMap::from([
        (
            MOTIVATION_STRUCTURING.to_string(),
            MotivationConfig::new("Fractionated transactions", Major, None),
        ),
        (
            MOTIVATION_BONUS.to_string(),
            MotivationConfig::new("Bonus concentration", Major, Some(DEFAULT_BONUS_THRESHOLD_PCT)),
        ),
        (
            MOTIVATION_CASINO_LIVE.to_string(),
            MotivationConfig::new(
                "Live casino concentration",
                Minor,
                Some(DEFAULT_CASINO_LIVE_THRESHOLD_PCT),
            ),
        ),
        (
            Granularity::Daily.motivation_key().to_string(),
            MotivationConfig::new("Daily volume threshold exceeded", Base, None),
        ),
        (
            Granularity::Weekly.motivation_key().to_string(),
            MotivationConfig::new("Weekly volume threshold exceeded", Base, None),
        ),
        (
            Granularity::Monthly.motivation_key().to_string(),
            MotivationConfig::new("Monthly volume threshold exceeded", Base, None),
        ),
    ])
}

impl Default for RiskConfig {
    /// Fallback: daily 5000 / weekly 10000 / monthly 15000, tiers
    /// Low / Medium / High / Elevato scoring 20 / 50 / 80 / 100.
    fn default() -> Self {
        let level = |name: &str| RiskLevel::from(name);
        Self {
            version: FALLBACK_CONFIG_VERSION.to_string(),
            volume_thresholds: VolumeThresholds {
                daily_minor: 500_000,
                weekly_minor: 1_000_000,
                monthly_minor: 1_500_000,
            },
            motivations: default_motivations(),
            risk_levels: RiskLevels {
                base_levels: BaseLevels {
                    monthly_exceeded: level("High"),
                    weekly_or_daily_exceeded: level("Medium"),
                    default: level("Low"),
                },
                escalation_rules: BTreeMap::from([
                    (
                        level("Low"),
                        EscalationRule {
                            major_aggravants: Some(level("High")),
                            minor_aggravants: Some(level("Medium")),
                            any_aggravants: None,
                        },
                    ),
                    (
                        level("Medium"),
                        EscalationRule {
                            major_aggravants: Some(level("High")),
                            minor_aggravants: Some(level("High")),
                            any_aggravants: None,
                        },
                    ),
                    (
                        level("High"),
                        EscalationRule {
                            major_aggravants: None,
                            minor_aggravants: None,
                            any_aggravants: Some(level("Elevato")),
                        },
                    ),
                ]),
                score_mapping: BTreeMap::from([
                    (level("Low"), 20),
                    (level("Medium"), 50),
                    (level("High"), 80),
                    (level("Elevato"), 100),
                ]),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Wire payload
// ---------------------------------------------------------------------------

/// JSON shape served by the configuration service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskConfigPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub volume_thresholds: VolumeThresholdsPayload,
    #[serde(default)]
    pub risk_motivations: BTreeMap<String, MotivationPayload>,
    pub risk_levels: RiskLevelsPayload,
}

/// Ceilings in major units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolumeThresholdsPayload {
    pub daily: f64,
    pub weekly: f64,
    pub monthly: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotivationPayload {
    pub name: String,
    pub weight: MotivationWeight,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_percentage: Option<f64>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskLevelsPayload {
    pub base_levels: BaseLevelsPayload,
    #[serde(default)]
    pub escalation_rules: BTreeMap<String, EscalationRulePayload>,
    pub score_mapping: BTreeMap<String, i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseLevelsPayload {
    pub monthly_exceeded: String,
    pub weekly_or_daily_exceeded: String,
    pub default: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationRulePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_aggravants: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor_aggravants: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_aggravants: Option<String>,
}

fn major_to_minor(name: &str, value: f64) -> Result<i64, RiskError> {
    if !value.is_finite() || value < 0.0 {
        return Err(RiskError::invalid(format!(
            "{name} threshold must be a finite non-negative number, got {value}"
        )));
    }
    Ok((value * 100.0).round() as i64)
}

fn minor_to_major(minor: i64) -> f64 {
    minor as f64 / 100.0
}

impl TryFrom<RiskConfigPayload> for RiskConfig {
    type Error = RiskError;

    /// Convert and validate. Motivations absent from the payload keep their
    /// default definitions.
    fn try_from(payload: RiskConfigPayload) -> Result<Self, Self::Error> {
        let thresholds = &payload.volume_thresholds;
        let volume_thresholds = VolumeThresholds {
            daily_minor: major_to_minor("daily", thresholds.daily)?,
            weekly_minor: major_to_minor("weekly", thresholds.weekly)?,
            monthly_minor: major_to_minor("monthly", thresholds.monthly)?,
        };

        let mut motivations = default_motivations();
        for (key, motivation) in payload.risk_motivations {
            if let Some(pct) = motivation.threshold_percentage {
                if !pct.is_finite() || pct < 0.0 {
                    return Err(RiskError::invalid(format!(
                        "motivation '{key}' has invalid threshold_percentage {pct}"
                    )));
                }
            }
            motivations.insert(
                key,
                MotivationConfig {
                    name: motivation.name,
                    weight: motivation.weight,
                    threshold_percentage: motivation.threshold_percentage,
                    enabled: motivation.enabled,
                },
            );
        }

        let levels = payload.risk_levels;
        let config = RiskConfig {
            version: payload
                .version
                .unwrap_or_else(|| "unversioned".to_string()),
            volume_thresholds,
            motivations,
            risk_levels: RiskLevels {
                base_levels: BaseLevels {
                    monthly_exceeded: RiskLevel(levels.base_levels.monthly_exceeded),
                    weekly_or_daily_exceeded: RiskLevel(
                        levels.base_levels.weekly_or_daily_exceeded,
                    ),
                    default: RiskLevel(levels.base_levels.default),
                },
                escalation_rules: levels
                    .escalation_rules
                    .into_iter()
                    .map(|(tier, rule)| {
                        (
                            RiskLevel(tier),
                            EscalationRule {
                                major_aggravants: rule.major_aggravants.map(RiskLevel),
                                minor_aggravants: rule.minor_aggravants.map(RiskLevel),
                                any_aggravants: rule.any_aggravants.map(RiskLevel),
                            },
                        )
                    })
                    .collect(),
                score_mapping: levels
                    .score_mapping
                    .into_iter()
                    .map(|(tier, score)| (RiskLevel(tier), score))
                    .collect(),
            },
        };

        config.validate()?;
        Ok(config)
    }
}

impl From<&RiskConfig> for RiskConfigPayload {
    fn from(config: &RiskConfig) -> Self {
        let levels = &config.risk_levels;
        Self {
            version: Some(config.version.clone()),
            volume_thresholds: VolumeThresholdsPayload {
                daily: minor_to_major(config.volume_thresholds.daily_minor),
                weekly: minor_to_major(config.volume_thresholds.weekly_minor),
                monthly: minor_to_major(config.volume_thresholds.monthly_minor),
            },
            risk_motivations: config
                .motivations
                .iter()
                .map(|(key, m)| {
                    (
                        key.clone(),
                        MotivationPayload {
                            name: m.name.clone(),
                            weight: m.weight,
                            threshold_percentage: m.threshold_percentage,
                            enabled: m.enabled,
                        },
                    )
                })
                .collect(),
            risk_levels: RiskLevelsPayload {
                base_levels: BaseLevelsPayload {
                    monthly_exceeded: levels.base_levels.monthly_exceeded.0.clone(),
                    weekly_or_daily_exceeded: levels.base_levels.weekly_or_daily_exceeded.0.clone(),
                    default: levels.base_levels.default.0.clone(),
                },
                escalation_rules: levels
                    .escalation_rules
                    .iter()
                    .map(|(tier, rule)| {
                        (
                            tier.0.clone(),
                            EscalationRulePayload {
                                major_aggravants: rule
                                    .major_aggravants
                                    .as_ref()
                                    .map(|l| l.0.clone()),
                                minor_aggravants: rule
                                    .minor_aggravants
                                    .as_ref()
                                    .map(|l| l.0.clone()),
                                any_aggravants: rule.any_aggravants.as_ref().map(|l| l.0.clone()),
                            },
                        )
                    })
                    .collect(),
                score_mapping: levels
                    .score_mapping
                    .iter()
                    .map(|(tier, score)| (tier.0.clone(), *score))
                    .collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE_JSON: &str = r#"{
        "volumeThresholds": { "daily": 2500, "weekly": 8000.5, "monthly": 12000 },
        "riskMotivations": {
            "frazionate": { "name": "Operazioni frazionate", "weight": "major", "enabled": true },
            "bonus_concentration": { "name": "Bonus", "weight": "major", "threshold_percentage": 25, "enabled": false },
            "casino_live": { "name": "Casino live", "weight": "minor", "threshold_percentage": 50, "enabled": true },
            "volumes_daily": { "name": "Volumi giornalieri", "weight": "base", "enabled": true }
        },
        "riskLevels": {
            "base_levels": { "monthly_exceeded": "High", "weekly_or_daily_exceeded": "Medium", "default": "Low" },
            "escalation_rules": {
                "Low": { "major_aggravants": "Medium", "minor_aggravants": "Medium" },
                "Medium": { "major_aggravants": "High" },
                "High": { "any_aggravants": "Elevato" }
            },
            "score_mapping": { "Low": 10, "Medium": 40, "High": 70, "Elevato": 95 }
        }
    }"#;

    #[test]
    fn default_config_is_valid() {
        let config = RiskConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.volume_thresholds.daily_minor, 500_000);
        assert_eq!(config.score_of(&RiskLevel::from("Elevato")), Some(100));
        assert_eq!(config.risk_levels.base_levels.default, RiskLevel::from("Low"));
    }

    #[test]
    fn service_payload_converts() {
        let payload: RiskConfigPayload = serde_json::from_str(SERVICE_JSON).unwrap();
        let config = RiskConfig::try_from(payload).unwrap();

        assert_eq!(config.volume_thresholds.daily_minor, 250_000);
        assert_eq!(config.volume_thresholds.weekly_minor, 800_050);
        assert!(!config.is_enabled(MOTIVATION_BONUS));
        assert_eq!(config.threshold_percentage(MOTIVATION_CASINO_LIVE, 40.0), 50.0);
        assert_eq!(config.display_name(MOTIVATION_STRUCTURING), "Operazioni frazionate");
        assert_eq!(config.version, "unversioned");
    }

    #[test]
    fn missing_motivations_keep_defaults() {
        let payload: RiskConfigPayload = serde_json::from_str(SERVICE_JSON).unwrap();
        let config = RiskConfig::try_from(payload).unwrap();
        let weekly = config.motivation("volumes_weekly").unwrap();
        assert!(weekly.enabled);
        assert_eq!(weekly.weight, MotivationWeight::Base);
    }

    #[test]
    fn unmapped_base_level_is_rejected() {
        let mut payload = RiskConfig::default().to_payload();
        payload.risk_levels.base_levels.default = "Unknown".into();
        let err = RiskConfig::try_from(payload).unwrap_err();
        assert!(matches!(err, RiskError::InvalidConfig(_)));
        assert!(err.to_string().contains("Unknown"));
    }

    #[test]
    fn unmapped_escalation_target_is_rejected() {
        let mut payload = RiskConfig::default().to_payload();
        payload.risk_levels.escalation_rules.insert(
            "Elevato".into(),
            EscalationRulePayload {
                any_aggravants: Some("Critico".into()),
                ..Default::default()
            },
        );
        assert!(RiskConfig::try_from(payload).is_err());
    }

    #[test]
    fn score_lowering_escalation_is_rejected() {
        let mut payload = RiskConfig::default().to_payload();
        payload
            .risk_levels
            .escalation_rules
            .get_mut("Medium")
            .unwrap()
            .major_aggravants = Some("Low".into());
        let err = RiskConfig::try_from(payload).unwrap_err();
        assert!(err.to_string().contains("lowers the score"));
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let mut payload = RiskConfig::default().to_payload();
        payload.volume_thresholds.monthly = -1.0;
        assert!(RiskConfig::try_from(payload).is_err());
    }

    #[test]
    fn malformed_json_fails_to_decode() {
        let missing_levels = r#"{ "volumeThresholds": { "daily": 1, "weekly": 2, "monthly": 3 } }"#;
        assert!(serde_json::from_str::<RiskConfigPayload>(missing_levels).is_err());
    }

    #[test]
    fn default_payload_converts_back() {
        let config = RiskConfig::default();
        let converted = RiskConfig::try_from(config.to_payload()).unwrap();
        assert_eq!(converted, config);
    }
}
