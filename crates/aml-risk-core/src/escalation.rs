use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{MotivationWeight, RiskConfig, RiskLevels};
use crate::patterns::AggravatingSignals;
use crate::types::RiskLevel;

/// Edge label of the escalation graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggravantClass {
    Major,
    Minor,
    /// Catch-all edge, consulted when no specific edge applies.
    Any,
}

/// Escalation graph flattened into a (tier, class) → tier lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EscalationMatrix {
    edges: BTreeMap<(RiskLevel, AggravantClass), RiskLevel>,
}

impl EscalationMatrix {
    pub fn from_levels(levels: &RiskLevels) -> Self {
        let mut edges = BTreeMap::new();
        for (tier, rule) in &levels.escalation_rules {
            for (class, target) in [
                (AggravantClass::Major, &rule.major_aggravants),
                (AggravantClass::Minor, &rule.minor_aggravants),
                (AggravantClass::Any, &rule.any_aggravants),
            ] {
                if let Some(target) = target {
                    edges.insert((tier.clone(), class), target.clone());
                }
            }
        }
        Self { edges }
    }

    pub fn target(&self, from: &RiskLevel, class: AggravantClass) -> Option<&RiskLevel> {
        self.edges.get(&(from.clone(), class))
    }

    pub fn edges(&self) -> impl Iterator<Item = (&RiskLevel, AggravantClass, &RiskLevel)> {
        self.edges
            .iter()
            .map(|((from, class), to)| (from, *class, to))
    }
}

/// Outcome of the single escalation step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escalation {
    pub level: RiskLevel,
    /// Edge taken, `None` when the base tier was kept.
    pub applied: Option<AggravantClass>,
    /// Display names of the aggravants that justified the transition.
    pub motivations: Vec<String>,
}

/// Apply at most one escalation hop to `base`.
///
/// Fired signals are split into major and minor by the weight of their
/// motivation. The major edge is tried first, then the minor edge, then the
/// `any` edge. Motivations are reported only when a transition happens.
pub fn escalate(config: &RiskConfig, base: &RiskLevel, signals: &AggravatingSignals) -> Escalation {
    let matrix = EscalationMatrix::from_levels(&config.risk_levels);

    let mut majors = Vec::new();
    let mut minors = Vec::new();
    let mut aggravants = Vec::new();
    for key in signals.fired() {
        let weight = config.motivation(key).map(|m| m.weight);
        match weight {
            Some(MotivationWeight::Major) => majors.push(key),
            Some(MotivationWeight::Minor) => minors.push(key),
            _ => continue,
        }
        aggravants.push(key);
    }

    let step = [
        (AggravantClass::Major, &majors),
        (AggravantClass::Minor, &minors),
        (AggravantClass::Any, &aggravants),
    ]
    .into_iter()
    .filter(|(_, keys)| !keys.is_empty())
    .find_map(|(class, keys)| matrix.target(base, class).map(|to| (class, to, keys)));

    match step {
        Some((class, to, keys)) => {
            debug!(from = %base, to = %to, class = ?class, "escalated");
            Escalation {
                level: to.clone(),
                applied: Some(class),
                motivations: keys
                    .iter()
                    .map(|key| config.display_name(key).to_string())
                    .collect(),
            }
        }
        None => Escalation {
            level: base.clone(),
            applied: None,
            motivations: Vec::new(),
        },
    }
}
