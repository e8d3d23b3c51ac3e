//! Aggravating behaviour signals.
//!
//! Each signal is gated by the `enabled` flag of its motivation. Percentage
//! checks compare `count * 100 / total` against the configured threshold and
//! never fire on an empty denominator.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::{MovementClassifier, MovementKind};
use crate::config::{
    RiskConfig, DEFAULT_BONUS_THRESHOLD_PCT, DEFAULT_CASINO_LIVE_THRESHOLD_PCT, MOTIVATION_BONUS,
    MOTIVATION_CASINO_LIVE, MOTIVATION_STRUCTURING,
};
use crate::types::{EvaluationRequest, Movement};

/// Upstream label fragments that flag bonus abuse.
const ABUSE_LABEL_MARKERS: &[&str] = &["abuse", "abuso"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggravatingSignals {
    pub structuring: bool,
    pub bonus_concentration: bool,
    pub casino_live: bool,
}

impl AggravatingSignals {
    pub fn any(&self) -> bool {
        self.structuring || self.bonus_concentration || self.casino_live
    }

    /// Motivation keys of the fired signals, in signal order.
    pub fn fired(&self) -> Vec<&'static str> {
        [
            (self.structuring, MOTIVATION_STRUCTURING),
            (self.bonus_concentration, MOTIVATION_BONUS),
            (self.casino_live, MOTIVATION_CASINO_LIVE),
        ]
        .into_iter()
        .filter_map(|(fired, key)| fired.then_some(key))
        .collect()
    }
}

/// Run every detector. `kinds[i]` classifies `request.movements[i]`.
pub fn detect<C>(
    config: &RiskConfig,
    request: &EvaluationRequest,
    kinds: &[MovementKind],
    classifier: &C,
) -> AggravatingSignals
where
    C: MovementClassifier + ?Sized,
{
    let signals = AggravatingSignals {
        structuring: detect_structuring(config, request),
        bonus_concentration: detect_bonus_concentration(
            config,
            &request.pattern_labels,
            &request.movements,
            classifier,
        ),
        casino_live: detect_casino_live(config, &request.movements, kinds, classifier),
    };
    debug!(
        structuring = signals.structuring,
        bonus_concentration = signals.bonus_concentration,
        casino_live = signals.casino_live,
        "aggravating signals"
    );
    signals
}

/// Presence of any precomputed fractionation group, either side.
pub fn detect_structuring(config: &RiskConfig, request: &EvaluationRequest) -> bool {
    config.is_enabled(MOTIVATION_STRUCTURING)
        && (!request.deposit_groups.is_empty() || !request.withdrawal_groups.is_empty())
}

pub fn detect_bonus_concentration<C>(
    config: &RiskConfig,
    labels: &[String],
    movements: &[Movement],
    classifier: &C,
) -> bool
where
    C: MovementClassifier + ?Sized,
{
    if !config.is_enabled(MOTIVATION_BONUS) {
        return false;
    }
    if labels.iter().any(|label| is_abuse_label(label)) {
        return true;
    }

    let bonus = movements
        .iter()
        .filter(|m| classifier.mentions_bonus(m.reason.as_deref()))
        .count();
    share_reaches(
        bonus,
        movements.len(),
        config.threshold_percentage(MOTIVATION_BONUS, DEFAULT_BONUS_THRESHOLD_PCT),
    )
}

/// Live-dealer share among game-play movements. Bonus credits are not
/// game play even though the classifier reports them as `Other`.
pub fn detect_casino_live<C>(
    config: &RiskConfig,
    movements: &[Movement],
    kinds: &[MovementKind],
    classifier: &C,
) -> bool
where
    C: MovementClassifier + ?Sized,
{
    if !config.is_enabled(MOTIVATION_CASINO_LIVE) {
        return false;
    }

    let mut game_play = 0;
    let mut live = 0;
    for (movement, kind) in movements.iter().zip(kinds) {
        let reason = movement.reason.as_deref();
        if *kind != MovementKind::Other || classifier.mentions_bonus(reason) {
            continue;
        }
        game_play += 1;
        if classifier.mentions_live(reason) {
            live += 1;
        }
    }

    share_reaches(
        live,
        game_play,
        config.threshold_percentage(MOTIVATION_CASINO_LIVE, DEFAULT_CASINO_LIVE_THRESHOLD_PCT),
    )
}

fn is_abuse_label(label: &str) -> bool {
    let label = label.to_lowercase();
    ABUSE_LABEL_MARKERS.iter().any(|marker| label.contains(marker))
}

fn share_reaches(count: usize, total: usize, threshold_pct: f64) -> bool {
    if total == 0 {
        return false;
    }
    count as f64 * 100.0 / total as f64 >= threshold_pct
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::KeywordClassifier;
    use crate::types::FractionationGroup;

    fn kinds_of(movements: &[Movement]) -> Vec<MovementKind> {
        let c = KeywordClassifier::default();
        movements.iter().map(|m| c.classify(m.reason.as_deref())).collect()
    }

    fn play(reason: &str) -> Movement {
        Movement::new("2024-03-01 20:00:00", reason, 5.0)
    }

    #[test]
    fn structuring_needs_a_group() {
        let config = RiskConfig::default();
        let mut request = EvaluationRequest::default();
        assert!(!detect_structuring(&config, &request));

        request.withdrawal_groups.push(FractionationGroup::default());
        assert!(detect_structuring(&config, &request));
    }

    #[test]
    fn disabled_structuring_never_fires() {
        let mut config = RiskConfig::default();
        config
            .motivations
            .get_mut(MOTIVATION_STRUCTURING)
            .unwrap()
            .enabled = false;
        let mut request = EvaluationRequest::default();
        request.deposit_groups.push(FractionationGroup::default());
        assert!(!detect_structuring(&config, &request));
    }

    #[test]
    fn abuse_label_triggers_bonus_concentration() {
        let config = RiskConfig::default();
        let labels = vec!["Possibile ABUSO bonus".to_string()];
        let c = KeywordClassifier::default();
        assert!(detect_bonus_concentration(&config, &labels, &[], &c));
        assert!(!detect_bonus_concentration(&config, &["velocity".to_string()], &[], &c));
    }

    #[test]
    fn bonus_share_meets_threshold_inclusively() {
        let config = RiskConfig::default();
        let c = KeywordClassifier::default();
        // 1 of 10 = 10 %, exactly the default threshold.
        let mut movements: Vec<Movement> = (0..9).map(|_| play("Giocata slot")).collect();
        movements.push(play("Accredito bonus"));
        assert!(detect_bonus_concentration(&config, &[], &movements, &c));

        movements.push(play("Giocata slot"));
        assert!(!detect_bonus_concentration(&config, &[], &movements, &c));
    }

    #[test]
    fn empty_movements_never_trigger_percentages() {
        let config = RiskConfig::default();
        let c = KeywordClassifier::default();
        assert!(!detect_bonus_concentration(&config, &[], &[], &c));
        assert!(!detect_casino_live(&config, &[], &[], &c));
    }

    #[test]
    fn casino_live_counts_only_game_play() {
        let config = RiskConfig::default();
        let c = KeywordClassifier::default();
        let movements = vec![
            play("Roulette live"),
            play("Slot"),
            play("Slot"),
            play("Bonus live"),
            Movement::new("2024-03-01", "Ricarica live", 50.0),
        ];
        // Game play: roulette live, slot, slot => 1/3 < 40 %.
        assert!(!detect_casino_live(&config, &movements, &kinds_of(&movements), &c));

        let movements = vec![play("Roulette live"), play("Slot")];
        assert!(detect_casino_live(&config, &movements, &kinds_of(&movements), &c));
    }

    #[test]
    fn configured_percentage_overrides_default() {
        let mut config = RiskConfig::default();
        config
            .motivations
            .get_mut(MOTIVATION_CASINO_LIVE)
            .unwrap()
            .threshold_percentage = Some(75.0);
        let c = KeywordClassifier::default();
        let movements = vec![play("Blackjack live"), play("Slot")];
        assert!(!detect_casino_live(&config, &movements, &kinds_of(&movements), &c));
    }

    #[test]
    fn fired_keys_follow_signal_order() {
        let signals = AggravatingSignals {
            structuring: true,
            bonus_concentration: false,
            casino_live: true,
        };
        assert!(signals.any());
        assert_eq!(signals.fired(), vec![MOTIVATION_STRUCTURING, MOTIVATION_CASINO_LIVE]);
        assert!(!AggravatingSignals::default().any());
    }
}
