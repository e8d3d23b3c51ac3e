//! End-to-end verdicts for the reference account histories.

use std::sync::Arc;

use aml_risk_core::*;

fn engine() -> RiskEngine {
    RiskEngine::new(Arc::new(StaticConfigProvider::default()))
}

fn daily_motivation() -> String {
    "Daily volume threshold exceeded: deposits of 6000.00 on 2024-03-04 exceed the daily threshold of 5000.00"
        .to_string()
}

fn two_deposits_same_day() -> EvaluationRequest {
    EvaluationRequest::from_movements(vec![
        Movement::new("2024-03-04 09:00:00", "Ricarica conto", 3_000.0).with_payment_method("Visa"),
        Movement::new("2024-03-04 17:30:00", "Ricarica conto", 3_000.0).with_payment_method("Visa"),
    ])
}

fn group_of(movements: &[Movement]) -> FractionationGroup {
    FractionationGroup {
        window_start: "2024-03-04 09:00:00".into(),
        window_end: "2024-03-04 17:30:00".into(),
        total: 6_000.0,
        movements: movements.to_vec(),
    }
}

#[test]
fn single_deposit_under_daily_ceiling() {
    let request = EvaluationRequest::from_movements(vec![Movement::new(
        "2024-03-04 10:00:00",
        "Ricarica",
        4_999.0,
    )]);
    let result = engine().evaluate(&request);

    assert_eq!(result.level, RiskLevel::from("Low"));
    assert_eq!(result.score, 20);
    assert!(result.motivations.is_empty());
    assert!(result.motivation_triggers.is_empty());

    let deposits = result.deposit_summary.expect("deposit summary");
    assert_eq!(deposits.total_minor, 499_900);
    assert_eq!(deposits.span_days, 1);
}

#[test]
fn same_day_deposits_exceed_daily_ceiling() {
    let result = engine().evaluate(&two_deposits_same_day());

    assert_eq!(result.base_level, RiskLevel::from("Medium"));
    assert_eq!(result.level, RiskLevel::from("Medium"));
    assert_eq!(result.score, 50);
    assert_eq!(result.motivations, vec![daily_motivation()]);

    let trigger = &result.motivation_triggers[&daily_motivation()];
    assert_eq!(trigger.granularity, Granularity::Daily);
    assert_eq!(trigger.bucket_key, "2024-03-04");
    assert_eq!(trigger.direction, Direction::Deposits);

    let deposits = result.deposit_summary.expect("deposit summary");
    assert_eq!(deposits.method_breakdown.len(), 1);
    assert_eq!(deposits.method_breakdown[0].method, "Carta");
    assert_eq!(deposits.method_breakdown[0].count, 2);
}

#[test]
fn structuring_escalates_medium_to_high() {
    let mut request = two_deposits_same_day();
    request.deposit_groups.push(group_of(&request.movements));

    let result = engine().evaluate(&request);

    assert_eq!(result.base_level, RiskLevel::from("Medium"));
    assert_eq!(result.level, RiskLevel::from("High"));
    assert_eq!(result.score, 80);
    assert!(result.signals.structuring);
    assert_eq!(
        result.motivations,
        vec![daily_motivation(), "Fractionated transactions".to_string()]
    );
}

#[test]
fn cancelled_withdrawal_is_fully_excluded() {
    let request = EvaluationRequest::from_movements(vec![
        Movement::new("2024-03-04 10:00:00", "Prelievo vincite", 200.0).with_reference("WD-7781"),
        Movement::new("2024-03-04 15:00:00", "Annullamento prelievo", 200.0)
            .with_reference("WD-7781"),
    ]);
    let result = engine().evaluate(&request);

    let withdrawn = result
        .withdrawal_summary
        .as_ref()
        .map_or(0, |summary| summary.total_minor);
    assert_eq!(withdrawn, 0);
    assert!(result
        .withdrawal_summary
        .map_or(true, |summary| summary.transactions.is_empty()));
    assert_eq!(result.level, RiskLevel::from("Low"));
}

#[test]
fn live_game_play_escalates_default_tier() {
    let request = EvaluationRequest::from_movements(vec![
        Movement::new("2024-03-04 20:00:00", "Roulette Live", 10.0),
        Movement::new("2024-03-04 20:10:00", "Blackjack live", 10.0),
        Movement::new("2024-03-04 20:20:00", "Baccarat live", 10.0),
        Movement::new("2024-03-04 20:30:00", "Slot Book of Ra", 10.0),
        Movement::new("2024-03-04 20:40:00", "Poker cash game", 10.0),
    ]);
    let result = engine().evaluate(&request);

    assert!(result.signals.casino_live);
    assert!(!result.signals.structuring);
    assert!(!result.signals.bonus_concentration);
    assert_eq!(result.base_level, RiskLevel::from("Low"));
    assert_eq!(result.level, RiskLevel::from("Medium"));
    assert_eq!(result.score, 50);
    assert_eq!(result.motivations, vec!["Live casino concentration".to_string()]);
    assert!(result.deposit_summary.is_none());
    assert!(result.withdrawal_summary.is_none());
}

#[test]
fn withdrawal_side_structuring_also_counts() {
    let mut request = EvaluationRequest::from_movements(vec![Movement::new(
        "2024-03-04 10:00:00",
        "Prelievo",
        100.0,
    )]);
    request.withdrawal_groups.push(FractionationGroup::default());
    let result = engine().evaluate(&request);
    assert_eq!(result.level, RiskLevel::from("High"));
}

#[test]
fn monthly_breach_with_aggravant_reaches_top_tier() {
    let movements: Vec<Movement> = (1..=4)
        .map(|day| Movement::new(format!("2024-03-{:02} 12:00:00", day * 7), "Deposito", 4_000.0))
        .collect();
    let mut request = EvaluationRequest::from_movements(movements);
    request.pattern_labels.push("bonus_abuse".into());

    let result = engine().evaluate(&request);

    assert_eq!(result.base_level, RiskLevel::from("High"));
    assert_eq!(result.level, RiskLevel::from("Elevato"));
    assert_eq!(result.score, 100);
    assert_eq!(
        result.motivations.last().map(String::as_str),
        Some("Bonus concentration")
    );
}

#[test]
fn evaluation_is_idempotent() {
    let mut request = two_deposits_same_day();
    request.deposit_groups.push(group_of(&request.movements));
    request.movements.push(
        Movement::new("2024-03-05 10:00:00", "Prelievo", 500.0).with_payment_method("Bonifico"),
    );
    request.access_logs.push(AccessLogEntry {
        timestamp: "2024-03-05 09:59:00".into(),
        ip_address: Some("10.0.0.4".into()),
        device: None,
    });

    let engine = engine();
    let first = engine.evaluate(&request);
    let second = engine.evaluate(&request);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn custom_snapshot_changes_verdict() {
    let mut config = RiskConfig::default();
    config.version = "2024-06".into();
    config.volume_thresholds.daily_minor = 1_000_000;

    let engine = RiskEngine::new(Arc::new(StaticConfigProvider::new(config)));
    let result = engine.evaluate(&two_deposits_same_day());

    assert_eq!(result.level, RiskLevel::from("Low"));
    assert_eq!(result.config_version, "2024-06");
}

#[test]
fn deposit_equal_to_daily_ceiling_stays_default() {
    let at_ceiling = EvaluationRequest::from_movements(vec![Movement::new(
        "2024-03-04 10:00:00",
        "Ricarica",
        5_000.00,
    )]);
    let result = engine().evaluate(&at_ceiling);
    assert_eq!(result.level, RiskLevel::from("Low"));
    assert!(result.motivations.is_empty());

    let one_cent_above = EvaluationRequest::from_movements(vec![Movement::new(
        "2024-03-04 10:00:00",
        "Ricarica",
        5_000.01,
    )]);
    let result = engine().evaluate(&one_cent_above);
    assert_eq!(result.base_level, RiskLevel::from("Medium"));
    assert_eq!(result.level, RiskLevel::from("Medium"));
    assert_eq!(result.motivation_triggers.len(), 1);
}

#[test]
fn enormous_deposits_reach_monthly_tier() {
    let request = EvaluationRequest::from_movements(vec![
        Movement::new("2024-03-04 09:00:00", "Ricarica", 1e18),
        Movement::new("2024-03-05 09:00:00", "Ricarica", 1e18),
    ]);
    let result = engine().evaluate(&request);

    assert_eq!(result.base_level, RiskLevel::from("High"));
    assert_eq!(result.score, 80);
    let deposits = result.deposit_summary.expect("deposit summary");
    assert_eq!(deposits.total_minor, i64::MAX);
}
