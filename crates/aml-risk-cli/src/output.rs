//! Verdict rendering

use std::fmt::Write;

use aml_risk_core::types::format_minor;
use aml_risk_core::{RiskResult, VolumeSummary};
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

pub fn render(result: &RiskResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => Ok(render_text(result)),
    }
}

fn render_text(result: &RiskResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "level:       {}", result.level);
    if result.base_level != result.level {
        let _ = writeln!(out, "base level:  {}", result.base_level);
    }
    let _ = writeln!(out, "score:       {}", result.score);
    let _ = writeln!(out, "config:      {}", result.config_version);

    if result.motivations.is_empty() {
        let _ = writeln!(out, "motivations: none");
    } else {
        let _ = writeln!(out, "motivations:");
        for motivation in &result.motivations {
            let _ = writeln!(out, "  - {motivation}");
        }
    }

    summary_line(&mut out, "deposits:   ", result.deposit_summary.as_ref());
    summary_line(&mut out, "withdrawals:", result.withdrawal_summary.as_ref());
    out
}

fn summary_line(out: &mut String, label: &str, summary: Option<&VolumeSummary>) {
    let Some(summary) = summary else {
        let _ = writeln!(out, "{label} none");
        return;
    };
    let _ = write!(
        out,
        "{label} {} over {} day(s), {} movement(s)",
        format_minor(summary.total_minor),
        summary.span_days,
        summary.transactions.len()
    );
    if let Some(peak) = &summary.peak_window {
        let _ = write!(
            out,
            ", 7-day peak {} from {}",
            format_minor(peak.total_minor),
            peak.start.format("%Y-%m-%d")
        );
    }
    let _ = writeln!(out);
    for method in &summary.method_breakdown {
        let _ = writeln!(
            out,
            "    {:<12} {:>12} {:>6.1}% ({})",
            method.method,
            format_minor(method.volume_minor),
            method.percentage,
            method.count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aml_risk_core::{EvaluationRequest, Movement, RiskEngine, StaticConfigProvider};
    use std::sync::Arc;

    fn verdict() -> RiskResult {
        let engine = RiskEngine::new(Arc::new(StaticConfigProvider::default()));
        engine.evaluate(&EvaluationRequest::from_movements(vec![
            Movement::new("2024-03-04 09:00:00", "Ricarica", 3_000.0),
            Movement::new("2024-03-04 10:00:00", "Ricarica", 3_000.0),
        ]))
    }

    #[test]
    fn text_lists_level_score_and_motivations() {
        let text = render(&verdict(), OutputFormat::Text).unwrap();
        assert!(text.contains("level:       Medium"));
        assert!(text.contains("score:       50"));
        assert!(text.contains("  - Daily volume threshold exceeded"));
        assert!(text.contains("deposits:    6000.00 over 1 day(s)"));
        assert!(text.contains("withdrawals: none"));
    }

    #[test]
    fn json_is_the_serialized_result() {
        let result = verdict();
        let json = render(&result, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["score"], 50);
        assert_eq!(value["level"], "Medium");
    }
}
