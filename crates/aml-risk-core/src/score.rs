use tracing::error;

use crate::config::RiskLevels;
use crate::error::RiskError;
use crate::types::RiskLevel;

pub fn score_for(levels: &RiskLevels, level: &RiskLevel) -> Result<i64, RiskError> {
    levels
        .score_mapping
        .get(level)
        .copied()
        .ok_or_else(|| RiskError::UnmappedLevel {
            level: level.to_string(),
        })
}

/// Score of `level`, or 0 with an error log when the tier is unmapped.
pub fn score_or_zero(levels: &RiskLevels, level: &RiskLevel) -> i64 {
    match score_for(levels, level) {
        Ok(score) => score,
        Err(err) => {
            error!(level = %level, error = %err, "risk level has no score, using 0");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiskConfig;

    #[test]
    fn mapped_levels_score() {
        let levels = RiskConfig::default().risk_levels;
        assert_eq!(score_for(&levels, &RiskLevel::from("Medium")), Ok(50));
        assert_eq!(score_or_zero(&levels, &RiskLevel::from("Elevato")), 100);
    }

    #[test]
    fn unmapped_level_is_an_error_and_scores_zero() {
        let levels = RiskConfig::default().risk_levels;
        let missing = RiskLevel::from("Critico");
        assert_eq!(
            score_for(&levels, &missing),
            Err(RiskError::UnmappedLevel {
                level: "Critico".into()
            })
        );
        assert_eq!(score_or_zero(&levels, &missing), 0);
    }
}
