use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregation::BucketTotals;
use crate::config::RiskConfig;
use crate::types::{format_minor, Direction, Granularity, MotivationTrigger, RiskLevel};

/// Result of comparing bucket totals against the volume ceilings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdOutcome {
    pub daily_exceeded: bool,
    pub weekly_exceeded: bool,
    pub monthly_exceeded: bool,
    /// One text per exceeded (granularity, direction), in scan order.
    pub motivations: Vec<String>,
    pub triggers: BTreeMap<String, MotivationTrigger>,
    pub base_level: RiskLevel,
}

impl ThresholdOutcome {
    pub fn exceeded(&self, granularity: Granularity) -> bool {
        match granularity {
            Granularity::Daily => self.daily_exceeded,
            Granularity::Weekly => self.weekly_exceeded,
            Granularity::Monthly => self.monthly_exceeded,
        }
    }

    fn mark(&mut self, granularity: Granularity) {
        match granularity {
            Granularity::Daily => self.daily_exceeded = true,
            Granularity::Weekly => self.weekly_exceeded = true,
            Granularity::Monthly => self.monthly_exceeded = true,
        }
    }
}

/// Scan daily, weekly then monthly buckets, deposits before withdrawals.
///
/// A bucket exceeds its ceiling only when strictly greater. Each
/// (granularity, direction) pair stops at its first exceeding bucket. A
/// disabled `volumes_{granularity}` motivation skips that granularity.
pub fn evaluate_thresholds(
    config: &RiskConfig,
    deposits: &BucketTotals,
    withdrawals: &BucketTotals,
) -> ThresholdOutcome {
    let base_levels = &config.risk_levels.base_levels;
    let mut outcome = ThresholdOutcome {
        daily_exceeded: false,
        weekly_exceeded: false,
        monthly_exceeded: false,
        motivations: Vec::new(),
        triggers: BTreeMap::new(),
        base_level: base_levels.default.clone(),
    };

    for granularity in Granularity::ALL {
        let key = granularity.motivation_key();
        if !config.is_enabled(key) {
            debug!(granularity = %granularity, "volume check disabled");
            continue;
        }
        let ceiling = config.volume_thresholds.for_granularity(granularity);

        for (direction, totals) in [
            (Direction::Deposits, deposits),
            (Direction::Withdrawals, withdrawals),
        ] {
            let Some((bucket_key, total)) = totals
                .for_granularity(granularity)
                .iter()
                .find(|&(_, &total)| total > ceiling)
            else {
                continue;
            };

            let text = format!(
                "{}: {} of {} {} exceed the {} threshold of {}",
                config.display_name(key),
                direction,
                format_minor(*total),
                granularity.bucket_phrase(bucket_key),
                granularity,
                format_minor(ceiling),
            );
            debug!(
                granularity = %granularity,
                direction = %direction,
                bucket = %bucket_key,
                total_minor = *total,
                ceiling_minor = ceiling,
                "volume threshold exceeded"
            );

            outcome.mark(granularity);
            outcome.triggers.insert(
                text.clone(),
                MotivationTrigger {
                    granularity,
                    bucket_key: bucket_key.clone(),
                    direction,
                },
            );
            outcome.motivations.push(text);
        }
    }

    outcome.base_level = if outcome.monthly_exceeded {
        base_levels.monthly_exceeded.clone()
    } else if outcome.weekly_exceeded || outcome.daily_exceeded {
        base_levels.weekly_or_daily_exceeded.clone()
    } else {
        base_levels.default.clone()
    };

    outcome
}
