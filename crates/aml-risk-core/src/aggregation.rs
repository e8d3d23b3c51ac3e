use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::MovementClassifier;
use crate::types::{Direction, Granularity, MethodVolume, Movement, PeakWindow, VolumeSummary};

const SECONDS_PER_DAY: i64 = 86_400;
const PEAK_WINDOW_DAYS: i64 = 7;

/// Per-bucket totals (cents) keyed by `YYYY-MM-DD`, `YYYY-Www` and `YYYY-MM`.
///
/// Keys sort chronologically, so iteration order is the scan order used by
/// the threshold check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTotals {
    pub daily: BTreeMap<String, i64>,
    pub weekly: BTreeMap<String, i64>,
    pub monthly: BTreeMap<String, i64>,
}

impl BucketTotals {
    pub fn for_granularity(&self, granularity: Granularity) -> &BTreeMap<String, i64> {
        match granularity {
            Granularity::Daily => &self.daily,
            Granularity::Weekly => &self.weekly,
            Granularity::Monthly => &self.monthly,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.daily.is_empty()
    }
}

/// Calendar bucket keys for one timestamp.
pub fn bucket_keys(at: NaiveDateTime) -> [(Granularity, String); 3] {
    let week = at.date().iso_week();
    [
        (Granularity::Daily, at.format("%Y-%m-%d").to_string()),
        (
            Granularity::Weekly,
            format!("{}-W{:02}", week.year(), week.week()),
        ),
        (Granularity::Monthly, at.format("%Y-%m").to_string()),
    ]
}

/// Bucket movement volumes by day, ISO week (Monday anchored) and month.
pub fn bucket_totals(movements: &[&Movement]) -> BucketTotals {
    let mut totals = BucketTotals::default();
    for movement in movements {
        let Some(at) = movement.parsed_timestamp() else {
            continue;
        };
        let volume = movement.volume_minor();
        for (granularity, key) in bucket_keys(at) {
            let bucket = match granularity {
                Granularity::Daily => &mut totals.daily,
                Granularity::Weekly => &mut totals.weekly,
                Granularity::Monthly => &mut totals.monthly,
            };
            let total = bucket.entry(key).or_insert(0);
            *total = total.saturating_add(volume);
        }
    }
    totals
}

/// Build the volume summary for one direction.
///
/// Movements without a parseable timestamp are treated as absent. Returns
/// `None` when nothing remains.
pub fn summarize<C>(
    direction: Direction,
    movements: &[&Movement],
    classifier: &C,
) -> Option<VolumeSummary>
where
    C: MovementClassifier + ?Sized,
{
    let dated: Vec<(NaiveDateTime, &Movement)> = movements
        .iter()
        .filter_map(|m| m.parsed_timestamp().map(|at| (at, *m)))
        .collect();

    if dated.is_empty() {
        return None;
    }

    let total_minor = dated
        .iter()
        .map(|(_, m)| m.volume_minor())
        .fold(0_i64, i64::saturating_add);
    let earliest = dated.iter().map(|(at, _)| *at).min()?;
    let latest = dated.iter().map(|(at, _)| *at).max()?;
    let span_days = span_in_days(earliest, latest);

    let mut timeline: Vec<(NaiveDateTime, i64)> = dated
        .iter()
        .map(|(at, m)| (*at, m.volume_minor()))
        .collect();
    timeline.sort_by_key(|(at, _)| *at);

    let summary = VolumeSummary {
        direction,
        total_minor,
        span_days,
        average_per_day_minor: total_minor as f64 / span_days as f64,
        peak_window: peak_window(&timeline),
        method_breakdown: method_breakdown(&dated, total_minor, classifier),
        transactions: dated.iter().map(|(_, m)| (*m).clone()).collect(),
    };

    debug!(
        direction = %direction,
        total_minor,
        span_days,
        movements = summary.transactions.len(),
        "volume summary built"
    );

    Some(summary)
}

/// Whole days between two instants, rounded up, never below one.
fn span_in_days(earliest: NaiveDateTime, latest: NaiveDateTime) -> i64 {
    let seconds = (latest - earliest).num_seconds().max(0);
    let days = (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY;
    days.max(1)
}

/// Maximum volume over `[start, start + 7d]` for every distinct start.
///
/// `timeline` must be sorted by timestamp. The earliest start wins ties.
/// Prefix sums are kept wide and window totals clamp to `i64::MAX`.
fn peak_window(timeline: &[(NaiveDateTime, i64)]) -> Option<PeakWindow> {
    let window = Duration::days(PEAK_WINDOW_DAYS);
    let mut prefix = Vec::with_capacity(timeline.len() + 1);
    prefix.push(0_i128);
    for (_, volume) in timeline {
        let last = prefix.last().copied().unwrap_or(0);
        prefix.push(last + i128::from(*volume));
    }

    let mut best: Option<PeakWindow> = None;
    let mut end = 0;
    for start in 0..timeline.len() {
        if start > 0 && timeline[start].0 == timeline[start - 1].0 {
            continue;
        }
        let window_start = timeline[start].0;
        let window_end = window_start + window;
        while end < timeline.len() && timeline[end].0 <= window_end {
            end += 1;
        }
        let total = i64::try_from(prefix[end] - prefix[start]).unwrap_or(i64::MAX);
        if best.as_ref().map_or(true, |b| total > b.total_minor) {
            best = Some(PeakWindow {
                total_minor: total,
                start: window_start,
                end: window_end,
            });
        }
    }
    best
}

fn method_breakdown<C>(
    dated: &[(NaiveDateTime, &Movement)],
    total_minor: i64,
    classifier: &C,
) -> Vec<MethodVolume>
where
    C: MovementClassifier + ?Sized,
{
    let mut by_method: BTreeMap<String, (i64, usize)> = BTreeMap::new();
    for (_, movement) in dated {
        let method = classifier.payment_method(
            movement.payment_method.as_deref(),
            movement.reason.as_deref(),
        );
        let entry = by_method.entry(method).or_insert((0, 0));
        entry.0 = entry.0.saturating_add(movement.volume_minor());
        entry.1 += 1;
    }

    let mut breakdown: Vec<MethodVolume> = by_method
        .into_iter()
        .map(|(method, (volume_minor, count))| MethodVolume {
            percentage: if total_minor > 0 {
                volume_minor as f64 * 100.0 / total_minor as f64
            } else {
                0.0
            },
            method,
            volume_minor,
            count,
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.volume_minor
            .cmp(&a.volume_minor)
            .then_with(|| a.method.cmp(&b.method))
    });
    breakdown
}
