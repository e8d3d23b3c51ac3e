use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Timestamp layouts accepted besides RFC 3339, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

/// Config-defined risk tier name, e.g. "Low", "Medium", "High", "Elevato".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RiskLevel(pub String);

impl RiskLevel {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RiskLevel {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

/// One financial event on the account, as produced by the upstream parser.
///
/// Fields are kept raw: the engine decides what is usable. A timestamp that
/// does not parse removes the movement from aggregation, a missing or
/// non-finite amount contributes zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub timestamp: String,
    #[serde(default)]
    pub reason: Option<String>,
    /// Amount in major units; the sign is ignored for volume purposes.
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub reference_id: Option<String>,
}

impl Movement {
    pub fn new(timestamp: impl Into<String>, reason: impl Into<String>, amount: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            reason: Some(reason.into()),
            amount: Some(amount),
            payment_method: None,
            reference_id: None,
        }
    }

    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    pub fn with_reference(mut self, reference_id: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id.into());
        self
    }

    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }

    /// Absolute amount in cents. Missing, NaN and infinite amounts yield 0.
    pub fn volume_minor(&self) -> i64 {
        match self.amount {
            Some(amount) if amount.is_finite() => (amount.abs() * 100.0).round() as i64,
            _ => 0,
        }
    }

    /// Reference id with surrounding whitespace removed; blank ids count as absent.
    pub fn reference(&self) -> Option<&str> {
        self.reference_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Parse a movement timestamp into wall-clock time.
///
/// RFC 3339 values keep their local wall clock so that calendar buckets match
/// what the operator sees on the statement.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// A precomputed cluster of movements considered structured.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FractionationGroup {
    #[serde(default)]
    pub window_start: String,
    #[serde(default)]
    pub window_end: String,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub movements: Vec<Movement>,
}

/// Login record; accepted for future login-pattern signals.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
}

/// Everything one evaluation consumes besides the configuration snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    #[serde(default)]
    pub deposit_groups: Vec<FractionationGroup>,
    #[serde(default)]
    pub withdrawal_groups: Vec<FractionationGroup>,
    #[serde(default)]
    pub pattern_labels: Vec<String>,
    #[serde(default)]
    pub movements: Vec<Movement>,
    #[serde(default)]
    pub access_logs: Vec<AccessLogEntry>,
}

impl EvaluationRequest {
    pub fn from_movements(movements: Vec<Movement>) -> Self {
        Self {
            movements,
            ..Self::default()
        }
    }
}

/// Direction of money flow a summary or bucket refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Deposits,
    Withdrawals,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Deposits => "deposits",
            Direction::Withdrawals => "withdrawals",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Calendar granularity of a volume bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [
        Granularity::Daily,
        Granularity::Weekly,
        Granularity::Monthly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::Monthly => "monthly",
        }
    }

    /// Key of the motivation toggling this granularity's threshold check.
    pub fn motivation_key(&self) -> &'static str {
        match self {
            Granularity::Daily => "volumes_daily",
            Granularity::Weekly => "volumes_weekly",
            Granularity::Monthly => "volumes_monthly",
        }
    }

    pub fn bucket_phrase(&self, bucket_key: &str) -> String {
        match self {
            Granularity::Daily => format!("on {bucket_key}"),
            Granularity::Weekly => format!("in week {bucket_key}"),
            Granularity::Monthly => format!("in month {bucket_key}"),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The window a volume motivation was raised for, so a reviewer can drill in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotivationTrigger {
    pub granularity: Granularity,
    pub bucket_key: String,
    pub direction: Direction,
}

/// Highest 7-day rolling volume.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeakWindow {
    pub total_minor: i64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Volume moved through one payment method.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MethodVolume {
    pub method: String,
    pub volume_minor: i64,
    pub percentage: f64,
    pub count: usize,
}

/// Derived statistics for one direction. Recomputed on every evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolumeSummary {
    pub direction: Direction,
    pub total_minor: i64,
    pub span_days: i64,
    pub average_per_day_minor: f64,
    pub peak_window: Option<PeakWindow>,
    pub method_breakdown: Vec<MethodVolume>,
    /// Contributing movements in input order.
    pub transactions: Vec<Movement>,
}

/// Render cents as a plain decimal amount, e.g. `600000` → `"6000.00"`.
pub fn format_minor(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let abs = minor.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
