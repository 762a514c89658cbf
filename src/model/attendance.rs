use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Daily hours at or above which a day counts as on time.
pub const ON_TIME_HOURS: f64 = 8.0;
/// Lower bound of the borderline band.
pub const BORDERLINE_HOURS: f64 = 7.5;
/// Raw spans strictly longer than this include an unpaid lunch.
pub const LUNCH_THRESHOLD_HOURS: f64 = 9.0;
pub const LUNCH_DEDUCTION_HOURS: f64 = 1.0;

/// One badge scan as delivered by the terminal feed or the `attendance_logs` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RawPunch {
    #[schema(example = "M-0042")]
    pub employee_id: String,
    /// RFC 3339, or plant-local `YYYY-MM-DDTHH:MM[:SS]`
    #[schema(example = "2024-01-02T08:00:00")]
    pub log_time: String,
    /// `IN` or `OUT`, any case
    #[schema(example = "IN")]
    pub status: String,
}

impl RawPunch {
    pub fn new(
        employee_id: impl Into<String>,
        log_time: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            log_time: log_time.into(),
            status: status.into(),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    /// Parses a feed status, ignoring case and surrounding whitespace.
    pub fn from_status(status: &str) -> Option<Self> {
        status.trim().parse().ok()
    }
}

/// A punch whose employee and timestamp were accepted.
/// `direction` is `None` when the feed carried an unrecognised status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PunchEvent {
    pub employee_id: String,
    pub timestamp: DateTime<FixedOffset>,
    pub direction: Option<Direction>,
}

/// Worked hours for a day, or the marker for a day missing a punch.
///
/// The sentinel is a separate variant so that a genuine zero-length shift
/// and a missing punch can never be confused.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum WorkedHours {
    Measured(f64),
    InsufficientData,
}

impl WorkedHours {
    /// Full-precision value, `None` for the sentinel.
    pub fn hours(&self) -> Option<f64> {
        match self {
            WorkedHours::Measured(h) => Some(*h),
            WorkedHours::InsufficientData => None,
        }
    }

    /// Value used by aggregates, where a missing punch contributes nothing.
    pub fn hours_or_zero(&self) -> f64 {
        self.hours().unwrap_or(0.0)
    }

    /// Display value, rounded to two decimals.
    pub fn rounded(&self) -> Option<f64> {
        self.hours().map(round2)
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, WorkedHours::InsufficientData)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum QualityTag {
    OnTime,
    Borderline,
    Short,
    Insufficient,
}

impl QualityTag {
    pub fn classify(worked: WorkedHours) -> Self {
        match worked {
            WorkedHours::InsufficientData => QualityTag::Insufficient,
            WorkedHours::Measured(h) if h >= ON_TIME_HOURS => QualityTag::OnTime,
            WorkedHours::Measured(h) if h >= BORDERLINE_HOURS => QualityTag::Borderline,
            WorkedHours::Measured(_) => QualityTag::Short,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyAttendanceRecord {
    pub employee_id: String,
    pub date: NaiveDate,
    pub first_in: Option<DateTime<FixedOffset>>,
    pub last_out: Option<DateTime<FixedOffset>>,
    pub worked_hours: WorkedHours,
    pub quality_tag: QualityTag,
}

impl DailyAttendanceRecord {
    /// Raw presence span (`last_out - first_in`) in hours, before the lunch deduction.
    pub fn presence_hours(&self) -> Option<f64> {
        match (self.first_in, self.last_out) {
            (Some(i), Some(o)) if o >= i => Some(span_hours(i, o)),
            _ => None,
        }
    }
}

pub fn span_hours(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parsing_ignores_case_and_whitespace() {
        assert_eq!(Direction::from_status("in"), Some(Direction::In));
        assert_eq!(Direction::from_status(" OUT "), Some(Direction::Out));
        assert_eq!(Direction::from_status("Out"), Some(Direction::Out));
        assert_eq!(Direction::from_status("break"), None);
        assert_eq!(Direction::from_status(""), None);
    }

    #[test]
    fn quality_tag_thresholds() {
        assert_eq!(QualityTag::classify(WorkedHours::Measured(8.0)), QualityTag::OnTime);
        assert_eq!(QualityTag::classify(WorkedHours::Measured(9.25)), QualityTag::OnTime);
        assert_eq!(QualityTag::classify(WorkedHours::Measured(7.99)), QualityTag::Borderline);
        assert_eq!(QualityTag::classify(WorkedHours::Measured(7.5)), QualityTag::Borderline);
        assert_eq!(QualityTag::classify(WorkedHours::Measured(7.49)), QualityTag::Short);
        assert_eq!(QualityTag::classify(WorkedHours::Measured(0.0)), QualityTag::Short);
        assert_eq!(
            QualityTag::classify(WorkedHours::InsufficientData),
            QualityTag::Insufficient
        );
    }

    #[test]
    fn quality_tag_renders_kebab_case() {
        assert_eq!(QualityTag::OnTime.to_string(), "on-time");
        assert_eq!(QualityTag::Insufficient.as_ref(), "insufficient");
    }

    #[test]
    fn sentinel_differs_from_zero() {
        let zero = WorkedHours::Measured(0.0);
        let missing = WorkedHours::InsufficientData;
        assert_ne!(zero, missing);
        assert_eq!(zero.rounded(), Some(0.0));
        assert_eq!(missing.rounded(), None);
        assert_eq!(missing.hours_or_zero(), 0.0);
    }

    #[test]
    fn rounding_keeps_two_decimals() {
        assert_eq!(round2(8.456), 8.46);
        assert_eq!(round2(7.333_333), 7.33);
        assert_eq!(WorkedHours::Measured(8.005_1).rounded(), Some(8.01));
    }
}
