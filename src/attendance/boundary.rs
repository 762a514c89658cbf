use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};

/// Naive layouts accepted from terminal feeds, tried in order.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Timezone used to cut timestamps into calendar days.
///
/// Each plant has its own offset; individual employees (e.g. on mission at
/// another plant) can be pinned to a different one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBoundary {
    plant: FixedOffset,
    overrides: HashMap<String, FixedOffset>,
}

impl Default for DayBoundary {
    fn default() -> Self {
        Self::utc()
    }
}

impl DayBoundary {
    pub fn new(plant: FixedOffset) -> Self {
        Self {
            plant,
            overrides: HashMap::new(),
        }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    pub fn with_employee(mut self, employee_id: impl Into<String>, offset: FixedOffset) -> Self {
        self.overrides.insert(employee_id.into(), offset);
        self
    }

    pub fn offset_for(&self, employee_id: &str) -> FixedOffset {
        self.overrides.get(employee_id).copied().unwrap_or(self.plant)
    }

    /// Parses a feed timestamp for `employee_id`.
    ///
    /// RFC 3339 values keep their own offset; naive values are read as wall
    /// clock time in the employee's zone. Either way the result is expressed
    /// in the employee's zone.
    pub fn parse(&self, employee_id: &str, raw: &str) -> Option<DateTime<FixedOffset>> {
        let raw = raw.trim();
        let offset = self.offset_for(employee_id);

        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&offset));
        }

        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .and_then(|naive| offset.from_local_datetime(&naive).single())
    }

    /// Calendar day of `ts` for `employee_id`.
    pub fn local_date(&self, employee_id: &str, ts: &DateTime<FixedOffset>) -> NaiveDate {
        ts.with_timezone(&self.offset_for(employee_id)).date_naive()
    }

    pub fn local_time(&self, employee_id: &str, ts: &DateTime<FixedOffset>) -> NaiveTime {
        ts.with_timezone(&self.offset_for(employee_id)).time()
    }
}

/// Parses `+HH:MM`, `-HH:MM`, `+HHMM` or `Z` into an offset.
pub fn parse_offset(value: &str) -> Option<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return Some(Utc.fix());
    }

    let (sign, rest) = match value.as_bytes().first()? {
        b'+' => (1, &value[1..]),
        b'-' => (-1, &value[1..]),
        _ => return None,
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
