use chrono::{Datelike, Days, NaiveDate};

use crate::model::attendance::DailyAttendanceRecord;

/// Monday on or before `reference`.
pub fn week_start(reference: NaiveDate) -> NaiveDate {
    let back = reference.weekday().num_days_from_monday() as u64;
    reference - Days::new(back)
}

/// Sum of worked hours for records dated within `[week_start, as_of]`.
///
/// Days missing a punch count as zero here; full precision is kept.
pub fn weekly_total(records: &[DailyAttendanceRecord], week_start: NaiveDate, as_of: NaiveDate) -> f64 {
    records
        .iter()
        .filter(|r| r.date >= week_start && r.date <= as_of)
        .map(|r| r.worked_hours.hours_or_zero())
        .sum()
}
