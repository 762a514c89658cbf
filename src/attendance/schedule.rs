use chrono::{Duration, NaiveTime};
use serde::Serialize;
use strum_macros::{AsRefStr, Display};

use super::boundary::DayBoundary;
use crate::model::attendance::DailyAttendanceRecord;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ArrivalStatus {
    OnTime,
    Late,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum DepartureStatus {
    OnTime,
    Early,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
pub struct Punctuality {
    pub arrival: Option<ArrivalStatus>,
    pub departure: Option<DepartureStatus>,
}

fn last_instant() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}

/// Expected shift hours with grace periods on both ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub late_tolerance: Duration,
    pub early_departure_tolerance: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            late_tolerance: Duration::zero(),
            early_departure_tolerance: Duration::zero(),
        }
    }
}

impl Schedule {
    pub fn new(start: NaiveTime, end: NaiveTime, late_minutes: u32, early_minutes: u32) -> Self {
        Self {
            start,
            end,
            late_tolerance: Duration::minutes(late_minutes.into()),
            early_departure_tolerance: Duration::minutes(early_minutes.into()),
        }
    }

    /// Classifies the day's first IN and last OUT against this shift, in the
    /// employee's local time.
    pub fn punctuality(&self, record: &DailyAttendanceRecord, boundary: &DayBoundary) -> Punctuality {
        // Tolerances never carry a bound into the neighbouring day.
        let latest_arrival = match self.start.overflowing_add_signed(self.late_tolerance) {
            (t, 0) => t,
            _ => last_instant(),
        };
        let earliest_departure = match self.end.overflowing_sub_signed(self.early_departure_tolerance) {
            (t, 0) => t,
            _ => NaiveTime::MIN,
        };

        let arrival = record.first_in.map(|ts| {
            if boundary.local_time(&record.employee_id, &ts) > latest_arrival {
                ArrivalStatus::Late
            } else {
                ArrivalStatus::OnTime
            }
        });

        let departure = record.last_out.map(|ts| {
            if boundary.local_time(&record.employee_id, &ts) < earliest_departure {
                DepartureStatus::Early
            } else {
                DepartureStatus::OnTime
            }
        });

        Punctuality { arrival, departure }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::reconcile;
    use crate::model::attendance::RawPunch;
    use chrono::FixedOffset;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day(punches: &[(&str, &str)], boundary: &DayBoundary) -> DailyAttendanceRecord {
        let raw: Vec<_> = punches
            .iter()
            .map(|(t, d)| RawPunch::new("e1", *t, *d))
            .collect();
        reconcile(&raw, boundary).records.remove(0)
    }

    #[test]
    fn arrival_within_tolerance_is_on_time() {
        let schedule = Schedule::new(hm(8, 0), hm(17, 0), 10, 0);
        let boundary = DayBoundary::utc();

        let record = day(&[("2024-01-02T08:10", "IN"), ("2024-01-02T17:00", "OUT")], &boundary);
        let p = schedule.punctuality(&record, &boundary);
        assert_eq!(p.arrival, Some(ArrivalStatus::OnTime));
        assert_eq!(p.departure, Some(DepartureStatus::OnTime));

        let record = day(&[("2024-01-02T08:11", "IN")], &boundary);
        let p = schedule.punctuality(&record, &boundary);
        assert_eq!(p.arrival, Some(ArrivalStatus::Late));
        assert_eq!(p.departure, None);
    }

    #[test]
    fn early_departure_respects_tolerance() {
        let schedule = Schedule::new(hm(8, 0), hm(17, 0), 0, 15);
        let boundary = DayBoundary::utc();

        let record = day(&[("2024-01-02T16:45", "OUT")], &boundary);
        assert_eq!(
            schedule.punctuality(&record, &boundary).departure,
            Some(DepartureStatus::OnTime)
        );

        let record = day(&[("2024-01-02T16:44", "OUT")], &boundary);
        let p = schedule.punctuality(&record, &boundary);
        assert_eq!(p.departure, Some(DepartureStatus::Early));
        assert_eq!(p.arrival, None);
    }

    #[test]
    fn tolerances_stop_at_midnight() {
        let boundary = DayBoundary::utc();

        let late_shift = Schedule::new(hm(23, 55), hm(23, 59), 10, 0);
        let record = day(&[("2024-01-02T23:56", "IN")], &boundary);
        assert_eq!(
            late_shift.punctuality(&record, &boundary).arrival,
            Some(ArrivalStatus::OnTime)
        );

        let early_end = Schedule::new(hm(0, 0), hm(0, 5), 0, 10);
        let record = day(&[("2024-01-02T00:01", "OUT")], &boundary);
        assert_eq!(
            early_end.punctuality(&record, &boundary).departure,
            Some(DepartureStatus::OnTime)
        );
    }

    #[test]
    fn local_time_uses_the_plant_offset() {
        let schedule = Schedule::default();
        let boundary = DayBoundary::new(FixedOffset::east_opt(2 * 3600).unwrap());

        // 07:30Z is 09:30 at the plant
        let record = day(&[("2024-01-02T07:30:00Z", "IN")], &boundary);
        assert_eq!(
            schedule.punctuality(&record, &boundary).arrival,
            Some(ArrivalStatus::Late)
        );
    }
}
