use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;
use tracing::{debug, warn};

use super::boundary::DayBoundary;
use crate::model::attendance::{
    DailyAttendanceRecord, Direction, LUNCH_DEDUCTION_HOURS, LUNCH_THRESHOLD_HOURS, PunchEvent,
    QualityTag, RawPunch, WorkedHours, span_hours,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PunchDefectKind {
    #[error("punch has no employee id")]
    MissingEmployee,

    #[error("unparsable timestamp {value:?}")]
    MalformedTimestamp { value: String },

    #[error("unknown direction {value:?}")]
    UnknownDirection { value: String },
}

/// A data-quality problem with one input punch. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PunchDefect {
    /// Position of the punch in the input list.
    pub index: usize,
    pub employee_id: String,
    #[serde(flatten)]
    pub kind: PunchDefectKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub records: Vec<DailyAttendanceRecord>,
    pub defects: Vec<PunchDefect>,
}

#[derive(Default)]
struct DayPunches {
    first_in: Option<DateTime<FixedOffset>>,
    last_out: Option<DateTime<FixedOffset>>,
}

impl DayPunches {
    fn add(&mut self, punch: &PunchEvent) {
        match punch.direction {
            Some(Direction::In) => {
                self.first_in = Some(match self.first_in {
                    Some(cur) => cur.min(punch.timestamp),
                    None => punch.timestamp,
                });
            }
            Some(Direction::Out) => {
                self.last_out = Some(match self.last_out {
                    Some(cur) => cur.max(punch.timestamp),
                    None => punch.timestamp,
                });
            }
            None => {}
        }
    }
}

/// Validates one raw punch against the day boundary.
///
/// An unknown direction still yields an event (it opens its day) but the
/// defect is returned alongside it.
pub fn parse_punch(
    index: usize,
    raw: &RawPunch,
    boundary: &DayBoundary,
) -> (Option<PunchEvent>, Option<PunchDefect>) {
    let employee_id = raw.employee_id.trim();
    let defect = |kind| PunchDefect {
        index,
        employee_id: employee_id.to_string(),
        kind,
    };

    if employee_id.is_empty() {
        return (None, Some(defect(PunchDefectKind::MissingEmployee)));
    }

    let Some(timestamp) = boundary.parse(employee_id, &raw.log_time) else {
        return (
            None,
            Some(defect(PunchDefectKind::MalformedTimestamp {
                value: raw.log_time.clone(),
            })),
        );
    };

    let direction = Direction::from_status(&raw.status);
    let unknown = direction.is_none().then(|| {
        defect(PunchDefectKind::UnknownDirection {
            value: raw.status.clone(),
        })
    });

    let event = PunchEvent {
        employee_id: employee_id.to_string(),
        timestamp,
        direction,
    };
    (Some(event), unknown)
}

/// Worked hours for a day given its earliest IN and latest OUT.
pub fn worked_hours(
    first_in: Option<DateTime<FixedOffset>>,
    last_out: Option<DateTime<FixedOffset>>,
) -> WorkedHours {
    match (first_in, last_out) {
        (Some(i), Some(o)) if o >= i => {
            let raw = span_hours(i, o);
            if raw > LUNCH_THRESHOLD_HOURS {
                WorkedHours::Measured(raw - LUNCH_DEDUCTION_HOURS)
            } else {
                WorkedHours::Measured(raw)
            }
        }
        _ => WorkedHours::InsufficientData,
    }
}

/// Groups raw punches into one record per employee and local calendar day.
///
/// The earliest IN and the latest OUT of each day are used, so duplicate
/// and out-of-order scans do not change the result. Output is sorted by
/// employee id then date; defects keep input order.
pub fn reconcile(punches: &[RawPunch], boundary: &DayBoundary) -> Reconciliation {
    let mut days: BTreeMap<(String, NaiveDate), DayPunches> = BTreeMap::new();
    let mut defects = Vec::new();

    for (index, raw) in punches.iter().enumerate() {
        let (event, defect) = parse_punch(index, raw, boundary);

        if let Some(defect) = defect {
            warn!(
                index,
                employee_id = %defect.employee_id,
                defect = %defect.kind,
                "Punch data-quality defect"
            );
            defects.push(defect);
        }

        if let Some(event) = event {
            let date = boundary.local_date(&event.employee_id, &event.timestamp);
            days.entry((event.employee_id.clone(), date))
                .or_default()
                .add(&event);
        }
    }

    let records: Vec<DailyAttendanceRecord> = days
        .into_iter()
        .map(|((employee_id, date), day)| {
            let worked = worked_hours(day.first_in, day.last_out);
            DailyAttendanceRecord {
                employee_id,
                date,
                first_in: day.first_in,
                last_out: day.last_out,
                worked_hours: worked,
                quality_tag: QualityTag::classify(worked),
            }
        })
        .collect();

    debug!(
        punches = punches.len(),
        records = records.len(),
        defects = defects.len(),
        "Reconciled punches"
    );

    Reconciliation { records, defects }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn punch(e: &str, t: &str, d: &str) -> RawPunch {
        RawPunch::new(e, t, d)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn single(punches: &[RawPunch]) -> DailyAttendanceRecord {
        let out = reconcile(punches, &DayBoundary::utc());
        assert_eq!(out.records.len(), 1, "{:?}", out.records);
        out.records.into_iter().next().unwrap()
    }

    fn assert_hours(record: &DailyAttendanceRecord, expected: f64) {
        let got = record.worked_hours.hours().expect("measured hours");
        assert!((got - expected).abs() < 0.01, "got {got}, expected {expected}");
    }

    #[test]
    fn long_shift_gets_lunch_deduction() {
        let r = single(&[
            punch("e1", "2024-01-02T08:00", "IN"),
            punch("e1", "2024-01-02T17:30", "OUT"),
        ]);
        assert_eq!(r.date, date(2024, 1, 2));
        assert_hours(&r, 8.5);
        assert_eq!(r.quality_tag, QualityTag::OnTime);
    }

    #[test]
    fn eight_hour_shift_has_no_deduction() {
        let r = single(&[
            punch("e1", "2024-01-02T08:00", "IN"),
            punch("e1", "2024-01-02T16:00", "OUT"),
        ]);
        assert_hours(&r, 8.0);
        assert_eq!(r.quality_tag, QualityTag::OnTime);
    }

    #[test]
    fn exactly_nine_hours_is_not_deducted() {
        let r = single(&[
            punch("e1", "2024-01-02T08:00", "IN"),
            punch("e1", "2024-01-02T17:00", "OUT"),
        ]);
        assert_hours(&r, 9.0);
    }

    #[test]
    fn just_over_nine_hours_is_deducted() {
        let r = single(&[
            punch("e1", "2024-01-02T08:00:00", "IN"),
            punch("e1", "2024-01-02T17:00:36", "OUT"),
        ]);
        assert_hours(&r, 8.01);
        assert_eq!(r.quality_tag, QualityTag::OnTime);
    }

    #[test]
    fn missing_punches_are_insufficient() {
        for punches in [
            vec![punch("e1", "2024-01-02T08:00", "IN")],
            vec![punch("e1", "2024-01-02T17:00", "OUT")],
            vec![punch("e1", "2024-01-02T17:00", "lunch")],
        ] {
            let r = reconcile(&punches, &DayBoundary::utc()).records.remove(0);
            assert_eq!(r.worked_hours, WorkedHours::InsufficientData);
            assert_eq!(r.quality_tag, QualityTag::Insufficient);
        }
    }

    #[test]
    fn zero_length_shift_is_not_insufficient() {
        let r = single(&[
            punch("e1", "2024-01-02T08:00", "IN"),
            punch("e1", "2024-01-02T08:00", "OUT"),
        ]);
        assert_eq!(r.worked_hours, WorkedHours::Measured(0.0));
        assert_eq!(r.quality_tag, QualityTag::Short);
    }

    #[test]
    fn out_before_in_is_insufficient() {
        let r = single(&[
            punch("e1", "2024-01-02T07:00", "OUT"),
            punch("e1", "2024-01-02T08:00", "IN"),
        ]);
        assert!(r.first_in.is_some() && r.last_out.is_some());
        assert_eq!(r.quality_tag, QualityTag::Insufficient);
    }

    #[test]
    fn duplicates_use_earliest_in_and_latest_out() {
        let r = single(&[
            punch("e1", "2024-01-02T16:00", "out"),
            punch("e1", "2024-01-02T08:15", "in"),
            punch("e1", "2024-01-02T08:00", "In"),
            punch("e1", "2024-01-02T15:00", "OUT"),
            punch("e1", "2024-01-02T08:05", "IN"),
        ]);
        assert_eq!(r.first_in.unwrap().to_rfc3339(), "2024-01-02T08:00:00+00:00");
        assert_eq!(r.last_out.unwrap().to_rfc3339(), "2024-01-02T16:00:00+00:00");
        assert_hours(&r, 8.0);
    }

    #[test]
    fn output_ignores_input_order() {
        let mut punches = vec![
            punch("e2", "2024-01-03T09:00", "IN"),
            punch("e1", "2024-01-02T08:00", "IN"),
            punch("e1", "2024-01-02T15:45", "OUT"),
            punch("e2", "2024-01-03T16:00", "OUT"),
            punch("e1", "2024-01-03T08:30", "IN"),
        ];
        let forward = reconcile(&punches, &DayBoundary::utc()).records;
        punches.reverse();
        let backward = reconcile(&punches, &DayBoundary::utc()).records;
        assert_eq!(forward, backward);

        let keys: Vec<_> = forward
            .iter()
            .map(|r| (r.employee_id.as_str(), r.date))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("e1", date(2024, 1, 2)),
                ("e1", date(2024, 1, 3)),
                ("e2", date(2024, 1, 3)),
            ]
        );
        assert_eq!(forward[0].quality_tag, QualityTag::Borderline);
        assert_eq!(forward[2].quality_tag, QualityTag::Short);
    }

    #[test]
    fn defects_do_not_block_other_punches() {
        let punches = [
            punch("e1", "2024-01-02T08:00", "IN"),
            punch("e1", "not a time", "OUT"),
            punch("  ", "2024-01-02T09:00", "IN"),
            punch("e1", "2024-01-02T12:00", "pause"),
            punch("e1", "2024-01-02T16:00", "OUT"),
        ];
        let out = reconcile(&punches, &DayBoundary::utc());

        assert_eq!(out.records.len(), 1);
        assert_hours(&out.records[0], 8.0);

        let kinds: Vec<_> = out.defects.iter().map(|d| (d.index, &d.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (
                    1,
                    &PunchDefectKind::MalformedTimestamp {
                        value: "not a time".into()
                    }
                ),
                (2, &PunchDefectKind::MissingEmployee),
                (
                    3,
                    &PunchDefectKind::UnknownDirection {
                        value: "pause".into()
                    }
                ),
            ]
        );
    }

    #[test]
    fn unknown_direction_alone_still_opens_the_day() {
        let out = reconcile(
            &[punch("e1", "2024-01-02T08:00", "?")],
            &DayBoundary::utc(),
        );
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].quality_tag, QualityTag::Insufficient);
        assert_eq!(out.defects.len(), 1);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(reconcile(&[], &DayBoundary::utc()), Reconciliation::default());
    }

    #[test]
    fn day_cut_follows_the_plant_offset() {
        let plant = DayBoundary::new(FixedOffset::east_opt(3600).unwrap());
        let out = reconcile(
            &[
                punch("e1", "2024-01-02T23:30:00Z", "IN"),
                punch("e1", "2024-01-03T08:00:00+01:00", "OUT"),
            ],
            &plant,
        );
        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].date, date(2024, 1, 3));
        assert_hours(&out.records[0], 7.5);
    }

    #[test]
    fn rebuilding_punches_from_output_is_stable() {
        let punches = [
            punch("e1", "2024-01-02T07:58", "IN"),
            punch("e1", "2024-01-02T08:10", "IN"),
            punch("e1", "2024-01-02T17:41", "OUT"),
            punch("e2", "2024-01-02T09:00", "IN"),
            punch("e2", "2024-01-02T16:20", "OUT"),
            punch("e2", "2024-01-02T15:00", "OUT"),
        ];
        let first = reconcile(&punches, &DayBoundary::utc()).records;

        let rebuilt: Vec<RawPunch> = first
            .iter()
            .flat_map(|r| {
                [
                    r.first_in.map(|t| punch(&r.employee_id, &t.to_rfc3339(), "IN")),
                    r.last_out.map(|t| punch(&r.employee_id, &t.to_rfc3339(), "OUT")),
                ]
            })
            .flatten()
            .collect();
        let second = reconcile(&rebuilt, &DayBoundary::utc()).records;

        let hours = |rs: &[DailyAttendanceRecord]| -> Vec<_> {
            rs.iter().map(|r| r.worked_hours).collect()
        };
        assert_eq!(hours(&first), hours(&second));
    }

    #[test]
    fn defect_kinds_serialize_with_tag() {
        let defect = PunchDefect {
            index: 4,
            employee_id: "e9".into(),
            kind: PunchDefectKind::UnknownDirection { value: "x".into() },
        };
        let json = serde_json::to_value(&defect).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "index": 4,
                "employee_id": "e9",
                "kind": "unknown-direction",
                "value": "x"
            })
        );
    }
}
