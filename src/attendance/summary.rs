use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::model::attendance::DailyAttendanceRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeSummary {
    pub employee_id: String,
    /// Days with both an IN and an OUT.
    pub complete_days: u32,
    pub insufficient_days: u32,
    pub worked_hours: f64,
    /// Sum of `last_out - first_in` before lunch deduction.
    pub presence_hours: f64,
}

impl EmployeeSummary {
    fn new(employee_id: &str) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            complete_days: 0,
            insufficient_days: 0,
            worked_hours: 0.0,
            presence_hours: 0.0,
        }
    }

    fn add(&mut self, record: &DailyAttendanceRecord) {
        if record.worked_hours.is_insufficient() {
            self.insufficient_days += 1;
        } else {
            self.complete_days += 1;
        }
        self.worked_hours += record.worked_hours.hours_or_zero();
        self.presence_hours += record.presence_hours().unwrap_or(0.0);
    }
}

/// Per-employee totals over `[from, to]`, sorted by employee id.
pub fn summarize(records: &[DailyAttendanceRecord], from: NaiveDate, to: NaiveDate) -> Vec<EmployeeSummary> {
    let mut by_employee: BTreeMap<&str, EmployeeSummary> = BTreeMap::new();

    for record in records.iter().filter(|r| r.date >= from && r.date <= to) {
        by_employee
            .entry(record.employee_id.as_str())
            .or_insert_with(|| EmployeeSummary::new(&record.employee_id))
            .add(record);
    }

    by_employee.into_values().collect()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Seven-day buckets from the first of the month, the last one cut at month end.
pub fn month_weeks(month: NaiveDate) -> Vec<DateRange> {
    let Some(first) = month.with_day(1) else {
        return Vec::new();
    };
    let last = last_day_of_month(first);

    let mut weeks = Vec::with_capacity(5);
    let mut start = first;
    while start <= last {
        let end = (start + Days::new(6)).min(last);
        weeks.push(DateRange { start, end });
        start = end + Days::new(1);
    }
    weeks
}

fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    first
        .checked_add_months(chrono::Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(first)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeMonth {
    pub employee_id: String,
    /// Worked hours per bucket of [`month_weeks`], in order.
    pub weeks: Vec<f64>,
    pub total: f64,
}

/// Per-employee worked hours split into the month's week buckets.
pub fn monthly_breakdown(records: &[DailyAttendanceRecord], month: NaiveDate) -> Vec<EmployeeMonth> {
    let weeks = month_weeks(month);
    let mut by_employee: BTreeMap<&str, Vec<f64>> = BTreeMap::new();

    for record in records {
        let Some(bucket) = weeks.iter().position(|w| w.contains(record.date)) else {
            continue;
        };
        let totals = by_employee
            .entry(record.employee_id.as_str())
            .or_insert_with(|| vec![0.0; weeks.len()]);
        totals[bucket] += record.worked_hours.hours_or_zero();
    }

    by_employee
        .into_iter()
        .map(|(employee_id, weeks)| EmployeeMonth {
            employee_id: employee_id.to_string(),
            total: weeks.iter().sum(),
            weeks,
        })
        .collect()
}
