//! Attendance ("pointing") logic: pure functions over punches and daily records.

pub mod boundary;
pub mod reconcile;
pub mod schedule;
pub mod summary;
pub mod weekly;

pub use boundary::DayBoundary;
pub use reconcile::{PunchDefect, reconcile};
pub use schedule::{Punctuality, Schedule};
pub use summary::{EmployeeMonth, EmployeeSummary, month_weeks, monthly_breakdown, summarize};
pub use weekly::{week_start, weekly_total};
