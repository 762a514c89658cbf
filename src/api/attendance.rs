use actix_web::{HttpResponse, web};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::attendance::boundary::parse_offset;
use crate::attendance::{
    DayBoundary, EmployeeMonth, EmployeeSummary, PunchDefect, Punctuality, Schedule, month_weeks,
    monthly_breakdown, reconcile, summarize, week_start, weekly_total,
};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::attendance::{DailyAttendanceRecord, Direction, RawPunch, round2};
use crate::store::punches::{PunchFilter, fetch_punches, insert_punch};

#[derive(Serialize, Deserialize, ToSchema)]
pub struct PunchRequest {
    /// `IN` or `OUT`, any case
    #[schema(example = "IN")]
    pub direction: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct DateWindow {
    /// First day, inclusive
    #[schema(example = "2024-01-01", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    /// Last day, inclusive
    #[schema(example = "2024-01-31", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct DailyQuery {
    /// Matricule to filter on
    #[schema(example = "M-0042")]
    pub employee_id: Option<String>,
    #[schema(example = "2024-01-01", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2024-01-31", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2024-01-31", format = "date", value_type = String)]
    pub to_date: NaiveDate,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct MonthQuery {
    /// Month as `YYYY-MM`
    #[schema(example = "2024-02")]
    pub month: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ReconcileRequest {
    pub punches: Vec<RawPunch>,
    /// Overrides the plant offset for this request, e.g. `+01:00`
    #[schema(example = "+01:00")]
    pub utc_offset: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailyRecordResponse {
    #[schema(example = "M-0042")]
    pub employee_id: String,
    #[schema(example = "2024-01-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "2024-01-02T08:00:00+01:00", format = "date-time")]
    pub first_in: Option<String>,
    #[schema(example = "2024-01-02T17:30:00+01:00", format = "date-time")]
    pub last_out: Option<String>,
    /// Rounded to 2 decimals; `null` when a punch is missing
    #[schema(example = 8.5)]
    pub worked_hours: Option<f64>,
    /// Classified on the unrounded hours, so 7.999 shows as `8.0` yet stays `borderline`
    #[schema(example = "on-time")]
    pub quality_tag: String,
    #[schema(example = "late")]
    pub arrival: Option<String>,
    #[schema(example = "on-time")]
    pub departure: Option<String>,
}

impl DailyRecordResponse {
    fn new(record: &DailyAttendanceRecord, punctuality: Option<Punctuality>) -> Self {
        let punctuality = punctuality.unwrap_or(Punctuality {
            arrival: None,
            departure: None,
        });

        Self {
            employee_id: record.employee_id.clone(),
            date: record.date,
            first_in: record.first_in.map(|t| t.to_rfc3339()),
            last_out: record.last_out.map(|t| t.to_rfc3339()),
            worked_hours: record.worked_hours.rounded(),
            quality_tag: record.quality_tag.to_string(),
            arrival: punctuality.arrival.map(|a| a.to_string()),
            departure: punctuality.departure.map(|d| d.to_string()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailyListResponse {
    pub data: Vec<DailyRecordResponse>,
    /// Data-quality problems found in the raw punches
    #[schema(value_type = Vec<Object>)]
    pub defects: Vec<PunchDefect>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyPointingResponse {
    pub data: Vec<DailyRecordResponse>,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub week_start: NaiveDate,
    /// Hours worked since Monday, rounded to 2 decimals
    #[schema(example = 23.8)]
    pub weekly_hours: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SummaryResponse {
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<EmployeeSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlyResponse {
    /// Bucket bounds, in the same order as each employee's `weeks`
    #[schema(value_type = Vec<Object>)]
    pub weeks: Vec<crate::attendance::summary::DateRange>,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<EmployeeMonth>,
}

fn in_window(date: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    start.is_none_or(|s| date >= s) && end.is_none_or(|e| date <= e)
}

/// Drops defects of punches that belong to a day outside the window. Punches
/// without a readable timestamp cannot be placed and are always kept.
fn defects_in_window(
    defects: Vec<PunchDefect>,
    punches: &[RawPunch],
    boundary: &DayBoundary,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<PunchDefect> {
    defects
        .into_iter()
        .filter(|defect| {
            punches
                .get(defect.index)
                .and_then(|raw| boundary.parse(&defect.employee_id, &raw.log_time))
                .is_none_or(|ts| in_window(boundary.local_date(&defect.employee_id, &ts), start, end))
        })
        .collect()
}

fn render(
    records: &[DailyAttendanceRecord],
    boundary: &DayBoundary,
    schedule: Option<&Schedule>,
) -> Vec<DailyRecordResponse> {
    records
        .iter()
        .map(|r| DailyRecordResponse::new(r, schedule.map(|s| s.punctuality(r, boundary))))
        .collect()
}

fn check_window(start: Option<NaiveDate>, end: Option<NaiveDate>) -> AppResult<()> {
    match (start, end) {
        (Some(s), Some(e)) if s > e => Err(AppError::BadRequest(
            "start_date cannot be after end_date".into(),
        )),
        _ => Ok(()),
    }
}

fn parse_month(raw: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest("month must be YYYY-MM".into()))
}

/// Record a punch for the caller
#[utoipa::path(
    post,
    path = "/api/attendance/punch",
    request_body = PunchRequest,
    responses(
        (status = 200, description = "Punch recorded", body = Object, example = json!({
            "message": "Punch recorded",
            "direction": "IN"
        })),
        (status = 400, description = "Unknown direction"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn punch(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<PunchRequest>,
) -> AppResult<HttpResponse> {
    let employee_id = auth.own_employee_id()?;

    let direction = Direction::from_status(&payload.direction)
        .ok_or_else(|| AppError::BadRequest("direction must be IN or OUT".into()))?;

    let offset = config.day_boundary().offset_for(employee_id);
    let at = Utc::now().with_timezone(&offset).naive_local();

    insert_punch(pool.get_ref(), employee_id, direction, at).await?;
    info!(user_id = auth.user_id, username = %auth.username, employee_id, %direction, "Punch recorded");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Punch recorded",
        "direction": direction,
    })))
}

/// Caller's own daily records and hours since Monday
#[utoipa::path(
    get,
    path = "/api/attendance/me",
    params(DateWindow),
    responses(
        (status = 200, description = "Daily records and weekly hours", body = MyPointingResponse),
        (status = 400, description = "Bad date window"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_pointing(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DateWindow>,
) -> AppResult<HttpResponse> {
    let employee_id = auth.own_employee_id()?;
    check_window(query.start_date, query.end_date)?;

    let boundary = config.day_boundary();
    let today = Utc::now()
        .with_timezone(&boundary.offset_for(employee_id))
        .date_naive();
    let monday = week_start(today);

    let start = query.start_date.unwrap_or(monday);
    let end = query.end_date.unwrap_or(today);

    let filter = PunchFilter {
        employee_id: Some(employee_id),
        start_date: Some(start.min(monday)),
        end_date: Some(end.max(today)),
    };
    let punches = fetch_punches(pool.get_ref(), &filter).await?;
    let reconciled = reconcile(&punches, &boundary);

    let weekly = weekly_total(&reconciled.records, monday, today);
    let shown: Vec<_> = reconciled
        .records
        .into_iter()
        .filter(|r| in_window(r.date, Some(start), Some(end)))
        .collect();

    Ok(HttpResponse::Ok().json(MyPointingResponse {
        data: render(&shown, &boundary, Some(&config.schedule)),
        week_start: monday,
        weekly_hours: round2(weekly),
    }))
}

/// Reconciled daily records (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/attendance/daily",
    params(DailyQuery),
    responses(
        (status = 200, description = "Daily records with punctuality", body = DailyListResponse),
        (status = 400, description = "Bad date window"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn daily(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<DailyQuery>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    check_window(query.start_date, query.end_date)?;

    let filter = PunchFilter {
        employee_id: query.employee_id.as_deref().map(str::trim).filter(|s| !s.is_empty()),
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let punches = fetch_punches(pool.get_ref(), &filter).await?;

    let boundary = config.day_boundary();
    let reconciled = reconcile(&punches, &boundary);
    let records: Vec<_> = reconciled
        .records
        .into_iter()
        .filter(|r| in_window(r.date, query.start_date, query.end_date))
        .collect();
    let defects = defects_in_window(
        reconciled.defects,
        &punches,
        &boundary,
        query.start_date,
        query.end_date,
    );

    Ok(HttpResponse::Ok().json(DailyListResponse {
        data: render(&records, &boundary, Some(&config.schedule)),
        defects,
    }))
}

/// Reconcile a posted punch feed without touching storage (HR/Admin)
#[utoipa::path(
    post,
    path = "/api/attendance/reconcile",
    request_body = ReconcileRequest,
    responses(
        (status = 200, description = "Daily records and defects", body = DailyListResponse),
        (status = 400, description = "Bad offset"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn reconcile_punches(
    auth: AuthUser,
    config: web::Data<Config>,
    payload: web::Json<ReconcileRequest>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let boundary = match payload.utc_offset.as_deref() {
        Some(raw) => DayBoundary::new(
            parse_offset(raw).ok_or_else(|| AppError::BadRequest("utc_offset must look like +01:00".into()))?,
        ),
        None => config.day_boundary(),
    };

    let reconciled = reconcile(&payload.punches, &boundary);

    Ok(HttpResponse::Ok().json(DailyListResponse {
        data: render(&reconciled.records, &boundary, None),
        defects: reconciled.defects,
    }))
}

/// Per-employee working hours over a period (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/attendance/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Per-employee totals", body = SummaryResponse),
        (status = 400, description = "Bad date window"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn summary(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<SummaryQuery>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    check_window(Some(query.from_date), Some(query.to_date))?;

    let filter = PunchFilter {
        employee_id: None,
        start_date: Some(query.from_date),
        end_date: Some(query.to_date),
    };
    let punches = fetch_punches(pool.get_ref(), &filter).await?;
    let reconciled = reconcile(&punches, &config.day_boundary());

    let data = summarize(&reconciled.records, query.from_date, query.to_date)
        .into_iter()
        .map(|mut s| {
            s.worked_hours = round2(s.worked_hours);
            s.presence_hours = round2(s.presence_hours);
            s
        })
        .collect();

    Ok(HttpResponse::Ok().json(SummaryResponse { data }))
}

/// Working hours per week bucket of a month (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/attendance/monthly",
    params(MonthQuery),
    responses(
        (status = 200, description = "Week buckets per employee", body = MonthlyResponse),
        (status = 400, description = "Bad month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn monthly(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    query: web::Query<MonthQuery>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let month = parse_month(&query.month)?;
    let weeks = month_weeks(month);
    let (Some(first), Some(last)) = (weeks.first(), weeks.last()) else {
        return Err(AppError::BadRequest("month must be YYYY-MM".into()));
    };

    let filter = PunchFilter {
        employee_id: None,
        start_date: Some(first.start),
        end_date: Some(last.end),
    };
    let punches = fetch_punches(pool.get_ref(), &filter).await?;
    let reconciled = reconcile(&punches, &config.day_boundary());

    let data = monthly_breakdown(&reconciled.records, month)
        .into_iter()
        .map(|mut m| {
            m.weeks.iter_mut().for_each(|w| *w = round2(*w));
            m.total = round2(m.total);
            m
        })
        .collect();

    info!(year = month.year(), month = month.month(), "Monthly pointing report built");
    Ok(HttpResponse::Ok().json(MonthlyResponse { weeks, data }))
}
