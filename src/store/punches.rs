use chrono::{Days, NaiveDate, NaiveDateTime};
use sqlx::MySqlPool;
use tracing::debug;

use crate::model::attendance::{Direction, RawPunch};

/// Filter for reading raw punches. Dates are inclusive calendar days.
#[derive(Debug, Default, Clone)]
pub struct PunchFilter<'a> {
    pub employee_id: Option<&'a str>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

type PunchRow = (Option<String>, Option<String>, Option<String>);

/// NULL columns become empty strings so the reconciler reports them as
/// defects instead of the whole query failing to decode.
fn row_to_punch((employee_id, log_time, status): PunchRow) -> RawPunch {
    RawPunch::new(
        employee_id.unwrap_or_default(),
        log_time.unwrap_or_default(),
        status.unwrap_or_default(),
    )
}

enum Bind<'a> {
    Str(&'a str),
    Date(NaiveDate),
}

/// Loads raw punches as stored, unvalidated. Parsing and grouping are left
/// to the reconciler so that bad rows surface as defects.
///
/// The date window is widened by one day on each side so that punches near
/// midnight can still land on the right local day once the plant offset is
/// applied; callers trim the reconciled records back to the window.
pub async fn fetch_punches(pool: &MySqlPool, filter: &PunchFilter<'_>) -> Result<Vec<RawPunch>, sqlx::Error> {
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<Bind> = Vec::new();

    if let Some(employee_id) = filter.employee_id {
        where_sql.push_str(" AND employee_id = ?");
        args.push(Bind::Str(employee_id));
    }

    if let Some(start) = filter.start_date {
        where_sql.push_str(" AND log_time >= ?");
        args.push(Bind::Date(start.checked_sub_days(Days::new(1)).unwrap_or(start)));
    }

    if let Some(end) = filter.end_date {
        where_sql.push_str(" AND log_time < ?");
        args.push(Bind::Date(end.checked_add_days(Days::new(2)).unwrap_or(end)));
    }

    let sql = format!(
        r#"
        SELECT
            CAST(employee_id AS CHAR) AS employee_id,
            DATE_FORMAT(log_time, '%Y-%m-%dT%H:%i:%s') AS log_time,
            status
        FROM attendance_logs
        {}
        ORDER BY log_time
        "#,
        where_sql
    );
    debug!(sql = %sql, ?filter, "Fetching punches");

    let mut query = sqlx::query_as::<_, PunchRow>(&sql);
    for arg in args {
        query = match arg {
            Bind::Str(v) => query.bind(v),
            Bind::Date(v) => query.bind(v),
        };
    }

    let rows = query.fetch_all(pool).await?;

    Ok(rows.into_iter().map(row_to_punch).collect())
}

/// Records a punch. `at` is plant-local wall clock time, the same form the
/// terminals write.
pub async fn insert_punch(
    pool: &MySqlPool,
    employee_id: &str,
    direction: Direction,
    at: NaiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO attendance_logs (employee_id, log_time, status)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(at)
    .bind(direction.as_ref())
    .execute(pool)
    .await?;

    Ok(())
}
