use crate::api::attendance::{
    DailyListResponse, DailyQuery, DailyRecordResponse, DateWindow, MonthQuery, MonthlyResponse,
    MyPointingResponse, PunchRequest, ReconcileRequest, SummaryQuery, SummaryResponse,
};
use crate::model::attendance::RawPunch;
use crate::models::{LoginReqDto, TokenPair};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pointing API",
        version = "1.0.0",
        description = r#"
## Attendance (pointing) reconciliation

Raw badge punches from the plant terminals are grouped into one record per
employee and calendar day.

### Daily records
- `first_in` is the earliest IN of the day, `last_out` the latest OUT
- Spans longer than 9 hours lose 1 hour for lunch
- `worked_hours` is `null` when a punch is missing, and the tag is `insufficient`
- Tags: `on-time` (>= 8h), `borderline` (>= 7.5h), `short`

### Reports
- Hours since Monday for the caller
- Per-employee totals over a period
- A month split into 7-day buckets

### Security
Endpoints under `/api` need a **JWT Bearer** access token.
HR and Admin roles can read everybody's data.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::attendance::punch,
        crate::api::attendance::my_pointing,
        crate::api::attendance::daily,
        crate::api::attendance::reconcile_punches,
        crate::api::attendance::summary,
        crate::api::attendance::monthly
    ),
    components(
        schemas(
            LoginReqDto,
            TokenPair,
            RawPunch,
            PunchRequest,
            DateWindow,
            DailyQuery,
            SummaryQuery,
            MonthQuery,
            ReconcileRequest,
            DailyRecordResponse,
            DailyListResponse,
            MyPointingResponse,
            SummaryResponse,
            MonthlyResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token refresh"),
        (name = "Attendance", description = "Pointing records and reports"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_attendance_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<_> = doc.paths.paths.keys().cloned().collect();
        for p in [
            "/auth/login",
            "/api/attendance/reconcile",
            "/api/attendance/me",
            "/api/attendance/monthly",
        ] {
            assert!(paths.iter().any(|k| k == p), "missing {p} in {paths:?}");
        }
        assert!(
            doc.components
                .as_ref()
                .is_some_and(|c| c.security_schemes.contains_key("bearer_auth"))
        );
    }
}
