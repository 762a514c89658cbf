use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono::{FixedOffset, NaiveTime};
use dotenvy::dotenv;

use crate::attendance::boundary::parse_offset;
use crate::attendance::{DayBoundary, Schedule};

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub log_level: tracing::Level,

    // Pointing
    pub plant_offset: FixedOffset,
    /// Employees whose day is cut in another zone than the plant's.
    pub employee_offsets: Vec<(String, FixedOffset)>,
    pub schedule: Schedule,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key}={raw:?} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

/// Parses `M-0042=+02:00,M-0077=-05:00`.
fn employee_offsets(raw: &str) -> Result<Vec<(String, FixedOffset)>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (employee, offset) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("EMPLOYEE_UTC_OFFSETS entry {entry:?} must be id=+HH:MM"))?;
            let offset = parse_offset(offset)
                .ok_or_else(|| anyhow!("EMPLOYEE_UTC_OFFSETS entry {entry:?} has a bad offset"))?;
            Ok((employee.trim().to_string(), offset))
        })
        .collect()
}

fn time_or(key: &str, default: &str) -> Result<NaiveTime> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .with_context(|| format!("{key}={raw:?} must be HH:MM"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let offset_raw = env::var("PLANT_UTC_OFFSET").unwrap_or_else(|_| "+00:00".to_string());
        let plant_offset = parse_offset(&offset_raw)
            .ok_or_else(|| anyhow!("PLANT_UTC_OFFSET={offset_raw:?} must look like +01:00"))?;

        let employee_offsets = employee_offsets(&env::var("EMPLOYEE_UTC_OFFSETS").unwrap_or_default())?;

        let schedule = Schedule::new(
            time_or("SHIFT_START", "08:00")?,
            time_or("SHIFT_END", "17:00")?,
            parsed_or("LATE_TOLERANCE_MIN", 0)?,
            parsed_or("EARLY_DEPARTURE_TOLERANCE_MIN", 0)?,
        );

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed_or("ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: parsed_or("REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: parsed_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_refresh_per_min: parsed_or("RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_level: parsed_or("LOG_LEVEL", tracing::Level::DEBUG)?,

            plant_offset,
            employee_offsets,
            schedule,
        })
    }

    /// Day boundary used to cut punches into calendar days.
    pub fn day_boundary(&self) -> DayBoundary {
        self.employee_offsets
            .iter()
            .fold(DayBoundary::new(self.plant_offset), |boundary, (employee, offset)| {
                boundary.with_employee(employee.clone(), *offset)
            })
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: "mysql://localhost/unused".into(),
        jwt_secret: "test-secret-that-is-long-enough-for-hmac".into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 900,
        refresh_token_ttl: 3600,
        rate_login_per_min: 60,
        rate_refresh_per_min: 30,
        rate_protected_per_min: 1000,
        api_prefix: "/api".into(),
        log_level: tracing::Level::DEBUG,
        plant_offset: FixedOffset::east_opt(3600).unwrap(),
        employee_offsets: Vec::new(),
        schedule: Schedule::default(),
    }
}
