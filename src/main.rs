use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::{Context, Result};

mod api;
mod attendance;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod store;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::routes::RateLimiters;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Pointing service up"
}

/// `hrm-pointing hash-password <password>` prints an argon2 hash for seeding
/// the `users` table; there is no self-registration endpoint.
fn hash_password_command(mut args: impl Iterator<Item = String>) -> Result<bool> {
    if args.next().as_deref() != Some("hash-password") {
        return Ok(false);
    }
    let password = args.next().context("usage: hash-password <password>")?;
    let hash = auth::password::hash_password(&password)
        .map_err(|e| anyhow::anyhow!("hashing failed: {e}"))?;
    println!("{hash}");
    Ok(true)
}

#[actix_web::main]
async fn main() -> Result<()> {
    if hash_password_command(std::env::args().skip(1))? {
        return Ok(());
    }

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(
        plant_offset = %config.plant_offset,
        shift_start = %config.schedule.start,
        shift_end = %config.schedule.end,
        "Server starting..."
    );

    let pool = init_db(&config.database_url).await?;
    let limits = RateLimiters::from_config(&config)?;
    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        let config = config.clone();
        let limits = limits.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config, &limits))
    })
    .bind(&server_addr)
    .with_context(|| format!("cannot bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn hash_password_command_only_runs_when_asked() {
        assert!(!hash_password_command(args(&[])).unwrap());
        assert!(!hash_password_command(args(&["serve"])).unwrap());
        assert!(hash_password_command(args(&["hash-password", "pw"])).unwrap());
        assert!(hash_password_command(args(&["hash-password"])).is_err());
    }
}
