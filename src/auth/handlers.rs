use actix_web::{HttpRequest, HttpResponse, web};
use sqlx::MySqlPool;
use tracing::{debug, error, info, instrument};

use crate::{
    auth::{
        jwt::{Subject, generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    error::{AppError, AppResult},
    models::{Claims, LoginReqDto, TokenPair, TokenType},
    store::users,
};

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Issues an access/refresh pair and persists the refresh token id.
async fn issue_pair(pool: &MySqlPool, config: &Config, subject: &Subject<'_>) -> AppResult<TokenPair> {
    let token_err = |e: jsonwebtoken::errors::Error| AppError::Internal(format!("token encoding failed: {e}"));

    let access_token = generate_access_token(subject, &config.jwt_secret, config.access_token_ttl)
        .map_err(token_err)?;
    let (refresh_token, refresh_claims) =
        generate_refresh_token(subject, &config.jwt_secret, config.refresh_token_ttl).map_err(token_err)?;

    debug!(user_id = subject.user_id, jti = %refresh_claims.jti, "Storing refresh token");
    users::store_refresh_token(pool, subject.user_id, &refresh_claims.jti, refresh_claims.exp).await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Verifies a bearer refresh token and consumes it.
async fn consume_refresh(req: &HttpRequest, pool: &MySqlPool, config: &Config) -> AppResult<Claims> {
    let token = bearer(req).ok_or_else(|| AppError::Unauthorized("No token".into()))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    if claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized("Refresh token required".into()));
    }

    if !users::revoke_refresh_token(pool, &claims.jti).await? {
        return Err(AppError::Unauthorized("Refresh token revoked".into()));
    }

    Ok(claims)
}

/// Log in with username and password.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Token pair issued", body = TokenPair),
        (status = 400, description = "Username or password missing"),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(pool, config, user), fields(username = %user.username))]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        return Err(AppError::BadRequest("Username or password required".into()));
    }

    let Some(db_user) = users::find_by_username(pool.get_ref(), user.username.trim()).await? else {
        info!("Invalid credentials: user not found");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if let Err(e) = verify_password(&user.password, &db_user.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let subject = Subject {
        user_id: db_user.id,
        username: &db_user.username,
        role: db_user.role_id,
        employee_id: db_user.employee_id.as_deref(),
    };
    let pair = issue_pair(pool.get_ref(), &config, &subject).await?;

    // not fatal for the login itself
    if let Err(e) = users::touch_last_login(pool.get_ref(), db_user.id).await {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!(user_id = db_user.id, "Login successful");
    Ok(HttpResponse::Ok().json(pair))
}

/// Exchange a refresh token for a new pair. The old refresh token is revoked.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Missing, invalid or revoked refresh token"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let claims = consume_refresh(&req, pool.get_ref(), &config).await?;

    let subject = Subject {
        user_id: claims.user_id,
        username: &claims.sub,
        role: claims.role,
        employee_id: claims.employee_id.as_deref(),
    };
    let pair = issue_pair(pool.get_ref(), &config, &subject).await?;

    Ok(HttpResponse::Ok().json(pair))
}

/// Revoke a refresh token. Always answers 204.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    if let Err(e) = consume_refresh(&req, pool.get_ref(), &config).await {
        debug!(error = %e, "Logout without a live refresh token");
    }
    HttpResponse::NoContent().finish()
}
