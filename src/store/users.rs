use sqlx::MySqlPool;

use crate::models::UserSql;

pub async fn find_by_username(pool: &MySqlPool, username: &str) -> Result<Option<UserSql>, sqlx::Error> {
    sqlx::query_as::<_, UserSql>(
        r#"
        SELECT id, username, password, role_id, employee_id
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn touch_last_login(pool: &MySqlPool, user_id: u64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn store_refresh_token(pool: &MySqlPool, user_id: u64, jti: &str, expires_at: usize) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(user_id)
    .bind(jti)
    .bind(expires_at as i64)
    .execute(pool)
    .await?;
    Ok(())
}

/// Revokes a live refresh token. Returns `false` when it was unknown or
/// already revoked, so each refresh token can be used once.
pub async fn revoke_refresh_token(pool: &MySqlPool, jti: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = 1
        WHERE jti = ?
        AND revoked = 0
        "#,
    )
    .bind(jti)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
