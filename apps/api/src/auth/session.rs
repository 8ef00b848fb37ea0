use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{Role, UserTokenRow};
use crate::state::AppState;

/// Session lifetime for issued tokens.
const TOKEN_TTL_DAYS: i64 = 30;

/// Header carrying the per-session CSRF token on state-changing requests.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Per-request authenticated user context, resolved from the bearer token.
/// This is the explicit replacement for ambient session globals: everything a
/// handler needs about the caller travels in this one value.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub role: Role,
    pub token: String,
    pub csrf_token: String,
}

impl CurrentUser {
    /// Role gate: `Forbidden` on mismatch, no stack trace exposed.
    pub fn require_role(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// CSRF contract: every state-changing request must echo the session's
    /// CSRF token. Mismatch reads as a bad form submission, not a 403.
    pub fn require_csrf(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let presented = headers
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if presented == self.csrf_token {
            Ok(())
        } else {
            Err(AppError::validation("Invalid form submission"))
        }
    }
}

/// Issues a fresh session: opaque bearer token plus paired CSRF token.
pub async fn create_session(pool: &PgPool, user_id: Uuid) -> Result<UserTokenRow, AppError> {
    let token = new_opaque_token();
    let csrf_token = new_opaque_token();
    let row: UserTokenRow = sqlx::query_as(
        r#"
        INSERT INTO user_tokens (id, user_id, token, csrf_token, expires_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&token)
    .bind(&csrf_token)
    .bind(Utc::now() + Duration::days(TOKEN_TTL_DAYS))
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Revokes one session token. Missing token is a no-op.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM user_tokens WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

fn new_opaque_token() -> String {
    // Two v4 UUIDs back to back: 256 bits of randomness, hex, no separators.
    format!(
        "{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    )
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let row: Option<(Uuid, String, String, String)> = sqlx::query_as(
            r#"
            SELECT u.id, u.role, t.token, t.csrf_token
            FROM user_tokens t
            JOIN users u ON u.id = t.user_id
            WHERE t.token = $1 AND t.expires_at > now()
            "#,
        )
        .bind(bearer)
        .fetch_optional(&state.db)
        .await?;

        let (id, role, token, csrf_token) = row.ok_or(AppError::Unauthorized)?;
        let role = Role::parse(&role).ok_or(AppError::Unauthorized)?;

        Ok(CurrentUser {
            id,
            role,
            token,
            csrf_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn make_user(csrf: &str) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            role: Role::Seeker,
            token: "t".to_string(),
            csrf_token: csrf.to_string(),
        }
    }

    #[test]
    fn test_require_role_mismatch_is_forbidden() {
        let user = make_user("c");
        assert!(matches!(
            user.require_role(Role::Employer),
            Err(AppError::Forbidden)
        ));
        assert!(user.require_role(Role::Seeker).is_ok());
    }

    #[test]
    fn test_csrf_match_passes() {
        let user = make_user("abc123");
        let mut headers = HeaderMap::new();
        headers.insert(CSRF_HEADER, HeaderValue::from_static("abc123"));
        assert!(user.require_csrf(&headers).is_ok());
    }

    #[test]
    fn test_csrf_mismatch_is_validation_error() {
        let user = make_user("abc123");
        let mut headers = HeaderMap::new();
        headers.insert(CSRF_HEADER, HeaderValue::from_static("wrong"));
        assert!(matches!(
            user.require_csrf(&headers),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_csrf_missing_header_is_validation_error() {
        let user = make_user("abc123");
        assert!(user.require_csrf(&HeaderMap::new()).is_err());
    }

    #[test]
    fn test_opaque_tokens_are_unique_and_long() {
        let a = new_opaque_token();
        let b = new_opaque_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }
}
