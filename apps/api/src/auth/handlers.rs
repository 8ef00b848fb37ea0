use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activity::log_activity;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::session::{create_session, delete_session, CurrentUser};
use crate::errors::{conflict_on_unique, AppError};
use crate::models::user::{Role, UserProfile, UserRow};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: String,
    pub name: String,
    pub company_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub csrf_token: String,
    pub user: UserProfile,
}

/// POST /api/v1/auth/register
///
/// Admin accounts are seeded out of band; registration only mints seekers and
/// employers. The unique-email constraint is the canonical duplicate signal.
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let mut errors = Vec::new();
    if req.email.trim().is_empty() || !req.email.contains('@') {
        errors.push("A valid email address is required".to_string());
    }
    if req.password.len() < 8 {
        errors.push("Password must be at least 8 characters".to_string());
    }
    if req.name.trim().is_empty() {
        errors.push("Name is required".to_string());
    }
    let role = match Role::parse(&req.role) {
        Some(r @ (Role::Seeker | Role::Employer)) => Some(r),
        _ => {
            errors.push("Role must be 'seeker' or 'employer'".to_string());
            None
        }
    };
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let role = role.unwrap_or(Role::Seeker);

    let password_hash = hash_password(&req.password)?;
    let user: UserRow = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role, name, company_name)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(req.email.trim().to_lowercase())
    .bind(&password_hash)
    .bind(role.as_str())
    .bind(req.name.trim())
    .bind(req.company_name.as_deref().map(str::trim))
    .fetch_one(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, "An account with this email already exists"))?;

    log_activity(&state.db, Some(user.id), "register", role.as_str()).await;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/v1/auth/login
///
/// Unknown email and wrong password produce the same response — no account
/// enumeration through error text.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(req.email.trim().to_lowercase())
        .fetch_optional(&state.db)
        .await?;

    let user = match user {
        Some(u) if verify_password(&req.password, &u.password_hash) => u,
        _ => return Err(AppError::Unauthorized),
    };

    let session = create_session(&state.db, user.id).await?;
    log_activity(&state.db, Some(user.id), "login", "").await;

    Ok(Json(LoginResponse {
        token: session.token,
        csrf_token: session.csrf_token,
        user: user.into(),
    }))
}

/// POST /api/v1/auth/logout
///
/// State-changing like any other mutation, so the CSRF echo is required here
/// too; a cross-site logout is still a forced action against the session.
pub async fn handle_logout(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    user.require_csrf(&headers)?;
    delete_session(&state.db, &user.token).await?;
    log_activity(&state.db, Some(user.id), "logout", "").await;
    Ok(StatusCode::NO_CONTENT)
}
