use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::activity::log_activity;
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::listing::{is_valid_listing_status, JobListingRow};
use crate::models::review::EmployerReviewRow;
use crate::models::user::{Role, UserProfile, UserRow};
use crate::state::AppState;

/// GET /api/v1/admin/users
pub async fn handle_list_users(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    user.require_role(Role::Admin)?;

    let rows: Vec<UserRow> = sqlx::query_as("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(rows.into_iter().map(UserProfile::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct ListingStatusUpdate {
    pub status: String,
}

/// PATCH /api/v1/admin/jobs/:id/status
///
/// Admins may set any status, including the `pending` moderation hold that
/// employers cannot set themselves.
pub async fn handle_set_listing_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    headers: HeaderMap,
    Json(body): Json<ListingStatusUpdate>,
) -> Result<Json<JobListingRow>, AppError> {
    user.require_role(Role::Admin)?;
    user.require_csrf(&headers)?;

    if !is_valid_listing_status(&body.status) {
        return Err(AppError::validation(format!(
            "Unknown listing status '{}'",
            body.status
        )));
    }

    let listing: Option<JobListingRow> = sqlx::query_as(
        "UPDATE job_listings SET status = $1, updated_at = now() WHERE id = $2 RETURNING *",
    )
    .bind(&body.status)
    .bind(id)
    .fetch_optional(&state.db)
    .await?;

    let listing =
        listing.ok_or_else(|| AppError::NotFound(format!("Job listing {id} not found")))?;

    log_activity(
        &state.db,
        Some(user.id),
        "moderate_listing",
        &format!("{id}:{}", body.status),
    )
    .await;

    Ok(Json(listing))
}

/// GET /api/v1/admin/reviews/pending — the moderation queue, oldest first.
pub async fn handle_pending_reviews(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<EmployerReviewRow>>, AppError> {
    user.require_role(Role::Admin)?;

    let rows: Vec<EmployerReviewRow> = sqlx::query_as(
        "SELECT * FROM employer_reviews WHERE status = 'pending' ORDER BY created_at ASC",
    )
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct ReviewModeration {
    /// "approve" publishes the review; "reject" deletes it.
    pub action: String,
}

/// PATCH /api/v1/admin/reviews/:id
pub async fn handle_moderate_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    headers: HeaderMap,
    Json(body): Json<ReviewModeration>,
) -> Result<StatusCode, AppError> {
    user.require_role(Role::Admin)?;
    user.require_csrf(&headers)?;

    let affected = match body.action.as_str() {
        "approve" => {
            sqlx::query("UPDATE employer_reviews SET status = 'approved' WHERE id = $1")
                .bind(id)
                .execute(&state.db)
                .await?
                .rows_affected()
        }
        "reject" => {
            sqlx::query("DELETE FROM employer_reviews WHERE id = $1")
                .bind(id)
                .execute(&state.db)
                .await?
                .rows_affected()
        }
        other => {
            return Err(AppError::validation(format!(
                "Action must be 'approve' or 'reject', got '{other}'"
            )))
        }
    };

    if affected == 0 {
        return Err(AppError::NotFound(format!("Review {id} not found")));
    }

    log_activity(
        &state.db,
        Some(user.id),
        "moderate_review",
        &format!("{id}:{}", body.action),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}
