use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::activity::log_activity;
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::listings::search::{run_search, SearchPage, SearchParams};
use crate::models::listing::{
    is_valid_category, is_valid_job_type, JobListingRow, JobListingWithEmployer,
};
use crate::models::user::Role;
use crate::state::AppState;

/// GET /api/v1/jobs
///
/// Public browse/search. A query fault degrades to the "no jobs found" page
/// (empty set, total 0, one page) instead of surfacing an error — the public
/// listing page must always render.
pub async fn handle_browse(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchPage> {
    match run_search(&state.db, &params).await {
        Ok(page) => Json(page),
        Err(e) => {
            error!("Job search failed, degrading to empty result: {e}");
            Json(SearchPage::empty(params.page()))
        }
    }
}

/// GET /api/v1/jobs/:id
///
/// Single-listing view does not degrade: a bad or expired id is a 404.
pub async fn handle_get_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobListingWithEmployer>, AppError> {
    let listing: Option<JobListingWithEmployer> = sqlx::query_as(
        r#"
        SELECT j.id, j.employer_id, j.title, j.description, j.requirements, j.location,
               j.category, j.job_type, j.salary_min, j.salary_max, j.status, j.featured,
               j.expires_at, j.created_at,
               COALESCE(NULLIF(u.company_name, ''), u.name) AS employer_label
        FROM job_listings j
        JOIN users u ON u.id = j.employer_id
        WHERE j.id = $1
          AND j.status = 'active'
          AND (j.expires_at IS NULL OR j.expires_at > now())
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?;

    listing
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Job listing {id} not found")))
}

#[derive(Debug, Deserialize)]
pub struct ListingForm {
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
    pub location: String,
    pub category: String,
    pub job_type: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub featured: Option<bool>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Runs every applicable check and returns the full list of failures.
pub fn validate_listing_form(form: &ListingForm) -> Vec<String> {
    let mut errors = Vec::new();
    if form.title.trim().is_empty() {
        errors.push("Title is required".to_string());
    }
    if form.description.trim().is_empty() {
        errors.push("Description is required".to_string());
    }
    if form.location.trim().is_empty() {
        errors.push("Location is required".to_string());
    }
    if !is_valid_category(&form.category) {
        errors.push(format!("Unknown category '{}'", form.category));
    }
    if !is_valid_job_type(&form.job_type) {
        errors.push(format!("Unknown job type '{}'", form.job_type));
    }
    if form.salary_min.is_some_and(|s| s < 0) || form.salary_max.is_some_and(|s| s < 0) {
        errors.push("Salary must not be negative".to_string());
    }
    if let (Some(min), Some(max)) = (form.salary_min, form.salary_max) {
        if min > max {
            errors.push("Minimum salary must not exceed maximum salary".to_string());
        }
    }
    errors
}

/// POST /api/v1/employer/jobs
pub async fn handle_create_listing(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
    Json(form): Json<ListingForm>,
) -> Result<(StatusCode, Json<JobListingRow>), AppError> {
    user.require_role(Role::Employer)?;
    user.require_csrf(&headers)?;

    let errors = validate_listing_form(&form);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let listing: JobListingRow = sqlx::query_as(
        r#"
        INSERT INTO job_listings
            (id, employer_id, title, description, requirements, location,
             category, job_type, salary_min, salary_max, status, featured, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'active', $11, $12)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.id)
    .bind(form.title.trim())
    .bind(form.description.trim())
    .bind(form.requirements.as_deref().map(str::trim))
    .bind(form.location.trim())
    .bind(&form.category)
    .bind(&form.job_type)
    .bind(form.salary_min)
    .bind(form.salary_max)
    .bind(form.featured.unwrap_or(false))
    .bind(form.expires_at)
    .fetch_one(&state.db)
    .await?;

    log_activity(&state.db, Some(user.id), "post_listing", &listing.id.to_string()).await;

    Ok((StatusCode::CREATED, Json(listing)))
}

/// GET /api/v1/employer/jobs — all of the caller's listings, any status.
pub async fn handle_my_listings(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<JobListingRow>>, AppError> {
    user.require_role(Role::Employer)?;

    let listings: Vec<JobListingRow> = sqlx::query_as(
        "SELECT * FROM job_listings WHERE employer_id = $1 ORDER BY created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(listings))
}

/// Loads a listing and enforces employer ownership.
async fn owned_listing(
    state: &AppState,
    user: &CurrentUser,
    id: Uuid,
) -> Result<JobListingRow, AppError> {
    let listing: Option<JobListingRow> = sqlx::query_as("SELECT * FROM job_listings WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    let listing = listing.ok_or_else(|| AppError::NotFound(format!("Job listing {id} not found")))?;
    if listing.employer_id != user.id {
        return Err(AppError::Forbidden);
    }
    Ok(listing)
}

/// PATCH /api/v1/employer/jobs/:id
pub async fn handle_update_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    headers: HeaderMap,
    Json(form): Json<ListingForm>,
) -> Result<Json<JobListingRow>, AppError> {
    user.require_role(Role::Employer)?;
    user.require_csrf(&headers)?;
    owned_listing(&state, &user, id).await?;

    let errors = validate_listing_form(&form);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let listing: JobListingRow = sqlx::query_as(
        r#"
        UPDATE job_listings
        SET title = $1, description = $2, requirements = $3, location = $4,
            category = $5, job_type = $6, salary_min = $7, salary_max = $8,
            featured = $9, expires_at = $10, updated_at = now()
        WHERE id = $11
        RETURNING *
        "#,
    )
    .bind(form.title.trim())
    .bind(form.description.trim())
    .bind(form.requirements.as_deref().map(str::trim))
    .bind(form.location.trim())
    .bind(&form.category)
    .bind(&form.job_type)
    .bind(form.salary_min)
    .bind(form.salary_max)
    .bind(form.featured.unwrap_or(false))
    .bind(form.expires_at)
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(listing))
}

#[derive(Debug, Deserialize)]
pub struct StatusToggle {
    pub status: String,
}

/// PATCH /api/v1/employer/jobs/:id/status
///
/// Employers flip between active and inactive; `pending` is an admin-only
/// moderation state.
pub async fn handle_toggle_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    headers: HeaderMap,
    Json(body): Json<StatusToggle>,
) -> Result<Json<JobListingRow>, AppError> {
    user.require_role(Role::Employer)?;
    user.require_csrf(&headers)?;
    owned_listing(&state, &user, id).await?;

    if body.status != "active" && body.status != "inactive" {
        return Err(AppError::validation(
            "Status must be 'active' or 'inactive'",
        ));
    }

    let listing: JobListingRow = sqlx::query_as(
        "UPDATE job_listings SET status = $1, updated_at = now() WHERE id = $2 RETURNING *",
    )
    .bind(&body.status)
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(listing))
}
