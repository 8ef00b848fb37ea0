use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activity::log_activity;
use crate::auth::CurrentUser;
use crate::errors::{conflict_on_unique, AppError};
use crate::models::review::{EmployerReviewRow, PublicReviewRow};
use crate::models::user::Role;
use crate::reviews::rating::{aggregate_ratings, RatingSummary};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EmployerReviewsResponse {
    pub summary: RatingSummary,
    pub reviews: Vec<PublicReviewRow>,
}

async fn employer_exists(state: &AppState, employer_id: Uuid) -> Result<(), AppError> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM users WHERE id = $1 AND role = 'employer'")
            .bind(employer_id)
            .fetch_optional(&state.db)
            .await?;
    if row.is_none() {
        return Err(AppError::NotFound(format!("Employer {employer_id} not found")));
    }
    Ok(())
}

/// GET /api/v1/employers/:id/reviews
///
/// Public: approved reviews plus the rating aggregate. Pending reviews are
/// invisible here and excluded from the aggregate.
pub async fn handle_employer_reviews(
    State(state): State<AppState>,
    Path(employer_id): Path<Uuid>,
) -> Result<Json<EmployerReviewsResponse>, AppError> {
    employer_exists(&state, employer_id).await?;

    let reviews: Vec<PublicReviewRow> = sqlx::query_as(
        r#"
        SELECT r.id, r.rating, r.title, r.body, r.created_at, u.name AS reviewer_name
        FROM employer_reviews r
        JOIN users u ON u.id = r.seeker_id
        WHERE r.employer_id = $1 AND r.status = 'approved'
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(employer_id)
    .fetch_all(&state.db)
    .await?;

    let ratings: Vec<i16> = reviews.iter().map(|r| r.rating).collect();

    Ok(Json(EmployerReviewsResponse {
        summary: aggregate_ratings(&ratings),
        reviews,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: i16,
    pub title: String,
    pub body: String,
}

pub fn validate_review_form(form: &ReviewForm) -> Vec<String> {
    let mut errors = Vec::new();
    if !(1..=5).contains(&form.rating) {
        errors.push("Rating must be between 1 and 5".to_string());
    }
    if form.title.trim().is_empty() {
        errors.push("Review title is required".to_string());
    }
    if form.body.trim().is_empty() {
        errors.push("Review text is required".to_string());
    }
    errors
}

/// POST /api/v1/employers/:id/reviews
///
/// New reviews enter the moderation queue as `pending`. The UNIQUE
/// (employer_id, seeker_id) constraint caps each seeker at one review per
/// employer, races included.
pub async fn handle_submit_review(
    State(state): State<AppState>,
    Path(employer_id): Path<Uuid>,
    user: CurrentUser,
    headers: HeaderMap,
    Json(form): Json<ReviewForm>,
) -> Result<(StatusCode, Json<EmployerReviewRow>), AppError> {
    user.require_role(Role::Seeker)?;
    user.require_csrf(&headers)?;
    employer_exists(&state, employer_id).await?;

    let errors = validate_review_form(&form);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let review: EmployerReviewRow = sqlx::query_as(
        r#"
        INSERT INTO employer_reviews (id, employer_id, seeker_id, rating, title, body, status)
        VALUES ($1, $2, $3, $4, $5, $6, 'pending')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(employer_id)
    .bind(user.id)
    .bind(form.rating)
    .bind(form.title.trim())
    .bind(form.body.trim())
    .fetch_one(&state.db)
    .await
    .map_err(|e| conflict_on_unique(e, "You have already reviewed this employer"))?;

    log_activity(&state.db, Some(user.id), "review", &employer_id.to_string()).await;

    Ok((StatusCode::CREATED, Json(review)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(rating: i16, title: &str, body: &str) -> ReviewForm {
        ReviewForm {
            rating,
            title: title.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_valid_review_passes() {
        assert!(validate_review_form(&form(4, "Good place", "Fair process")).is_empty());
    }

    #[test]
    fn test_rating_bounds() {
        assert!(!validate_review_form(&form(0, "t", "b")).is_empty());
        assert!(!validate_review_form(&form(6, "t", "b")).is_empty());
        assert!(validate_review_form(&form(1, "t", "b")).is_empty());
        assert!(validate_review_form(&form(5, "t", "b")).is_empty());
    }

    #[test]
    fn test_all_review_errors_collected() {
        let errors = validate_review_form(&form(9, " ", ""));
        assert_eq!(errors.len(), 3, "collected: {errors:?}");
    }
}
