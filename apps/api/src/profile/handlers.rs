use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::applications::storage::{store_photo, FileUpload};
use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::listing::JobListingWithEmployer;
use crate::models::user::{Role, UserProfile, UserRow};
use crate::state::AppState;

pub const MAX_PHOTO_BYTES: usize = 2_000_000;
pub const ALLOWED_PHOTO_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Collects every problem with a profile image before reporting.
pub fn validate_photo(upload: &FileUpload) -> Vec<String> {
    let mut errors = Vec::new();
    if !ALLOWED_PHOTO_TYPES.contains(&upload.content_type.as_str()) {
        errors.push(format!(
            "Profile image must be a JPEG or PNG (got '{}')",
            upload.content_type
        ));
    }
    if upload.bytes.len() > MAX_PHOTO_BYTES {
        errors.push(format!(
            "Profile image exceeds the {} byte limit ({} bytes)",
            MAX_PHOTO_BYTES,
            upload.bytes.len()
        ));
    }
    if upload.bytes.is_empty() {
        errors.push("Uploaded image file is empty".to_string());
    }
    errors
}

/// GET /api/v1/me
pub async fn handle_get_me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UserProfile>, AppError> {
    let row: UserRow = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user.id)
        .fetch_one(&state.db)
        .await?;
    Ok(Json(row.into()))
}

/// Partial profile update: absent fields keep their current value. The seeker
/// fields (skills/education/experience) and the employer field (company_name)
/// are simply ignored for the other role by never being rendered there.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub company_name: Option<String>,
    pub skills: Option<String>,
    pub education: Option<String>,
    pub experience: Option<String>,
}

/// PATCH /api/v1/me
pub async fn handle_update_me(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserProfile>, AppError> {
    user.require_csrf(&headers)?;

    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::validation("Name must not be empty"));
    }

    let row: UserRow = sqlx::query_as(
        r#"
        UPDATE users
        SET name = COALESCE($1, name),
            phone = COALESCE($2, phone),
            location = COALESCE($3, location),
            bio = COALESCE($4, bio),
            company_name = COALESCE($5, company_name),
            skills = COALESCE($6, skills),
            education = COALESCE($7, education),
            experience = COALESCE($8, experience),
            updated_at = now()
        WHERE id = $9
        RETURNING *
        "#,
    )
    .bind(update.name.as_deref().map(str::trim))
    .bind(update.phone)
    .bind(update.location)
    .bind(update.bio)
    .bind(update.company_name)
    .bind(update.skills)
    .bind(update.education)
    .bind(update.experience)
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(row.into()))
}

/// POST /api/v1/me/photo (multipart, field `photo`)
pub async fn handle_upload_photo(
    State(state): State<AppState>,
    user: CurrentUser,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UserProfile>, AppError> {
    user.require_csrf(&headers)?;

    let mut upload: Option<FileUpload> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Malformed form submission: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "photo" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::validation(format!("Malformed form submission: {e}")))?;
            upload = Some(FileUpload {
                filename,
                content_type,
                bytes,
            });
        }
    }

    let upload = upload.ok_or_else(|| AppError::validation("A profile image is required"))?;
    let errors = validate_photo(&upload);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let path = store_photo(&state.config.upload_dir, &upload).await?;

    let row: UserRow = sqlx::query_as(
        "UPDATE users SET profile_image = $1, updated_at = now() WHERE id = $2 RETURNING *",
    )
    .bind(&path)
    .bind(user.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(row.into()))
}

/// POST /api/v1/jobs/:id/save
///
/// Idempotent: saving an already-saved job is a no-op, not a conflict.
pub async fn handle_save_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    user: CurrentUser,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    user.require_role(Role::Seeker)?;
    user.require_csrf(&headers)?;

    let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM job_listings WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&state.db)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!("Job listing {job_id} not found")));
    }

    sqlx::query(
        r#"
        INSERT INTO saved_jobs (user_id, job_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, job_id) DO NOTHING
        "#,
    )
    .bind(user.id)
    .bind(job_id)
    .execute(&state.db)
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/jobs/:id/save
pub async fn handle_unsave_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    user: CurrentUser,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    user.require_role(Role::Seeker)?;
    user.require_csrf(&headers)?;

    sqlx::query("DELETE FROM saved_jobs WHERE user_id = $1 AND job_id = $2")
        .bind(user.id)
        .bind(job_id)
        .execute(&state.db)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/me/saved-jobs — saved listings, most recently saved first.
pub async fn handle_saved_jobs(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<JobListingWithEmployer>>, AppError> {
    user.require_role(Role::Seeker)?;

    let rows: Vec<JobListingWithEmployer> = sqlx::query_as(
        r#"
        SELECT j.id, j.employer_id, j.title, j.description, j.requirements, j.location,
               j.category, j.job_type, j.salary_min, j.salary_max, j.status, j.featured,
               j.expires_at, j.created_at,
               COALESCE(NULLIF(u.company_name, ''), u.name) AS employer_label
        FROM saved_jobs s
        JOIN job_listings j ON j.id = s.job_id
        JOIN users u ON u.id = j.employer_id
        WHERE s.user_id = $1
        ORDER BY s.created_at DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn photo(content_type: &str, size: usize) -> FileUpload {
        FileUpload {
            filename: "avatar.png".to_string(),
            content_type: content_type.to_string(),
            bytes: Bytes::from(vec![0u8; size]),
        }
    }

    #[test]
    fn test_valid_png_accepted() {
        assert!(validate_photo(&photo("image/png", 500_000)).is_empty());
    }

    #[test]
    fn test_oversized_photo_rejected() {
        let errors = validate_photo(&photo("image/jpeg", 3_000_000));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("byte limit"));
    }

    #[test]
    fn test_wrong_type_and_size_collected_together() {
        let errors = validate_photo(&photo("image/gif", 3_000_000));
        assert_eq!(errors.len(), 2, "collected: {errors:?}");
    }
}
