use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::activity::log_activity;
use crate::applications::storage::{remove_upload, store_resume, FileUpload};
use crate::applications::validate::{validate_submission, ResumeSource};
use crate::auth::CurrentUser;
use crate::errors::{conflict_on_unique, AppError};
use crate::models::application::{
    is_valid_application_status, ApplicantRow, ApplicationRow, SeekerApplicationRow,
};
use crate::models::user::Role;
use crate::state::AppState;

/// Multipart fields accepted by the submission form.
struct SubmissionForm {
    cover_letter: String,
    source: ResumeSource,
}

async fn read_submission(mut multipart: Multipart) -> Result<SubmissionForm, AppError> {
    let mut cover_letter = String::new();
    let mut upload: Option<FileUpload> = None;
    let mut existing: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Malformed form submission: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "cover_letter" => {
                cover_letter = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(format!("Malformed form submission: {e}")))?;
            }
            "resume" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Malformed form submission: {e}")))?;
                // An empty file part means the form's file input was left blank.
                if !filename.is_empty() || !bytes.is_empty() {
                    upload = Some(FileUpload {
                        filename,
                        content_type,
                        bytes,
                    });
                }
            }
            "existing_resume" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::validation(format!("Malformed form submission: {e}")))?;
                if !value.trim().is_empty() {
                    existing = Some(value);
                }
            }
            _ => {}
        }
    }

    let source = match (upload, existing) {
        (Some(_), Some(_)) => ResumeSource::Both,
        (Some(u), None) => ResumeSource::Upload(u),
        (None, Some(p)) => ResumeSource::Existing(p),
        (None, None) => ResumeSource::Missing,
    };

    Ok(SubmissionForm {
        cover_letter,
        source,
    })
}

/// POST /api/v1/jobs/:id/apply (multipart)
///
/// Validations all run before reporting. The UNIQUE (job_id, seeker_id)
/// constraint is what actually prevents double-applying; the pre-check below
/// only exists for a friendlier message in the sequential case.
pub async fn handle_apply(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    user: CurrentUser,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    user.require_role(Role::Seeker)?;
    user.require_csrf(&headers)?;

    let open: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT id FROM job_listings
        WHERE id = $1 AND status = 'active'
          AND (expires_at IS NULL OR expires_at > now())
        "#,
    )
    .bind(job_id)
    .fetch_optional(&state.db)
    .await?;
    if open.is_none() {
        return Err(AppError::NotFound(format!("Job listing {job_id} not found")));
    }

    let already: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM applications WHERE job_id = $1 AND seeker_id = $2")
            .bind(job_id)
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?;
    if already.is_some() {
        return Err(AppError::Conflict(
            "You have already applied to this job".to_string(),
        ));
    }

    let form = read_submission(multipart).await?;
    let mut errors = validate_submission(&form.cover_letter, &form.source);

    // Reusing a resume requires that the path belong to one of the caller's
    // own applications.
    if let ResumeSource::Existing(ref path) = form.source {
        let owned: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM applications WHERE seeker_id = $1 AND resume_path = $2 LIMIT 1",
        )
        .bind(user.id)
        .bind(path)
        .fetch_optional(&state.db)
        .await?;
        if owned.is_none() {
            errors.push("Selected resume was not found among your applications".to_string());
        }
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let (resume_path, fresh_upload) = match form.source {
        ResumeSource::Upload(ref upload) => {
            (Some(store_resume(&state.config.upload_dir, upload).await?), true)
        }
        ResumeSource::Existing(path) => (Some(path), false),
        _ => unreachable!("validated above"),
    };

    let inserted: Result<ApplicationRow, sqlx::Error> = sqlx::query_as(
        r#"
        INSERT INTO applications (id, job_id, seeker_id, cover_letter, resume_path, status)
        VALUES ($1, $2, $3, $4, $5, 'pending')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(job_id)
    .bind(user.id)
    .bind(form.cover_letter.trim())
    .bind(&resume_path)
    .fetch_one(&state.db)
    .await;

    let application = match inserted {
        Ok(row) => row,
        Err(e) => {
            // A freshly written file has no row referencing it once the insert
            // fails (e.g. losing the duplicate race), so remove it.
            if fresh_upload {
                if let Some(ref path) = resume_path {
                    remove_upload(&state.config.upload_dir, path).await;
                }
            }
            return Err(conflict_on_unique(e, "You have already applied to this job"));
        }
    };

    log_activity(&state.db, Some(user.id), "apply", &job_id.to_string()).await;

    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/v1/me/applications — the seeker's applications with listing context.
pub async fn handle_my_applications(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<SeekerApplicationRow>>, AppError> {
    user.require_role(Role::Seeker)?;

    let rows: Vec<SeekerApplicationRow> = sqlx::query_as(
        r#"
        SELECT a.id, a.job_id, a.cover_letter, a.resume_path, a.status, a.created_at,
               j.title AS job_title,
               COALESCE(NULLIF(u.company_name, ''), u.name) AS employer_label
        FROM applications a
        JOIN job_listings j ON j.id = a.job_id
        JOIN users u ON u.id = j.employer_id
        WHERE a.seeker_id = $1
        ORDER BY a.created_at DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

/// DELETE /api/v1/me/applications/:id
///
/// Withdrawal deletes the row, which also releases the uniqueness slot so the
/// seeker could apply again later. Only still-pending applications can be
/// withdrawn.
pub async fn handle_withdraw(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    user.require_role(Role::Seeker)?;
    user.require_csrf(&headers)?;

    let row: Option<(String,)> =
        sqlx::query_as("SELECT status FROM applications WHERE id = $1 AND seeker_id = $2")
            .bind(id)
            .bind(user.id)
            .fetch_optional(&state.db)
            .await?;

    match row {
        None => Err(AppError::NotFound(format!("Application {id} not found"))),
        Some((status,)) if status != "pending" => Err(AppError::validation(
            "Only pending applications can be withdrawn",
        )),
        Some(_) => {
            sqlx::query("DELETE FROM applications WHERE id = $1")
                .bind(id)
                .execute(&state.db)
                .await?;
            log_activity(&state.db, Some(user.id), "withdraw", &id.to_string()).await;
            Ok(StatusCode::NO_CONTENT)
        }
    }
}

/// GET /api/v1/employer/jobs/:id/applications — applicants for an owned listing.
pub async fn handle_job_applications(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    user: CurrentUser,
) -> Result<Json<Vec<ApplicantRow>>, AppError> {
    user.require_role(Role::Employer)?;

    let owner: Option<(Uuid,)> =
        sqlx::query_as("SELECT employer_id FROM job_listings WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&state.db)
            .await?;
    match owner {
        None => return Err(AppError::NotFound(format!("Job listing {job_id} not found"))),
        Some((employer_id,)) if employer_id != user.id => return Err(AppError::Forbidden),
        Some(_) => {}
    }

    let rows: Vec<ApplicantRow> = sqlx::query_as(
        r#"
        SELECT a.id, a.job_id, a.seeker_id, a.cover_letter, a.resume_path, a.status,
               a.created_at, u.name AS seeker_name, u.email AS seeker_email
        FROM applications a
        JOIN users u ON u.id = a.seeker_id
        WHERE a.job_id = $1
        ORDER BY a.created_at ASC
        "#,
    )
    .bind(job_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// PATCH /api/v1/employer/applications/:id/status
pub async fn handle_update_application_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    headers: HeaderMap,
    Json(body): Json<StatusUpdate>,
) -> Result<Json<ApplicationRow>, AppError> {
    user.require_role(Role::Employer)?;
    user.require_csrf(&headers)?;

    if !is_valid_application_status(&body.status) {
        return Err(AppError::validation(format!(
            "Unknown application status '{}'",
            body.status
        )));
    }

    // Ownership travels through the listing: only the employer who posted the
    // job may move its applications.
    let owner: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT j.employer_id
        FROM applications a
        JOIN job_listings j ON j.id = a.job_id
        WHERE a.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?;
    match owner {
        None => return Err(AppError::NotFound(format!("Application {id} not found"))),
        Some((employer_id,)) if employer_id != user.id => return Err(AppError::Forbidden),
        Some(_) => {}
    }

    let application: ApplicationRow = sqlx::query_as(
        "UPDATE applications SET status = $1, updated_at = now() WHERE id = $2 RETURNING *",
    )
    .bind(&body.status)
    .bind(id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(application))
}
