use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Application workflow statuses, in the order an employer steps them.
pub const APPLICATION_STATUSES: &[&str] =
    &["pending", "reviewed", "interviewed", "accepted", "rejected"];

pub fn is_valid_application_status(s: &str) -> bool {
    APPLICATION_STATUSES.contains(&s)
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub seeker_id: Uuid,
    pub cover_letter: String,
    pub resume_path: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Applicant view for employers: the application joined with seeker identity.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicantRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub seeker_id: Uuid,
    pub cover_letter: String,
    pub resume_path: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub seeker_name: String,
    pub seeker_email: String,
}

/// Seeker view: the application joined with the listing it targets.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SeekerApplicationRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub cover_letter: String,
    pub resume_path: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub job_title: String,
    pub employer_label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_enumeration_is_closed() {
        for s in APPLICATION_STATUSES {
            assert!(is_valid_application_status(s));
        }
        assert!(!is_valid_application_status("withdrawn"));
        assert!(!is_valid_application_status(""));
    }
}
