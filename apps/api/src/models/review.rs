use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A review row. Status is `pending` until an admin approves it; only
/// approved reviews are public and only they count toward the rating
/// aggregate.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EmployerReviewRow {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub seeker_id: Uuid,
    pub rating: i16,
    pub title: String,
    pub body: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Public view of an approved review: reviewer shown by name only.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PublicReviewRow {
    pub id: Uuid,
    pub rating: i16,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub reviewer_name: String,
}
