use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The fixed job-type enumeration. Filter values outside this set are ignored
/// rather than rejected.
pub const JOB_TYPES: &[&str] = &[
    "full_time",
    "part_time",
    "contract",
    "temporary",
    "internship",
];

/// Fixed category enumeration for listings and the category filter.
pub const CATEGORIES: &[&str] = &[
    "technology",
    "healthcare",
    "finance",
    "education",
    "marketing",
    "sales",
    "design",
    "operations",
    "customer_service",
    "other",
];

/// Listing lifecycle status. `active` is the only state visible in search.
pub const LISTING_STATUSES: &[&str] = &["active", "inactive", "pending"];

pub fn is_valid_job_type(s: &str) -> bool {
    JOB_TYPES.contains(&s)
}

pub fn is_valid_category(s: &str) -> bool {
    CATEGORIES.contains(&s)
}

pub fn is_valid_listing_status(s: &str) -> bool {
    LISTING_STATUSES.contains(&s)
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobListingRow {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
    pub location: String,
    pub category: String,
    pub job_type: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub status: String,
    pub featured: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Search-result row: a listing joined with its employer's display label.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobListingWithEmployer {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: Option<String>,
    pub location: String,
    pub category: String,
    pub job_type: String,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub status: String,
    pub featured: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub employer_label: String,
}
