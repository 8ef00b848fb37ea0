#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User roles. Stored as text; `parse` rejects anything outside the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Seeker,
    Employer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Seeker => "seeker",
            Role::Employer => "employer",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "seeker" => Some(Role::Seeker),
            "employer" => Some(Role::Employer),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub name: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub company_name: Option<String>,
    pub skills: Option<String>,
    pub education: Option<String>,
    pub experience: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Display label used everywhere a user is shown next to a listing or
    /// review: company name when present and non-empty, personal name
    /// otherwise. The search queries apply the same rule in SQL via
    /// `COALESCE(NULLIF(company_name, ''), name)`.
    pub fn display_label(&self) -> &str {
        match self.company_name.as_deref() {
            Some(c) if !c.is_empty() => c,
            _ => &self.name,
        }
    }
}

/// Client-safe projection of a user — never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub name: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub company_name: Option<String>,
    pub skills: Option<String>,
    pub education: Option<String>,
    pub experience: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        UserProfile {
            id: row.id,
            email: row.email,
            role: row.role,
            name: row.name,
            phone: row.phone,
            location: row.location,
            bio: row.bio,
            company_name: row.company_name,
            skills: row.skills,
            education: row.education,
            experience: row.experience,
            profile_image: row.profile_image,
            created_at: row.created_at,
        }
    }
}

/// Session row: opaque bearer token plus the paired CSRF token.
#[derive(Debug, Clone, FromRow)]
pub struct UserTokenRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub csrf_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_user(name: &str, company: Option<&str>) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            email: "a@b.c".to_string(),
            password_hash: String::new(),
            role: "employer".to_string(),
            name: name.to_string(),
            phone: None,
            location: None,
            bio: None,
            company_name: company.map(String::from),
            skills: None,
            education: None,
            experience: None,
            profile_image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_label_prefers_company_name() {
        let u = make_user("Ada", Some("Initech"));
        assert_eq!(u.display_label(), "Initech");
    }

    #[test]
    fn test_display_label_falls_back_on_empty_company() {
        let u = make_user("Ada", Some(""));
        assert_eq!(u.display_label(), "Ada");
    }

    #[test]
    fn test_display_label_falls_back_on_missing_company() {
        let u = make_user("Ada", None);
        assert_eq!(u.display_label(), "Ada");
    }

    #[test]
    fn test_role_parse_rejects_unknown() {
        assert_eq!(Role::parse("moderator"), None);
        assert_eq!(Role::parse("employer"), Some(Role::Employer));
    }
}
