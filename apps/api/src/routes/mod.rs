pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};

use crate::state::AppState;
use crate::{admin, applications, auth, listings, profile, reviews};

/// Resume uploads are limited to 5 MB by validation; the body limit sits a
/// little above that so the oversize case reaches the validator and reports a
/// proper message instead of a bare 413.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/register", post(auth::handlers::handle_register))
        .route("/api/v1/auth/login", post(auth::handlers::handle_login))
        .route("/api/v1/auth/logout", post(auth::handlers::handle_logout))
        // Public job search & detail
        .route("/api/v1/jobs", get(listings::handlers::handle_browse))
        .route("/api/v1/jobs/:id", get(listings::handlers::handle_get_listing))
        .route(
            "/api/v1/jobs/:id/apply",
            post(applications::handlers::handle_apply),
        )
        .route(
            "/api/v1/jobs/:id/save",
            post(profile::handlers::handle_save_job).delete(profile::handlers::handle_unsave_job),
        )
        // Employer reviews
        .route(
            "/api/v1/employers/:id/reviews",
            get(reviews::handlers::handle_employer_reviews)
                .post(reviews::handlers::handle_submit_review),
        )
        // Own profile & saved jobs
        .route(
            "/api/v1/me",
            get(profile::handlers::handle_get_me).patch(profile::handlers::handle_update_me),
        )
        .route("/api/v1/me/photo", post(profile::handlers::handle_upload_photo))
        .route(
            "/api/v1/me/applications",
            get(applications::handlers::handle_my_applications),
        )
        .route(
            "/api/v1/me/applications/:id",
            delete(applications::handlers::handle_withdraw),
        )
        .route("/api/v1/me/saved-jobs", get(profile::handlers::handle_saved_jobs))
        // Employer listing management
        .route(
            "/api/v1/employer/jobs",
            get(listings::handlers::handle_my_listings)
                .post(listings::handlers::handle_create_listing),
        )
        .route(
            "/api/v1/employer/jobs/:id",
            patch(listings::handlers::handle_update_listing),
        )
        .route(
            "/api/v1/employer/jobs/:id/status",
            patch(listings::handlers::handle_toggle_status),
        )
        .route(
            "/api/v1/employer/jobs/:id/applications",
            get(applications::handlers::handle_job_applications),
        )
        .route(
            "/api/v1/employer/applications/:id/status",
            patch(applications::handlers::handle_update_application_status),
        )
        // Admin moderation
        .route("/api/v1/admin/users", get(admin::handlers::handle_list_users))
        .route(
            "/api/v1/admin/jobs/:id/status",
            patch(admin::handlers::handle_set_listing_status),
        )
        .route(
            "/api/v1/admin/reviews/pending",
            get(admin::handlers::handle_pending_reviews),
        )
        .route(
            "/api/v1/admin/reviews/:id",
            patch(admin::handlers::handle_moderate_review),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
