use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

/// Best-effort activity trail. A failed write is logged at warn and never
/// fails the request that triggered it.
pub async fn log_activity(pool: &PgPool, user_id: Option<Uuid>, action: &str, detail: &str) {
    let result = sqlx::query(
        "INSERT INTO user_activity_log (id, user_id, action, detail) VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action)
    .bind(detail)
    .execute(pool)
    .await;

    if let Err(e) = result {
        warn!("Activity log write failed for action '{action}': {e}");
    }
}
