//! Database liveness probe

use sqlx::PgPool;

/// True when a trivial query round-trips
pub async fn is_alive(pool: &PgPool) -> bool {
    match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(error = %e, "database liveness check failed");
            false
        }
    }
}
