// src/services/cleanup.rs

use std::time::Duration;

use sqlx::SqlitePool;
use tokio::task::JoinHandle;

/// Time between sweeps.
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Retention window for anonymous results, in hours.
pub const ANONYMOUS_RESULT_MAX_AGE_HOURS: i64 = 24;

/// Deletes anonymous quiz results older than the retention window.
/// Results with an attached identity are never touched.
pub async fn cleanup_anonymous_results(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let cutoff = chrono::Utc::now() - chrono::Duration::hours(ANONYMOUS_RESULT_MAX_AGE_HOURS);

    let result = sqlx::query(
        r#"
        DELETE FROM quiz_results
        WHERE is_anonymous = 1 AND completed_at < ?
        "#,
    )
    .bind(cutoff)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Starts the sweep schedule: one run immediately, then every 24 hours.
///
/// A failed sweep is logged and does not block the next attempt. The
/// returned handle is owned by the process lifecycle; aborting it stops
/// the schedule.
pub fn start_cleanup_schedule(pool: SqlitePool) -> JoinHandle<()> {
    tracing::info!("Anonymous quiz result cleanup scheduled (every 24h)");

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            match cleanup_anonymous_results(&pool).await {
                Ok(deleted) => {
                    tracing::info!(deleted, "Deleted anonymous quiz results");
                }
                Err(e) => {
                    tracing::error!("Failed to delete anonymous quiz results: {:?}", e);
                }
            }
        }
    })
}
