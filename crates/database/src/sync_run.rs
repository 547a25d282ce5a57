//! Sync run lifecycle persistence.
//!
//! A run is inserted as `running` and moved to exactly one terminal state.
//! Terminal updates only match rows that are still `running`, so a second
//! completion attempt reports `NotFound` instead of overwriting the outcome.

use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{SyncRun, SyncStatus};

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Record the start of a run and return its id.
pub async fn create_run(pool: &SqlitePool, entity_type: &str) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO sync_runs (entity_type, started_at, status, records_synced)
        VALUES (?, ?, ?, 0)
        RETURNING id
        "#,
    )
    .bind(entity_type)
    .bind(now_rfc3339())
    .bind(SyncStatus::Running)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Mark a running run as successful.
pub async fn mark_success(pool: &SqlitePool, id: i64, records_synced: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE sync_runs
        SET status = ?, records_synced = ?, completed_at = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(SyncStatus::Success)
    .bind(records_synced)
    .bind(now_rfc3339())
    .bind(id)
    .bind(SyncStatus::Running)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "running SyncRun",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Mark a running run as failed, keeping the error for operators.
pub async fn mark_failed(pool: &SqlitePool, id: i64, error_message: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE sync_runs
        SET status = ?, error_message = ?, completed_at = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(SyncStatus::Failed)
    .bind(error_message)
    .bind(now_rfc3339())
    .bind(id)
    .bind(SyncStatus::Running)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "running SyncRun",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Get a run by id.
pub async fn get_run(pool: &SqlitePool, id: i64) -> Result<SyncRun> {
    sqlx::query_as::<_, SyncRun>(
        r#"
        SELECT id, entity_type, started_at, completed_at, status, records_synced, error_message
        FROM sync_runs
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "SyncRun",
        id: id.to_string(),
    })
}

/// Get the most recently started run, if any.
pub async fn latest_run(pool: &SqlitePool) -> Result<Option<SyncRun>> {
    let run = sqlx::query_as::<_, SyncRun>(
        r#"
        SELECT id, entity_type, started_at, completed_at, status, records_synced, error_message
        FROM sync_runs
        ORDER BY started_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(run)
}

/// Get the most recently started run that is still `running`, if any.
pub async fn find_running(pool: &SqlitePool) -> Result<Option<SyncRun>> {
    let run = sqlx::query_as::<_, SyncRun>(
        r#"
        SELECT id, entity_type, started_at, completed_at, status, records_synced, error_message
        FROM sync_runs
        WHERE status = ?
        ORDER BY started_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(SyncStatus::Running)
    .fetch_optional(pool)
    .await?;

    Ok(run)
}
