//! Guest persistence.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{Guest, NewGuest};

/// Insert or refresh a guest keyed by its external id, returning the local id.
pub async fn upsert_guest(pool: &SqlitePool, guest: &NewGuest) -> Result<String> {
    let id = sqlx::query_scalar::<_, String>(
        r#"
        INSERT INTO guests (id, external_id, email_hash)
        VALUES (?, ?, ?)
        ON CONFLICT(external_id) DO UPDATE SET
            email_hash = excluded.email_hash,
            updated_at = datetime('now')
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&guest.external_id)
    .bind(&guest.email_hash)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Get a guest by its Guesty id.
pub async fn get_guest_by_external_id(pool: &SqlitePool, external_id: &str) -> Result<Guest> {
    sqlx::query_as::<_, Guest>(
        r#"
        SELECT id, external_id, email_hash, created_at, updated_at
        FROM guests
        WHERE external_id = ?
        "#,
    )
    .bind(external_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Guest",
        id: external_id.to_string(),
    })
}

/// Count total guests.
pub async fn count_guests(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM guests")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
