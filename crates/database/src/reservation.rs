//! Reservation persistence.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{NewReservation, Reservation};

/// Insert or refresh a reservation keyed by its external id, returning the local id.
pub async fn upsert_reservation(pool: &SqlitePool, reservation: &NewReservation) -> Result<String> {
    let id = sqlx::query_scalar::<_, String>(
        r#"
        INSERT INTO reservations (
            id, external_id, listing_id, guest_id, source, status, check_in, check_out,
            booked_at, total_price, nights, lead_time_days, cancelled_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(external_id) DO UPDATE SET
            listing_id = excluded.listing_id,
            guest_id = excluded.guest_id,
            source = excluded.source,
            status = excluded.status,
            check_in = excluded.check_in,
            check_out = excluded.check_out,
            booked_at = excluded.booked_at,
            total_price = excluded.total_price,
            nights = excluded.nights,
            lead_time_days = excluded.lead_time_days,
            cancelled_at = excluded.cancelled_at,
            updated_at = datetime('now')
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&reservation.external_id)
    .bind(&reservation.listing_id)
    .bind(&reservation.guest_id)
    .bind(&reservation.source)
    .bind(&reservation.status)
    .bind(&reservation.check_in)
    .bind(&reservation.check_out)
    .bind(&reservation.booked_at)
    .bind(reservation.total_price)
    .bind(reservation.nights)
    .bind(reservation.lead_time_days)
    .bind(&reservation.cancelled_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Get a reservation by its Guesty id.
pub async fn get_reservation_by_external_id(
    pool: &SqlitePool,
    external_id: &str,
) -> Result<Reservation> {
    sqlx::query_as::<_, Reservation>(
        r#"
        SELECT id, external_id, listing_id, guest_id, source, status, check_in, check_out,
               booked_at, total_price, nights, lead_time_days, cancelled_at, created_at, updated_at
        FROM reservations
        WHERE external_id = ?
        "#,
    )
    .bind(external_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Reservation",
        id: external_id.to_string(),
    })
}

/// List all reservations ordered by external id.
pub async fn list_reservations(pool: &SqlitePool) -> Result<Vec<Reservation>> {
    let rows = sqlx::query_as::<_, Reservation>(
        r#"
        SELECT id, external_id, listing_id, guest_id, source, status, check_in, check_out,
               booked_at, total_price, nights, lead_time_days, cancelled_at, created_at, updated_at
        FROM reservations
        ORDER BY external_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Count total reservations.
pub async fn count_reservations(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reservations")
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// Count reservations grouped by normalized source.
pub async fn count_reservations_by_source(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT source, COUNT(*) as count
        FROM reservations
        GROUP BY source
        ORDER BY count DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
