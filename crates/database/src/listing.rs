//! Listing persistence.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{Listing, NewListing};

/// Insert or refresh a listing keyed by its external id.
///
/// Returns the local id, which is preserved when the listing already exists.
pub async fn upsert_listing(pool: &SqlitePool, listing: &NewListing) -> Result<String> {
    let id = sqlx::query_scalar::<_, String>(
        r#"
        INSERT INTO listings (id, external_id, name, bedrooms, bathrooms, property_type, active, address)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(external_id) DO UPDATE SET
            name = excluded.name,
            bedrooms = excluded.bedrooms,
            bathrooms = excluded.bathrooms,
            property_type = excluded.property_type,
            active = excluded.active,
            address = excluded.address,
            updated_at = datetime('now')
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&listing.external_id)
    .bind(&listing.name)
    .bind(listing.bedrooms)
    .bind(listing.bathrooms)
    .bind(&listing.property_type)
    .bind(listing.active)
    .bind(&listing.address)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Get a listing by its Guesty id.
pub async fn get_listing_by_external_id(pool: &SqlitePool, external_id: &str) -> Result<Listing> {
    sqlx::query_as::<_, Listing>(
        r#"
        SELECT id, external_id, name, bedrooms, bathrooms, property_type, active, address,
               created_at, updated_at
        FROM listings
        WHERE external_id = ?
        "#,
    )
    .bind(external_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Listing",
        id: external_id.to_string(),
    })
}

/// List all listings ordered by external id.
pub async fn list_listings(pool: &SqlitePool) -> Result<Vec<Listing>> {
    let listings = sqlx::query_as::<_, Listing>(
        r#"
        SELECT id, external_id, name, bedrooms, bathrooms, property_type, active, address,
               created_at, updated_at
        FROM listings
        ORDER BY external_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(listings)
}

/// Count total listings.
pub async fn count_listings(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM listings")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
