use async_trait::async_trait;
use database::listing::upsert_listing;
use database::NewListing;
use guesty_client::EntityKind;
use serde_json::Value;
use tracing::warn;

use super::{EntitySyncer, SyncContext};
use crate::error::Result;
use crate::record::{bool_field, external_id, f64_field, i64_field, path, str_field};

/// Pulls `/listings`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListingSyncer;

/// Transform a raw listing; `None` when it has no `_id`.
pub fn listing_from(record: &Value) -> Option<NewListing> {
    let external_id = external_id(record)?;

    let name = match str_field(record, "title") {
        Some(title) => title.to_string(),
        None => {
            warn!("Listing {} has no title", external_id);
            String::new()
        }
    };

    Some(NewListing {
        name,
        bedrooms: i64_field(record.get("bedrooms")).unwrap_or(0),
        bathrooms: f64_field(record.get("bathrooms")).unwrap_or(0.0),
        property_type: str_field(record, "propertyType").map(str::to_string),
        active: bool_field(record.get("active")).unwrap_or(true),
        address: path(record, "address.full")
            .and_then(Value::as_str)
            .filter(|full| !full.is_empty())
            .map(str::to_string),
        external_id,
    })
}

#[async_trait]
impl EntitySyncer for ListingSyncer {
    fn entity(&self) -> EntityKind {
        EntityKind::Listings
    }

    async fn store(&self, ctx: &SyncContext<'_>, record: &Value) -> Result<Option<(String, String)>> {
        let Some(listing) = listing_from(record) else {
            warn!("Skipping listing without _id");
            return Ok(None);
        };

        let local_id = upsert_listing(ctx.db.pool(), &listing).await?;
        Ok(Some((listing.external_id, local_id)))
    }
}
