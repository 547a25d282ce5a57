use async_trait::async_trait;
use database::guest::upsert_guest;
use database::NewGuest;
use guesty_client::EntityKind;
use serde_json::Value;
use tracing::warn;

use super::{EntitySyncer, SyncContext};
use crate::error::Result;
use crate::record::{external_id, hash_email, str_field};

/// Pulls `/guests`. Emails are hashed before they reach the store.
#[derive(Debug, Default, Clone, Copy)]
pub struct GuestSyncer;

/// Transform a raw guest; `None` when it has no `_id`.
pub fn guest_from(record: &Value) -> Option<NewGuest> {
    Some(NewGuest {
        external_id: external_id(record)?,
        email_hash: hash_email(str_field(record, "email")),
    })
}

#[async_trait]
impl EntitySyncer for GuestSyncer {
    fn entity(&self) -> EntityKind {
        EntityKind::Guests
    }

    async fn store(&self, ctx: &SyncContext<'_>, record: &Value) -> Result<Option<(String, String)>> {
        let Some(guest) = guest_from(record) else {
            warn!("Skipping guest without _id");
            return Ok(None);
        };

        let local_id = upsert_guest(ctx.db.pool(), &guest).await?;
        Ok(Some((guest.external_id, local_id)))
    }
}
