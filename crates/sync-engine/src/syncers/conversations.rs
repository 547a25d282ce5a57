use async_trait::async_trait;
use database::conversation::upsert_conversation;
use database::NewConversation;
use guesty_client::EntityKind;
use serde_json::Value;
use tracing::warn;

use super::{EntitySyncer, SyncContext};
use crate::error::Result;
use crate::id_map::IdMap;
use crate::normalizer::SourceNormalizer;
use crate::record::{external_id, format_timestamp, i64_field, parse_timestamp, str_field};

/// Pulls `/communication/conversations`.
///
/// Whether a conversation converted into a booking is derived by the store
/// from the resolved reservation id.
#[derive(Debug, Clone, Copy)]
pub struct ConversationSyncer<'a> {
    listings: &'a IdMap,
    guests: &'a IdMap,
    reservations: &'a IdMap,
}

impl<'a> ConversationSyncer<'a> {
    pub fn new(listings: &'a IdMap, guests: &'a IdMap, reservations: &'a IdMap) -> Self {
        Self {
            listings,
            guests,
            reservations,
        }
    }
}

/// Transform a raw conversation; `None` when it has no `_id`.
pub fn conversation_from(
    record: &Value,
    normalizer: &SourceNormalizer,
    listings: &IdMap,
    guests: &IdMap,
    reservations: &IdMap,
) -> Option<NewConversation> {
    let external_id = external_id(record)?;

    let first_message_at = str_field(record, "createdAt").and_then(|raw| {
        let parsed = parse_timestamp(raw);
        if parsed.is_none() {
            warn!("Conversation {} has unparsable createdAt {:?}", external_id, raw);
        }
        parsed
    });

    Some(NewConversation {
        listing_id: listings.resolve(str_field(record, "listingId")),
        guest_id: guests.resolve(str_field(record, "guestId")),
        reservation_id: reservations.resolve(str_field(record, "reservationId")),
        source: normalizer.normalize(str_field(record, "source")).to_string(),
        first_message_at: first_message_at.map(format_timestamp),
        message_count: i64_field(record.get("messageCount")).unwrap_or(0).max(0),
        external_id,
    })
}

#[async_trait]
impl EntitySyncer for ConversationSyncer<'_> {
    fn entity(&self) -> EntityKind {
        EntityKind::Conversations
    }

    async fn store(&self, ctx: &SyncContext<'_>, record: &Value) -> Result<Option<(String, String)>> {
        let conversation = conversation_from(
            record,
            ctx.normalizer,
            self.listings,
            self.guests,
            self.reservations,
        );
        let Some(conversation) = conversation else {
            warn!("Skipping conversation without _id");
            return Ok(None);
        };

        let local_id = upsert_conversation(ctx.db.pool(), &conversation).await?;
        Ok(Some((conversation.external_id, local_id)))
    }
}
