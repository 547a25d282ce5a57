//! Conversation persistence.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{Conversation, NewConversation};

/// Insert or refresh a conversation keyed by its external id, returning the local id.
///
/// `converted_to_booking` is a generated column and follows `reservation_id`.
pub async fn upsert_conversation(
    pool: &SqlitePool,
    conversation: &NewConversation,
) -> Result<String> {
    let id = sqlx::query_scalar::<_, String>(
        r#"
        INSERT INTO conversations (
            id, external_id, listing_id, guest_id, reservation_id, source,
            first_message_at, message_count
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(external_id) DO UPDATE SET
            listing_id = excluded.listing_id,
            guest_id = excluded.guest_id,
            reservation_id = excluded.reservation_id,
            source = excluded.source,
            first_message_at = excluded.first_message_at,
            message_count = excluded.message_count,
            updated_at = datetime('now')
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&conversation.external_id)
    .bind(&conversation.listing_id)
    .bind(&conversation.guest_id)
    .bind(&conversation.reservation_id)
    .bind(&conversation.source)
    .bind(&conversation.first_message_at)
    .bind(conversation.message_count)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Get a conversation by its Guesty id.
pub async fn get_conversation_by_external_id(
    pool: &SqlitePool,
    external_id: &str,
) -> Result<Conversation> {
    sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, external_id, listing_id, guest_id, reservation_id, source,
               converted_to_booking, first_message_at, message_count, created_at, updated_at
        FROM conversations
        WHERE external_id = ?
        "#,
    )
    .bind(external_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Conversation",
        id: external_id.to_string(),
    })
}

/// Count total conversations.
pub async fn count_conversations(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM conversations")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
