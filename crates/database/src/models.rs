//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A rental property, keyed by its Guesty `_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Listing {
    /// Local UUID, stable across re-syncs.
    pub id: String,
    /// Guesty listing id.
    pub external_id: String,
    /// Listing title.
    pub name: String,
    pub bedrooms: i64,
    /// Guesty reports half baths, so this is fractional.
    pub bathrooms: f64,
    pub property_type: Option<String>,
    pub active: bool,
    /// Full formatted address.
    pub address: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Listing fields as extracted from an upstream record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    pub external_id: String,
    pub name: String,
    pub bedrooms: i64,
    pub bathrooms: f64,
    pub property_type: Option<String>,
    pub active: bool,
    pub address: Option<String>,
}

/// A guest. Only a one-way hash of the email is ever stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Guest {
    /// Local UUID, stable across re-syncs.
    pub id: String,
    /// Guesty guest id.
    pub external_id: String,
    /// Hex SHA-256 of the lower-cased email.
    pub email_hash: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Guest fields as extracted from an upstream record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGuest {
    pub external_id: String,
    pub email_hash: Option<String>,
}

/// A booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    /// Local UUID, stable across re-syncs.
    pub id: String,
    /// Guesty reservation id.
    pub external_id: String,
    /// Local listing id, null when the listing was not synced in the same run.
    pub listing_id: Option<String>,
    /// Local guest id, null when the guest was not synced in the same run.
    pub guest_id: Option<String>,
    /// Normalized booking channel.
    pub source: String,
    pub status: String,
    /// Check-in date (`YYYY-MM-DD`).
    pub check_in: String,
    /// Check-out date (`YYYY-MM-DD`).
    pub check_out: String,
    /// RFC 3339 booking timestamp.
    pub booked_at: String,
    /// Total price in minor currency units.
    pub total_price: i64,
    pub nights: i64,
    pub lead_time_days: i64,
    pub cancelled_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Reservation fields as extracted from an upstream record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReservation {
    pub external_id: String,
    pub listing_id: Option<String>,
    pub guest_id: Option<String>,
    pub source: String,
    pub status: String,
    pub check_in: String,
    pub check_out: String,
    pub booked_at: String,
    pub total_price: i64,
    pub nights: i64,
    pub lead_time_days: i64,
    pub cancelled_at: Option<String>,
}

/// An inquiry thread, possibly converted into a reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    /// Local UUID, stable across re-syncs.
    pub id: String,
    /// Guesty conversation id.
    pub external_id: String,
    pub listing_id: Option<String>,
    pub guest_id: Option<String>,
    pub reservation_id: Option<String>,
    /// Normalized booking channel.
    pub source: String,
    /// Generated by the store from `reservation_id`; never written directly.
    pub converted_to_booking: bool,
    pub first_message_at: Option<String>,
    pub message_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Conversation fields as extracted from an upstream record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConversation {
    pub external_id: String,
    pub listing_id: Option<String>,
    pub guest_id: Option<String>,
    pub reservation_id: Option<String>,
    pub source: String,
    pub first_message_at: Option<String>,
    pub message_count: i64,
}

/// Lifecycle state of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum SyncStatus {
    Running,
    Success,
    Failed,
}

impl SyncStatus {
    /// Status as stored and reported.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Running => "running",
            SyncStatus::Success => "success",
            SyncStatus::Failed => "failed",
        }
    }

    /// Whether the run has finished.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SyncStatus::Running)
    }
}

/// One invocation of the ingestion pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SyncRun {
    /// Auto-incrementing ID.
    pub id: i64,
    /// `full` for orchestrated runs.
    pub entity_type: String,
    /// RFC 3339 start timestamp.
    pub started_at: String,
    /// RFC 3339 completion timestamp, set with the terminal status.
    pub completed_at: Option<String>,
    pub status: SyncStatus,
    pub records_synced: i64,
    pub error_message: Option<String>,
}
