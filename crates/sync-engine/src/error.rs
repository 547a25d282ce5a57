//! Error types for sync operations.

use database::DatabaseError;
use guesty_client::GuestyError;
use thiserror::Error;

/// Errors that abort a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The Guesty API could not be read.
    #[error("Guesty error: {0}")]
    Remote(#[from] GuestyError),

    /// The local store rejected a read or write.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// A syncer panicked mid-run.
    #[error("sync panicked: {0}")]
    Panicked(String),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
