//! SQLite store for synced Guesty data.
//!
//! This crate persists listings, guests, reservations and conversations pulled
//! from the Guesty Open API, plus the lifecycle record of each sync run. Every
//! entity write is an upsert keyed by the upstream `external_id`, so repeated
//! syncs of unchanged data are idempotent.
//!
//! # Example
//!
//! ```no_run
//! use database::{listing, models::NewListing, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:insights.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let listing = NewListing {
//!         external_id: "5f1a2b3c".to_string(),
//!         name: "Beach House".to_string(),
//!         bedrooms: 3,
//!         bathrooms: 2.5,
//!         property_type: Some("House".to_string()),
//!         active: true,
//!         address: None,
//!     };
//!     let local_id = listing::upsert_listing(db.pool(), &listing).await?;
//!     println!("stored as {local_id}");
//!
//!     Ok(())
//! }
//! ```

pub mod conversation;
pub mod error;
pub mod guest;
pub mod listing;
pub mod models;
pub mod reservation;
pub mod sync_run;

pub use error::{DatabaseError, Result};
pub use models::{
    Conversation, Guest, Listing, NewConversation, NewGuest, NewListing, NewReservation,
    Reservation, SyncRun, SyncStatus,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/insights.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing, keep a single connection)
    /// let db = database::Database::connect_with_pool_size("sqlite::memory:", 1).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Check connectivity with a trivial query.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
