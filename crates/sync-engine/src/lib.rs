//! Guesty-to-SQLite synchronization pipeline.
//!
//! This crate pulls listings, guests, reservations and conversations from the
//! Guesty Open API and upserts them into the local store, in dependency order,
//! recording every run.
//!
//! # Architecture
//!
//! ```text
//! SyncService::trigger ──spawn──▶ SyncOrchestrator::run_full_sync
//!                                  │
//!                                  ├─ create SyncRun (running)
//!                                  ├─ ListingSyncer        ─▶ IdMap (listings)
//!                                  ├─ GuestSyncer          ─▶ IdMap (guests)
//!                                  ├─ ReservationSyncer    ─▶ IdMap (reservations)
//!                                  ├─ ConversationSyncer
//!                                  └─ mark SyncRun success / failed
//!
//! each syncer: RecordSource::fetch_page ─▶ record transform ─▶ upsert
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use database::Database;
//! use sync_engine::{SyncOrchestrator, SyncService, TriggerOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:insights.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let service = SyncService::new(Arc::new(SyncOrchestrator::from_env(db)?));
//!     if let TriggerOutcome::Started { sync_id } = service.trigger().await? {
//!         println!("sync {sync_id} started");
//!     }
//!     service.wait().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id_map;
pub mod normalizer;
pub mod orchestrator;
pub mod record;
pub mod service;
pub mod syncers;

#[cfg(test)]
mod testing;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use id_map::IdMap;
pub use normalizer::{BookingSource, SourceNormalizer};
pub use orchestrator::{SyncOrchestrator, FULL_SYNC};
pub use service::{StatusReport, SyncService, TriggerOutcome};
pub use syncers::{EntitySyncer, SyncContext, SyncOutcome};
