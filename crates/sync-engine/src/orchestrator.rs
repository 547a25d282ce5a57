//! Full-sync orchestration and run bookkeeping.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use database::{sync_run, Database, DatabaseError};
use futures::FutureExt;
use guesty_client::{GuestyClient, RecordSource};
use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::normalizer::SourceNormalizer;
use crate::syncers::{
    ConversationSyncer, EntitySyncer, GuestSyncer, ListingSyncer, ReservationSyncer, SyncContext,
};

/// `entity_type` recorded for an orchestrated run.
pub const FULL_SYNC: &str = "full";

const TERMINAL_UPDATE_ATTEMPTS: u32 = 3;
const TERMINAL_UPDATE_BACKOFF: Duration = Duration::from_millis(50);

/// Runs the four syncers in dependency order and records the run.
///
/// The normalizer lives as long as the orchestrator, so an unmapped booking
/// source is reported once per orchestrator rather than once per run.
pub struct SyncOrchestrator {
    source: Arc<dyn RecordSource>,
    db: Database,
    normalizer: SourceNormalizer,
    config: SyncConfig,
}

impl SyncOrchestrator {
    /// Create an orchestrator over any record source.
    pub fn new(source: Arc<dyn RecordSource>, db: Database, config: SyncConfig) -> Self {
        Self {
            source,
            db,
            normalizer: SourceNormalizer::new(),
            config,
        }
    }

    /// Create an orchestrator backed by a [`GuestyClient`] configured from
    /// the environment.
    pub fn from_env(db: Database) -> Result<Self> {
        let client = GuestyClient::from_env()?;
        Ok(Self::new(Arc::new(client), db, SyncConfig::from_env()))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &SourceNormalizer {
        &self.normalizer
    }

    /// Run a complete sync and return the number of records upserted.
    ///
    /// The run row is created `running` before any syncer starts and is
    /// moved to `success` or `failed` before this returns, including when a
    /// syncer panics.
    pub async fn run_full_sync(&self) -> Result<u64> {
        let run_id = self.begin_run().await?;
        self.complete_run(run_id).await
    }

    /// Record the start of a full sync and return the run id.
    pub async fn begin_run(&self) -> Result<i64> {
        let run_id = sync_run::create_run(self.db.pool(), FULL_SYNC).await?;
        info!("Starting full data sync (run {})", run_id);
        Ok(run_id)
    }

    /// Execute the syncers for a run created by [`begin_run`](Self::begin_run)
    /// and record its outcome.
    pub async fn complete_run(&self, run_id: i64) -> Result<u64> {
        let result = match AssertUnwindSafe(self.sync_all()).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(SyncError::Panicked(panic_message(payload.as_ref()))),
        };

        let pool = self.db.pool();
        match result {
            Ok(total) => {
                let records = i64::try_from(total).unwrap_or(i64::MAX);
                if let Err(err) = sync_run::mark_success(pool, run_id, records).await {
                    error!("Failed to record success of sync run {}: {}", run_id, err);
                    self.record_failure(run_id, &err.to_string()).await;
                    return Err(err.into());
                }
                info!(
                    "Full sync completed successfully (run {}). Total records: {}",
                    run_id, total
                );
                Ok(total)
            }
            Err(err) => {
                error!("Sync run {} failed: {}", run_id, err);
                self.record_failure(run_id, &err.to_string()).await;
                Err(err)
            }
        }
    }

    async fn record_failure(&self, run_id: i64, message: &str) {
        for attempt in 1..=TERMINAL_UPDATE_ATTEMPTS {
            match sync_run::mark_failed(self.db.pool(), run_id, message).await {
                Ok(()) => return,
                Err(err @ DatabaseError::NotFound { .. }) => {
                    error!("Sync run {} is no longer running: {}", run_id, err);
                    return;
                }
                Err(err) if attempt < TERMINAL_UPDATE_ATTEMPTS => {
                    warn!(
                        "Failed to record failure of sync run {} (attempt {}): {}",
                        run_id, attempt, err
                    );
                    tokio::time::sleep(TERMINAL_UPDATE_BACKOFF * attempt).await;
                }
                Err(err) => {
                    error!(
                        "Sync run {} left running after {} attempts to record failure: {}",
                        run_id, attempt, err
                    );
                }
            }
        }
    }

    async fn sync_all(&self) -> Result<u64> {
        let ctx = SyncContext {
            source: self.source.as_ref(),
            db: &self.db,
            normalizer: &self.normalizer,
            page_size: self.config.page_size,
        };

        let listings = ListingSyncer.run(&ctx).await?;
        let guests = GuestSyncer.run(&ctx).await?;

        let cutoff = self.config.lookback_cutoff(Utc::now().date_naive());
        let reservations = ReservationSyncer::new(&listings.ids, &guests.ids, cutoff)
            .run(&ctx)
            .await?;

        let conversations =
            ConversationSyncer::new(&listings.ids, &guests.ids, &reservations.ids)
                .run(&ctx)
                .await?;

        Ok(listings.count + guests.count + reservations.count + conversations.count)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_db, FakeSource};
    use database::{conversation, guest, listing, reservation, SyncStatus};
    use guesty_client::EntityKind;
    use serde_json::{json, Value};
    use tracing_test::traced_test;

    fn recent_check_in() -> String {
        (Utc::now().date_naive() - chrono::Duration::days(30)).to_string()
    }

    fn fixture() -> FakeSource {
        let check_in = recent_check_in();
        FakeSource::new()
            .with(
                EntityKind::Listings,
                vec![
                    json!({"_id": "lst-1", "title": "Beach House", "bedrooms": 3, "bathrooms": 2.5}),
                    json!({"_id": "lst-2", "title": "Cabin"}),
                ],
            )
            .with(
                EntityKind::Guests,
                vec![json!({"_id": "g-1", "email": "jane@example.com"})],
            )
            .with(
                EntityKind::Reservations,
                vec![
                    json!({
                        "_id": "res-1", "listingId": "lst-1", "guestId": "g-1",
                        "source": "Airbnb", "checkIn": check_in, "checkOut": check_in,
                        "money": {"totalPrice": 300}
                    }),
                    json!({
                        "_id": "res-2", "listingId": "lst-unsynced", "guestId": "g-unsynced",
                        "source": "VRBO", "checkIn": check_in
                    }),
                ],
            )
            .with(
                EntityKind::Conversations,
                vec![
                    json!({"_id": "conv-1", "listingId": "lst-1", "reservationId": "res-1", "source": "airbnb"}),
                    json!({"_id": "conv-2", "listingId": "lst-2", "source": "Plum Guide"}),
                ],
            )
    }

    fn orchestrator(source: FakeSource, db: &Database) -> SyncOrchestrator {
        SyncOrchestrator::new(Arc::new(source), db.clone(), SyncConfig::default())
    }

    #[tokio::test]
    async fn test_full_sync_records_success() {
        let db = test_db().await;
        let orchestrator = orchestrator(fixture(), &db);

        let total = orchestrator.run_full_sync().await.unwrap();
        assert_eq!(total, 7);

        let run = sync_run::latest_run(db.pool()).await.unwrap().unwrap();
        assert_eq!(run.entity_type, FULL_SYNC);
        assert_eq!(run.status, SyncStatus::Success);
        assert_eq!(run.records_synced, 7);
        assert!(run.completed_at.is_some());
        assert!(run.error_message.is_none());
    }

    #[tokio::test]
    async fn test_resync_is_idempotent() {
        let db = test_db().await;
        let orchestrator = orchestrator(fixture(), &db);

        orchestrator.run_full_sync().await.unwrap();
        let before = reservation::get_reservation_by_external_id(db.pool(), "res-1")
            .await
            .unwrap();

        orchestrator.run_full_sync().await.unwrap();
        let after = reservation::get_reservation_by_external_id(db.pool(), "res-1")
            .await
            .unwrap();

        assert_eq!(before.id, after.id);
        assert_eq!(listing::count_listings(db.pool()).await.unwrap(), 2);
        assert_eq!(guest::count_guests(db.pool()).await.unwrap(), 1);
        assert_eq!(reservation::count_reservations(db.pool()).await.unwrap(), 2);
        assert_eq!(conversation::count_conversations(db.pool()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_foreign_keys_resolve_within_run() {
        let db = test_db().await;
        orchestrator(fixture(), &db).run_full_sync().await.unwrap();

        let beach = listing::get_listing_by_external_id(db.pool(), "lst-1").await.unwrap();
        let jane = guest::get_guest_by_external_id(db.pool(), "g-1").await.unwrap();

        let linked = reservation::get_reservation_by_external_id(db.pool(), "res-1")
            .await
            .unwrap();
        assert_eq!(linked.listing_id, Some(beach.id.clone()));
        assert_eq!(linked.guest_id, Some(jane.id));
        assert_eq!(linked.source, "airbnb");
        assert_eq!(linked.total_price, 30_000);

        let orphan = reservation::get_reservation_by_external_id(db.pool(), "res-2")
            .await
            .unwrap();
        assert!(orphan.listing_id.is_none());
        assert!(orphan.guest_id.is_none());

        let converted = conversation::get_conversation_by_external_id(db.pool(), "conv-1")
            .await
            .unwrap();
        assert_eq!(converted.reservation_id, Some(linked.id));
        assert!(converted.converted_to_booking);

        let inquiry = conversation::get_conversation_by_external_id(db.pool(), "conv-2")
            .await
            .unwrap();
        assert!(!inquiry.converted_to_booking);
        assert_eq!(inquiry.source, "plum guide");
    }

    #[tokio::test]
    async fn test_reservations_request_lookback_filter() {
        let db = test_db().await;
        let source = Arc::new(fixture());
        let orchestrator = SyncOrchestrator::new(
            source.clone(),
            db.clone(),
            SyncConfig::default().with_lookback_years(2),
        );
        orchestrator.run_full_sync().await.unwrap();

        let cutoff = Utc::now().date_naive() - chrono::Duration::days(730);
        let expected = Value::String(format!("{}T00:00:00Z", cutoff));
        let requests = source.requests_for(EntityKind::Reservations);
        assert_eq!(requests[0].filters.as_ref().unwrap()[0]["value"], expected);
        assert!(source.requests_for(EntityKind::Listings)[0].filters.is_none());
    }

    #[tokio::test]
    async fn test_conversation_failure_marks_run_failed() {
        let db = test_db().await;
        let orchestrator = orchestrator(fixture().failing_on(EntityKind::Conversations), &db);

        let result = orchestrator.run_full_sync().await;
        assert!(matches!(result, Err(SyncError::Remote(_))));

        let run = sync_run::latest_run(db.pool()).await.unwrap().unwrap();
        assert_eq!(run.status, SyncStatus::Failed);
        assert!(run.completed_at.is_some());
        assert!(run.error_message.unwrap().contains("conversations unavailable"));

        // Earlier entities stay committed
        assert_eq!(reservation::count_reservations(db.pool()).await.unwrap(), 2);
        assert!(sync_run::find_running(db.pool()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_panicking_syncer_marks_run_failed() {
        let db = test_db().await;
        let orchestrator = orchestrator(fixture().panicking_on(EntityKind::Guests), &db);

        let result = orchestrator.run_full_sync().await;
        match result {
            Err(SyncError::Panicked(message)) => assert!(message.contains("guests endpoint exploded")),
            other => panic!("expected panic to be captured, got {:?}", other),
        }

        let run = sync_run::latest_run(db.pool()).await.unwrap().unwrap();
        assert_eq!(run.status, SyncStatus::Failed);
        assert!(run.error_message.unwrap().contains("exploded"));
        assert_eq!(listing::count_listings(db.pool()).await.unwrap(), 2);
        assert_eq!(guest::count_guests(db.pool()).await.unwrap(), 0);
    }

    /// Empty for every entity; closes the store while conversations load.
    struct ClosingSource {
        db: Database,
    }

    #[async_trait::async_trait]
    impl RecordSource for ClosingSource {
        async fn fetch_page(
            &self,
            entity: EntityKind,
            _page: &guesty_client::PageRequest,
        ) -> guesty_client::Result<Vec<Value>> {
            if entity == EntityKind::Conversations {
                self.db.close().await;
            }
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_unrecordable_outcome_is_an_error() {
        let db = test_db().await;
        let source = ClosingSource { db: db.clone() };
        let orchestrator = SyncOrchestrator::new(Arc::new(source), db.clone(), SyncConfig::default());

        let result = orchestrator.run_full_sync().await;

        assert!(matches!(result, Err(SyncError::Database(_))));
        assert!(logs_contain("Failed to record success of sync run"));
        assert!(logs_contain("left running after 3 attempts"));
    }

    #[tokio::test]
    async fn test_normalizer_outlives_runs() {
        let db = test_db().await;
        let orchestrator = orchestrator(fixture(), &db);

        orchestrator.run_full_sync().await.unwrap();
        orchestrator.run_full_sync().await.unwrap();

        let unmapped = orchestrator.normalizer().unmapped_labels();
        assert_eq!(unmapped.len(), 1);
        assert!(unmapped.contains("Plum Guide"));
    }
}
