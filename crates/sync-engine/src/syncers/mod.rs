//! Per-entity syncers.
//!
//! Each syncer walks one Guesty list endpoint page by page, transforms every
//! record and upserts it. Syncers run strictly in dependency order; the
//! [`IdMap`] returned by one is borrowed read-only by the ones after it.

mod conversations;
mod guests;
mod listings;
mod reservations;

pub use conversations::{conversation_from, ConversationSyncer};
pub use guests::{guest_from, GuestSyncer};
pub use listings::{listing_from, ListingSyncer};
pub use reservations::{reservation_filters, reservation_from, ReservationSyncer};

use async_trait::async_trait;
use database::Database;
use guesty_client::{EntityKind, PageRequest, RecordSource};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::id_map::IdMap;
use crate::normalizer::SourceNormalizer;
use crate::record::external_id;

/// Collaborators shared by every syncer of a run.
#[derive(Clone, Copy)]
pub struct SyncContext<'a> {
    pub source: &'a dyn RecordSource,
    pub db: &'a Database,
    pub normalizer: &'a SourceNormalizer,
    pub page_size: u64,
}

/// Result of one entity pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// Records upserted; skipped records are not counted.
    pub count: u64,
    /// Upstream id to local id for every upserted record.
    pub ids: IdMap,
}

/// One entity's pass over its Guesty endpoint.
#[async_trait]
pub trait EntitySyncer: Send + Sync {
    /// Entity this syncer pulls.
    fn entity(&self) -> EntityKind;

    /// First page request; later pages advance `skip` by the page size.
    fn first_page(&self, page_size: u64) -> PageRequest {
        PageRequest::first(page_size)
    }

    /// Transform and upsert one raw record.
    ///
    /// Returns `(external_id, local_id)`, or `None` when the record cannot be
    /// keyed and was skipped.
    async fn store(&self, ctx: &SyncContext<'_>, record: &Value) -> Result<Option<(String, String)>>;

    /// Pull every page and upsert every record.
    ///
    /// Stops at the first empty or short page, or at a page that repeats the
    /// previous one. Any source or store error aborts the pass.
    async fn run(&self, ctx: &SyncContext<'_>) -> Result<SyncOutcome> {
        let entity = self.entity();
        info!("Starting {} sync", entity);

        let mut outcome = SyncOutcome::default();
        let mut page = self.first_page(ctx.page_size);
        let mut previous_keys: Vec<Option<String>> = Vec::new();

        loop {
            let records = ctx.source.fetch_page(entity, &page).await?;
            let fetched = records.len() as u64;

            let keys: Vec<Option<String>> = records.iter().map(external_id).collect();
            if fetched > 0 && keys == previous_keys {
                warn!(
                    "{} page at skip={} repeats the previous page, stopping",
                    entity, page.skip
                );
                break;
            }

            for record in &records {
                if let Some((external_id, local_id)) = self.store(ctx, record).await? {
                    outcome.ids.insert(external_id, local_id);
                    outcome.count += 1;
                }
            }

            debug!("{} page at skip={} returned {} records", entity, page.skip, fetched);

            if fetched == 0 || fetched < page.limit || page.limit == 0 {
                break;
            }
            previous_keys = keys;
            page = page.next();
        }

        info!("Synced {} {}", outcome.count, entity);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_db;
    use database::listing;
    use guesty_client::GuestyError;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every request with the same full page, ignoring `skip`.
    struct FirstPageOnly {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RecordSource for FirstPageOnly {
        async fn fetch_page(
            &self,
            _entity: EntityKind,
            page: &PageRequest,
        ) -> std::result::Result<Vec<Value>, GuestyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..page.limit)
                .map(|i| json!({"_id": format!("lst-{}", i), "title": "Unit"}))
                .collect())
        }
    }

    #[tokio::test]
    async fn test_repeated_page_ends_pass() {
        let db = test_db().await;
        let normalizer = SourceNormalizer::new();
        let source = FirstPageOnly {
            calls: AtomicUsize::new(0),
        };
        let ctx = SyncContext {
            source: &source,
            db: &db,
            normalizer: &normalizer,
            page_size: 5,
        };

        let outcome = ListingSyncer.run(&ctx).await.unwrap();

        assert_eq!(outcome.count, 5);
        assert_eq!(outcome.ids.len(), 5);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(listing::count_listings(db.pool()).await.unwrap(), 5);
    }
}
