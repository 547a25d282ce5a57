//! In-memory record source and store helpers for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use database::Database;
use guesty_client::{EntityKind, GuestyError, PageRequest, RecordSource};
use serde_json::Value;

/// Serves fixed records per entity, sliced by `skip`/`limit`.
#[derive(Default)]
pub struct FakeSource {
    records: HashMap<EntityKind, Vec<Value>>,
    failing: Option<EntityKind>,
    panicking: Option<EntityKind>,
    delay: Option<Duration>,
    requests: Mutex<Vec<(EntityKind, PageRequest)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, entity: EntityKind, records: Vec<Value>) -> Self {
        self.records.insert(entity, records);
        self
    }

    /// Every request for `entity` fails with a 500.
    pub fn failing_on(mut self, entity: EntityKind) -> Self {
        self.failing = Some(entity);
        self
    }

    /// Every request for `entity` panics.
    pub fn panicking_on(mut self, entity: EntityKind) -> Self {
        self.panicking = Some(entity);
        self
    }

    /// Every request waits `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests_for(&self, entity: EntityKind) -> Vec<PageRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| *e == entity)
            .map(|(_, page)| page.clone())
            .collect()
    }
}

#[async_trait]
impl RecordSource for FakeSource {
    async fn fetch_page(
        &self,
        entity: EntityKind,
        page: &PageRequest,
    ) -> guesty_client::Result<Vec<Value>> {
        self.requests.lock().unwrap().push((entity, page.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.panicking == Some(entity) {
            panic!("{} endpoint exploded", entity);
        }
        if self.failing == Some(entity) {
            return Err(GuestyError::Remote {
                status: 500,
                message: format!("{} unavailable", entity),
            });
        }

        let all = self.records.get(&entity).cloned().unwrap_or_default();
        Ok(all
            .into_iter()
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .collect())
    }
}

/// Fresh migrated in-memory store.
pub async fn test_db() -> Database {
    let db = Database::connect_with_pool_size("sqlite::memory:", 1)
        .await
        .unwrap();
    db.migrate().await.unwrap();
    db
}
