//! Background sync trigger and status reporting.

use std::sync::Arc;

use database::{sync_run, SyncRun};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::Result;
use crate::orchestrator::SyncOrchestrator;

/// Result of a trigger request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new run was recorded and is executing in the background.
    Started { sync_id: i64 },
    /// A run is already in progress; nothing was started.
    AlreadyRunning { sync_id: i64 },
}

/// Latest recorded run, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReport {
    NeverRun,
    LastRun(SyncRun),
}

/// Starts full syncs in the background, one at a time.
///
/// The running-check and the spawn happen under one lock, so concurrent
/// triggers within this process cannot both start a run. Another process
/// sharing the store only sees the `running` row, which is advisory.
pub struct SyncService {
    orchestrator: Arc<SyncOrchestrator>,
    current: Mutex<Option<JoinHandle<()>>>,
}

impl SyncService {
    pub fn new(orchestrator: Arc<SyncOrchestrator>) -> Self {
        Self {
            orchestrator,
            current: Mutex::new(None),
        }
    }

    pub fn orchestrator(&self) -> &Arc<SyncOrchestrator> {
        &self.orchestrator
    }

    /// Start a full sync unless one is already running.
    ///
    /// The run row is created before this returns; the syncers execute on a
    /// spawned task with no timeout or cancellation.
    pub async fn trigger(&self) -> Result<TriggerOutcome> {
        let mut current = self.current.lock().await;

        let pool = self.orchestrator.database().pool();
        if let Some(running) = sync_run::find_running(pool).await? {
            info!("Sync {} is already in progress", running.id);
            return Ok(TriggerOutcome::AlreadyRunning { sync_id: running.id });
        }

        let sync_id = self.orchestrator.begin_run().await?;
        let orchestrator = Arc::clone(&self.orchestrator);
        *current = Some(tokio::spawn(async move {
            // outcome is recorded on the run row
            let _ = orchestrator.complete_run(sync_id).await;
        }));

        Ok(TriggerOutcome::Started { sync_id })
    }

    /// Report the most recently started run.
    pub async fn status(&self) -> Result<StatusReport> {
        let latest = sync_run::latest_run(self.orchestrator.database().pool()).await?;
        Ok(match latest {
            Some(run) => StatusReport::LastRun(run),
            None => StatusReport::NeverRun,
        })
    }

    /// Wait for the background run started by this service, if any.
    pub async fn wait(&self) {
        let handle = self.current.lock().await.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!("Background sync task failed: {}", err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::testing::{test_db, FakeSource};
    use database::SyncStatus;
    use guesty_client::EntityKind;
    use serde_json::json;
    use std::time::Duration;

    fn service(source: FakeSource, db: &database::Database) -> SyncService {
        let orchestrator = SyncOrchestrator::new(Arc::new(source), db.clone(), SyncConfig::default());
        SyncService::new(Arc::new(orchestrator))
    }

    fn listings() -> FakeSource {
        FakeSource::new().with(
            EntityKind::Listings,
            vec![json!({"_id": "lst-1"}), json!({"_id": "lst-2"})],
        )
    }

    #[tokio::test]
    async fn test_status_before_any_run() {
        let db = test_db().await;
        let service = service(listings(), &db);
        assert_eq!(service.status().await.unwrap(), StatusReport::NeverRun);
    }

    #[tokio::test]
    async fn test_trigger_runs_in_background() {
        let db = test_db().await;
        let service = service(listings(), &db);

        let outcome = service.trigger().await.unwrap();
        let TriggerOutcome::Started { sync_id } = outcome else {
            panic!("expected a new run, got {:?}", outcome);
        };

        service.wait().await;

        match service.status().await.unwrap() {
            StatusReport::LastRun(run) => {
                assert_eq!(run.id, sync_id);
                assert_eq!(run.status, SyncStatus::Success);
                assert_eq!(run.records_synced, 2);
            }
            StatusReport::NeverRun => panic!("expected a recorded run"),
        }
    }

    #[tokio::test]
    async fn test_trigger_refuses_while_running() {
        let db = test_db().await;
        let stale = sync_run::create_run(db.pool(), "full").await.unwrap();
        let service = service(listings(), &db);

        let outcome = service.trigger().await.unwrap();
        assert_eq!(outcome, TriggerOutcome::AlreadyRunning { sync_id: stale });

        // Nothing new was recorded
        let latest = sync_run::latest_run(db.pool()).await.unwrap().unwrap();
        assert_eq!(latest.id, stale);
    }

    #[tokio::test]
    async fn test_concurrent_triggers_start_one_run() {
        let db = test_db().await;
        let slow = listings().with_delay(Duration::from_millis(200));
        let service = service(slow, &db);

        let (first, second) = tokio::join!(service.trigger(), service.trigger());
        match (first.unwrap(), second.unwrap()) {
            (TriggerOutcome::Started { sync_id }, TriggerOutcome::AlreadyRunning { sync_id: other })
            | (TriggerOutcome::AlreadyRunning { sync_id: other }, TriggerOutcome::Started { sync_id }) => {
                assert_eq!(sync_id, other);
            }
            outcomes => panic!("expected exactly one started run, got {:?}", outcomes),
        }

        service.wait().await;
        let run = sync_run::latest_run(db.pool()).await.unwrap().unwrap();
        assert_eq!(run.status, SyncStatus::Success);
    }

    #[tokio::test]
    async fn test_failed_run_is_reported() {
        let db = test_db().await;
        let service = service(listings().failing_on(EntityKind::Guests), &db);

        service.trigger().await.unwrap();
        service.wait().await;

        match service.status().await.unwrap() {
            StatusReport::LastRun(run) => {
                assert_eq!(run.status, SyncStatus::Failed);
                assert!(run.error_message.is_some());
                assert!(run.completed_at.is_some());
            }
            StatusReport::NeverRun => panic!("expected a recorded run"),
        }
    }
}
