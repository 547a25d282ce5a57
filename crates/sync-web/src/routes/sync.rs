//! Sync trigger and status endpoints.

use axum::extract::State;
use axum::Json;
use database::SyncStatus;
use serde::Serialize;
use sync_engine::{StatusReport, TriggerOutcome};
use tracing::info;

use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub status: &'static str,
    pub message: &'static str,
    /// Only reported for a run that was already in progress.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum StatusResponse {
    NeverRun {
        status: &'static str,
        message: &'static str,
    },
    Run {
        status: SyncStatus,
        entity_type: String,
        records_synced: i64,
        started_at: String,
        completed_at: Option<String>,
        error_message: Option<String>,
    },
}

/// Start a full sync in the background unless one is running.
pub async fn trigger(State(state): State<AppState>) -> Result<Json<TriggerResponse>> {
    let response = match state.sync.trigger().await? {
        TriggerOutcome::Started { sync_id } => {
            info!("Sync {} triggered over HTTP", sync_id);
            TriggerResponse {
                status: "started",
                message: "Sync started in background",
                sync_id: None,
            }
        }
        TriggerOutcome::AlreadyRunning { sync_id } => TriggerResponse {
            status: "already_running",
            message: "A sync is already in progress",
            sync_id: Some(sync_id),
        },
    };
    Ok(Json(response))
}

/// Report the most recent sync run.
pub async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>> {
    let response = match state.sync.status().await? {
        StatusReport::NeverRun => StatusResponse::NeverRun {
            status: "never_run",
            message: "No sync has been run yet",
        },
        StatusReport::LastRun(run) => StatusResponse::Run {
            status: run.status,
            entity_type: run.entity_type,
            records_synced: run.records_synced,
            started_at: run.started_at,
            completed_at: run.completed_at,
            error_message: run.error_message,
        },
    };
    Ok(Json(response))
}
