use serde::Serialize;

use crate::session::{ReconcileSession, SessionError};
#[cfg(feature = "desktop")]
use crate::reconcile::ReconciliationView;
#[cfg(feature = "desktop")]
use crate::session::{ToggleResult, UpdateLoadResult};
#[cfg(feature = "desktop")]
use std::sync::Arc;
#[cfg(feature = "desktop")]
use tauri::{command, Emitter, State, Window};

pub struct AppState {
    pub session: ReconcileSession,
}

#[derive(Debug, Serialize)]
pub struct CommandError {
    message: String,
}

impl From<SessionError> for CommandError {
    fn from(e: SessionError) -> Self {
        CommandError {
            message: e.to_string(),
        }
    }
}

// Upload commands
#[cfg(feature = "desktop")]
#[command]
pub async fn load_baseline_file(
    state: State<'_, Arc<AppState>>,
    path: String,
) -> Result<ReconciliationView, CommandError> {
    Ok(state.session.load_baseline_path(path).await?)
}

#[cfg(feature = "desktop")]
#[command]
pub async fn load_baseline_data(
    state: State<'_, Arc<AppState>>,
    name: String,
    data: Vec<u8>,
) -> Result<ReconciliationView, CommandError> {
    Ok(state.session.load_baseline(name, data).await?)
}

#[cfg(feature = "desktop")]
#[command]
pub async fn load_update_file(
    state: State<'_, Arc<AppState>>,
    path: String,
) -> Result<UpdateLoadResult, CommandError> {
    Ok(state.session.load_update_path(path).await?)
}

#[cfg(feature = "desktop")]
#[command]
pub async fn load_update_data(
    state: State<'_, Arc<AppState>>,
    name: String,
    data: Vec<u8>,
) -> Result<UpdateLoadResult, CommandError> {
    Ok(state.session.load_update(name, data).await?)
}

// Resolution commands
#[cfg(feature = "desktop")]
#[command]
pub async fn toggle_resolution(
    window: Window,
    state: State<'_, Arc<AppState>>,
    record_id: String,
    field: String,
) -> Result<ToggleResult, CommandError> {
    let result = state.session.toggle_named(&record_id, &field).await?;

    let _ = window.emit("unresolved-count-changed", &serde_json::json!({
        "recordId": record_id,
        "field": field,
        "unresolvedCount": result.unresolved_count,
    }));

    Ok(result)
}

#[cfg(feature = "desktop")]
#[command]
pub async fn get_reconciliation(
    state: State<'_, Arc<AppState>>,
) -> Result<ReconciliationView, CommandError> {
    Ok(state.session.view().await)
}

// Side-channel commands
#[cfg(feature = "desktop")]
#[command]
pub async fn copy_record_id(
    state: State<'_, Arc<AppState>>,
    record_id: String,
) -> Result<String, CommandError> {
    Ok(state.session.copy_record_id(&record_id).await?)
}

#[cfg(feature = "desktop")]
#[command]
pub async fn export_report(
    state: State<'_, Arc<AppState>>,
    path: String,
) -> Result<String, CommandError> {
    Ok(state.session.export_report(path).await?)
}
