//! The single owner of reconciliation state.
//!
//! Every user action goes through one `tokio::sync::Mutex`. Workbooks are decoded
//! on a blocking task before the lock is taken, so a file that fails to decode
//! leaves the previous state untouched and a half-applied ingestion is never visible.

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::clipboard::{self, ClipboardError};
use crate::config::ReconcileConfig;
use crate::excel::{self, DecodedSheet, ExcelError, SourceFileInfo};
use crate::reconcile::{
    Field, ReconciliationState, ReconciliationView, ToggleOutcome, UnknownField, UpdateSummary,
};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to decode workbook: {0}")]
    Decode(#[source] ExcelError),
    #[error("failed to export report: {0}")]
    Export(#[source] ExcelError),
    #[error("unknown record: {0}")]
    UnknownRecord(String),
    #[error(transparent)]
    UnknownField(#[from] UnknownField),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error("task join error: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result of a resolution toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResult {
    pub outcome: ToggleOutcome,
    pub unresolved_count: usize,
}

/// Result of loading an update listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLoadResult {
    pub summary: UpdateSummary,
    pub view: ReconciliationView,
}

#[derive(Debug, Default)]
struct SessionInner {
    state: ReconciliationState,
    baseline_file: Option<SourceFileInfo>,
    update_file: Option<SourceFileInfo>,
}

impl SessionInner {
    fn view(&self) -> ReconciliationView {
        ReconciliationView::build(&self.state, self.baseline_file.clone(), self.update_file.clone())
    }
}

pub struct ReconcileSession {
    inner: Mutex<SessionInner>,
}

impl Default for ReconcileSession {
    fn default() -> Self {
        Self::new(ReconcileConfig::default())
    }
}

impl ReconcileSession {
    pub fn new(config: ReconcileConfig) -> Self {
        Self {
            inner: Mutex::new(SessionInner {
                state: ReconciliationState::new(config),
                ..SessionInner::default()
            }),
        }
    }

    /// Decode a baseline workbook and replace the working set with it
    pub async fn load_baseline(&self, name: String, bytes: Vec<u8>) -> Result<ReconciliationView, SessionError> {
        let (sheet, info) = decode_upload(name, bytes).await?;
        Ok(self.apply_baseline(sheet, info).await)
    }

    pub async fn load_baseline_path(&self, path: String) -> Result<ReconciliationView, SessionError> {
        let (sheet, info) = read_upload(path).await?;
        Ok(self.apply_baseline(sheet, info).await)
    }

    /// Decode an update workbook and match it against the working set
    pub async fn load_update(&self, name: String, bytes: Vec<u8>) -> Result<UpdateLoadResult, SessionError> {
        let (sheet, info) = decode_upload(name, bytes).await?;
        Ok(self.apply_update(sheet, info).await)
    }

    pub async fn load_update_path(&self, path: String) -> Result<UpdateLoadResult, SessionError> {
        let (sheet, info) = read_upload(path).await?;
        Ok(self.apply_update(sheet, info).await)
    }

    async fn apply_baseline(&self, sheet: DecodedSheet, info: SourceFileInfo) -> ReconciliationView {
        let mut inner = self.inner.lock().await;
        inner.state.ingest_baseline(&sheet.rows);
        inner.baseline_file = Some(info);
        inner.update_file = None;
        inner.view()
    }

    async fn apply_update(&self, sheet: DecodedSheet, info: SourceFileInfo) -> UpdateLoadResult {
        let mut inner = self.inner.lock().await;
        let summary = inner.state.ingest_update(&sheet.rows);
        inner.update_file = Some(info);
        UpdateLoadResult {
            summary,
            view: inner.view(),
        }
    }

    /// Flip the acknowledgment of `field` on the record with `record_id`.
    /// Fields that do not currently differ are left alone.
    pub async fn toggle(&self, record_id: &str, field: Field) -> ToggleResult {
        let mut inner = self.inner.lock().await;
        let outcome = inner.state.toggle_resolution(record_id, field);
        ToggleResult {
            outcome,
            unresolved_count: inner.state.unresolved_count(),
        }
    }

    /// Same as [`toggle`](Self::toggle) with the field given by its canonical name
    pub async fn toggle_named(&self, record_id: &str, field: &str) -> Result<ToggleResult, SessionError> {
        let field: Field = field.parse()?;
        Ok(self.toggle(record_id, field).await)
    }

    pub async fn view(&self) -> ReconciliationView {
        self.inner.lock().await.view()
    }

    pub async fn unresolved_count(&self) -> usize {
        self.inner.lock().await.state.unresolved_count()
    }

    /// Copy a record's id to the clipboard. Does not touch reconciliation state.
    pub async fn copy_record_id(&self, record_id: &str) -> Result<String, SessionError> {
        let id = {
            let inner = self.inner.lock().await;
            inner
                .state
                .record(record_id)
                .map(|r| r.id.clone())
                .ok_or_else(|| SessionError::UnknownRecord(record_id.to_string()))?
        };

        let text = id.clone();
        tokio::task::spawn_blocking(move || clipboard::write_clipboard_text(&text)).await??;
        tracing::debug!(record_id = %id, "copied record id to clipboard");
        Ok(id)
    }

    /// Write the discrepancy report workbook and return its checksum
    pub async fn export_report(&self, output_path: String) -> Result<String, SessionError> {
        let state = self.inner.lock().await.state.clone();
        let checksum = tokio::task::spawn_blocking(move || excel::export_report(&state, &output_path))
            .await?
            .map_err(SessionError::Export)?;
        Ok(checksum)
    }
}

async fn decode_upload(name: String, bytes: Vec<u8>) -> Result<(DecodedSheet, SourceFileInfo), SessionError> {
    let result = tokio::task::spawn_blocking(move || {
        let sheet = excel::decode_rows(&bytes)?;
        let info = excel::file_info(&name, &bytes, &sheet);
        Ok::<_, ExcelError>((sheet, info))
    })
    .await?;
    log_decode(result)
}

async fn read_upload(path: String) -> Result<(DecodedSheet, SourceFileInfo), SessionError> {
    let result = tokio::task::spawn_blocking(move || excel::read_rows(&path)).await?;
    log_decode(result)
}

fn log_decode(
    result: Result<(DecodedSheet, SourceFileInfo), ExcelError>,
) -> Result<(DecodedSheet, SourceFileInfo), SessionError> {
    match result {
        Ok((sheet, info)) => {
            tracing::info!(
                file = %info.name,
                sheet = %sheet.sheet_name,
                rows = sheet.rows.len(),
                "decoded workbook"
            );
            Ok((sheet, info))
        }
        Err(e) => {
            tracing::warn!(error = %e, kind = ?e.error_type, "workbook rejected, state unchanged");
            Err(SessionError::Decode(e))
        }
    }
}
