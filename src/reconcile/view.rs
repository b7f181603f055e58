use serde::{Deserialize, Serialize};

use super::fields::Field;
use super::record::Record;
use super::state::ReconciliationState;
use crate::excel::SourceFileInfo;

/// One rendered cell of the results table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCell {
    pub field: Field,
    pub baseline: String,
    /// Present only while the field differs
    pub updated: Option<String>,
    pub different: bool,
    /// Rendered struck through
    pub resolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordView {
    pub index: usize,
    pub id: String,
    pub matched: bool,
    /// Flag the row as a failed match; only meaningful once an update was loaded
    pub show_unmatched: bool,
    pub cells: Vec<FieldCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationView {
    pub records: Vec<RecordView>,
    pub unresolved_count: usize,
    pub baseline_file: Option<SourceFileInfo>,
    pub update_file: Option<SourceFileInfo>,
}

impl RecordView {
    pub fn from_record(index: usize, record: &Record, update_ingested: bool) -> Self {
        let cells = Field::COMPARABLE
            .iter()
            .map(|&field| {
                let different = record.is_different(field);
                FieldCell {
                    field,
                    baseline: record.baseline.get(field).unwrap_or_default().to_string(),
                    updated: different
                        .then(|| record.updated.as_ref().and_then(|u| u.get(field)))
                        .flatten()
                        .map(str::to_string),
                    different,
                    resolved: record.is_resolved(field),
                }
            })
            .collect();

        Self {
            index,
            id: record.id.clone(),
            matched: record.matched,
            show_unmatched: update_ingested && !record.matched,
            cells,
        }
    }
}

impl ReconciliationView {
    pub fn build(
        state: &ReconciliationState,
        baseline_file: Option<SourceFileInfo>,
        update_file: Option<SourceFileInfo>,
    ) -> Self {
        let update_ingested = state.update_ingested();
        Self {
            records: state
                .records()
                .iter()
                .enumerate()
                .map(|(i, r)| RecordView::from_record(i, r, update_ingested))
                .collect(),
            unresolved_count: state.unresolved_count(),
            baseline_file,
            update_file,
        }
    }
}
