use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use super::fields::{Field, Side};
use super::record::{FieldValues, Record};
use crate::config::ReconcileConfig;
use crate::excel::SourceRow;

/// What a toggle request did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The difference is now acknowledged; counter went down by one
    Resolved,
    /// The acknowledgment was withdrawn; counter went up by one
    Reopened,
    /// The field does not currently differ; nothing changed
    NotDifferent,
    /// No record carries that id; nothing changed
    UnknownRecord,
}

/// Summary of one update ingestion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSummary {
    pub matched: usize,
    pub unmatched: usize,
    pub duplicate_ids: usize,
    pub unresolved: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("counter is {counter} but {actual} unresolved differences exist")]
    CounterDrift { counter: usize, actual: usize },
    #[error("record {id} has field {field} resolved without a difference")]
    StaleResolution { id: String, field: Field },
    #[error("record id {0} appears more than once")]
    DuplicateRecord(String),
}

/// The working set of reconciled records and the outstanding-discrepancy counter.
///
/// Mutated only through `ingest_baseline`, `ingest_update` and `toggle_resolution`;
/// each runs to completion on `&mut self`.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationState {
    records: Vec<Record>,
    index: HashMap<String, usize>,
    unresolved: usize,
    update_ingested: bool,
    config: ReconcileConfig,
}

impl ReconciliationState {
    pub fn new(config: ReconcileConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, id: &str) -> Option<&Record> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn unresolved_count(&self) -> usize {
        self.unresolved
    }

    pub fn update_ingested(&self) -> bool {
        self.update_ingested
    }

    /// Replace the working set with one record per distinct baseline id.
    ///
    /// When an id repeats, the last row's values win and the record keeps the
    /// position of its first occurrence.
    pub fn ingest_baseline(&mut self, rows: &[SourceRow]) {
        let missing = self.config.missing_placeholder.as_str();
        let mut records: Vec<Record> = Vec::with_capacity(rows.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(rows.len());
        let mut duplicates = 0usize;

        for row in rows {
            let id = Field::Id.descriptor().extract(row, Side::Baseline, missing);
            let values = FieldValues::extract(row, Side::Baseline, missing);
            match index.entry(id) {
                Entry::Occupied(slot) => {
                    duplicates += 1;
                    tracing::warn!(id = %slot.key(), "duplicate id in baseline, keeping last row");
                    records[*slot.get()].baseline = values;
                }
                Entry::Vacant(slot) => {
                    records.push(Record::new(slot.key().clone(), values));
                    slot.insert(records.len() - 1);
                }
            }
        }

        self.records = records;
        self.index = index;
        self.unresolved = 0;
        self.update_ingested = false;

        tracing::info!(
            rows = rows.len(),
            records = self.records.len(),
            duplicates,
            "baseline ingested"
        );
        self.debug_check();
    }

    /// Match update rows against the working set by exact id and recompute the counter.
    ///
    /// The first update row carrying an id is the one used. Baseline records with
    /// no matching row are left untouched.
    pub fn ingest_update(&mut self, rows: &[SourceRow]) -> UpdateSummary {
        let missing = self.config.missing_placeholder.as_str();
        let mut by_id: HashMap<String, &SourceRow> = HashMap::with_capacity(rows.len());
        let mut duplicate_ids = 0usize;

        for row in rows {
            let id = Field::Id.descriptor().extract(row, Side::Update, missing);
            match by_id.entry(id) {
                Entry::Occupied(slot) => {
                    duplicate_ids += 1;
                    tracing::debug!(id = %slot.key(), "duplicate id in update, first row wins");
                }
                Entry::Vacant(slot) => {
                    slot.insert(row);
                }
            }
        }

        let mut summary = UpdateSummary {
            duplicate_ids,
            ..UpdateSummary::default()
        };

        for record in &mut self.records {
            let Some(row) = by_id.get(record.id.as_str()) else {
                summary.unmatched += 1;
                continue;
            };
            let updated = FieldValues::extract(row, Side::Update, missing);

            // An acknowledgment only survives if it still refers to the same discrepancy.
            let previous = record.updated.take();
            record.updated = Some(updated);
            record.matched = true;
            for field in Field::COMPARABLE {
                let same_value = previous.as_ref().and_then(|p| p.get(field))
                    == record.updated.as_ref().and_then(|u| u.get(field));
                if !record.is_different(field) || !same_value {
                    record.resolved.set(field, false);
                }
            }
            summary.matched += 1;
        }

        self.update_ingested = true;
        self.unresolved = self.recount();
        summary.unresolved = self.unresolved;

        tracing::info!(
            rows = rows.len(),
            matched = summary.matched,
            unmatched = summary.unmatched,
            duplicate_ids = summary.duplicate_ids,
            unresolved = summary.unresolved,
            "update ingested"
        );
        self.debug_check();
        summary
    }

    /// Flip the acknowledgment of one differing field.
    pub fn toggle_resolution(&mut self, record_id: &str, field: Field) -> ToggleOutcome {
        let Some(&i) = self.index.get(record_id) else {
            tracing::debug!(record_id, %field, "toggle ignored: unknown record");
            return ToggleOutcome::UnknownRecord;
        };
        let record = &mut self.records[i];

        if !record.is_different(field) {
            tracing::debug!(record_id, %field, "toggle ignored: field does not differ");
            return ToggleOutcome::NotDifferent;
        }

        let outcome = if record.is_resolved(field) {
            record.resolved.set(field, false);
            self.unresolved += 1;
            ToggleOutcome::Reopened
        } else {
            record.resolved.set(field, true);
            self.unresolved = self.unresolved.saturating_sub(1);
            ToggleOutcome::Resolved
        };

        tracing::debug!(record_id, %field, ?outcome, unresolved = self.unresolved, "toggled resolution");
        self.debug_check();
        outcome
    }

    /// Number of (record, field) pairs that differ and are unresolved, computed from scratch
    pub fn recount(&self) -> usize {
        self.records.iter().map(Record::unresolved_count).sum()
    }

    /// Total differing (record, field) pairs, resolved or not
    pub fn difference_count(&self) -> usize {
        self.records.iter().map(|r| r.different_fields().count()).sum()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let actual = self.recount();
        if actual != self.unresolved {
            return Err(InvariantViolation::CounterDrift {
                counter: self.unresolved,
                actual,
            });
        }

        for record in &self.records {
            for field in Field::COMPARABLE {
                if record.is_resolved(field) && !record.is_different(field) {
                    return Err(InvariantViolation::StaleResolution {
                        id: record.id.clone(),
                        field,
                    });
                }
            }
        }

        if self.index.len() != self.records.len() {
            let mut seen = std::collections::HashSet::new();
            if let Some(dup) = self.records.iter().find(|r| !seen.insert(r.id.as_str())) {
                return Err(InvariantViolation::DuplicateRecord(dup.id.clone()));
            }
        }

        Ok(())
    }

    fn debug_check(&self) {
        if !self.config.check_invariants {
            return;
        }
        if let Err(violation) = self.check_invariants() {
            tracing::error!(%violation, "reconciliation invariant violated");
            debug_assert!(false, "reconciliation invariant violated: {violation}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline_row(id: &str, name: &str, cost: &str, price: &str, market: &str) -> SourceRow {
        [
            ("商品編號", id),
            ("商品名稱", name),
            ("進價", cost),
            ("售價(含稅)", price),
            ("市價", market),
        ]
        .into_iter()
        .collect()
    }

    fn update_row(id: &str, name: &str, cost: &str, price: &str, market: &str) -> SourceRow {
        [
            ("商品編號", id),
            ("商品名稱", name),
            ("成本", cost),
            ("定價", price),
            ("參考市價(建議售價)", market),
        ]
        .into_iter()
        .collect()
    }

    fn state() -> ReconciliationState {
        ReconciliationState::new(ReconcileConfig {
            check_invariants: true,
            ..ReconcileConfig::default()
        })
    }

    #[test]
    fn test_widget_scenario() {
        let mut s = state();
        s.ingest_baseline(&[baseline_row("A1", "Widget", "10", "15", "20")]);
        assert_eq!(s.unresolved_count(), 0);

        let summary = s.ingest_update(&[update_row("A1", "Widget Pro", "10", "18", "20")]);
        assert_eq!(summary.matched, 1);
        let record = s.record("A1").unwrap();
        assert!(record.matched);
        assert_eq!(s.unresolved_count(), 2);
        assert!(record.is_different(Field::Name));
        assert!(record.is_different(Field::Price));
        assert!(!record.is_different(Field::Cost));

        assert_eq!(s.toggle_resolution("A1", Field::Name), ToggleOutcome::Resolved);
        assert_eq!(s.unresolved_count(), 1);
    }

    #[test]
    fn test_unmatched_record_contributes_nothing() {
        let mut s = state();
        s.ingest_baseline(&[
            baseline_row("A1", "Widget", "10", "15", "20"),
            baseline_row("B2", "Gadget", "1", "2", "3"),
        ]);
        let summary = s.ingest_update(&[update_row("A1", "Widget", "11", "15", "20")]);
        assert_eq!(summary.unmatched, 1);
        let b2 = s.record("B2").unwrap();
        assert!(!b2.matched);
        assert!(b2.updated.is_none());
        assert_eq!(b2.unresolved_count(), 0);
        assert_eq!(s.unresolved_count(), 1);
    }

    #[test]
    fn test_double_toggle_restores_counter() {
        let mut s = state();
        s.ingest_baseline(&[
            baseline_row("A1", "Widget", "10", "15", "20"),
            baseline_row("C3", "Thing", "5", "6", "7"),
        ]);
        s.ingest_update(&[
            update_row("A1", "Widget Pro", "10", "18", "20"),
            update_row("C3", "Thing", "9", "6", "7"),
        ]);
        let before = s.unresolved_count();
        let other = s.record("C3").unwrap().clone();

        assert_eq!(s.toggle_resolution("A1", Field::Price), ToggleOutcome::Resolved);
        assert_eq!(s.toggle_resolution("A1", Field::Price), ToggleOutcome::Reopened);
        assert_eq!(s.unresolved_count(), before);
        assert_eq!(s.record("C3").unwrap(), &other);
    }

    #[test]
    fn test_toggle_non_different_field_is_noop() {
        let mut s = state();
        s.ingest_baseline(&[baseline_row("A1", "Widget", "10", "15", "20")]);
        s.ingest_update(&[update_row("A1", "Widget Pro", "10", "15", "20")]);
        let before = s.records().to_vec();

        assert_eq!(s.toggle_resolution("A1", Field::Cost), ToggleOutcome::NotDifferent);
        assert_eq!(s.toggle_resolution("A1", Field::Id), ToggleOutcome::NotDifferent);
        assert_eq!(s.toggle_resolution("Z9", Field::Name), ToggleOutcome::UnknownRecord);
        assert_eq!(s.records(), before.as_slice());
        assert_eq!(s.unresolved_count(), 1);
    }

    #[test]
    fn test_toggle_before_update_is_noop() {
        let mut s = state();
        s.ingest_baseline(&[baseline_row("A1", "Widget", "10", "15", "20")]);
        assert_eq!(s.toggle_resolution("A1", Field::Name), ToggleOutcome::NotDifferent);
        assert_eq!(s.unresolved_count(), 0);
    }

    #[test]
    fn test_baseline_reingest_resets_everything() {
        let mut s = state();
        s.ingest_baseline(&[baseline_row("A1", "Widget", "10", "15", "20")]);
        s.ingest_update(&[update_row("A1", "Widget Pro", "12", "18", "22")]);
        s.toggle_resolution("A1", Field::Cost);
        assert!(s.update_ingested());

        s.ingest_baseline(&[baseline_row("A1", "Widget", "10", "15", "20")]);
        let record = s.record("A1").unwrap();
        assert!(!record.matched);
        assert!(record.updated.is_none());
        assert!(!record.is_resolved(Field::Cost));
        assert_eq!(s.unresolved_count(), 0);
        assert!(!s.update_ingested());
    }

    #[test]
    fn test_match_requires_exact_id() {
        let mut s = state();
        s.ingest_baseline(&[
            baseline_row("a1", "Widget", "10", "15", "20"),
            baseline_row("B2 ", "Gadget", "1", "2", "3"),
        ]);
        let summary = s.ingest_update(&[
            update_row("A1", "Other", "1", "1", "1"),
            update_row("B2", "Other", "1", "1", "1"),
        ]);
        assert_eq!(summary.matched, 0);
        assert_eq!(s.unresolved_count(), 0);
    }

    #[test]
    fn test_baseline_duplicate_last_row_wins() {
        let mut s = state();
        s.ingest_baseline(&[
            baseline_row("A1", "Old", "10", "15", "20"),
            baseline_row("B2", "Gadget", "1", "2", "3"),
            baseline_row("A1", "New", "11", "16", "21"),
        ]);
        assert_eq!(s.records().len(), 2);
        assert_eq!(s.records()[0].id, "A1");
        assert_eq!(s.records()[0].baseline.name, "New");
        assert_eq!(s.records()[1].id, "B2");
    }

    #[test]
    fn test_update_duplicate_first_row_wins() {
        let mut s = state();
        s.ingest_baseline(&[baseline_row("A1", "Widget", "10", "15", "20")]);
        let summary = s.ingest_update(&[
            update_row("A1", "Widget", "10", "15", "20"),
            update_row("A1", "Changed", "99", "99", "99"),
        ]);
        assert_eq!(summary.duplicate_ids, 1);
        assert_eq!(s.unresolved_count(), 0);
        assert_eq!(s.record("A1").unwrap().updated.as_ref().unwrap().name, "Widget");
    }

    #[test]
    fn test_missing_columns_use_placeholder() {
        let mut s = state();
        let sparse: SourceRow = [("商品編號(20碼含規格碼)", "X1"), ("商品名稱", "Bare")]
            .into_iter()
            .collect();
        s.ingest_baseline(&[sparse]);
        let record = s.record("X1").unwrap();
        assert_eq!(record.baseline.cost, "undefined");
        assert_eq!(record.baseline.market_price, "undefined");

        let no_id: SourceRow = [("商品名稱", "Nameless")].into_iter().collect();
        s.ingest_baseline(&[no_id]);
        assert!(s.record("undefined").is_some());
    }

    #[test]
    fn test_second_update_keeps_acknowledgment_of_same_value() {
        let mut s = state();
        s.ingest_baseline(&[baseline_row("A1", "Widget", "10", "15", "20")]);
        s.ingest_update(&[update_row("A1", "Widget Pro", "10", "18", "20")]);
        s.toggle_resolution("A1", Field::Name);
        s.toggle_resolution("A1", Field::Price);
        assert_eq!(s.unresolved_count(), 0);

        // Name unchanged, price changed again, cost newly differs.
        s.ingest_update(&[update_row("A1", "Widget Pro", "12", "19", "20")]);
        let record = s.record("A1").unwrap();
        assert!(record.is_resolved(Field::Name));
        assert!(!record.is_resolved(Field::Price));
        assert_eq!(s.unresolved_count(), 2);

        // Name no longer differs: its acknowledgment is dropped.
        s.ingest_update(&[update_row("A1", "Widget", "12", "19", "20")]);
        assert!(!s.record("A1").unwrap().is_resolved(Field::Name));
        assert_eq!(s.unresolved_count(), 2);
        assert!(s.check_invariants().is_ok());
    }

    #[test]
    fn test_update_without_baseline_matches_nothing() {
        let mut s = state();
        let summary = s.ingest_update(&[update_row("A1", "Widget", "1", "2", "3")]);
        assert_eq!(summary, UpdateSummary::default());
        assert!(s.update_ingested());
        assert!(s.records().is_empty());
    }

    #[test]
    fn test_counter_tracks_recount_through_random_toggles() {
        let mut s = state();
        let baseline: Vec<_> = (0..20)
            .map(|i| baseline_row(&format!("P{i}"), "n", "1", "2", "3"))
            .collect();
        let update: Vec<_> = (0..20)
            .filter(|i| i % 3 != 0)
            .map(|i| {
                let odd = if i % 2 == 1 { "x" } else { "n" };
                update_row(&format!("P{i}"), odd, &format!("{}", i % 4), "2", "4")
            })
            .collect();
        s.ingest_baseline(&baseline);
        s.ingest_update(&update);
        assert_eq!(s.unresolved_count(), s.recount());

        for step in 0..200usize {
            let id = format!("P{}", (step * 7) % 20);
            let field = Field::COMPARABLE[step % 4];
            s.toggle_resolution(&id, field);
            assert_eq!(s.unresolved_count(), s.recount());
            assert!(s.unresolved_count() <= s.difference_count());
        }
        assert!(s.check_invariants().is_ok());
    }
}
