use serde::{Deserialize, Serialize};

use super::fields::{Field, Side};
use crate::excel::SourceRow;

/// The four comparable values of one product
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldValues {
    pub name: String,
    pub cost: String,
    pub price: String,
    pub market_price: String,
}

impl FieldValues {
    pub fn extract(row: &SourceRow, side: Side, missing: &str) -> Self {
        let get = |field: Field| field.descriptor().extract(row, side, missing);
        Self {
            name: get(Field::Name),
            cost: get(Field::Cost),
            price: get(Field::Price),
            market_price: get(Field::MarketPrice),
        }
    }

    /// Value of a comparable field. `Field::Id` is not stored here.
    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Id => None,
            Field::Name => Some(&self.name),
            Field::Cost => Some(&self.cost),
            Field::Price => Some(&self.price),
            Field::MarketPrice => Some(&self.market_price),
        }
    }
}

/// Per-field acknowledgment flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub name: bool,
    pub cost: bool,
    pub price: bool,
    pub market_price: bool,
}

impl Resolution {
    pub fn get(&self, field: Field) -> bool {
        match field {
            Field::Id => false,
            Field::Name => self.name,
            Field::Cost => self.cost,
            Field::Price => self.price,
            Field::MarketPrice => self.market_price,
        }
    }

    fn slot(&mut self, field: Field) -> Option<&mut bool> {
        match field {
            Field::Id => None,
            Field::Name => Some(&mut self.name),
            Field::Cost => Some(&mut self.cost),
            Field::Price => Some(&mut self.price),
            Field::MarketPrice => Some(&mut self.market_price),
        }
    }

    pub fn set(&mut self, field: Field, resolved: bool) {
        if let Some(slot) = self.slot(field) {
            *slot = resolved;
        }
    }
}

/// Reconciled view of one baseline product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub baseline: FieldValues,
    pub updated: Option<FieldValues>,
    pub matched: bool,
    pub resolved: Resolution,
}

impl Record {
    pub fn new(id: String, baseline: FieldValues) -> Self {
        Self {
            id,
            baseline,
            updated: None,
            matched: false,
            resolved: Resolution::default(),
        }
    }

    /// A field differs when the record is matched, an updated value exists,
    /// and it is not string-equal to the baseline value.
    pub fn is_different(&self, field: Field) -> bool {
        if !self.matched || !field.is_counted() {
            return false;
        }
        let Some(updated) = self.updated.as_ref() else {
            return false;
        };
        updated.get(field) != self.baseline.get(field)
    }

    pub fn is_resolved(&self, field: Field) -> bool {
        self.resolved.get(field)
    }

    /// Number of fields that differ and are not yet acknowledged
    pub fn unresolved_count(&self) -> usize {
        Field::COMPARABLE
            .iter()
            .filter(|&&f| self.is_different(f) && !self.is_resolved(f))
            .count()
    }

    pub fn different_fields(&self) -> impl Iterator<Item = Field> + '_ {
        Field::COMPARABLE.into_iter().filter(|&f| self.is_different(f))
    }
}
