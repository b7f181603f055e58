//! The fixed set of comparable product fields and how each one is pulled out
//! of a decoded spreadsheet row.
//!
//! Platform exports and supplier listings name the same column differently, so
//! every field carries one ordered chain of column names per dataset side. The
//! first column in the chain holding a non-empty value wins.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::excel::SourceRow;

/// Which dataset a row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Baseline,
    Update,
}

/// A product attribute known to the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Id,
    Name,
    Cost,
    Price,
    MarketPrice,
}

impl Field {
    /// Fields that take part in diffing, in display order
    pub const COMPARABLE: [Field; 4] = [Field::Name, Field::Cost, Field::Price, Field::MarketPrice];

    pub fn descriptor(self) -> &'static FieldDescriptor {
        match self {
            Field::Id => &DESCRIPTORS[0],
            Field::Name => &DESCRIPTORS[1],
            Field::Cost => &DESCRIPTORS[2],
            Field::Price => &DESCRIPTORS[3],
            Field::MarketPrice => &DESCRIPTORS[4],
        }
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn label(self) -> &'static str {
        self.descriptor().label
    }

    pub fn is_counted(self) -> bool {
        self.descriptor().counted
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field: {0}")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DESCRIPTORS
            .iter()
            .find(|d| d.name == s)
            .map(|d| d.field)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// Static definition of one comparable attribute
#[derive(Debug)]
pub struct FieldDescriptor {
    pub field: Field,
    /// Canonical name used by the frontend
    pub name: &'static str,
    /// Column header shown in the results table
    pub label: &'static str,
    pub baseline_columns: &'static [&'static str],
    pub update_columns: &'static [&'static str],
    /// Whether a difference in this field counts as an outstanding discrepancy
    pub counted: bool,
}

impl FieldDescriptor {
    pub fn columns(&self, side: Side) -> &'static [&'static str] {
        match side {
            Side::Baseline => self.baseline_columns,
            Side::Update => self.update_columns,
        }
    }

    /// Extract this field from a row, falling back to `missing` when no column
    /// in the chain holds a value.
    pub fn extract(&self, row: &SourceRow, side: Side, missing: &str) -> String {
        self.columns(side)
            .iter()
            .find_map(|column| row.text(column))
            .unwrap_or_else(|| missing.to_string())
    }
}

pub static DESCRIPTORS: [FieldDescriptor; 5] = [
    FieldDescriptor {
        field: Field::Id,
        name: "id",
        label: "編號",
        baseline_columns: &["商品編號", "商品編號(20碼含規格碼)"],
        update_columns: &["商品編號", "商品編號(20碼含規格碼)"],
        counted: false,
    },
    FieldDescriptor {
        field: Field::Name,
        name: "name",
        label: "名稱",
        baseline_columns: &["商品名稱"],
        update_columns: &["商品名稱"],
        counted: true,
    },
    FieldDescriptor {
        field: Field::Cost,
        name: "cost",
        label: "成本",
        baseline_columns: &["進價", "成本"],
        update_columns: &["成本", "進價"],
        counted: true,
    },
    FieldDescriptor {
        field: Field::Price,
        name: "price",
        label: "售價",
        baseline_columns: &["售價(含稅)", "售價(網路價)"],
        update_columns: &["定價", "售價(含稅)", "售價(網路價)"],
        counted: true,
    },
    FieldDescriptor {
        field: Field::MarketPrice,
        name: "marketPrice",
        label: "市價",
        baseline_columns: &["市價", "參考市價(建議售價)"],
        update_columns: &["參考市價(建議售價)", "市價"],
        counted: true,
    },
];
