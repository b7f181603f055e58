//! Reconciliation engine: matches baseline and update listings by product id,
//! diffs their comparable fields and tracks which differences an operator
//! has acknowledged.

pub mod fields;
pub mod record;
pub mod state;
pub mod view;

pub use fields::{Field, FieldDescriptor, Side, UnknownField, DESCRIPTORS};
pub use record::{FieldValues, Record, Resolution};
pub use state::{InvariantViolation, ReconciliationState, ToggleOutcome, UpdateSummary};
pub use view::{FieldCell, RecordView, ReconciliationView};
