//! Cross-entity workflows over the record store.
//!
//! Each workflow borrows the [`RecordStore`](crate::store::RecordStore) and
//! owns the lifecycle of one group of records:
//!
//! - [`Appointments`]: slot publication and booking
//! - [`OutcomeRecorder`]: closing an appointment with an outcome and prescriptions
//! - [`Dispenser`]: dispensing prescriptions against stock
//! - [`Billing`]: bill status and payment
//! - [`Inventory`]: stock levels and replenishment
//!
//! Validation happens before the first write. Operations that touch more
//! than one table run inside [`RecordStore::journalled`](crate::store::RecordStore::journalled).

mod appointments;
mod billing;
mod dispensing;
mod inventory;
mod outcomes;

pub use appointments::*;
pub use billing::*;
pub use dispensing::*;
pub use inventory::*;
pub use outcomes::*;

use thiserror::Error;

use crate::models::TransitionError;
use crate::store::StoreError;

/// Workflow errors. The `Display` text is what the menu layer shows.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid selection {selection}: choose a number from 1 to {available}")]
    InvalidSelection { selection: usize, available: usize },

    #[error("Invalid transition: {0}")]
    InvalidTransition(#[from] TransitionError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Insufficient stock for {medicine_id}: {available} available, {requested} requested")]
    InsufficientStock {
        medicine_id: String,
        available: u32,
        requested: u32,
    },

    #[error("Already exists: {0}")]
    Duplicate(String),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Pick the `selection`-th (1-based) item of a freshly filtered list.
pub(crate) fn select<T>(items: Vec<T>, selection: usize) -> WorkflowResult<T> {
    let available = items.len();
    selection
        .checked_sub(1)
        .and_then(|index| items.into_iter().nth(index))
        .ok_or(WorkflowError::InvalidSelection {
            selection,
            available,
        })
}

/// Reject blank required text.
pub(crate) fn require_text(field: &str, value: &str) -> WorkflowResult<()> {
    if value.trim().is_empty() {
        return Err(WorkflowError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_one_based() {
        assert_eq!(select(vec!["a", "b", "c"], 1).unwrap(), "a");
        assert_eq!(select(vec!["a", "b", "c"], 3).unwrap(), "c");
    }

    #[test]
    fn test_select_out_of_range() {
        assert!(matches!(
            select(vec!["a"], 0),
            Err(WorkflowError::InvalidSelection { selection: 0, available: 1 })
        ));
        assert!(matches!(
            select(vec!["a"], 2),
            Err(WorkflowError::InvalidSelection { selection: 2, available: 1 })
        ));
        assert!(select(Vec::<&str>::new(), 1).is_err());
    }

    #[test]
    fn test_require_text() {
        assert!(require_text("service type", "Consultation").is_ok());
        assert!(require_text("service type", "   ").is_err());
    }
}
