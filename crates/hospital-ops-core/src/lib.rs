//! Hospital Operations Core Library
//!
//! Flat-file record store and workflow engine for appointments, outcomes,
//! prescriptions, bills and medicine inventory.
//!
//! # Architecture
//!
//! ```text
//!  Doctor publishes slot ──► AVAILABLE
//!                               │  patient requests
//!                               ▼
//!                            PENDING
//!                               │  doctor accepts
//!                               ▼
//!                            BOOKED
//!                               │  doctor records outcome
//!              ┌────────────────▼────────────────┐
//!              │      journalled operation       │
//!              │  prescriptions (PENDING)        │
//!              │  outcome                        │
//!              │  appointment → CLOSED           │
//!              │  bill (PROCESSING)              │
//!              └────────┬───────────────┬────────┘
//!                       │               │
//!                       ▼               ▼
//!                  Dispensing        Billing
//!                  (stock -= qty)    PROCESSING → BILLED → PAID
//!                       │
//!                       ▼
//!                  Inventory  ◄── replenishment request / approval
//! ```
//!
//! # Modules
//!
//! - [`store`]: pipe-delimited tables, id sequences and the operation journal
//! - [`models`]: domain records and their state machines
//! - [`workflow`]: cross-table operations
//! - [`directory`]: read-only staff and patient lookups
//! - [`console`]: input/output ports and interactive flows
//! - [`export`]: bill statements as JSON and CSV
//! - [`config`]: store configuration

pub mod config;
pub mod console;
pub mod directory;
pub mod export;
pub mod models;
pub mod store;
pub mod workflow;

// Re-export commonly used types
pub use config::StoreConfig;
pub use directory::{Directory, PatientLookup, StaffLookup};
pub use models::{
    Account, AppointmentRecord, AppointmentStatus, BillFilter, BillRecord, BillStatus,
    MedicineRecord, MedicineStatus, OutcomeDraft, OutcomeRecord, PrescriptionRecord,
    PrescriptionStatus, ReplenishmentRequest, Role,
};
pub use store::{JournalEntry, RecordStore, StoreError};
pub use workflow::{
    Appointments, Billing, Dispenser, Inventory, OutcomeRecorder, WorkflowError, WorkflowResult,
};

use thiserror::Error;

/// Errors surfaced by [`HospitalCore`].
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One open data directory and the workflows over it.
#[derive(Debug)]
pub struct HospitalCore {
    store: RecordStore,
}

impl HospitalCore {
    /// Open or create the store described by `config`.
    pub fn open(config: StoreConfig) -> Result<Self, CoreError> {
        Ok(Self {
            store: RecordStore::open(config)?,
        })
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn appointments(&self) -> Appointments<'_> {
        Appointments::new(&self.store)
    }

    pub fn outcomes(&self) -> OutcomeRecorder<'_> {
        OutcomeRecorder::new(&self.store)
    }

    pub fn dispenser(&self) -> Dispenser<'_> {
        Dispenser::new(&self.store)
    }

    pub fn billing(&self) -> Billing<'_> {
        Billing::new(&self.store)
    }

    pub fn inventory(&self) -> Inventory<'_> {
        Inventory::new(&self.store)
    }

    pub fn directory(&self) -> Directory<'_> {
        Directory::new(&self.store)
    }

    /// Statements for every bill matching `filter`, as JSON.
    pub fn export_statements_json(&self, filter: &BillFilter) -> Result<String, CoreError> {
        let directory = self.directory();
        let batch = export::StatementExporter::new(&self.store, &directory).export(filter)?;
        Ok(batch.to_json()?)
    }

    /// Statements for every bill matching `filter`, as CSV.
    pub fn export_statements_csv(&self, filter: &BillFilter) -> Result<String, CoreError> {
        let directory = self.directory();
        let batch = export::StatementExporter::new(&self.store, &directory).export(filter)?;
        Ok(batch.to_csv())
    }

    /// Interrupted multi-table operations, oldest first.
    pub fn incomplete_operations(&self) -> Result<Vec<JournalEntry>, CoreError> {
        Ok(self.store.incomplete_operations()?)
    }
}
