//! Write-ahead markers for operations that rewrite more than one table.
//!
//! Before the first rewrite a marker line is appended to the `journal`
//! table; after the last rewrite it is removed. A marker that survives
//! means the process stopped part-way and the tables named by the
//! operation may disagree. Nothing is rolled back.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::{Record, RecordStore, StoreError, StoreResult, TableSpec, JOURNAL, TIMESTAMP_FORMAT};

/// One in-flight (or interrupted) multi-table operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    pub tx_id: String,
    /// e.g. `record-outcome`, `dispense`
    pub operation: String,
    /// Key of the record the operation is about
    pub subject: String,
    pub started_at: NaiveDateTime,
}

impl JournalEntry {
    fn begin(operation: &str, subject: &str) -> Self {
        let now = chrono::Local::now().naive_local();
        Self {
            tx_id: Uuid::new_v4().to_string(),
            operation: operation.to_string(),
            subject: subject.to_string(),
            started_at: now,
        }
    }
}

impl Record for JournalEntry {
    const TABLE: TableSpec = JOURNAL;

    fn key(&self) -> &str {
        &self.tx_id
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.tx_id.clone(),
            self.operation.clone(),
            self.subject.clone(),
            self.started_at.format(TIMESTAMP_FORMAT).to_string(),
        ]
    }

    fn from_fields(fields: &[&str]) -> StoreResult<Self> {
        let started_at = NaiveDateTime::parse_from_str(fields[3].trim(), TIMESTAMP_FORMAT)
            .map_err(|_| StoreError::Parse(format!("started at: {:?}", fields[3])))?;

        Ok(JournalEntry {
            tx_id: fields[0].trim().to_string(),
            operation: fields[1].trim().to_string(),
            subject: fields[2].trim().to_string(),
            started_at,
        })
    }
}

impl RecordStore {
    /// Run `body` between a journal marker and its removal.
    ///
    /// Callers validate before calling so that `body` only performs writes.
    /// If `body` fails the marker stays, and the failure is returned as is.
    pub fn journalled<T, E, F>(&self, operation: &str, subject: &str, body: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: From<StoreError>,
    {
        let entry = JournalEntry::begin(operation, subject);
        self.append(&entry)?;

        match body() {
            Ok(value) => {
                self.remove_first(|e: &JournalEntry| e.tx_id == entry.tx_id)?;
                Ok(value)
            }
            Err(e) => {
                warn!(
                    tx = %entry.tx_id,
                    operation,
                    subject,
                    "operation stopped part-way; journal marker left in place"
                );
                Err(e)
            }
        }
    }

    /// Markers of operations that never finished.
    pub fn incomplete_operations(&self) -> StoreResult<Vec<JournalEntry>> {
        self.load_all()
    }

    /// Drop a marker once an operator has checked the affected tables.
    pub fn acknowledge_operation(&self, tx_id: &str) -> StoreResult<bool> {
        Ok(self
            .remove_first(|e: &JournalEntry| e.tx_id == tx_id)?
            .is_some())
    }
}
