//! Persisted id counters.
//!
//! Each id family (`AP`, `MD`, `RX`) has one row in the `sequence` table
//! holding the next number to hand out. Numbers are never reused, even
//! after rows are removed from the owning table.

use tracing::debug;

use super::{parse_field, Record, RecordStore, StoreError, StoreResult, TableSpec, SEQUENCES};

/// An id family: prefix plus minimum digit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdSequence {
    pub prefix: &'static str,
    pub width: usize,
}

pub const APPOINTMENT_IDS: IdSequence = IdSequence {
    prefix: "AP",
    width: 5,
};

pub const MEDICINE_IDS: IdSequence = IdSequence {
    prefix: "MD",
    width: 5,
};

pub const PRESCRIPTION_IDS: IdSequence = IdSequence {
    prefix: "RX",
    width: 3,
};

impl IdSequence {
    /// `AP` + 7 → `AP00007`.
    pub fn format(&self, number: u32) -> String {
        format!("{}{:0width$}", self.prefix, number, width = self.width)
    }

    /// `AP00007` → 7. `None` for ids of another family.
    pub fn number_of(&self, id: &str) -> Option<u32> {
        let digits = id.strip_prefix(self.prefix)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

/// A `prefix|next` line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SequenceRow {
    prefix: String,
    next: u32,
}

impl Record for SequenceRow {
    const TABLE: TableSpec = SEQUENCES;

    fn key(&self) -> &str {
        &self.prefix
    }

    fn to_fields(&self) -> Vec<String> {
        vec![self.prefix.clone(), self.next.to_string()]
    }

    fn from_fields(fields: &[&str]) -> StoreResult<Self> {
        Ok(SequenceRow {
            prefix: fields[0].trim().to_string(),
            next: parse_field("next", fields[1])?,
        })
    }
}

impl RecordStore {
    /// Hand out the next id of `sequence`.
    ///
    /// The first call for a family seeds the counter from the highest id
    /// already present in `R`'s table, so existing data keeps its numbering.
    pub fn next_id<R: Record>(&self, sequence: &IdSequence) -> StoreResult<String> {
        let existing: Option<SequenceRow> = self.find_by_key(sequence.prefix)?;

        let exhausted = || StoreError::Constraint(format!("{} ids exhausted", sequence.prefix));
        let number = match &existing {
            Some(row) => row.next,
            None => self
                .highest_number::<R>(sequence)?
                .checked_add(1)
                .ok_or_else(exhausted)?,
        };
        let row = SequenceRow {
            prefix: sequence.prefix.to_string(),
            next: number.checked_add(1).ok_or_else(exhausted)?,
        };

        if existing.is_some() {
            self.rewrite_matching(|r: &SequenceRow| r.prefix == row.prefix, |_| row.clone())?;
        } else {
            self.append(&row)?;
        }

        let id = sequence.format(number);
        debug!(%id, "issued id");
        Ok(id)
    }

    fn highest_number<R: Record>(&self, sequence: &IdSequence) -> StoreResult<u32> {
        let mut highest = 0;
        for record in self.scan::<R>()? {
            if let Some(number) = sequence.number_of(record?.key()) {
                highest = highest.max(number);
            }
        }
        Ok(highest)
    }
}
