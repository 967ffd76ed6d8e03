//! Prescription table codec.

use super::{parse_field, Record, StoreError, StoreResult, TableSpec, PRESCRIPTIONS};
use crate::models::{PrescriptionRecord, PrescriptionStatus};

impl Record for PrescriptionRecord {
    const TABLE: TableSpec = PRESCRIPTIONS;

    fn key(&self) -> &str {
        &self.id
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.medicine_id.clone(),
            self.quantity.to_string(),
            status_to_string(&self.status).to_string(),
        ]
    }

    fn from_fields(fields: &[&str]) -> StoreResult<Self> {
        let quantity: u32 = parse_field("quantity", fields[2])?;
        if quantity == 0 {
            return Err(StoreError::Parse("quantity: must be positive".into()));
        }

        Ok(PrescriptionRecord {
            id: fields[0].trim().to_string(),
            medicine_id: fields[1].trim().to_string(),
            quantity,
            status: string_to_status(fields[3])?,
        })
    }
}

fn status_to_string(status: &PrescriptionStatus) -> &'static str {
    status.as_str()
}

fn string_to_status(s: &str) -> StoreResult<PrescriptionStatus> {
    match s.trim().to_ascii_uppercase().as_str() {
        "PENDING" => Ok(PrescriptionStatus::Pending),
        "DISPENSED" => Ok(PrescriptionStatus::Dispensed),
        _ => Err(StoreError::Parse(format!("prescription status: {:?}", s))),
    }
}
