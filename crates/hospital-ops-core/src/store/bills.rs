//! Bill table codec.

use chrono::NaiveDateTime;

use super::{parse_field, Record, StoreError, StoreResult, TableSpec, BILLS, TIMESTAMP_FORMAT};
use crate::models::{BillRecord, BillStatus};

impl Record for BillRecord {
    const TABLE: TableSpec = BILLS;

    fn key(&self) -> &str {
        &self.appointment_id
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.appointment_id.clone(),
            self.patient_id.clone(),
            status_to_string(&self.status).to_string(),
            format!("{:.2}", self.cost),
            self.created_at.format(TIMESTAMP_FORMAT).to_string(),
        ]
    }

    fn from_fields(fields: &[&str]) -> StoreResult<Self> {
        let cost: f64 = parse_field("cost", fields[3])?;
        if !cost.is_finite() || cost < 0.0 {
            return Err(StoreError::Parse(format!("cost: {:?}", fields[3])));
        }
        let created_at = NaiveDateTime::parse_from_str(fields[4].trim(), TIMESTAMP_FORMAT)
            .map_err(|_| StoreError::Parse(format!("timestamp: {:?}", fields[4])))?;

        Ok(BillRecord {
            appointment_id: fields[0].trim().to_string(),
            patient_id: fields[1].trim().to_string(),
            status: string_to_status(fields[2])?,
            cost,
            created_at,
        })
    }
}

fn status_to_string(status: &BillStatus) -> &'static str {
    status.as_str()
}

fn string_to_status(s: &str) -> StoreResult<BillStatus> {
    match s.trim().to_ascii_uppercase().as_str() {
        "PROCESSING" => Ok(BillStatus::Processing),
        "BILLED" => Ok(BillStatus::Billed),
        "PAID" => Ok(BillStatus::Paid),
        _ => Err(StoreError::Parse(format!("bill status: {:?}", s))),
    }
}
