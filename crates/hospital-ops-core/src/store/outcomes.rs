//! Outcome table codec.

use super::appointments::parse_date;
use super::{Record, StoreResult, TableSpec, DATE_FORMAT, OUTCOMES};
use crate::models::{format_medications, parse_medications, OutcomeRecord};

impl Record for OutcomeRecord {
    const TABLE: TableSpec = OUTCOMES;

    fn key(&self) -> &str {
        &self.appointment_id
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.appointment_id.clone(),
            self.patient_id.clone(),
            self.doctor_id.clone(),
            self.date.format(DATE_FORMAT).to_string(),
            self.service_type.clone(),
            format_medications(&self.medications),
            self.notes.clone(),
        ]
    }

    fn from_fields(fields: &[&str]) -> StoreResult<Self> {
        Ok(OutcomeRecord {
            appointment_id: fields[0].trim().to_string(),
            patient_id: fields[1].trim().to_string(),
            doctor_id: fields[2].trim().to_string(),
            date: parse_date(fields[3])?,
            service_type: fields[4].to_string(),
            medications: parse_medications(fields[5]),
            notes: fields[6].to_string(),
        })
    }
}
