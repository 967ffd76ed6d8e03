//! Appointment outcome models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{title_case, PrescriptionRecord};
use crate::store::{LIST_DELIMITER, NONE_SENTINEL, PAIR_DELIMITER};

/// One `name,status` pair of an outcome's medication list.
///
/// `name` is the id of the prescription row. `status` is kept as stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationEntry {
    pub name: String,
    pub status: String,
}

impl MedicationEntry {
    pub fn for_prescription(prescription: &PrescriptionRecord) -> Self {
        Self {
            name: prescription.id.clone(),
            status: prescription.status.as_str().to_string(),
        }
    }

    /// Status for display only (`PENDING` → `Pending`).
    pub fn display_status(&self) -> String {
        title_case(&self.status)
    }
}

/// Parse a stored medication list: `;`-joined `name,status` pairs.
///
/// An empty field or `-` means no medication. A pair without a comma keeps
/// the whole text as the name and an empty status.
pub fn parse_medications(text: &str) -> Vec<MedicationEntry> {
    let text = text.trim();
    if text.is_empty() || text == NONE_SENTINEL {
        return Vec::new();
    }

    text.split(LIST_DELIMITER)
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(PAIR_DELIMITER) {
            Some((name, status)) => MedicationEntry {
                name: name.trim().to_string(),
                status: status.trim().to_string(),
            },
            None => MedicationEntry {
                name: entry.to_string(),
                status: String::new(),
            },
        })
        .collect()
}

/// Inverse of [`parse_medications`]. An empty list is stored as `-`.
pub fn format_medications(entries: &[MedicationEntry]) -> String {
    if entries.is_empty() {
        return NONE_SENTINEL.to_string();
    }
    let separator = LIST_DELIMITER.to_string();
    entries
        .iter()
        .map(|entry| format!("{}{}{}", entry.name, PAIR_DELIMITER, entry.status))
        .collect::<Vec<_>>()
        .join(separator.as_str())
}

/// Summary written when an appointment is closed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeRecord {
    /// Key; the closed appointment
    pub appointment_id: String,
    pub patient_id: String,
    pub doctor_id: String,
    pub date: NaiveDate,
    pub service_type: String,
    /// In prescription order
    pub medications: Vec<MedicationEntry>,
    pub notes: String,
}

impl OutcomeRecord {
    /// Prescription ids in the order they were prescribed.
    pub fn prescription_ids(&self) -> impl Iterator<Item = &str> {
        self.medications.iter().map(|entry| entry.name.as_str())
    }

    /// Update the stored status of one medication entry.
    pub fn mark_medication(&mut self, prescription_id: &str, status: &str) -> bool {
        match self
            .medications
            .iter_mut()
            .find(|entry| entry.name == prescription_id)
        {
            Some(entry) => {
                entry.status = status.to_string();
                true
            }
            None => false,
        }
    }
}

/// A medicine a doctor orders while recording an outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PrescriptionOrder {
    pub medicine_id: String,
    pub quantity: u32,
}

/// Errors parsing typed prescription text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderParseError {
    #[error("missing medicine id in {0:?}")]
    MissingMedicine(String),

    #[error("missing quantity for {0}; use MEDICINE_ID,QUANTITY")]
    MissingQuantity(String),

    #[error("quantity for {medicine_id} must be a positive whole number, got {value:?}")]
    InvalidQuantity { medicine_id: String, value: String },
}

/// Parse typed prescription text: `MD00001,3;MD00002,1`, or `-` for none.
pub fn parse_prescription_orders(text: &str) -> Result<Vec<PrescriptionOrder>, OrderParseError> {
    let text = text.trim();
    if text.is_empty() || text == NONE_SENTINEL {
        return Ok(Vec::new());
    }

    let mut orders = Vec::new();
    for entry in text.split(LIST_DELIMITER).map(str::trim) {
        if entry.is_empty() {
            continue;
        }
        let (medicine_id, quantity) = entry
            .split_once(PAIR_DELIMITER)
            .ok_or_else(|| OrderParseError::MissingQuantity(entry.to_string()))?;

        let medicine_id = medicine_id.trim();
        if medicine_id.is_empty() {
            return Err(OrderParseError::MissingMedicine(entry.to_string()));
        }

        let quantity = quantity.trim();
        let parsed = quantity
            .parse::<u32>()
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| OrderParseError::InvalidQuantity {
                medicine_id: medicine_id.to_string(),
                value: quantity.to_string(),
            })?;

        orders.push(PrescriptionOrder {
            medicine_id: medicine_id.to_string(),
            quantity: parsed,
        });
    }
    Ok(orders)
}

/// Everything a doctor supplies to close an appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutcomeDraft {
    pub appointment_id: String,
    pub service_type: String,
    pub prescriptions: Vec<PrescriptionOrder>,
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_medications() {
        let entries = parse_medications("RX001,PENDING;RX002,dispensed");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "RX001");
        assert_eq!(entries[0].status, "PENDING");
        assert_eq!(entries[0].display_status(), "Pending");
        assert_eq!(entries[1].status, "dispensed");
        assert_eq!(entries[1].display_status(), "Dispensed");
    }

    #[test]
    fn test_empty_medications() {
        assert!(parse_medications("-").is_empty());
        assert!(parse_medications("").is_empty());
        assert_eq!(format_medications(&[]), "-");
    }

    #[test]
    fn test_medication_without_status() {
        let entries = parse_medications("Paracetamol");
        assert_eq!(entries[0].name, "Paracetamol");
        assert_eq!(entries[0].status, "");
    }

    #[test]
    fn test_format_keeps_raw_status() {
        let entries = parse_medications("RX001,pending;RX002,DISPENSED");
        assert_eq!(format_medications(&entries), "RX001,pending;RX002,DISPENSED");
    }

    #[test]
    fn test_parse_orders() {
        let orders = parse_prescription_orders("MD00001,3; MD00002 , 1").unwrap();
        assert_eq!(
            orders,
            vec![
                PrescriptionOrder {
                    medicine_id: "MD00001".into(),
                    quantity: 3
                },
                PrescriptionOrder {
                    medicine_id: "MD00002".into(),
                    quantity: 1
                },
            ]
        );
        assert!(parse_prescription_orders("-").unwrap().is_empty());
    }

    #[test]
    fn test_parse_orders_rejects_bad_quantities() {
        assert_eq!(
            parse_prescription_orders("MD00001"),
            Err(OrderParseError::MissingQuantity("MD00001".into()))
        );
        assert!(matches!(
            parse_prescription_orders("MD00001,0"),
            Err(OrderParseError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            parse_prescription_orders("MD00001,-2"),
            Err(OrderParseError::InvalidQuantity { .. })
        ));
        assert!(matches!(
            parse_prescription_orders(",2"),
            Err(OrderParseError::MissingMedicine(_))
        ));
    }

    #[test]
    fn test_mark_medication() {
        let mut outcome = OutcomeRecord {
            appointment_id: "AP00001".into(),
            patient_id: "PA00001".into(),
            doctor_id: "DR001".into(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            service_type: "Consultation".into(),
            medications: parse_medications("RX001,PENDING;RX002,PENDING"),
            notes: String::new(),
        };

        assert!(outcome.mark_medication("RX002", "DISPENSED"));
        assert!(!outcome.mark_medication("RX009", "DISPENSED"));
        assert_eq!(outcome.medications[0].status, "PENDING");
        assert_eq!(outcome.medications[1].status, "DISPENSED");
        assert_eq!(
            outcome.prescription_ids().collect::<Vec<_>>(),
            vec!["RX001", "RX002"]
        );
    }
}
