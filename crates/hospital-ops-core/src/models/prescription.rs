//! Prescription models.

use serde::{Deserialize, Serialize};

use super::TransitionError;

/// Prescription status. Dispensed is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrescriptionStatus {
    Pending,
    Dispensed,
}

impl PrescriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Dispensed => "DISPENSED",
        }
    }
}

impl std::fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One medicine ordered in an outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionRecord {
    /// `RX001` style id
    pub id: String,
    pub medicine_id: String,
    /// Always > 0
    pub quantity: u32,
    pub status: PrescriptionStatus,
}

impl PrescriptionRecord {
    /// A new pending prescription.
    pub fn new(id: String, medicine_id: String, quantity: u32) -> Self {
        Self {
            id,
            medicine_id,
            quantity,
            status: PrescriptionStatus::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == PrescriptionStatus::Pending
    }

    /// Pending → Dispensed. Never reverts.
    pub fn dispense(&mut self) -> Result<(), TransitionError> {
        if !self.is_pending() {
            return Err(TransitionError {
                entity: "prescription",
                key: self.id.clone(),
                from: self.status.as_str(),
                to: PrescriptionStatus::Dispensed.as_str(),
            });
        }
        self.status = PrescriptionStatus::Dispensed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispense_once() {
        let mut prescription = PrescriptionRecord::new("RX001".into(), "MD00001".into(), 3);
        assert!(prescription.is_pending());

        prescription.dispense().unwrap();
        assert_eq!(prescription.status, PrescriptionStatus::Dispensed);

        let err = prescription.dispense().unwrap_err();
        assert_eq!(err.from, "DISPENSED");
        assert_eq!(prescription.status, PrescriptionStatus::Dispensed);
    }
}
