//! Billing models.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::TransitionError;

/// Bill status. Moves strictly forward: Processing → Billed → Paid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BillStatus {
    /// Created when the appointment closed; cost not set yet
    Processing,
    /// Cost set, awaiting payment
    Billed,
    /// Terminal
    Paid,
}

impl BillStatus {
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Processing => Some(Self::Billed),
            Self::Billed => Some(Self::Paid),
            Self::Paid => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "PROCESSING",
            Self::Billed => "BILLED",
            Self::Paid => "PAID",
        }
    }
}

impl std::fmt::Display for BillStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round to cents.
pub fn round_cost(cost: f64) -> f64 {
    (cost * 100.0).round() / 100.0
}

/// The bill for one appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillRecord {
    /// Key; one bill per appointment
    pub appointment_id: String,
    pub patient_id: String,
    pub status: BillStatus,
    /// Meaningful from Billed onward
    pub cost: f64,
    pub created_at: NaiveDateTime,
}

impl BillRecord {
    /// A processing bill with zero cost, stamped now (local time, whole seconds).
    pub fn new(appointment_id: String, patient_id: String) -> Self {
        let now = chrono::Local::now().naive_local();
        Self {
            appointment_id,
            patient_id,
            status: BillStatus::Processing,
            cost: 0.0,
            created_at: now.with_nanosecond(0).unwrap_or(now),
        }
    }

    /// Processing → Billed, setting the cost. The cost must already be validated.
    pub fn advance_to_billed(&mut self, cost: f64) -> Result<(), TransitionError> {
        self.advance(BillStatus::Billed)?;
        self.cost = round_cost(cost);
        Ok(())
    }

    /// Billed → Paid.
    pub fn pay(&mut self) -> Result<(), TransitionError> {
        self.advance(BillStatus::Paid)
    }

    fn advance(&mut self, to: BillStatus) -> Result<(), TransitionError> {
        if self.status.next() != Some(to) {
            return Err(TransitionError {
                entity: "bill",
                key: self.appointment_id.clone(),
                from: self.status.as_str(),
                to: to.as_str(),
            });
        }
        self.status = to;
        Ok(())
    }
}

/// Which bills to show. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BillFilter {
    pub status: Option<BillStatus>,
    pub patient_id: Option<String>,
}

impl BillFilter {
    pub fn with_status(status: BillStatus) -> Self {
        Self {
            status: Some(status),
            patient_id: None,
        }
    }

    pub fn for_patient(patient_id: &str) -> Self {
        Self {
            status: None,
            patient_id: Some(patient_id.to_string()),
        }
    }

    pub fn matches(&self, bill: &BillRecord) -> bool {
        self.status.map_or(true, |status| bill.status == status)
            && self
                .patient_id
                .as_deref()
                .map_or(true, |patient_id| bill.patient_id == patient_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bill() {
        let bill = BillRecord::new("AP00001".into(), "PA00001".into());
        assert_eq!(bill.status, BillStatus::Processing);
        assert_eq!(bill.cost, 0.0);
        assert_eq!(bill.created_at.nanosecond(), 0);
    }

    #[test]
    fn test_lifecycle_in_order() {
        let mut bill = BillRecord::new("AP00001".into(), "PA00001".into());

        assert!(bill.pay().is_err());
        assert_eq!(bill.status, BillStatus::Processing);

        bill.advance_to_billed(49.999).unwrap();
        assert_eq!(bill.status, BillStatus::Billed);
        assert_eq!(bill.cost, 50.0);

        assert!(bill.advance_to_billed(10.0).is_err());
        assert_eq!(bill.cost, 50.0);

        bill.pay().unwrap();
        assert_eq!(bill.status, BillStatus::Paid);
        assert!(bill.pay().is_err());
    }

    #[test]
    fn test_round_cost() {
        assert_eq!(round_cost(12.346), 12.35);
        assert_eq!(round_cost(12.344), 12.34);
        assert_eq!(round_cost(0.0), 0.0);
    }

    #[test]
    fn test_filter() {
        let mut bill = BillRecord::new("AP00001".into(), "PA00001".into());
        bill.advance_to_billed(20.0).unwrap();

        assert!(BillFilter::default().matches(&bill));
        assert!(BillFilter::with_status(BillStatus::Billed).matches(&bill));
        assert!(!BillFilter::with_status(BillStatus::Paid).matches(&bill));
        assert!(BillFilter::for_patient("PA00001").matches(&bill));
        assert!(!BillFilter::for_patient("PA00002").matches(&bill));
    }
}
