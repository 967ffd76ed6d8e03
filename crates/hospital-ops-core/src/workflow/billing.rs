//! Bill lifecycle: Processing → Billed → Paid.

use tracing::info;

use super::{select, WorkflowError, WorkflowResult};
use crate::models::{round_cost, BillFilter, BillRecord, BillStatus};
use crate::store::RecordStore;

pub struct Billing<'a> {
    store: &'a RecordStore,
}

impl<'a> Billing<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Open a `PROCESSING` bill for a closed appointment. One bill per appointment.
    pub fn create_bill(&self, appointment_id: &str, patient_id: &str) -> WorkflowResult<BillRecord> {
        if self.find(appointment_id)?.is_some() {
            return Err(WorkflowError::Duplicate(format!(
                "bill for appointment {}",
                appointment_id
            )));
        }

        let bill = BillRecord::new(appointment_id.to_string(), patient_id.to_string());
        self.store.append(&bill)?;

        info!(appointment = appointment_id, patient = patient_id, "bill opened");
        Ok(bill)
    }

    /// Bills matching `filter`, in table order.
    pub fn list(&self, filter: &BillFilter) -> WorkflowResult<Vec<BillRecord>> {
        Ok(self.store.filter(|bill: &BillRecord| filter.matches(bill))?)
    }

    /// The `selection`-th (1-based) bill of `list(filter)`.
    pub fn select(&self, filter: &BillFilter, selection: usize) -> WorkflowResult<BillRecord> {
        select(self.list(filter)?, selection)
    }

    pub fn find(&self, appointment_id: &str) -> WorkflowResult<Option<BillRecord>> {
        Ok(self.store.find_by_key(appointment_id)?)
    }

    /// Set the cost and move `PROCESSING` → `BILLED`.
    pub fn advance_to_billed(&self, appointment_id: &str, cost: f64) -> WorkflowResult<BillRecord> {
        if !cost.is_finite() || cost < 0.0 || !round_cost(cost).is_finite() {
            return Err(WorkflowError::Validation(format!(
                "cost must be a non-negative amount, got {}",
                cost
            )));
        }

        let mut bill = self.require(appointment_id)?;
        bill.advance_to_billed(cost)?;
        self.replace(&bill, BillStatus::Processing)?;

        info!(appointment = appointment_id, cost = bill.cost, "bill issued");
        Ok(bill)
    }

    /// `BILLED` → `PAID`.
    pub fn pay(&self, appointment_id: &str) -> WorkflowResult<BillRecord> {
        let mut bill = self.require(appointment_id)?;
        bill.pay()?;
        self.replace(&bill, BillStatus::Billed)?;

        info!(appointment = appointment_id, "bill paid");
        Ok(bill)
    }

    fn require(&self, appointment_id: &str) -> WorkflowResult<BillRecord> {
        self.find(appointment_id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("bill for appointment {}", appointment_id)))
    }

    fn replace(&self, updated: &BillRecord, expected: BillStatus) -> WorkflowResult<()> {
        let rewritten = self.store.rewrite_matching(
            |bill: &BillRecord| bill.appointment_id == updated.appointment_id && bill.status == expected,
            |_| updated.clone(),
        )?;
        if rewritten == 0 {
            return Err(WorkflowError::NotFound(format!(
                "{} bill for appointment {}",
                expected, updated.appointment_id
            )));
        }
        Ok(())
    }
}
