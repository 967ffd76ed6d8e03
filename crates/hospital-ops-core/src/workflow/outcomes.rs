//! Recording the outcome of a booked appointment.

use tracing::info;

use super::{require_text, Appointments, Billing, WorkflowError, WorkflowResult};
use crate::models::{
    AppointmentRecord, BillRecord, MedicationEntry, MedicineRecord, OutcomeDraft, OutcomeRecord,
    PrescriptionRecord, PrescriptionStatus,
};
use crate::store::{RecordStore, PRESCRIPTION_IDS};

/// What [`OutcomeRecorder::create_outcome`] wrote.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedOutcome {
    pub outcome: OutcomeRecord,
    pub appointment: AppointmentRecord,
    pub prescriptions: Vec<PrescriptionRecord>,
    pub bill: BillRecord,
}

pub struct OutcomeRecorder<'a> {
    store: &'a RecordStore,
}

impl<'a> OutcomeRecorder<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Close a booked appointment of `doctor_id` with an outcome.
    ///
    /// Everything in `draft` is checked first. The writes then run as one
    /// journalled operation: prescriptions, outcome, appointment, bill.
    pub fn create_outcome(
        &self,
        doctor_id: &str,
        draft: OutcomeDraft,
    ) -> WorkflowResult<RecordedOutcome> {
        let appointments = Appointments::new(self.store);
        let billing = Billing::new(self.store);
        let appointment_id = draft.appointment_id.trim();

        let appointment = appointments
            .find(appointment_id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("appointment {}", appointment_id)))?;
        if appointment.doctor_id != doctor_id {
            return Err(WorkflowError::Validation(format!(
                "appointment {} belongs to {}",
                appointment.id, appointment.doctor_id
            )));
        }
        // Status check without touching the table.
        appointment.clone().close()?;
        let patient_id = appointment.patient_id.clone().ok_or_else(|| {
            WorkflowError::Validation(format!("appointment {} has no patient", appointment.id))
        })?;

        if self.find_outcome(&appointment.id)?.is_some() {
            return Err(WorkflowError::Duplicate(format!(
                "outcome for appointment {}",
                appointment.id
            )));
        }
        if billing.find(&appointment.id)?.is_some() {
            return Err(WorkflowError::Duplicate(format!(
                "bill for appointment {}",
                appointment.id
            )));
        }
        require_text("service type", &draft.service_type)?;
        for order in &draft.prescriptions {
            if order.quantity == 0 {
                return Err(WorkflowError::Validation(format!(
                    "quantity for {} must be greater than zero",
                    order.medicine_id
                )));
            }
            if self
                .store
                .find_by_key::<MedicineRecord>(&order.medicine_id)?
                .is_none()
            {
                return Err(WorkflowError::NotFound(format!("medicine {}", order.medicine_id)));
            }
        }

        let recorded = self
            .store
            .journalled("record-outcome", &appointment.id, || -> WorkflowResult<_> {
                let mut prescriptions = Vec::with_capacity(draft.prescriptions.len());
                for order in &draft.prescriptions {
                    let id = self.store.next_id::<PrescriptionRecord>(&PRESCRIPTION_IDS)?;
                    let prescription =
                        PrescriptionRecord::new(id, order.medicine_id.clone(), order.quantity);
                    self.store.append(&prescription)?;
                    prescriptions.push(prescription);
                }

                let outcome = OutcomeRecord {
                    appointment_id: appointment.id.clone(),
                    patient_id: patient_id.clone(),
                    doctor_id: doctor_id.to_string(),
                    date: appointment.date,
                    service_type: draft.service_type.trim().to_string(),
                    medications: prescriptions
                        .iter()
                        .map(MedicationEntry::for_prescription)
                        .collect(),
                    notes: draft.notes.trim().to_string(),
                };
                self.store.append(&outcome)?;

                let appointment = appointments.close(&outcome.appointment_id)?;
                let bill = billing.create_bill(&outcome.appointment_id, &patient_id)?;

                Ok(RecordedOutcome {
                    outcome,
                    appointment,
                    prescriptions,
                    bill,
                })
            })?;

        info!(
            appointment = %recorded.outcome.appointment_id,
            doctor = doctor_id,
            prescriptions = recorded.prescriptions.len(),
            "outcome recorded"
        );
        Ok(recorded)
    }

    pub fn find_outcome(&self, appointment_id: &str) -> WorkflowResult<Option<OutcomeRecord>> {
        Ok(self.store.find_by_key(appointment_id)?)
    }

    /// A patient's medical record: every outcome, oldest first.
    pub fn outcomes_for_patient(&self, patient_id: &str) -> WorkflowResult<Vec<OutcomeRecord>> {
        Ok(self
            .store
            .filter(|o: &OutcomeRecord| o.patient_id == patient_id)?)
    }

    /// Outcomes with at least one medication still waiting to be dispensed.
    pub fn outcomes_with_pending(&self) -> WorkflowResult<Vec<OutcomeRecord>> {
        let pending = PrescriptionStatus::Pending.as_str();
        Ok(self.store.filter(|o: &OutcomeRecord| {
            o.medications
                .iter()
                .any(|entry| entry.status.eq_ignore_ascii_case(pending))
        })?)
    }
}
