//! Appointment slots and the booking state machine.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{require_text, select, WorkflowError, WorkflowResult};
use crate::directory::StaffLookup;
use crate::models::{Account, AppointmentRecord, AppointmentStatus};
use crate::store::{RecordStore, APPOINTMENT_IDS};

/// A booked appointment with the doctor's details, if the doctor is known.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookedAppointment {
    pub appointment: AppointmentRecord,
    pub doctor: Option<Account>,
}

/// Appointment workflow.
///
/// Closing is crate-private; [`OutcomeRecorder`](super::OutcomeRecorder)
/// closes an appointment when it records the outcome.
pub struct Appointments<'a> {
    store: &'a RecordStore,
}

impl<'a> Appointments<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Publish an available slot for a doctor.
    pub fn add_slot(
        &self,
        doctor_id: &str,
        date: NaiveDate,
        time: NaiveTime,
    ) -> WorkflowResult<AppointmentRecord> {
        require_text("doctor id", doctor_id)?;

        let clash = self.store.find_first(|a: &AppointmentRecord| {
            a.doctor_id == doctor_id && a.date == date && a.time == time
        })?;
        if let Some(existing) = clash {
            return Err(WorkflowError::Duplicate(format!(
                "{} already has slot {} at {}",
                doctor_id, existing.id, existing.time
            )));
        }

        let id = self.store.next_id::<AppointmentRecord>(&APPOINTMENT_IDS)?;
        let slot = AppointmentRecord::new_slot(id, doctor_id.to_string(), date, time);
        self.store.append(&slot)?;

        info!(appointment = %slot.id, doctor = doctor_id, "published slot");
        Ok(slot)
    }

    /// Open slots in insertion order. Selections index this list from 1.
    pub fn list_available(&self) -> WorkflowResult<Vec<AppointmentRecord>> {
        Ok(self
            .store
            .filter(|a: &AppointmentRecord| a.status == AppointmentStatus::Available)?)
    }

    /// Ask for the `selection`-th available slot.
    pub fn request_booking(
        &self,
        patient_id: &str,
        selection: usize,
        message: &str,
    ) -> WorkflowResult<AppointmentRecord> {
        require_text("patient id", patient_id)?;

        let mut appointment = select(self.list_available()?, selection)?;
        appointment.request(patient_id, message)?;
        self.replace(&appointment, AppointmentStatus::Available)?;

        info!(appointment = %appointment.id, patient = patient_id, "booking requested");
        Ok(appointment)
    }

    /// Requests waiting for `doctor_id` to accept.
    pub fn list_pending(&self, doctor_id: &str) -> WorkflowResult<Vec<AppointmentRecord>> {
        Ok(self.store.filter(|a: &AppointmentRecord| {
            a.status == AppointmentStatus::Pending && a.doctor_id == doctor_id
        })?)
    }

    /// Accept the `selection`-th pending request of `doctor_id`.
    pub fn accept_request(
        &self,
        doctor_id: &str,
        selection: usize,
    ) -> WorkflowResult<AppointmentRecord> {
        let mut appointment = select(self.list_pending(doctor_id)?, selection)?;
        appointment.accept()?;
        self.replace(&appointment, AppointmentStatus::Pending)?;

        info!(appointment = %appointment.id, doctor = doctor_id, "booking accepted");
        Ok(appointment)
    }

    /// A patient's booked appointments, with doctor details from `staff`.
    pub fn list_booked(
        &self,
        patient_id: &str,
        staff: &dyn StaffLookup,
    ) -> WorkflowResult<Vec<BookedAppointment>> {
        let booked = self.store.filter(|a: &AppointmentRecord| {
            a.status == AppointmentStatus::Booked && a.is_for_patient(patient_id)
        })?;

        booked
            .into_iter()
            .map(|appointment| -> WorkflowResult<BookedAppointment> {
                let doctor = staff.find_staff(&appointment.doctor_id)?;
                Ok(BookedAppointment {
                    appointment,
                    doctor,
                })
            })
            .collect()
    }

    /// A doctor's booked appointments; the ones an outcome can be recorded for.
    pub fn list_booked_for_doctor(&self, doctor_id: &str) -> WorkflowResult<Vec<AppointmentRecord>> {
        Ok(self.store.filter(|a: &AppointmentRecord| {
            a.status == AppointmentStatus::Booked && a.doctor_id == doctor_id
        })?)
    }

    /// Every slot of a doctor, by date and time.
    pub fn schedule(&self, doctor_id: &str) -> WorkflowResult<Vec<AppointmentRecord>> {
        let mut slots = self
            .store
            .filter(|a: &AppointmentRecord| a.doctor_id == doctor_id)?;
        slots.sort_by_key(|a| (a.date, a.time));
        Ok(slots)
    }

    /// Every appointment a patient has requested, whatever its status.
    pub fn history(&self, patient_id: &str) -> WorkflowResult<Vec<AppointmentRecord>> {
        Ok(self
            .store
            .filter(|a: &AppointmentRecord| a.is_for_patient(patient_id))?)
    }

    pub fn find(&self, appointment_id: &str) -> WorkflowResult<Option<AppointmentRecord>> {
        Ok(self.store.find_by_key(appointment_id)?)
    }

    /// Booked → Closed. Only the outcome recorder calls this.
    pub(crate) fn close(&self, appointment_id: &str) -> WorkflowResult<AppointmentRecord> {
        let mut appointment = self
            .find(appointment_id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("appointment {}", appointment_id)))?;
        appointment.close()?;
        self.replace(&appointment, AppointmentStatus::Booked)?;

        info!(appointment = %appointment.id, "appointment closed");
        Ok(appointment)
    }

    /// Rewrite the row of `updated`, provided it is still in status `expected`.
    fn replace(&self, updated: &AppointmentRecord, expected: AppointmentStatus) -> WorkflowResult<()> {
        let rewritten = self.store.rewrite_matching(
            |a: &AppointmentRecord| a.id == updated.id && a.status == expected,
            |_| updated.clone(),
        )?;
        if rewritten == 0 {
            return Err(WorkflowError::NotFound(format!(
                "{} appointment {}",
                expected, updated.id
            )));
        }
        Ok(())
    }
}
