//! Appointment models.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::TransitionError;

/// Appointment slot status.
///
/// Moves strictly forward: Available → Pending → Booked → Closed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AppointmentStatus {
    /// Open slot published by a doctor
    Available,
    /// Patient has asked for the slot
    Pending,
    /// Doctor has accepted the request
    Booked,
    /// Outcome recorded; terminal
    Closed,
}

impl AppointmentStatus {
    /// The only status this one may move to.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Available => Some(Self::Pending),
            Self::Pending => Some(Self::Booked),
            Self::Booked => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Pending => "PENDING",
            Self::Booked => "BOOKED",
            Self::Closed => "CLOSED",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One appointment slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentRecord {
    /// `AP00001` style id
    pub id: String,
    pub doctor_id: String,
    /// Unset while the slot is available
    pub patient_id: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
    /// Free text left by the patient when requesting
    pub message: String,
}

impl AppointmentRecord {
    /// A fresh, unbooked slot.
    pub fn new_slot(id: String, doctor_id: String, date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            id,
            doctor_id,
            patient_id: None,
            date,
            time,
            status: AppointmentStatus::Available,
            message: String::new(),
        }
    }

    /// Patient asks for this slot. Sets the patient exactly once.
    pub fn request(&mut self, patient_id: &str, message: &str) -> Result<(), TransitionError> {
        self.advance(AppointmentStatus::Pending)?;
        self.patient_id = Some(patient_id.to_string());
        self.message = message.trim().to_string();
        Ok(())
    }

    /// Doctor accepts a pending request.
    pub fn accept(&mut self) -> Result<(), TransitionError> {
        self.advance(AppointmentStatus::Booked)
    }

    /// Appointment has an outcome.
    pub fn close(&mut self) -> Result<(), TransitionError> {
        self.advance(AppointmentStatus::Closed)
    }

    fn advance(&mut self, to: AppointmentStatus) -> Result<(), TransitionError> {
        if self.status.next() != Some(to) {
            return Err(TransitionError {
                entity: "appointment",
                key: self.id.clone(),
                from: self.status.as_str(),
                to: to.as_str(),
            });
        }
        self.status = to;
        Ok(())
    }

    /// Whether this slot belongs to `patient_id`.
    pub fn is_for_patient(&self, patient_id: &str) -> bool {
        self.patient_id.as_deref() == Some(patient_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> AppointmentRecord {
        AppointmentRecord::new_slot(
            "AP00001".into(),
            "DR001".into(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_full_lifecycle() {
        let mut appointment = slot();
        assert!(appointment.patient_id.is_none());

        appointment.request("PA00001", "  cough ").unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert_eq!(appointment.patient_id.as_deref(), Some("PA00001"));
        assert_eq!(appointment.message, "cough");

        appointment.accept().unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Booked);

        appointment.close().unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Closed);
        assert!(appointment.status.next().is_none());
    }

    #[test]
    fn test_cannot_skip_steps() {
        let mut appointment = slot();
        let err = appointment.close().unwrap_err();
        assert_eq!(err.from, "AVAILABLE");
        assert_eq!(err.to, "CLOSED");
        assert_eq!(appointment.status, AppointmentStatus::Available);

        assert!(appointment.accept().is_err());
    }

    #[test]
    fn test_patient_set_only_once() {
        let mut appointment = slot();
        appointment.request("PA00001", "first").unwrap();

        assert!(appointment.request("PA00002", "second").is_err());
        assert_eq!(appointment.patient_id.as_deref(), Some("PA00001"));
        assert_eq!(appointment.message, "first");
    }

    #[test]
    fn test_status_ordering_follows_lifecycle() {
        assert!(AppointmentStatus::Available < AppointmentStatus::Pending);
        assert!(AppointmentStatus::Pending < AppointmentStatus::Booked);
        assert!(AppointmentStatus::Booked < AppointmentStatus::Closed);
    }
}
