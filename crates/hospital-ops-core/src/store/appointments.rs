//! Appointment table codec.

use chrono::{NaiveDate, NaiveTime};

use super::{optional_field, Record, StoreError, StoreResult, TableSpec, APPOINTMENTS, DATE_FORMAT, TIME_FORMAT};
use crate::models::{AppointmentRecord, AppointmentStatus};

impl Record for AppointmentRecord {
    const TABLE: TableSpec = APPOINTMENTS;

    fn key(&self) -> &str {
        &self.id
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.doctor_id.clone(),
            self.patient_id.clone().unwrap_or_default(),
            self.date.format(DATE_FORMAT).to_string(),
            self.time.format(TIME_FORMAT).to_string(),
            status_to_string(&self.status).to_string(),
            self.message.clone(),
        ]
    }

    fn from_fields(fields: &[&str]) -> StoreResult<Self> {
        Ok(AppointmentRecord {
            id: fields[0].trim().to_string(),
            doctor_id: fields[1].trim().to_string(),
            patient_id: optional_field(fields[2]),
            date: parse_date(fields[3])?,
            time: parse_time(fields[4])?,
            status: string_to_status(fields[5])?,
            message: fields[6].to_string(),
        })
    }
}

pub(crate) fn parse_date(value: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| StoreError::Parse(format!("date: {:?}", value)))
}

pub(crate) fn parse_time(value: &str) -> StoreResult<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), TIME_FORMAT)
        .map_err(|_| StoreError::Parse(format!("time: {:?}", value)))
}

fn status_to_string(status: &AppointmentStatus) -> &'static str {
    status.as_str()
}

fn string_to_status(s: &str) -> StoreResult<AppointmentStatus> {
    match s.trim().to_ascii_uppercase().as_str() {
        "AVAILABLE" => Ok(AppointmentStatus::Available),
        "PENDING" => Ok(AppointmentStatus::Pending),
        "BOOKED" => Ok(AppointmentStatus::Booked),
        "CLOSED" => Ok(AppointmentStatus::Closed),
        _ => Err(StoreError::Parse(format!("appointment status: {:?}", s))),
    }
}
