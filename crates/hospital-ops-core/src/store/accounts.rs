//! Staff and patient table codecs.
//!
//! Both tables belong to the registration side of the system; the core
//! only reads them.

use super::{parse_field, Record, StoreError, StoreResult, TableSpec, PATIENTS, STAFF};
use crate::models::{Account, PatientProfile, Role, StaffProfile};

/// A staff-table line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StaffRow(pub Account);

/// A patient-table line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PatientRow(pub Account);

impl Record for StaffRow {
    const TABLE: TableSpec = STAFF;

    fn key(&self) -> &str {
        &self.0.id
    }

    fn to_fields(&self) -> Vec<String> {
        let account = &self.0;
        let (gender, age) = account
            .role
            .staff_profile()
            .map(|profile| (profile.gender.clone(), profile.age.to_string()))
            .unwrap_or_default();

        vec![
            account.id.clone(),
            account.name.clone(),
            account.role.label().to_string(),
            gender,
            age,
            account.contact.clone(),
        ]
    }

    fn from_fields(fields: &[&str]) -> StoreResult<Self> {
        let profile = StaffProfile {
            gender: fields[3].trim().to_string(),
            age: parse_field("age", fields[4])?,
        };
        let role = match fields[2].trim().to_ascii_lowercase().as_str() {
            "doctor" => Role::Doctor(profile),
            "pharmacist" => Role::Pharmacist(profile),
            "administrator" => Role::Administrator(profile),
            other => return Err(StoreError::Parse(format!("staff role: {:?}", other))),
        };

        Ok(StaffRow(Account {
            id: fields[0].trim().to_string(),
            name: fields[1].trim().to_string(),
            contact: fields[5].trim().to_string(),
            role,
        }))
    }
}

impl Record for PatientRow {
    const TABLE: TableSpec = PATIENTS;

    fn key(&self) -> &str {
        &self.0.id
    }

    fn to_fields(&self) -> Vec<String> {
        let account = &self.0;
        let (date_of_birth, gender, blood_type) = match &account.role {
            Role::Patient(profile) => (
                profile.date_of_birth.clone(),
                profile.gender.clone(),
                profile.blood_type.clone(),
            ),
            _ => Default::default(),
        };

        vec![
            account.id.clone(),
            account.name.clone(),
            date_of_birth,
            gender,
            blood_type,
            account.contact.clone(),
        ]
    }

    fn from_fields(fields: &[&str]) -> StoreResult<Self> {
        Ok(PatientRow(Account {
            id: fields[0].trim().to_string(),
            name: fields[1].trim().to_string(),
            contact: fields[5].trim().to_string(),
            role: Role::Patient(PatientProfile {
                date_of_birth: fields[2].trim().to_string(),
                gender: fields[3].trim().to_string(),
                blood_type: fields[4].trim().to_string(),
            }),
        }))
    }
}
