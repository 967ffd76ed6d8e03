//! Accounts as seen by the workflows.
//!
//! Registration and login live elsewhere; the core only reads these to show
//! who a doctor or patient is and to pick the right menu for an operator.

use serde::{Deserialize, Serialize};

/// Fields shared by all staff roles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffProfile {
    pub gender: String,
    pub age: u32,
}

/// Fields only patients have.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientProfile {
    /// Stored as typed at registration
    pub date_of_birth: String,
    pub gender: String,
    pub blood_type: String,
}

/// What an account may do, with the data specific to that role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Role {
    Patient(PatientProfile),
    Doctor(StaffProfile),
    Pharmacist(StaffProfile),
    Administrator(StaffProfile),
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Patient(_) => "Patient",
            Role::Doctor(_) => "Doctor",
            Role::Pharmacist(_) => "Pharmacist",
            Role::Administrator(_) => "Administrator",
        }
    }

    pub fn staff_profile(&self) -> Option<&StaffProfile> {
        match self {
            Role::Doctor(profile) | Role::Pharmacist(profile) | Role::Administrator(profile) => {
                Some(profile)
            }
            Role::Patient(_) => None,
        }
    }
}

/// A person known to the system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub contact: String,
    pub role: Role,
}

impl Account {
    pub fn is_doctor(&self) -> bool {
        matches!(self.role, Role::Doctor(_))
    }
}
