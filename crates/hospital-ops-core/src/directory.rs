//! Read-only lookups into the staff and patient tables.

use crate::models::Account;
use crate::store::{PatientRow, RecordStore, StaffRow, StoreResult};

/// Finds staff members (doctors, pharmacists, administrators) by id.
pub trait StaffLookup {
    fn find_staff(&self, staff_id: &str) -> StoreResult<Option<Account>>;
}

/// Finds patients by id.
pub trait PatientLookup {
    fn find_patient(&self, patient_id: &str) -> StoreResult<Option<Account>>;
}

/// Both lookups, backed by the `staff` and `patient` tables.
pub struct Directory<'a> {
    store: &'a RecordStore,
}

impl<'a> Directory<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Staff first, then patients.
    pub fn find_account(&self, id: &str) -> StoreResult<Option<Account>> {
        match self.find_staff(id)? {
            Some(account) => Ok(Some(account)),
            None => self.find_patient(id),
        }
    }

    /// Every doctor, in table order.
    pub fn doctors(&self) -> StoreResult<Vec<Account>> {
        Ok(self
            .store
            .filter(|row: &StaffRow| row.0.is_doctor())?
            .into_iter()
            .map(|row| row.0)
            .collect())
    }
}

impl StaffLookup for Directory<'_> {
    fn find_staff(&self, staff_id: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .store
            .find_by_key::<StaffRow>(staff_id)?
            .map(|row| row.0))
    }
}

impl PatientLookup for Directory<'_> {
    fn find_patient(&self, patient_id: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .store
            .find_by_key::<PatientRow>(patient_id)?
            .map(|row| row.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::models::Role;
    use std::fs;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, RecordStore) {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(StoreConfig::new(dir.path()).unwrap()).unwrap();
        fs::write(
            store.table_path::<StaffRow>(),
            "DR001|Meredith Grey|Doctor|Female|41|grey@hospital.test\n\
             PH001|Sam Patel|Pharmacist|Male|35|patel@hospital.test\n\
             AD001|Jo Admin|Administrator|Female|50|admin@hospital.test\n\
             DR002|Derek Shepherd|Doctor|Male|45|shepherd@hospital.test\n",
        )
        .unwrap();
        fs::write(
            store.table_path::<PatientRow>(),
            "PA00001|Alex Kim|02-03-1990|Male|O+|alex@mail.test\n",
        )
        .unwrap();
        (dir, store)
    }

    #[test]
    fn test_find_staff_and_patient() {
        let (_dir, store) = setup_store();
        let directory = Directory::new(&store);

        let doctor = directory.find_staff("DR001").unwrap().unwrap();
        assert_eq!(doctor.name, "Meredith Grey");
        assert!(doctor.is_doctor());

        let patient = directory.find_patient("PA00001").unwrap().unwrap();
        assert!(matches!(patient.role, Role::Patient(_)));

        assert!(directory.find_staff("PA00001").unwrap().is_none());
        assert!(directory.find_patient("DR001").unwrap().is_none());
    }

    #[test]
    fn test_find_account_checks_both_tables() {
        let (_dir, store) = setup_store();
        let directory = Directory::new(&store);

        assert!(matches!(
            directory.find_account("PH001").unwrap().unwrap().role,
            Role::Pharmacist(_)
        ));
        assert!(matches!(
            directory.find_account("PA00001").unwrap().unwrap().role,
            Role::Patient(_)
        ));
        assert!(directory.find_account("XX999").unwrap().is_none());
    }

    #[test]
    fn test_doctors() {
        let (_dir, store) = setup_store();
        let ids: Vec<String> = Directory::new(&store)
            .doctors()
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["DR001", "DR002"]);
    }
}
