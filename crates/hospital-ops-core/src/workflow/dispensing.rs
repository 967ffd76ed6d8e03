//! Dispensing prescriptions against medicine stock.

use std::collections::HashMap;

use tracing::info;

use super::{select, Inventory, WorkflowError, WorkflowResult};
use crate::models::{MedicineRecord, OutcomeRecord, PrescriptionRecord, PrescriptionStatus};
use crate::store::RecordStore;

/// A dispensed prescription and the medicine's stock afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispensed {
    pub prescription: PrescriptionRecord,
    pub medicine: MedicineRecord,
}

pub struct Dispenser<'a> {
    store: &'a RecordStore,
}

impl<'a> Dispenser<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Still-pending prescriptions of an outcome, in the order they were prescribed.
    pub fn pending_prescriptions(
        &self,
        appointment_id: &str,
    ) -> WorkflowResult<Vec<PrescriptionRecord>> {
        let outcome = self
            .store
            .find_by_key::<OutcomeRecord>(appointment_id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("outcome for {}", appointment_id)))?;
        self.pending_of(&outcome)
    }

    /// Outcomes that still have something to dispense.
    pub fn awaiting_dispense(&self) -> WorkflowResult<Vec<OutcomeRecord>> {
        let mut awaiting = Vec::new();
        for outcome in self.store.load_all::<OutcomeRecord>()? {
            if !self.pending_of(&outcome)?.is_empty() {
                awaiting.push(outcome);
            }
        }
        Ok(awaiting)
    }

    /// Dispense the `selection`-th (1-based) pending prescription of an outcome.
    ///
    /// Fails without writing if the medicine is short. Otherwise the
    /// prescription, the medicine stock and the outcome's medication list
    /// are rewritten in that order under one journal marker.
    pub fn dispense(&self, appointment_id: &str, selection: usize) -> WorkflowResult<Dispensed> {
        let mut prescription = select(self.pending_prescriptions(appointment_id)?, selection)?;
        let inventory = Inventory::new(self.store);

        let medicine = inventory.find_medicine(&prescription.medicine_id)?.ok_or_else(|| {
            WorkflowError::NotFound(format!("medicine {}", prescription.medicine_id))
        })?;
        if !medicine.has_stock_for(prescription.quantity) {
            return Err(WorkflowError::InsufficientStock {
                medicine_id: medicine.id,
                available: medicine.stock_level,
                requested: prescription.quantity,
            });
        }
        prescription.dispense()?;

        let medicine = self.store.journalled(
            "dispense",
            &prescription.id,
            || -> WorkflowResult<MedicineRecord> {
                let rewritten = self.store.rewrite_matching(
                    |p: &PrescriptionRecord| p.id == prescription.id && p.is_pending(),
                    |_| prescription.clone(),
                )?;
                if rewritten == 0 {
                    return Err(WorkflowError::NotFound(format!(
                        "pending prescription {}",
                        prescription.id
                    )));
                }

                let medicine =
                    inventory.decrement_stock(&prescription.medicine_id, prescription.quantity)?;

                self.store.rewrite_matching(
                    |o: &OutcomeRecord| o.appointment_id == appointment_id,
                    |mut outcome| {
                        outcome.mark_medication(
                            &prescription.id,
                            PrescriptionStatus::Dispensed.as_str(),
                        );
                        outcome
                    },
                )?;
                Ok(medicine)
            },
        )?;

        info!(
            prescription = %prescription.id,
            medicine = %medicine.id,
            quantity = prescription.quantity,
            stock = medicine.stock_level,
            "prescription dispensed"
        );
        Ok(Dispensed {
            prescription,
            medicine,
        })
    }

    fn pending_of(&self, outcome: &OutcomeRecord) -> WorkflowResult<Vec<PrescriptionRecord>> {
        let mut by_id: HashMap<String, PrescriptionRecord> = self
            .store
            .filter(|p: &PrescriptionRecord| p.is_pending())?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        Ok(outcome
            .prescription_ids()
            .filter_map(|id| by_id.remove(id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use std::fs;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, RecordStore) {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(StoreConfig::new(dir.path()).unwrap()).unwrap();
        fs::write(
            store.table_path::<MedicineRecord>(),
            "MD00001|Paracetamol|Pain relief|22|5|Tablet\n\
             MD00002|Amoxicillin|Antibiotic|1|10|Capsule\n",
        )
        .unwrap();
        fs::write(
            store.table_path::<PrescriptionRecord>(),
            "RX001|MD00001|3|PENDING\n\
             RX002|MD00002|2|PENDING\n",
        )
        .unwrap();
        fs::write(
            store.table_path::<OutcomeRecord>(),
            "AP00001|PA00001|DR001|01-01-2025|Consultation|RX002,PENDING;RX001,PENDING|Rest\n",
        )
        .unwrap();
        (dir, store)
    }

    #[test]
    fn test_pending_in_outcome_order() {
        let (_dir, store) = setup_store();
        let pending = Dispenser::new(&store).pending_prescriptions("AP00001").unwrap();
        let ids: Vec<&str> = pending.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["RX002", "RX001"]);
    }

    #[test]
    fn test_dispense_updates_all_three_tables() {
        let (_dir, store) = setup_store();
        let dispenser = Dispenser::new(&store);

        let dispensed = dispenser.dispense("AP00001", 2).unwrap();
        assert_eq!(dispensed.prescription.id, "RX001");
        assert_eq!(dispensed.prescription.status, PrescriptionStatus::Dispensed);
        assert_eq!(dispensed.medicine.stock_level, 19);

        let outcome = store.find_by_key::<OutcomeRecord>("AP00001").unwrap().unwrap();
        assert_eq!(outcome.medications[0].status, "PENDING");
        assert_eq!(outcome.medications[1].status, "DISPENSED");

        let pending = dispenser.pending_prescriptions("AP00001").unwrap();
        assert_eq!(pending.len(), 1);
        assert!(store.incomplete_operations().unwrap().is_empty());
    }

    #[test]
    fn test_insufficient_stock_changes_nothing() {
        let (_dir, store) = setup_store();
        let before = fs::read_to_string(store.table_path::<PrescriptionRecord>()).unwrap();

        assert!(matches!(
            Dispenser::new(&store).dispense("AP00001", 1),
            Err(WorkflowError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            })
        ));

        let after = fs::read_to_string(store.table_path::<PrescriptionRecord>()).unwrap();
        assert_eq!(before, after);
        assert_eq!(
            store
                .find_by_key::<MedicineRecord>("MD00002")
                .unwrap()
                .unwrap()
                .stock_level,
            1
        );
    }

    #[test]
    fn test_awaiting_dispense() {
        let (_dir, store) = setup_store();
        let dispenser = Dispenser::new(&store);
        assert_eq!(dispenser.awaiting_dispense().unwrap().len(), 1);

        fs::write(
            store.table_path::<MedicineRecord>(),
            "MD00001|Paracetamol|Pain relief|22|5|Tablet\n\
             MD00002|Amoxicillin|Antibiotic|30|10|Capsule\n",
        )
        .unwrap();
        dispenser.dispense("AP00001", 1).unwrap();
        dispenser.dispense("AP00001", 1).unwrap();

        assert!(dispenser.awaiting_dispense().unwrap().is_empty());
        assert!(matches!(
            dispenser.dispense("AP00001", 1),
            Err(WorkflowError::InvalidSelection { .. })
        ));
    }

    #[test]
    fn test_unknown_outcome() {
        let (_dir, store) = setup_store();
        assert!(matches!(
            Dispenser::new(&store).pending_prescriptions("AP00009"),
            Err(WorkflowError::NotFound(_))
        ));
    }
}
