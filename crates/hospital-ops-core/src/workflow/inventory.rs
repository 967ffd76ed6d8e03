//! Medicine stock and replenishment requests.

use tracing::{info, warn};

use super::{require_text, WorkflowError, WorkflowResult};
use crate::models::{
    LowStockAlert, MedicineRecord, MedicineStatus, MedicineSummary, ReplenishmentRequest,
};
use crate::store::{RecordStore, MEDICINE_IDS};

/// Fields for a new medicine. Stock starts at `stock_level`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMedicine {
    pub name: String,
    pub description: String,
    pub stock_level: u32,
    pub low_stock_level: u32,
    pub medicine_type: String,
}

pub struct Inventory<'a> {
    store: &'a RecordStore,
}

impl<'a> Inventory<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Register a medicine under the next `MD` id. Names are unique, ignoring case.
    pub fn add_medicine(&self, new: NewMedicine) -> WorkflowResult<MedicineRecord> {
        require_text("medicine name", &new.name)?;
        let name = new.name.trim();

        let existing = self
            .store
            .find_first(|m: &MedicineRecord| m.name.eq_ignore_ascii_case(name))?;
        if let Some(existing) = existing {
            return Err(WorkflowError::Duplicate(format!(
                "medicine {} ({})",
                existing.name, existing.id
            )));
        }

        let medicine = MedicineRecord {
            id: self.store.next_id::<MedicineRecord>(&MEDICINE_IDS)?,
            name: name.to_string(),
            description: new.description.trim().to_string(),
            stock_level: new.stock_level,
            low_stock_level: new.low_stock_level,
            medicine_type: new.medicine_type.trim().to_string(),
        };
        self.store.append(&medicine)?;

        info!(medicine = %medicine.id, name = %medicine.name, "medicine added");
        Ok(medicine)
    }

    /// Every medicine with its alert flag and status, in table order.
    pub fn list_medicines(&self) -> WorkflowResult<Vec<MedicineSummary>> {
        let requests = self.outstanding_requests()?;
        let summaries = self
            .store
            .load_all::<MedicineRecord>()?
            .into_iter()
            .map(|medicine| {
                let requested = requests.iter().any(|r| r.medicine_id == medicine.id);
                MedicineSummary {
                    low_stock_alert: medicine.is_low_stock(),
                    status: MedicineStatus::derive(&medicine, requested),
                    medicine,
                }
            })
            .collect();
        Ok(summaries)
    }

    pub fn find_medicine(&self, medicine_id: &str) -> WorkflowResult<Option<MedicineRecord>> {
        Ok(self.store.find_by_key(medicine_id)?)
    }

    pub fn medicine_status(&self, medicine_id: &str) -> WorkflowResult<MedicineStatus> {
        let medicine = self.require(medicine_id)?;
        let requested = self.find_request(medicine_id)?.is_some();
        Ok(MedicineStatus::derive(&medicine, requested))
    }

    /// Medicines at or below their threshold.
    pub fn low_stock_medicines(&self) -> WorkflowResult<Vec<MedicineRecord>> {
        Ok(self.store.filter(|m: &MedicineRecord| m.is_low_stock())?)
    }

    pub fn update_low_stock_level(
        &self,
        medicine_id: &str,
        low_stock_level: u32,
    ) -> WorkflowResult<MedicineRecord> {
        let mut medicine = self.require(medicine_id)?;
        medicine.low_stock_level = low_stock_level;
        self.replace(&medicine)?;

        info!(medicine = medicine_id, low_stock_level, "threshold updated");
        Ok(medicine)
    }

    /// Outstanding requests whose medicine is still at or below its threshold.
    ///
    /// Requests for unknown medicines, or for medicines that have since
    /// recovered, are left out.
    pub fn check_low_stock(&self) -> WorkflowResult<Vec<LowStockAlert>> {
        let mut alerts = Vec::new();
        for request in self.outstanding_requests()? {
            match self.find_medicine(&request.medicine_id)? {
                Some(medicine) if medicine.is_low_stock() => {
                    alerts.push(LowStockAlert { request, medicine })
                }
                Some(_) => {}
                None => warn!(
                    medicine = %request.medicine_id,
                    "replenishment request for unknown medicine"
                ),
            }
        }
        Ok(alerts)
    }

    /// Ask for `amount` more units of a low-stock medicine.
    pub fn request_replenishment(
        &self,
        medicine_id: &str,
        amount: u32,
    ) -> WorkflowResult<ReplenishmentRequest> {
        if amount == 0 {
            return Err(WorkflowError::Validation(
                "requested amount must be greater than zero".to_string(),
            ));
        }

        let medicine = self.require(medicine_id)?;
        if !medicine.can_request_replenishment() {
            return Err(WorkflowError::Validation(format!(
                "{} is not low on stock ({} in stock, threshold {})",
                medicine.name, medicine.stock_level, medicine.low_stock_level
            )));
        }
        if self.find_request(medicine_id)?.is_some() {
            return Err(WorkflowError::Duplicate(format!(
                "replenishment request for {}",
                medicine_id
            )));
        }

        let request = ReplenishmentRequest {
            medicine_id: medicine.id.clone(),
            requested_amount: amount,
            medicine_name: medicine.name.clone(),
        };
        self.store.append(&request)?;

        info!(medicine = medicine_id, amount, "replenishment requested");
        Ok(request)
    }

    pub fn outstanding_requests(&self) -> WorkflowResult<Vec<ReplenishmentRequest>> {
        Ok(self.store.load_all()?)
    }

    /// Add the requested amount to stock and drop the request.
    pub fn approve_replenishment(&self, medicine_id: &str) -> WorkflowResult<MedicineRecord> {
        let request = self.find_request(medicine_id)?.ok_or_else(|| {
            WorkflowError::NotFound(format!("replenishment request for {}", medicine_id))
        })?;
        let mut medicine = self.require(medicine_id)?;
        medicine.add_stock(request.requested_amount);

        self.store
            .journalled("approve-replenishment", medicine_id, || -> WorkflowResult<()> {
                self.replace(&medicine)?;
                self.store
                    .remove_first(|r: &ReplenishmentRequest| r.medicine_id == medicine_id)?;
                Ok(())
            })?;

        info!(
            medicine = medicine_id,
            amount = request.requested_amount,
            stock = medicine.stock_level,
            "replenishment approved"
        );
        Ok(medicine)
    }

    /// Take `quantity` units out of stock, never going below zero.
    pub(crate) fn decrement_stock(
        &self,
        medicine_id: &str,
        quantity: u32,
    ) -> WorkflowResult<MedicineRecord> {
        let mut medicine = self.require(medicine_id)?;
        medicine.remove_stock(quantity);
        self.replace(&medicine)?;
        Ok(medicine)
    }

    fn find_request(&self, medicine_id: &str) -> WorkflowResult<Option<ReplenishmentRequest>> {
        Ok(self.store.find_by_key(medicine_id)?)
    }

    fn require(&self, medicine_id: &str) -> WorkflowResult<MedicineRecord> {
        self.find_medicine(medicine_id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("medicine {}", medicine_id)))
    }

    fn replace(&self, updated: &MedicineRecord) -> WorkflowResult<()> {
        let rewritten = self
            .store
            .rewrite_matching(|m: &MedicineRecord| m.id == updated.id, |_| updated.clone())?;
        if rewritten == 0 {
            return Err(WorkflowError::NotFound(format!("medicine {}", updated.id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, RecordStore) {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(StoreConfig::new(dir.path()).unwrap()).unwrap();
        (dir, store)
    }

    fn new_medicine(name: &str, stock: u32, low: u32) -> NewMedicine {
        NewMedicine {
            name: name.to_string(),
            description: "test".to_string(),
            stock_level: stock,
            low_stock_level: low,
            medicine_type: "Tablet".to_string(),
        }
    }

    #[test]
    fn test_add_medicine() {
        let (_dir, store) = setup_store();
        let inventory = Inventory::new(&store);

        let first = inventory.add_medicine(new_medicine("Paracetamol", 2, 5)).unwrap();
        let second = inventory.add_medicine(new_medicine("Ibuprofen", 40, 10)).unwrap();
        assert_eq!(first.id, "MD00001");
        assert_eq!(second.id, "MD00002");

        assert!(matches!(
            inventory.add_medicine(new_medicine("paracetamol", 1, 1)),
            Err(WorkflowError::Duplicate(_))
        ));
        assert!(matches!(
            inventory.add_medicine(new_medicine("  ", 1, 1)),
            Err(WorkflowError::Validation(_))
        ));
    }

    #[test]
    fn test_request_and_approve() {
        let (_dir, store) = setup_store();
        let inventory = Inventory::new(&store);
        let medicine = inventory.add_medicine(new_medicine("Paracetamol", 2, 5)).unwrap();

        assert_eq!(
            inventory.medicine_status(&medicine.id).unwrap(),
            MedicineStatus::LowStock
        );

        inventory.request_replenishment(&medicine.id, 20).unwrap();
        assert_eq!(
            inventory.medicine_status(&medicine.id).unwrap(),
            MedicineStatus::PendingReplenishment
        );
        assert_eq!(inventory.check_low_stock().unwrap().len(), 1);

        let approved = inventory.approve_replenishment(&medicine.id).unwrap();
        assert_eq!(approved.stock_level, 22);
        assert!(inventory.outstanding_requests().unwrap().is_empty());
        assert!(store.incomplete_operations().unwrap().is_empty());
        assert_eq!(
            inventory.medicine_status(&medicine.id).unwrap(),
            MedicineStatus::InStock
        );
    }

    #[test]
    fn test_request_rejections() {
        let (_dir, store) = setup_store();
        let inventory = Inventory::new(&store);
        let healthy = inventory.add_medicine(new_medicine("Ibuprofen", 40, 10)).unwrap();
        let low = inventory.add_medicine(new_medicine("Paracetamol", 2, 5)).unwrap();

        assert!(matches!(
            inventory.request_replenishment(&healthy.id, 10),
            Err(WorkflowError::Validation(_))
        ));
        assert!(matches!(
            inventory.request_replenishment(&low.id, 0),
            Err(WorkflowError::Validation(_))
        ));
        assert!(matches!(
            inventory.request_replenishment("MD09999", 5),
            Err(WorkflowError::NotFound(_))
        ));

        inventory.request_replenishment(&low.id, 10).unwrap();
        assert!(matches!(
            inventory.request_replenishment(&low.id, 10),
            Err(WorkflowError::Duplicate(_))
        ));
    }

    #[test]
    fn test_approve_without_request() {
        let (_dir, store) = setup_store();
        let inventory = Inventory::new(&store);
        let medicine = inventory.add_medicine(new_medicine("Paracetamol", 2, 5)).unwrap();

        assert!(matches!(
            inventory.approve_replenishment(&medicine.id),
            Err(WorkflowError::NotFound(_))
        ));
        assert_eq!(
            inventory.find_medicine(&medicine.id).unwrap().unwrap().stock_level,
            2
        );
    }

    #[test]
    fn test_check_low_stock_skips_recovered() {
        let (_dir, store) = setup_store();
        let inventory = Inventory::new(&store);
        let medicine = inventory.add_medicine(new_medicine("Paracetamol", 5, 5)).unwrap();
        inventory.request_replenishment(&medicine.id, 10).unwrap();

        inventory.update_low_stock_level(&medicine.id, 1).unwrap();
        assert!(inventory.check_low_stock().unwrap().is_empty());
        assert_eq!(inventory.outstanding_requests().unwrap().len(), 1);
    }

    #[test]
    fn test_list_and_decrement() {
        let (_dir, store) = setup_store();
        let inventory = Inventory::new(&store);
        let medicine = inventory.add_medicine(new_medicine("Paracetamol", 8, 5)).unwrap();

        let summaries = inventory.list_medicines().unwrap();
        assert!(!summaries[0].low_stock_alert);
        assert_eq!(summaries[0].status, MedicineStatus::InStock);

        let updated = inventory.decrement_stock(&medicine.id, 3).unwrap();
        assert_eq!(updated.stock_level, 5);
        assert_eq!(inventory.low_stock_medicines().unwrap().len(), 1);

        let emptied = inventory.decrement_stock(&medicine.id, 50).unwrap();
        assert_eq!(emptied.stock_level, 0);
    }
}
