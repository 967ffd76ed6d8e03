//! Bill statements for patients and accounts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::directory::PatientLookup;
use crate::models::{
    BillFilter, BillRecord, BillStatus, MedicineRecord, OutcomeRecord, PrescriptionRecord,
};
use crate::store::{RecordStore, DATE_FORMAT, TIMESTAMP_FORMAT};
use crate::workflow::{WorkflowError, WorkflowResult};

const CSV_HEADER: &str = "appointment_id,patient_id,status,cost,created_at,service_type,prescription_id,medicine_id,medicine_name,quantity,prescription_status\n";

/// Statement for a single bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillStatement {
    pub metadata: StatementMetadata,
    /// Prescriptions from the appointment's outcome
    pub line_items: Vec<StatementLineItem>,
}

/// Bill statement metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementMetadata {
    pub appointment_id: String,
    pub patient_id: String,
    /// Patient name (if the patient is on file)
    pub patient_name: Option<String>,
    pub doctor_id: Option<String>,
    pub appointment_date: Option<String>,
    pub service_type: Option<String>,
    pub status: BillStatus,
    pub cost: f64,
    /// Bill creation time
    pub created_at: String,
    /// Export timestamp
    pub exported_at: String,
}

/// Single prescription on a statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementLineItem {
    pub prescription_id: String,
    pub medicine_id: String,
    /// Medicine name (if the medicine is still on file)
    pub medicine_name: Option<String>,
    pub quantity: u32,
    pub status: String,
}

impl BillStatement {
    /// Assemble a statement. `medicines` maps medicine id to record.
    pub fn from_parts(
        bill: &BillRecord,
        outcome: Option<&OutcomeRecord>,
        prescriptions: &[PrescriptionRecord],
        medicines: &HashMap<String, MedicineRecord>,
        patient_name: Option<String>,
    ) -> Self {
        let line_items = prescriptions
            .iter()
            .map(|prescription| StatementLineItem {
                prescription_id: prescription.id.clone(),
                medicine_id: prescription.medicine_id.clone(),
                medicine_name: medicines
                    .get(&prescription.medicine_id)
                    .map(|m| m.name.clone()),
                quantity: prescription.quantity,
                status: prescription.status.as_str().to_string(),
            })
            .collect();

        Self {
            metadata: StatementMetadata {
                appointment_id: bill.appointment_id.clone(),
                patient_id: bill.patient_id.clone(),
                patient_name,
                doctor_id: outcome.map(|o| o.doctor_id.clone()),
                appointment_date: outcome.map(|o| o.date.format(DATE_FORMAT).to_string()),
                service_type: outcome.map(|o| o.service_type.clone()),
                status: bill.status,
                cost: bill.cost,
                created_at: bill.created_at.format(TIMESTAMP_FORMAT).to_string(),
                exported_at: chrono::Local::now().to_rfc3339(),
            },
            line_items,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        self.push_csv_rows(&mut csv);
        csv
    }

    /// One row per prescription; a bill without prescriptions still gets a row.
    fn push_csv_rows(&self, csv: &mut String) {
        let meta = &self.metadata;
        let prefix = format!(
            "{},{},{},{:.2},{},{}",
            escape_csv(&meta.appointment_id),
            escape_csv(&meta.patient_id),
            meta.status,
            meta.cost,
            escape_csv(&meta.created_at),
            escape_csv(meta.service_type.as_deref().unwrap_or("")),
        );

        if self.line_items.is_empty() {
            csv.push_str(&prefix);
            csv.push_str(",,,,,\n");
            return;
        }

        for item in &self.line_items {
            csv.push_str(&format!(
                "{},{},{},{},{},{}\n",
                prefix,
                escape_csv(&item.prescription_id),
                escape_csv(&item.medicine_id),
                escape_csv(item.medicine_name.as_deref().unwrap_or("")),
                item.quantity,
                escape_csv(&item.status),
            ));
        }
    }
}

/// Several statements exported together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchStatement {
    pub exported_at: String,
    pub statements: Vec<BillStatement>,
    /// Sum of all bill costs
    pub total_cost: f64,
    /// Sum of costs of bills not yet paid
    pub outstanding_cost: f64,
}

impl BatchStatement {
    fn new(statements: Vec<BillStatement>) -> Self {
        let total_cost: f64 = statements.iter().map(|s| s.metadata.cost).sum();
        let outstanding_cost: f64 = statements
            .iter()
            .filter(|s| s.metadata.status != BillStatus::Paid)
            .map(|s| s.metadata.cost)
            .sum();

        Self {
            exported_at: chrono::Local::now().to_rfc3339(),
            statements,
            total_cost,
            outstanding_cost,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        for statement in &self.statements {
            statement.push_csv_rows(&mut csv);
        }
        csv
    }
}

/// Builds statements from the bill, outcome, prescription and medicine tables.
pub struct StatementExporter<'a> {
    store: &'a RecordStore,
    patients: &'a dyn PatientLookup,
}

impl<'a> StatementExporter<'a> {
    pub fn new(store: &'a RecordStore, patients: &'a dyn PatientLookup) -> Self {
        Self { store, patients }
    }

    /// Statement for one appointment's bill.
    pub fn statement(&self, appointment_id: &str) -> WorkflowResult<BillStatement> {
        let missing = || WorkflowError::NotFound(format!("bill for appointment {}", appointment_id));
        let bill = self
            .store
            .find_by_key::<BillRecord>(appointment_id)?
            .ok_or_else(missing)?;
        self.build(vec![bill])?.pop().ok_or_else(missing)
    }

    /// Every bill matching `filter`.
    pub fn export(&self, filter: &BillFilter) -> WorkflowResult<BatchStatement> {
        let bills = self.store.filter(|bill: &BillRecord| filter.matches(bill))?;
        Ok(BatchStatement::new(self.build(bills)?))
    }

    fn build(&self, bills: Vec<BillRecord>) -> WorkflowResult<Vec<BillStatement>> {
        let medicines: HashMap<String, MedicineRecord> = self
            .store
            .load_all::<MedicineRecord>()?
            .into_iter()
            .map(|m| (m.id.clone(), m))
            .collect();
        let prescriptions: HashMap<String, PrescriptionRecord> = self
            .store
            .load_all::<PrescriptionRecord>()?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        let mut names: HashMap<String, Option<String>> = HashMap::new();
        let mut statements = Vec::with_capacity(bills.len());
        for bill in bills {
            let outcome = self.store.find_by_key::<OutcomeRecord>(&bill.appointment_id)?;
            let prescribed: Vec<PrescriptionRecord> = outcome
                .iter()
                .flat_map(|o| o.prescription_ids())
                .filter_map(|id| prescriptions.get(id).cloned())
                .collect();

            let patient_name = match names.get(&bill.patient_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self
                        .patients
                        .find_patient(&bill.patient_id)?
                        .map(|account| account.name);
                    names.insert(bill.patient_id.clone(), name.clone());
                    name
                }
            };

            statements.push(BillStatement::from_parts(
                &bill,
                outcome.as_ref(),
                &prescribed,
                &medicines,
                patient_name,
            ));
        }
        Ok(statements)
    }
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::directory::Directory;
    use crate::store::PatientRow;
    use crate::workflow::Billing;
    use std::fs;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, RecordStore) {
        let dir = TempDir::new().unwrap();
        let store = RecordStore::open(StoreConfig::new(dir.path()).unwrap()).unwrap();
        fs::write(
            store.table_path::<PatientRow>(),
            "PA00001|Alex Kim|02-03-1990|Male|O+|alex@mail.test\n",
        )
        .unwrap();
        fs::write(
            store.table_path::<MedicineRecord>(),
            "MD00001|Paracetamol|Pain relief|22|5|Tablet\n",
        )
        .unwrap();
        fs::write(
            store.table_path::<PrescriptionRecord>(),
            "RX001|MD00001|3|DISPENSED\n",
        )
        .unwrap();
        fs::write(
            store.table_path::<OutcomeRecord>(),
            "AP00001|PA00001|DR001|01-01-2025|Consultation, follow-up|RX001,DISPENSED|Rest\n",
        )
        .unwrap();
        (dir, store)
    }

    #[test]
    fn test_statement_joins_tables() {
        let (_dir, store) = setup_store();
        let billing = Billing::new(&store);
        billing.create_bill("AP00001", "PA00001").unwrap();
        billing.advance_to_billed("AP00001", 42.5).unwrap();

        let directory = Directory::new(&store);
        let statement = StatementExporter::new(&store, &directory)
            .statement("AP00001")
            .unwrap();

        assert_eq!(statement.metadata.patient_name.as_deref(), Some("Alex Kim"));
        assert_eq!(statement.metadata.status, BillStatus::Billed);
        assert_eq!(statement.metadata.appointment_date.as_deref(), Some("01-01-2025"));
        assert_eq!(statement.line_items.len(), 1);
        assert_eq!(statement.line_items[0].medicine_name.as_deref(), Some("Paracetamol"));

        let json = statement.to_json().unwrap();
        assert!(json.contains("\"Billed\""));
        assert!(json.contains("Paracetamol"));
    }

    #[test]
    fn test_statement_csv() {
        let (_dir, store) = setup_store();
        let billing = Billing::new(&store);
        billing.create_bill("AP00001", "PA00001").unwrap();
        billing.create_bill("AP00002", "PA00001").unwrap();

        let directory = Directory::new(&store);
        let batch = StatementExporter::new(&store, &directory)
            .export(&BillFilter::for_patient("PA00001"))
            .unwrap();

        let csv = batch.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3); // Header + one row per bill
        assert!(lines[0].starts_with("appointment_id"));
        assert!(lines[1].contains("\"Consultation, follow-up\""));
        assert!(lines[1].contains("RX001"));
        assert!(lines[2].starts_with("AP00002,PA00001,PROCESSING,0.00"));
    }

    #[test]
    fn test_batch_totals() {
        let (_dir, store) = setup_store();
        let billing = Billing::new(&store);
        billing.create_bill("AP00001", "PA00001").unwrap();
        billing.advance_to_billed("AP00001", 30.0).unwrap();
        billing.pay("AP00001").unwrap();
        billing.create_bill("AP00002", "PA00001").unwrap();
        billing.advance_to_billed("AP00002", 12.25).unwrap();

        let directory = Directory::new(&store);
        let batch = StatementExporter::new(&store, &directory)
            .export(&BillFilter::default())
            .unwrap();

        assert_eq!(batch.statements.len(), 2);
        assert_eq!(batch.total_cost, 42.25);
        assert_eq!(batch.outstanding_cost, 12.25);
    }

    #[test]
    fn test_missing_bill() {
        let (_dir, store) = setup_store();
        let directory = Directory::new(&store);
        assert!(matches!(
            StatementExporter::new(&store, &directory).statement("AP00009"),
            Err(WorkflowError::NotFound(_))
        ));
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
    }
}
