//! Flat-file table layouts.
//!
//! ```text
//! appointment            id|doctorId|patientId|date|time|status|message
//! outcome                appointmentId|patientId|doctorId|date|serviceType|medications|notes
//! prescription           prescriptionId|medicineId|quantity|status
//! bill                   appointmentId|patientId|status|cost|timestamp
//! medicine               medicineId|name|description|stockLevel|lowStockLevel|medicineType
//! replenishment_request  medicineId|requestedAmount|medicineName
//! staff                  staffId|name|role|gender|age|contact
//! patient                patientId|name|dateOfBirth|gender|bloodType|contact
//! sequence               prefix|next
//! journal                txId|operation|subject|startedAt
//! ```

/// Separates the fields of a record.
pub const FIELD_DELIMITER: char = '|';
/// Separates entries of a list stored in a single field.
pub const LIST_DELIMITER: char = ';';
/// Separates the halves of a `name,status` style pair.
pub const PAIR_DELIMITER: char = ',';
/// Stored (and typed) in place of an empty list.
pub const NONE_SENTINEL: &str = "-";

/// `DD-MM-YYYY`
pub const DATE_FORMAT: &str = "%d-%m-%Y";
/// `HH:MM`
pub const TIME_FORMAT: &str = "%H:%M";
/// Bill creation timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Shape of a table.
///
/// Lines with fewer than `required_fields` fields are skipped as malformed.
/// Trailing optional fields (up to `total_fields`) read as empty strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSpec {
    pub name: &'static str,
    pub required_fields: usize,
    pub total_fields: usize,
}

pub const APPOINTMENTS: TableSpec = TableSpec {
    name: "appointment",
    required_fields: 6,
    total_fields: 7,
};

pub const OUTCOMES: TableSpec = TableSpec {
    name: "outcome",
    required_fields: 6,
    total_fields: 7,
};

pub const PRESCRIPTIONS: TableSpec = TableSpec {
    name: "prescription",
    required_fields: 4,
    total_fields: 4,
};

pub const BILLS: TableSpec = TableSpec {
    name: "bill",
    required_fields: 5,
    total_fields: 5,
};

pub const MEDICINES: TableSpec = TableSpec {
    name: "medicine",
    required_fields: 6,
    total_fields: 6,
};

pub const REPLENISHMENT_REQUESTS: TableSpec = TableSpec {
    name: "replenishment_request",
    required_fields: 3,
    total_fields: 3,
};

pub const STAFF: TableSpec = TableSpec {
    name: "staff",
    required_fields: 6,
    total_fields: 6,
};

pub const PATIENTS: TableSpec = TableSpec {
    name: "patient",
    required_fields: 6,
    total_fields: 6,
};

pub const SEQUENCES: TableSpec = TableSpec {
    name: "sequence",
    required_fields: 2,
    total_fields: 2,
};

pub const JOURNAL: TableSpec = TableSpec {
    name: "journal",
    required_fields: 4,
    total_fields: 4,
};
