//! Medicine and replenishment-request table codecs.

use super::{parse_field, Record, StoreError, StoreResult, TableSpec, MEDICINES, REPLENISHMENT_REQUESTS};
use crate::models::{MedicineRecord, ReplenishmentRequest};

impl Record for MedicineRecord {
    const TABLE: TableSpec = MEDICINES;

    fn key(&self) -> &str {
        &self.id
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.description.clone(),
            self.stock_level.to_string(),
            self.low_stock_level.to_string(),
            self.medicine_type.clone(),
        ]
    }

    fn from_fields(fields: &[&str]) -> StoreResult<Self> {
        Ok(MedicineRecord {
            id: fields[0].trim().to_string(),
            name: fields[1].to_string(),
            description: fields[2].to_string(),
            stock_level: parse_field("stock level", fields[3])?,
            low_stock_level: parse_field("low stock level", fields[4])?,
            medicine_type: fields[5].to_string(),
        })
    }
}

impl Record for ReplenishmentRequest {
    const TABLE: TableSpec = REPLENISHMENT_REQUESTS;

    fn key(&self) -> &str {
        &self.medicine_id
    }

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.medicine_id.clone(),
            self.requested_amount.to_string(),
            self.medicine_name.clone(),
        ]
    }

    fn from_fields(fields: &[&str]) -> StoreResult<Self> {
        let requested_amount: u32 = parse_field("requested amount", fields[1])?;
        if requested_amount == 0 {
            return Err(StoreError::Parse("requested amount: must be positive".into()));
        }

        Ok(ReplenishmentRequest {
            medicine_id: fields[0].trim().to_string(),
            requested_amount,
            medicine_name: fields[2].to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{encode_line, split_line};

    #[test]
    fn test_medicine_line() {
        let line = "MD00001|Paracetamol|Pain relief|2|5|Tablet";
        let fields = split_line(&MEDICINES, line).unwrap();
        let medicine = MedicineRecord::from_fields(&fields).unwrap();

        assert_eq!(medicine.stock_level, 2);
        assert_eq!(medicine.low_stock_level, 5);
        assert!(medicine.is_low_stock());
        assert_eq!(encode_line(&medicine.to_fields()), line);
    }

    #[test]
    fn test_negative_stock_is_malformed() {
        let fields = split_line(&MEDICINES, "MD00001|Paracetamol|Pain relief|-2|5|Tablet").unwrap();
        assert!(MedicineRecord::from_fields(&fields).is_err());
    }

    #[test]
    fn test_request_line() {
        let line = "MD00001|20|Paracetamol";
        let fields = split_line(&REPLENISHMENT_REQUESTS, line).unwrap();
        let request = ReplenishmentRequest::from_fields(&fields).unwrap();

        assert_eq!(request.requested_amount, 20);
        assert_eq!(encode_line(&request.to_fields()), line);

        let fields = split_line(&REPLENISHMENT_REQUESTS, "MD00001|0|Paracetamol").unwrap();
        assert!(ReplenishmentRequest::from_fields(&fields).is_err());
    }
}
