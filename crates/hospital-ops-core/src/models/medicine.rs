//! Medicine inventory models.

use serde::{Deserialize, Serialize};

/// One medicine in the inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineRecord {
    /// `MD00001` style id
    pub id: String,
    pub name: String,
    pub description: String,
    pub stock_level: u32,
    /// Alert threshold (inclusive)
    pub low_stock_level: u32,
    /// e.g. "Tablet", "Syrup"
    pub medicine_type: String,
}

impl MedicineRecord {
    /// Low-stock alert: stock at or below the threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock_level <= self.low_stock_level
    }

    /// Replenishment is only justified for low or empty stock.
    pub fn can_request_replenishment(&self) -> bool {
        self.is_low_stock() || self.stock_level == 0
    }

    pub fn has_stock_for(&self, quantity: u32) -> bool {
        self.stock_level >= quantity
    }

    /// Take stock out, never going below zero.
    pub fn remove_stock(&mut self, quantity: u32) {
        self.stock_level = self.stock_level.saturating_sub(quantity);
    }

    pub fn add_stock(&mut self, amount: u32) {
        self.stock_level = self.stock_level.saturating_add(amount);
    }
}

/// Display status of a medicine, derived from stock and outstanding requests.
///
/// Separate from the low-stock alert: a medicine can be low on stock and
/// already have a replenishment request waiting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MedicineStatus {
    InStock,
    LowStock,
    PendingReplenishment,
}

impl MedicineStatus {
    pub fn derive(medicine: &MedicineRecord, has_outstanding_request: bool) -> Self {
        if has_outstanding_request {
            Self::PendingReplenishment
        } else if medicine.is_low_stock() {
            Self::LowStock
        } else {
            Self::InStock
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::InStock => "In stock",
            Self::LowStock => "Low stock",
            Self::PendingReplenishment => "Pending replenishment",
        }
    }
}

/// A medicine together with its derived status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicineSummary {
    pub medicine: MedicineRecord,
    pub low_stock_alert: bool,
    pub status: MedicineStatus,
}

/// A pharmacist's ask to top up one medicine, awaiting approval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplenishmentRequest {
    pub medicine_id: String,
    /// Always > 0
    pub requested_amount: u32,
    /// Copied from the medicine for display
    pub medicine_name: String,
}

/// An outstanding request whose medicine is still low on stock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LowStockAlert {
    pub request: ReplenishmentRequest,
    pub medicine: MedicineRecord,
}
