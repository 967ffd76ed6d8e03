//! Property tests for status lifecycles and stock arithmetic.
//!
//! Invariants:
//! - appointment and bill statuses only move one step forward
//! - a rejected transition leaves the record unchanged
//! - approving a request for `a` units turns stock `s` into `s + a`
//! - dispensing `q` units out of `s` leaves `s - q`, or nothing changes if `q > s`

use std::fs;

use chrono::{NaiveDate, NaiveTime};
use hospital_ops_core::store::Record;
use hospital_ops_core::workflow::WorkflowError;
use hospital_ops_core::{
    AppointmentRecord, AppointmentStatus, BillRecord, BillStatus, HospitalCore, MedicineRecord,
    OutcomeRecord, PrescriptionRecord, StoreConfig,
};
use proptest::prelude::*;
use tempfile::TempDir;

#[derive(Debug, Clone, Copy)]
enum SlotAction {
    Request,
    Accept,
    Close,
}

impl SlotAction {
    fn target(self) -> AppointmentStatus {
        match self {
            SlotAction::Request => AppointmentStatus::Pending,
            SlotAction::Accept => AppointmentStatus::Booked,
            SlotAction::Close => AppointmentStatus::Closed,
        }
    }
}

fn slot_action() -> impl Strategy<Value = SlotAction> {
    prop_oneof![
        Just(SlotAction::Request),
        Just(SlotAction::Accept),
        Just(SlotAction::Close),
    ]
}

fn open_core() -> (TempDir, HospitalCore) {
    let dir = TempDir::new().unwrap();
    let core = HospitalCore::open(StoreConfig::new(dir.path()).unwrap()).unwrap();
    (dir, core)
}

fn write_table<R: Record>(core: &HospitalCore, contents: &str) {
    fs::write(core.store().table_path::<R>(), contents).unwrap();
}

fn stock_of(core: &HospitalCore) -> u32 {
    core.inventory()
        .find_medicine("MD00001")
        .unwrap()
        .unwrap()
        .stock_level
}

proptest! {
    #[test]
    fn prop_appointment_status_only_moves_forward(
        actions in prop::collection::vec(slot_action(), 0..12)
    ) {
        let mut slot = AppointmentRecord::new_slot(
            "AP00001".into(),
            "DR001".into(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        );

        for action in actions {
            let before = slot.clone();
            let allowed = before.status.next() == Some(action.target());
            let result = match action {
                SlotAction::Request => slot.request("PA00001", "checkup"),
                SlotAction::Accept => slot.accept(),
                SlotAction::Close => slot.close(),
            };

            prop_assert_eq!(result.is_ok(), allowed);
            if allowed {
                prop_assert_eq!(slot.status, action.target());
                prop_assert!(slot.status > before.status);
            } else {
                prop_assert_eq!(&slot, &before);
            }
            if slot.status >= AppointmentStatus::Pending {
                prop_assert_eq!(slot.patient_id.as_deref(), Some("PA00001"));
            }
        }
    }

    #[test]
    fn prop_bill_status_only_moves_forward(
        steps in prop::collection::vec(any::<bool>(), 0..8),
        cost in 0.0f64..10_000.0,
    ) {
        let mut bill = BillRecord::new("AP00001".into(), "PA00001".into());

        for pay in steps {
            let before = bill.clone();
            let result = if pay { bill.pay() } else { bill.advance_to_billed(cost) };
            let target = if pay { BillStatus::Paid } else { BillStatus::Billed };

            prop_assert_eq!(result.is_ok(), before.status.next() == Some(target));
            prop_assert!(bill.status >= before.status);
            if result.is_err() {
                prop_assert_eq!(&bill, &before);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_approval_adds_requested_amount(
        stock in 0u32..50,
        headroom in 0u32..50,
        amount in 1u32..500,
    ) {
        let (_dir, core) = open_core();
        let low = stock + headroom;
        write_table::<MedicineRecord>(
            &core,
            &format!("MD00001|Paracetamol|Pain relief|{}|{}|Tablet\n", stock, low),
        );

        core.inventory().request_replenishment("MD00001", amount).unwrap();
        core.inventory().approve_replenishment("MD00001").unwrap();

        prop_assert_eq!(stock_of(&core), stock + amount);
        prop_assert!(core.inventory().outstanding_requests().unwrap().is_empty());
    }

    #[test]
    fn prop_dispense_subtracts_quantity_or_changes_nothing(
        stock in 0u32..100,
        quantity in 1u32..100,
    ) {
        let (_dir, core) = open_core();
        write_table::<MedicineRecord>(
            &core,
            &format!("MD00001|Paracetamol|Pain relief|{}|5|Tablet\n", stock),
        );
        write_table::<PrescriptionRecord>(&core, &format!("RX001|MD00001|{}|PENDING\n", quantity));
        write_table::<OutcomeRecord>(
            &core,
            "AP00001|PA00001|DR001|01-01-2025|Consultation|RX001,PENDING|\n",
        );

        let result = core.dispenser().dispense("AP00001", 1);

        if quantity <= stock {
            prop_assert!(result.is_ok());
            prop_assert_eq!(stock_of(&core), stock - quantity);
            prop_assert!(core.dispenser().pending_prescriptions("AP00001").unwrap().is_empty());
        } else {
            let insufficient = matches!(result, Err(WorkflowError::InsufficientStock { .. }));
            prop_assert!(insufficient);
            prop_assert_eq!(stock_of(&core), stock);
            prop_assert_eq!(core.dispenser().pending_prescriptions("AP00001").unwrap().len(), 1);
        }
    }
}
