//! Role menus. Every error is shown and the menu carries on; `0` logs out.

use chrono::{NaiveDate, NaiveTime};
use hospital_ops_core::console::{
    prompt_required, prompt_selection, prompt_text, record_outcome, InputPort, OutputPort,
};
use hospital_ops_core::export::StatementExporter;
use hospital_ops_core::models::MedicineSummary;
use hospital_ops_core::store::{DATE_FORMAT, TIMESTAMP_FORMAT, TIME_FORMAT};
use hospital_ops_core::workflow::NewMedicine;
use hospital_ops_core::{
    Account, AppointmentRecord, BillFilter, BillRecord, BillStatus, HospitalCore, OutcomeRecord,
};

type MenuResult = anyhow::Result<()>;

pub struct Menu<'a> {
    core: &'a HospitalCore,
    input: &'a mut dyn InputPort,
    output: &'a mut dyn OutputPort,
}

impl<'a> Menu<'a> {
    pub fn new(
        core: &'a HospitalCore,
        input: &'a mut dyn InputPort,
        output: &'a mut dyn OutputPort,
    ) -> Self {
        Self {
            core,
            input,
            output,
        }
    }

    // =========================================================================
    // Menu loops
    // =========================================================================

    pub fn patient(&mut self, patient: &Account) -> MenuResult {
        let items = [
            "View medical record",
            "View available appointment slots",
            "Request an appointment",
            "View booked appointments",
            "View appointment history",
            "View bills",
            "Pay a bill",
        ];
        self.run(&patient.name, &items, |menu, choice| match choice {
            1 => menu.show_records(&patient.id),
            2 => menu.show_available(),
            3 => menu.request_appointment(&patient.id),
            4 => menu.show_booked(&patient.id),
            5 => menu.show_history(&patient.id),
            6 => menu.show_bills(&BillFilter::for_patient(&patient.id)),
            _ => menu.pay_bill(&patient.id),
        })
    }

    pub fn doctor(&mut self, doctor: &Account) -> MenuResult {
        let items = [
            "View schedule",
            "Publish an appointment slot",
            "Accept appointment requests",
            "Record appointment outcome",
            "View a patient's medical record",
        ];
        self.run(&doctor.name, &items, |menu, choice| match choice {
            1 => menu.show_schedule(&doctor.id),
            2 => menu.add_slot(&doctor.id),
            3 => menu.accept_requests(&doctor.id),
            4 => {
                record_outcome(menu.core.store(), &doctor.id, menu.input, menu.output)?;
                Ok(())
            }
            _ => {
                let Some(patient_id) = prompt_required(menu.input, menu.output, "Patient ID: ")
                else {
                    return Ok(());
                };
                menu.show_records(&patient_id)
            }
        })
    }

    pub fn pharmacist(&mut self, pharmacist: &Account) -> MenuResult {
        let items = [
            "View outcomes awaiting dispense",
            "Dispense a prescription",
            "View inventory",
            "Request replenishment",
        ];
        self.run(&pharmacist.name, &items, |menu, choice| match choice {
            1 => menu.show_awaiting(),
            2 => menu.dispense(),
            3 => menu.show_inventory(),
            _ => menu.request_replenishment(),
        })
    }

    pub fn administrator(&mut self, admin: &Account) -> MenuResult {
        let items = [
            "View inventory",
            "Add a medicine",
            "Change a low-stock threshold",
            "Approve replenishment requests",
            "Issue bills",
            "Export bill statements",
            "View interrupted operations",
        ];
        self.run(&admin.name, &items, |menu, choice| match choice {
            1 => menu.show_inventory(),
            2 => menu.add_medicine(),
            3 => menu.update_threshold(),
            4 => menu.approve_replenishment(),
            5 => menu.issue_bill(),
            6 => menu.export_statements(),
            _ => menu.show_journal(),
        })
    }

    fn run<F>(&mut self, name: &str, items: &[&str], mut handle: F) -> MenuResult
    where
        F: FnMut(&mut Self, usize) -> MenuResult,
    {
        loop {
            self.output.show("");
            self.output.show(&format!("=== {} ===", name));
            for (index, item) in items.iter().enumerate() {
                self.output.show(&format!("{}. {}", index + 1, item));
            }
            self.output.show("0. Log out");

            let Some(choice) = prompt_selection(self.input, self.output, "> ", items.len())
            else {
                return Ok(());
            };
            if let Err(e) = handle(self, choice) {
                self.output.show(&format!("Error: {:#}", e));
            }
        }
    }

    fn say(&mut self, text: &str) {
        self.output.show(text);
    }

    // =========================================================================
    // Appointments
    // =========================================================================

    fn show_available(&mut self) -> MenuResult {
        let slots = self.core.appointments().list_available()?;
        if slots.is_empty() {
            self.say("No available slots.");
        }
        for (index, slot) in slots.iter().enumerate() {
            let line = format!("{}. {}", index + 1, format_slot(slot));
            self.say(&line);
        }
        Ok(())
    }

    fn request_appointment(&mut self, patient_id: &str) -> MenuResult {
        let count = self.core.appointments().list_available()?.len();
        if count == 0 {
            self.say("No available slots.");
            return Ok(());
        }
        self.show_available()?;

        let Some(selection) = prompt_selection(self.input, self.output, "Slot number: ", count)
        else {
            return Ok(());
        };
        let Some(message) = prompt_text(self.input, "Message for the doctor: ") else {
            return Ok(());
        };

        let appointment = self
            .core
            .appointments()
            .request_booking(patient_id, selection, &message)?;
        self.say(&format!("Requested {}. Waiting for the doctor.", appointment.id));
        Ok(())
    }

    fn show_booked(&mut self, patient_id: &str) -> MenuResult {
        let core = self.core;
        let directory = core.directory();
        let booked = core.appointments().list_booked(patient_id, &directory)?;
        if booked.is_empty() {
            self.say("No booked appointments.");
        }
        for entry in booked {
            let doctor = entry
                .doctor
                .map(|d| d.name)
                .unwrap_or_else(|| entry.appointment.doctor_id.clone());
            self.say(&format!("{}  with {}", format_slot(&entry.appointment), doctor));
        }
        Ok(())
    }

    fn show_history(&mut self, patient_id: &str) -> MenuResult {
        let history = self.core.appointments().history(patient_id)?;
        if history.is_empty() {
            self.say("No appointments yet.");
        }
        for appointment in history {
            self.say(&format_slot(&appointment));
        }
        Ok(())
    }

    fn show_schedule(&mut self, doctor_id: &str) -> MenuResult {
        let schedule = self.core.appointments().schedule(doctor_id)?;
        if schedule.is_empty() {
            self.say("No slots published.");
        }
        for slot in schedule {
            let patient = slot.patient_id.as_deref().unwrap_or("-").to_string();
            self.say(&format!("{}  patient {}", format_slot(&slot), patient));
        }
        Ok(())
    }

    fn add_slot(&mut self, doctor_id: &str) -> MenuResult {
        let Some(date) = self.prompt_parsed("Date (DD-MM-YYYY): ", |text| {
            NaiveDate::parse_from_str(text, DATE_FORMAT).ok()
        }) else {
            return Ok(());
        };
        let Some(time) = self.prompt_parsed("Time (HH:MM): ", |text| {
            NaiveTime::parse_from_str(text, TIME_FORMAT).ok()
        }) else {
            return Ok(());
        };

        let slot = self.core.appointments().add_slot(doctor_id, date, time)?;
        self.say(&format!("Published {}.", slot.id));
        Ok(())
    }

    fn accept_requests(&mut self, doctor_id: &str) -> MenuResult {
        let pending = self.core.appointments().list_pending(doctor_id)?;
        if pending.is_empty() {
            self.say("No pending requests.");
            return Ok(());
        }
        for (index, request) in pending.iter().enumerate() {
            self.say(&format!(
                "{}. {}  patient {}  \"{}\"",
                index + 1,
                format_slot(request),
                request.patient_id.as_deref().unwrap_or("-"),
                request.message
            ));
        }

        let Some(selection) =
            prompt_selection(self.input, self.output, "Request to accept: ", pending.len())
        else {
            return Ok(());
        };
        let accepted = self.core.appointments().accept_request(doctor_id, selection)?;
        self.say(&format!("Booked {}.", accepted.id));
        Ok(())
    }

    fn show_records(&mut self, patient_id: &str) -> MenuResult {
        let outcomes = self.core.outcomes().outcomes_for_patient(patient_id)?;
        if outcomes.is_empty() {
            self.say("No recorded outcomes.");
        }
        for outcome in outcomes {
            for line in format_outcome(&outcome) {
                self.say(&line);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Dispensing and inventory
    // =========================================================================

    fn show_awaiting(&mut self) -> MenuResult {
        let awaiting = self.core.dispenser().awaiting_dispense()?;
        if awaiting.is_empty() {
            self.say("Nothing to dispense.");
        }
        for outcome in awaiting {
            for line in format_outcome(&outcome) {
                self.say(&line);
            }
        }
        Ok(())
    }

    fn dispense(&mut self) -> MenuResult {
        let Some(appointment_id) = prompt_required(self.input, self.output, "Appointment ID: ")
        else {
            return Ok(());
        };
        let core = self.core;
        let dispenser = core.dispenser();
        let pending = dispenser.pending_prescriptions(&appointment_id)?;
        if pending.is_empty() {
            self.say("All prescriptions for this appointment are dispensed.");
            return Ok(());
        }

        let inventory = core.inventory();
        for (index, prescription) in pending.iter().enumerate() {
            let name = inventory
                .find_medicine(&prescription.medicine_id)?
                .map(|m| m.name)
                .unwrap_or_else(|| prescription.medicine_id.clone());
            self.say(&format!(
                "{}. {}  {} x{}",
                index + 1,
                prescription.id,
                name,
                prescription.quantity
            ));
        }

        let Some(selection) =
            prompt_selection(self.input, self.output, "Prescription to dispense: ", pending.len())
        else {
            return Ok(());
        };
        let dispensed = dispenser.dispense(&appointment_id, selection)?;
        self.say(&format!(
            "Dispensed {}. {} left in stock of {}.",
            dispensed.prescription.id, dispensed.medicine.stock_level, dispensed.medicine.name
        ));
        Ok(())
    }

    fn show_inventory(&mut self) -> MenuResult {
        let medicines = self.core.inventory().list_medicines()?;
        if medicines.is_empty() {
            self.say("No medicines on file.");
        }
        for summary in &medicines {
            self.say(&format_medicine(summary));
        }
        Ok(())
    }

    fn request_replenishment(&mut self) -> MenuResult {
        let low = self.core.inventory().low_stock_medicines()?;
        if low.is_empty() {
            self.say("No medicine is low on stock.");
            return Ok(());
        }
        for (index, medicine) in low.iter().enumerate() {
            self.say(&format!(
                "{}. {} {}  stock {} (threshold {})",
                index + 1,
                medicine.id,
                medicine.name,
                medicine.stock_level,
                medicine.low_stock_level
            ));
        }

        let Some(selection) = prompt_selection(self.input, self.output, "Medicine: ", low.len())
        else {
            return Ok(());
        };
        let Some(amount) = self.prompt_parsed("Amount to request: ", |text| {
            text.parse::<u32>().ok().filter(|amount| *amount > 0)
        }) else {
            return Ok(());
        };

        let medicine = &low[selection - 1];
        let request = self
            .core
            .inventory()
            .request_replenishment(&medicine.id, amount)?;
        self.say(&format!(
            "Requested {} more of {}.",
            request.requested_amount, request.medicine_name
        ));
        Ok(())
    }

    fn add_medicine(&mut self) -> MenuResult {
        let Some(name) = prompt_required(self.input, self.output, "Name: ") else {
            return Ok(());
        };
        let Some(description) = prompt_text(self.input, "Description: ") else {
            return Ok(());
        };
        let Some(medicine_type) = prompt_required(self.input, self.output, "Type: ") else {
            return Ok(());
        };
        let Some(stock_level) = self.prompt_count("Initial stock: ") else {
            return Ok(());
        };
        let Some(low_stock_level) = self.prompt_count("Low-stock threshold: ") else {
            return Ok(());
        };

        let medicine = self.core.inventory().add_medicine(NewMedicine {
            name,
            description,
            stock_level,
            low_stock_level,
            medicine_type,
        })?;
        self.say(&format!("Added {} as {}.", medicine.name, medicine.id));
        Ok(())
    }

    fn update_threshold(&mut self) -> MenuResult {
        let Some(medicine_id) = prompt_required(self.input, self.output, "Medicine ID: ") else {
            return Ok(());
        };
        let Some(level) = self.prompt_count("New low-stock threshold: ") else {
            return Ok(());
        };
        let medicine = self
            .core
            .inventory()
            .update_low_stock_level(&medicine_id, level)?;
        self.say(&format!(
            "{} now alerts at {} or fewer.",
            medicine.name, medicine.low_stock_level
        ));
        Ok(())
    }

    fn approve_replenishment(&mut self) -> MenuResult {
        let core = self.core;
        let inventory = core.inventory();
        let requests = inventory.outstanding_requests()?;
        if requests.is_empty() {
            self.say("No outstanding replenishment requests.");
            return Ok(());
        }
        let alerts = inventory.check_low_stock()?;
        for (index, request) in requests.iter().enumerate() {
            let low = alerts
                .iter()
                .any(|alert| alert.request.medicine_id == request.medicine_id);
            self.say(&format!(
                "{}. {} {}  +{}{}",
                index + 1,
                request.medicine_id,
                request.medicine_name,
                request.requested_amount,
                if low { "  (low stock)" } else { "" }
            ));
        }

        let Some(selection) =
            prompt_selection(self.input, self.output, "Request to approve: ", requests.len())
        else {
            return Ok(());
        };
        let medicine = inventory.approve_replenishment(&requests[selection - 1].medicine_id)?;
        self.say(&format!(
            "Approved. {} now has {} in stock.",
            medicine.name, medicine.stock_level
        ));
        Ok(())
    }

    // =========================================================================
    // Billing
    // =========================================================================

    fn show_bills(&mut self, filter: &BillFilter) -> MenuResult {
        let bills = self.core.billing().list(filter)?;
        if bills.is_empty() {
            self.say("No bills.");
        }
        for (index, bill) in bills.iter().enumerate() {
            let line = format!("{}. {}", index + 1, format_bill(bill));
            self.say(&line);
        }
        Ok(())
    }

    fn pay_bill(&mut self, patient_id: &str) -> MenuResult {
        let filter = BillFilter {
            status: Some(BillStatus::Billed),
            patient_id: Some(patient_id.to_string()),
        };
        let count = self.core.billing().list(&filter)?.len();
        if count == 0 {
            self.say("No bills awaiting payment.");
            return Ok(());
        }
        self.show_bills(&filter)?;

        let Some(selection) = prompt_selection(self.input, self.output, "Bill to pay: ", count)
        else {
            return Ok(());
        };
        let billing = self.core.billing();
        let bill = billing.select(&filter, selection)?;
        let paid = billing.pay(&bill.appointment_id)?;
        self.say(&format!("Paid {:.2} for {}.", paid.cost, paid.appointment_id));
        Ok(())
    }

    fn issue_bill(&mut self) -> MenuResult {
        let filter = BillFilter::with_status(BillStatus::Processing);
        let count = self.core.billing().list(&filter)?.len();
        if count == 0 {
            self.say("No bills in processing.");
            return Ok(());
        }
        self.show_bills(&filter)?;

        let Some(selection) = prompt_selection(self.input, self.output, "Bill to issue: ", count)
        else {
            return Ok(());
        };
        let Some(cost) = self.prompt_parsed("Cost: ", |text| {
            text.parse::<f64>()
                .ok()
                .filter(|cost| cost.is_finite() && *cost >= 0.0)
        }) else {
            return Ok(());
        };

        let billing = self.core.billing();
        let bill = billing.select(&filter, selection)?;
        let billed = billing.advance_to_billed(&bill.appointment_id, cost)?;
        self.say(&format!("Billed {:.2} for {}.", billed.cost, billed.appointment_id));
        Ok(())
    }

    fn export_statements(&mut self) -> MenuResult {
        let Some(format) = prompt_selection(self.input, self.output, "1. JSON  2. CSV: ", 2) else {
            return Ok(());
        };
        let directory = self.core.directory();
        let batch =
            StatementExporter::new(self.core.store(), &directory).export(&BillFilter::default())?;
        let text = if format == 1 {
            batch.to_json()?
        } else {
            batch.to_csv()
        };
        self.say(&text);
        Ok(())
    }

    fn show_journal(&mut self) -> MenuResult {
        let entries = self.core.incomplete_operations()?;
        if entries.is_empty() {
            self.say("No interrupted operations.");
        }
        for entry in entries {
            self.say(&format!(
                "{}  {}  {}  started {}",
                entry.tx_id, entry.operation, entry.subject, entry.started_at
            ));
        }
        Ok(())
    }

    // =========================================================================
    // Prompts
    // =========================================================================

    /// Re-ask until `parse` accepts the trimmed answer.
    fn prompt_parsed<T>(&mut self, prompt: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        loop {
            let text = prompt_text(self.input, prompt)?;
            match parse(&text) {
                Some(value) => return Some(value),
                None => self.say("Invalid value, try again."),
            }
        }
    }

    fn prompt_count(&mut self, prompt: &str) -> Option<u32> {
        self.prompt_parsed(prompt, |text| text.parse::<u32>().ok())
    }
}

fn format_slot(slot: &AppointmentRecord) -> String {
    format!(
        "{}  {}  {}  {}  {}",
        slot.id,
        slot.date.format(DATE_FORMAT),
        slot.time.format(TIME_FORMAT),
        slot.doctor_id,
        slot.status
    )
}

fn format_outcome(outcome: &OutcomeRecord) -> Vec<String> {
    let mut lines = vec![format!(
        "{}  {}  {}  by {}",
        outcome.appointment_id,
        outcome.date.format(DATE_FORMAT),
        outcome.service_type,
        outcome.doctor_id
    )];
    if outcome.medications.is_empty() {
        lines.push("    No medication".to_string());
    }
    for entry in &outcome.medications {
        lines.push(format!("    {}  {}", entry.name, entry.display_status()));
    }
    if !outcome.notes.is_empty() {
        lines.push(format!("    Notes: {}", outcome.notes));
    }
    lines
}

fn format_medicine(summary: &MedicineSummary) -> String {
    let medicine = &summary.medicine;
    format!(
        "{}  {}  {}  stock {} (threshold {})  {}{}",
        medicine.id,
        medicine.name,
        medicine.medicine_type,
        medicine.stock_level,
        medicine.low_stock_level,
        summary.status.label(),
        if summary.low_stock_alert { "  [ALERT]" } else { "" }
    )
}

fn format_bill(bill: &BillRecord) -> String {
    format!(
        "{}  {}  {}  {:.2}  {}",
        bill.appointment_id,
        bill.patient_id,
        bill.status,
        bill.cost,
        bill.created_at.format(TIMESTAMP_FORMAT)
    )
}
