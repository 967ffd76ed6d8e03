//! Console ports and the interactive flows that need more than one prompt.
//!
//! Input and output are passed in explicitly so the flows can be driven by
//! scripted input in tests. Entering `0` at any prompt cancels the flow
//! before anything is written.

use std::io::{self, BufRead, Write};

use tracing::warn;

use crate::models::{parse_prescription_orders, OutcomeDraft, PrescriptionOrder};
use crate::store::{RecordStore, DATE_FORMAT, TIME_FORMAT};
use crate::workflow::{Appointments, Inventory, OutcomeRecorder, RecordedOutcome, WorkflowResult};

/// Input that cancels the current flow.
pub const ABORT_INPUT: &str = "0";

/// Source of operator input.
pub trait InputPort {
    /// Show `prompt` and read one line, without the trailing newline.
    /// `None` means input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Option<String>;
}

/// Sink for text shown to the operator.
pub trait OutputPort {
    fn show(&mut self, text: &str);
}

/// Stdin/stdout console.
#[derive(Debug, Default)]
pub struct StdConsole;

impl InputPort for StdConsole {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        let mut stdout = io::stdout();
        if write!(stdout, "{}", prompt).and_then(|_| stdout.flush()).is_err() {
            return None;
        }

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()),
            Err(e) => {
                warn!(error = %e, "failed to read from stdin");
                None
            }
        }
    }
}

impl OutputPort for StdConsole {
    fn show(&mut self, text: &str) {
        println!("{}", text);
    }
}

fn is_abort(line: &str) -> bool {
    line.trim() == ABORT_INPUT
}

/// Ask for a 1-based choice out of `count`, retrying until one is valid.
///
/// Returns `None` on `0` or end of input.
pub fn prompt_selection(
    input: &mut dyn InputPort,
    output: &mut dyn OutputPort,
    prompt: &str,
    count: usize,
) -> Option<usize> {
    loop {
        let line = input.read_line(prompt)?;
        if is_abort(&line) {
            return None;
        }
        match line.trim().parse::<usize>() {
            Ok(choice) if (1..=count).contains(&choice) => return Some(choice),
            _ => output.show(&format!(
                "Invalid choice. Enter a number from 1 to {}, or {} to cancel.",
                count, ABORT_INPUT
            )),
        }
    }
}

/// Ask for free text, trimmed. Returns `None` on `0` or end of input.
pub fn prompt_text(input: &mut dyn InputPort, prompt: &str) -> Option<String> {
    let line = input.read_line(prompt)?;
    if is_abort(&line) {
        return None;
    }
    Some(line.trim().to_string())
}

/// Ask for non-empty text, retrying on blank input.
pub fn prompt_required(
    input: &mut dyn InputPort,
    output: &mut dyn OutputPort,
    prompt: &str,
) -> Option<String> {
    loop {
        let text = prompt_text(input, prompt)?;
        if !text.is_empty() {
            return Some(text);
        }
        output.show("This field cannot be empty.");
    }
}

/// Interactive outcome recording for `doctor_id`.
///
/// Lists the doctor's booked appointments, then asks for the appointment id,
/// service type, prescriptions (`MD00001,3;MD00002,1` or `-`) and notes.
/// Invalid answers are re-asked. Returns `Ok(None)` if the doctor cancels or
/// has nothing to record.
pub fn record_outcome(
    store: &RecordStore,
    doctor_id: &str,
    input: &mut dyn InputPort,
    output: &mut dyn OutputPort,
) -> WorkflowResult<Option<RecordedOutcome>> {
    let booked = Appointments::new(store).list_booked_for_doctor(doctor_id)?;
    if booked.is_empty() {
        output.show("No booked appointments to record an outcome for.");
        return Ok(None);
    }

    output.show("Booked appointments:");
    for appointment in &booked {
        output.show(&format!(
            "  {}  {}  {}  patient {}",
            appointment.id,
            appointment.date.format(DATE_FORMAT),
            appointment.time.format(TIME_FORMAT),
            appointment.patient_id.as_deref().unwrap_or("-"),
        ));
    }

    let appointment_id = loop {
        let Some(line) = prompt_text(input, "Appointment ID (0 to cancel): ") else {
            return Ok(None);
        };
        match booked.iter().find(|a| a.id.eq_ignore_ascii_case(&line)) {
            Some(appointment) => break appointment.id.clone(),
            None => output.show("Invalid appointment ID. Choose one from the list."),
        }
    };

    let Some(service_type) = prompt_required(input, output, "Service type: ") else {
        return Ok(None);
    };
    let Some(prescriptions) = prompt_prescriptions(store, input, output)? else {
        return Ok(None);
    };
    let Some(notes) = prompt_text(input, "Consultation notes: ") else {
        return Ok(None);
    };

    let draft = OutcomeDraft {
        appointment_id,
        service_type,
        prescriptions,
        notes,
    };
    let recorded = OutcomeRecorder::new(store).create_outcome(doctor_id, draft)?;
    output.show(&format!(
        "Outcome recorded for {} with {} prescription(s).",
        recorded.outcome.appointment_id,
        recorded.prescriptions.len()
    ));
    Ok(Some(recorded))
}

/// Ask for prescription orders until they parse and name known medicines.
fn prompt_prescriptions(
    store: &RecordStore,
    input: &mut dyn InputPort,
    output: &mut dyn OutputPort,
) -> WorkflowResult<Option<Vec<PrescriptionOrder>>> {
    let inventory = Inventory::new(store);
    'prompt: loop {
        let Some(text) = prompt_text(input, "Prescriptions (MEDICINE_ID,QUANTITY;... or -): ")
        else {
            return Ok(None);
        };

        let orders = match parse_prescription_orders(&text) {
            Ok(orders) => orders,
            Err(e) => {
                output.show(&format!("Invalid prescriptions: {}", e));
                continue;
            }
        };
        for order in &orders {
            if inventory.find_medicine(&order.medicine_id)?.is_none() {
                output.show(&format!("Unknown medicine {}.", order.medicine_id));
                continue 'prompt;
            }
        }
        return Ok(Some(orders));
    }
}
