//! Domain models for the hospital operations core.

mod account;
mod appointment;
mod bill;
mod medicine;
mod outcome;
mod prescription;

pub use account::*;
pub use appointment::*;
pub use bill::*;
pub use medicine::*;
pub use outcome::*;
pub use prescription::*;

use thiserror::Error;

/// A status change that skips a step or goes backwards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{entity} {key} cannot move from {from} to {to}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub key: String,
    pub from: &'static str,
    pub to: &'static str,
}

/// Upper-case the first letter of each word and lower-case the rest.
///
/// `PENDING` → `Pending`, `not yet dispensed` → `Not Yet Dispensed`.
pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
