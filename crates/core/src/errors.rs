use chrono::NaiveDate;
use thiserror::Error;

use crate::calendar::Slot;
use crate::ledger::Owner;

/// Booking failures surfaced to the conversational front end. Every variant
/// is terminal for the current step: nothing is retried automatically and
/// none of them crash the process.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReservationError {
    #[error("`{input}` is not a valid calendar date (expected YYYY-MM-DD)")]
    InvalidDateFormat { input: String },
    #[error("{date} is before today and cannot be booked")]
    DateInPast { date: NaiveDate },
    #[error("{date} is more than {horizon_days} days ahead")]
    DateBeyondHorizon { date: NaiveDate, horizon_days: u32 },
    #[error("no date selected in this booking session")]
    MissingDateContext,
    #[error("`{input}` is not a valid slot (expected HH:00)")]
    InvalidSlotFormat { input: String },
    #[error("slot {slot} is outside the bookable window")]
    SlotOutOfWindow { slot: Slot },
    #[error("slot {slot} on {date} is already reserved by {owner}")]
    SlotTaken { date: NaiveDate, slot: Slot, owner: Owner },
    #[error("no slots are available on {date}")]
    NoSlotsAvailable { date: NaiveDate },
}

impl ReservationError {
    /// User-safe rendering. The conflict message deliberately omits the
    /// holding owner; only the already-booked fact is shown.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidDateFormat { .. } => {
                "That is not a valid date. Pick one of the offered dates.".to_owned()
            }
            Self::DateInPast { date } => {
                format!("{date} is in the past. Pick today or a later date.")
            }
            Self::DateBeyondHorizon { date, horizon_days } => {
                format!("{date} is beyond the booking horizon of {horizon_days} days.")
            }
            Self::MissingDateContext => {
                "No date selected yet. Start a new booking and pick a date first.".to_owned()
            }
            Self::InvalidSlotFormat { .. } => {
                "That is not a valid slot. Pick one of the offered times.".to_owned()
            }
            Self::SlotOutOfWindow { slot } => {
                format!("{slot} is outside bookable hours.")
            }
            Self::SlotTaken { date, slot, .. } => {
                format!("{slot} on {date} is already booked.")
            }
            Self::NoSlotsAvailable { date } => {
                format!("No free slots remain on {date}.")
            }
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::SlotTaken { .. })
    }
}
