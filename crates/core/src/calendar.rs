use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::errors::ReservationError;

/// An hourly booking slot, rendered canonically as `HH:00`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(pub u8);

impl Slot {
    pub fn hour(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

impl FromStr for Slot {
    type Err = ReservationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ReservationError::InvalidSlotFormat { input: value.to_owned() };

        let trimmed = value.trim();
        let (hour, minute) = trimmed.split_once(':').ok_or_else(invalid)?;
        if hour.len() != 2 || minute != "00" {
            return Err(invalid());
        }
        let hour = hour.parse::<u8>().map_err(|_| invalid())?;
        if hour >= 24 {
            return Err(invalid());
        }

        Ok(Self(hour))
    }
}

/// The bookable working-hours window, `[start_hour, end_hour)` at fixed
/// one-hour granularity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotWindow {
    start_hour: u8,
    end_hour: u8,
}

impl SlotWindow {
    pub fn new(start_hour: u8, end_hour: u8) -> Self {
        Self { start_hour, end_hour }
    }

    pub fn start_hour(&self) -> u8 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u8 {
        self.end_hour
    }

    /// One slot per integer hour in `[start_hour, end_hour)`, ascending.
    /// An inverted or empty window yields an empty sequence; presenting
    /// "no slots" is the front end's job.
    pub fn generate_slots(&self) -> Vec<Slot> {
        (self.start_hour..self.end_hour).map(Slot).collect()
    }

    pub fn contains(&self, slot: Slot) -> bool {
        (self.start_hour..self.end_hour).contains(&slot.0)
    }
}

/// Strict `YYYY-MM-DD` parsing; the input must denote a real calendar date.
pub fn parse_date(input: &str) -> Result<NaiveDate, ReservationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|_| ReservationError::InvalidDateFormat { input: input.to_owned() })
}

/// A date is bookable iff its day is on or after the reference day.
/// Today itself is bookable.
pub fn is_future_or_today(date: NaiveDate, reference_now: DateTime<Utc>) -> bool {
    date >= reference_now.date_naive()
}

/// The offerable date range: today through today plus `horizon_days`,
/// ascending. A horizon of zero offers only today.
pub fn upcoming_dates(reference_now: DateTime<Utc>, horizon_days: u32) -> Vec<NaiveDate> {
    let today = reference_now.date_naive();
    (0..=u64::from(horizon_days))
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .collect()
}
