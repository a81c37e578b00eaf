use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;

use crate::calendar::{Slot, SlotWindow};
use crate::errors::ReservationError;

/// The identity a reservation is held under: a chat handle, or a display
/// name when no handle exists.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Owner(pub String);

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reservation {
    pub date: NaiveDate,
    pub slot: Slot,
    pub owner: Owner,
}

type Bookings = BTreeMap<NaiveDate, BTreeMap<Slot, Owner>>;

/// Sole owner of reservation state for the process lifetime. All access
/// goes through one lock; the `try_reserve` check-then-insert is a single
/// critical section, so racing claimants for the same (date, slot) resolve
/// to exactly one winner.
///
/// Invariant: every slot key present in the map is a member of the window's
/// generated slot set.
#[derive(Debug)]
pub struct ReservationLedger {
    window: SlotWindow,
    bookings: Mutex<Bookings>,
}

impl ReservationLedger {
    pub fn new(window: SlotWindow) -> Self {
        Self { window, bookings: Mutex::new(Bookings::new()) }
    }

    pub fn window(&self) -> SlotWindow {
        self.window
    }

    fn guard(&self) -> MutexGuard<'_, Bookings> {
        match self.bookings.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// The window's full slot list minus slots already taken on `date`,
    /// ascending order preserved.
    pub fn available_slots(&self, date: NaiveDate) -> Vec<Slot> {
        let bookings = self.guard();
        let taken = bookings.get(&date);
        self.window
            .generate_slots()
            .into_iter()
            .filter(|slot| taken.map_or(true, |by_slot| !by_slot.contains_key(slot)))
            .collect()
    }

    /// Atomic claim: insert and return the reservation when the slot is
    /// free, report the holding owner when it is not. Out-of-window slots
    /// are rejected before any mutation.
    pub fn try_reserve(
        &self,
        date: NaiveDate,
        slot: Slot,
        owner: Owner,
    ) -> Result<Reservation, ReservationError> {
        if !self.window.contains(slot) {
            return Err(ReservationError::SlotOutOfWindow { slot });
        }

        let mut bookings = self.guard();
        let by_slot = bookings.entry(date).or_default();
        match by_slot.get(&slot) {
            Some(holder) => {
                Err(ReservationError::SlotTaken { date, slot, owner: holder.clone() })
            }
            None => {
                by_slot.insert(slot, owner.clone());
                Ok(Reservation { date, slot, owner })
            }
        }
    }

    /// Every reservation, sorted by date then slot.
    pub fn list_all(&self) -> Vec<Reservation> {
        self.guard()
            .iter()
            .flat_map(|(date, by_slot)| {
                by_slot.iter().map(|(slot, owner)| Reservation {
                    date: *date,
                    slot: *slot,
                    owner: owner.clone(),
                })
            })
            .collect()
    }

    pub fn list_for_owner(&self, owner: &Owner) -> Vec<(NaiveDate, Slot)> {
        self.guard()
            .iter()
            .flat_map(|(date, by_slot)| {
                by_slot
                    .iter()
                    .filter(|(_, holder)| *holder == owner)
                    .map(|(slot, _)| (*date, *slot))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn reservation_count(&self) -> usize {
        self.guard().values().map(BTreeMap::len).sum()
    }
}
