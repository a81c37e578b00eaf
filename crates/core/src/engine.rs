use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::calendar::{self, Slot};
use crate::errors::ReservationError;
use crate::ledger::{Owner, Reservation, ReservationLedger};
use crate::session::SessionStore;

/// Wall-clock seam for future-date validation. Tests pin the reference
/// time with a fixed implementation.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Orchestrates the per-user booking flow: idle until a date passes
/// validation, then a single claim attempt that ends the session either
/// with a reservation or a conflict. No automatic retries; a failed claim
/// sends the user back to date selection.
pub struct ReservationEngine<C = SystemClock> {
    ledger: Arc<ReservationLedger>,
    sessions: SessionStore,
    horizon_days: u32,
    clock: C,
}

impl ReservationEngine<SystemClock> {
    pub fn with_system_clock(ledger: Arc<ReservationLedger>, horizon_days: u32) -> Self {
        Self::new(ledger, horizon_days, SystemClock)
    }
}

impl<C> ReservationEngine<C>
where
    C: Clock,
{
    pub fn new(ledger: Arc<ReservationLedger>, horizon_days: u32, clock: C) -> Self {
        Self { ledger, sessions: SessionStore::new(), horizon_days, clock }
    }

    pub fn ledger(&self) -> &ReservationLedger {
        &self.ledger
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    /// Dates offerable for booking: today through the configured horizon.
    /// The front end paginates; the engine never truncates.
    pub fn upcoming_dates(&self) -> Vec<NaiveDate> {
        calendar::upcoming_dates(self.clock.now(), self.horizon_days)
    }

    pub fn available_slots(&self, date: NaiveDate) -> Vec<Slot> {
        self.ledger.available_slots(date)
    }

    /// Idle -> DateSelected. Returns the slots available at selection time
    /// for the front end to render. The session is only advanced on
    /// success; every rejection leaves it untouched.
    pub fn choose_date(
        &self,
        user_id: &str,
        raw_date: &str,
    ) -> Result<Vec<Slot>, ReservationError> {
        let date = calendar::parse_date(raw_date)?;
        let now = self.clock.now();

        if !calendar::is_future_or_today(date, now) {
            return Err(ReservationError::DateInPast { date });
        }
        let last_offered =
            now.date_naive().checked_add_days(Days::new(u64::from(self.horizon_days)));
        if last_offered.is_some_and(|last| date > last) {
            return Err(ReservationError::DateBeyondHorizon {
                date,
                horizon_days: self.horizon_days,
            });
        }

        let slots = self.ledger.available_slots(date);
        if slots.is_empty() {
            return Err(ReservationError::NoSlotsAvailable { date });
        }

        self.sessions.select_date(user_id, date);
        Ok(slots)
    }

    /// DateSelected -> terminal. The date context is spent by the attempt
    /// whatever its outcome, so the next interaction restarts at date
    /// selection. Slot membership is not re-checked here; a slot taken
    /// between render and click surfaces as the store's conflict.
    pub fn reserve(
        &self,
        user_id: &str,
        raw_slot: &str,
        owner: Owner,
    ) -> Result<Reservation, ReservationError> {
        let Some(date) = self.sessions.take_selected_date(user_id) else {
            return Err(ReservationError::MissingDateContext);
        };

        let slot = raw_slot.parse::<Slot>()?;
        self.ledger.try_reserve(date, slot, owner)
    }

    pub fn list_all(&self) -> Vec<Reservation> {
        self.ledger.list_all()
    }

    pub fn list_for_owner(&self, owner: &Owner) -> Vec<(NaiveDate, Slot)> {
        self.ledger.list_for_owner(owner)
    }

    pub fn choose_date_with_audit<S>(
        &self,
        user_id: &str,
        raw_date: &str,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<Vec<Slot>, ReservationError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.choose_date(user_id, raw_date);
        match &result {
            Ok(slots) => {
                sink.emit(
                    AuditEvent::new(
                        audit.user_id.clone(),
                        audit.correlation_id.clone(),
                        "booking.date_selected",
                        AuditCategory::Session,
                        audit.actor.clone(),
                        AuditOutcome::Success,
                    )
                    .with_metadata("date", raw_date.trim())
                    .with_metadata("available_slots", slots.len().to_string()),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit.user_id.clone(),
                        audit.correlation_id.clone(),
                        "booking.date_rejected",
                        AuditCategory::Session,
                        audit.actor.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("date", raw_date.trim())
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }

    pub fn reserve_with_audit<S>(
        &self,
        user_id: &str,
        raw_slot: &str,
        owner: Owner,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<Reservation, ReservationError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.reserve(user_id, raw_slot, owner);
        match &result {
            Ok(reservation) => {
                sink.emit(
                    AuditEvent::new(
                        audit.user_id.clone(),
                        audit.correlation_id.clone(),
                        "booking.slot_reserved",
                        AuditCategory::Reservation,
                        audit.actor.clone(),
                        AuditOutcome::Success,
                    )
                    .with_metadata("date", reservation.date.to_string())
                    .with_metadata("slot", reservation.slot.to_string())
                    .with_metadata("owner", reservation.owner.to_string()),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit.user_id.clone(),
                        audit.correlation_id.clone(),
                        "booking.slot_rejected",
                        AuditCategory::Reservation,
                        audit.actor.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("slot", raw_slot.trim())
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}
