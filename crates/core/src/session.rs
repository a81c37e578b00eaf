use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;

/// Where one user's booking conversation currently stands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    DateSelected(NaiveDate),
}

/// Per-user session state, keyed by user identity. A shared mutable
/// "current date" field would let concurrent users overwrite each other's
/// selections; the map keyed by user id is the correctness requirement,
/// not an optimization.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, HashMap<String, SessionState>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn state(&self, user_id: &str) -> SessionState {
        self.guard().get(user_id).copied().unwrap_or_default()
    }

    pub fn select_date(&self, user_id: &str, date: NaiveDate) {
        self.guard().insert(user_id.to_owned(), SessionState::DateSelected(date));
    }

    /// Consumes the user's selected date, resetting the session to idle.
    /// A claim attempt always spends the date context, whatever its outcome.
    pub fn take_selected_date(&self, user_id: &str) -> Option<NaiveDate> {
        match self.guard().remove(user_id) {
            Some(SessionState::DateSelected(date)) => Some(date),
            Some(SessionState::Idle) | None => None,
        }
    }

    pub fn clear(&self, user_id: &str) {
        self.guard().remove(user_id);
    }
}
