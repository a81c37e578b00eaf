use std::sync::Arc;

use roomy_core::calendar::{self, SlotWindow};
use roomy_core::config::{AppConfig, LoadOptions};
use roomy_core::engine::{Clock, SystemClock};
use roomy_core::ledger::ReservationLedger;

use crate::commands::CommandResult;

/// Previews the bookable slots for a date under the configured window.
/// The preview runs against a fresh ledger, so it shows the full window;
/// live occupancy only exists inside a running server process.
pub fn run(date: Option<&str>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("slots", "config_validation", error.to_string(), 2)
        }
    };

    let now = SystemClock.now();
    let date = match date {
        Some(raw) => match calendar::parse_date(raw) {
            Ok(date) => date,
            Err(error) => {
                return CommandResult::failure("slots", "invalid_date", error.to_string(), 3)
            }
        },
        None => now.date_naive(),
    };

    if !calendar::is_future_or_today(date, now) {
        return CommandResult::failure(
            "slots",
            "invalid_date",
            format!("{date} is in the past and cannot be booked"),
            3,
        );
    }

    let window = SlotWindow::new(config.booking.start_hour, config.booking.end_hour);
    let ledger = Arc::new(ReservationLedger::new(window));
    let slots = ledger.available_slots(date);

    if slots.is_empty() {
        return CommandResult::success(
            "slots",
            format!("no bookable slots on {date}; the configured window is empty"),
        );
    }

    let labels: Vec<String> = slots.iter().map(ToString::to_string).collect();
    CommandResult::success(
        "slots",
        format!("{} bookable slots on {date}: {}", labels.len(), labels.join(", ")),
    )
}
