use std::sync::Arc;
use std::time::Instant;

use secrecy::ExposeSecret;
use serde::Serialize;

use roomy_core::calendar::SlotWindow;
use roomy_core::config::{AppConfig, LoadOptions};
use roomy_core::engine::ReservationEngine;
use roomy_core::ledger::{Owner, ReservationLedger};

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config = match timed_check(|| AppConfig::load(LoadOptions::default())) {
        Ok((elapsed_ms, config)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            checks.push(skipped("chat_token_sanity"));
            checks.push(skipped("slot_generation"));
            checks.push(skipped("booking_round_trip"));
            return finalize_report(checks, started.elapsed().as_millis() as u64);
        }
    };

    let token_check_started = Instant::now();
    let app_ok = config.chat.app_token.expose_secret().starts_with("xapp-");
    let bot_ok = config.chat.bot_token.expose_secret().starts_with("xoxb-");
    checks.push(SmokeCheck {
        name: "chat_token_sanity",
        status: if app_ok && bot_ok { SmokeStatus::Pass } else { SmokeStatus::Fail },
        elapsed_ms: token_check_started.elapsed().as_millis() as u64,
        message: if app_ok && bot_ok {
            "token prefixes are valid".to_string()
        } else {
            "expected chat credentials with valid prefixes (app xapp-*, bot xoxb-*)".to_string()
        },
    });

    let generation_started = Instant::now();
    let window = SlotWindow::new(config.booking.start_hour, config.booking.end_hour);
    let slot_count = window.generate_slots().len();
    if slot_count == 0 {
        checks.push(SmokeCheck {
            name: "slot_generation",
            status: SmokeStatus::Fail,
            elapsed_ms: generation_started.elapsed().as_millis() as u64,
            message: format!(
                "window {:02}:00..{:02}:00 yields no bookable slots",
                config.booking.start_hour, config.booking.end_hour
            ),
        });
        checks.push(skipped("booking_round_trip"));
        return finalize_report(checks, started.elapsed().as_millis() as u64);
    }
    checks.push(SmokeCheck {
        name: "slot_generation",
        status: SmokeStatus::Pass,
        elapsed_ms: generation_started.elapsed().as_millis() as u64,
        message: format!("{slot_count} hourly slots generated per day"),
    });

    let round_trip_started = Instant::now();
    checks.push(match booking_round_trip(&config, window) {
        Ok(message) => SmokeCheck {
            name: "booking_round_trip",
            status: SmokeStatus::Pass,
            elapsed_ms: round_trip_started.elapsed().as_millis() as u64,
            message,
        },
        Err(message) => SmokeCheck {
            name: "booking_round_trip",
            status: SmokeStatus::Fail,
            elapsed_ms: round_trip_started.elapsed().as_millis() as u64,
            message,
        },
    });

    finalize_report(checks, started.elapsed().as_millis() as u64)
}

/// Exercises the whole claim path against a throwaway in-memory engine:
/// date selection, a winning claim, a conflicting claim, and availability
/// afterwards.
fn booking_round_trip(config: &AppConfig, window: SlotWindow) -> Result<String, String> {
    let ledger = Arc::new(ReservationLedger::new(window));
    let engine = ReservationEngine::with_system_clock(
        Arc::clone(&ledger),
        config.booking.booking_horizon_days,
    );

    let today =
        engine.upcoming_dates().first().copied().ok_or("horizon offers no dates".to_string())?;

    let slots = engine
        .choose_date("smoke-user-1", &today.to_string())
        .map_err(|error| format!("date selection failed: {error}"))?;
    let slot = slots.first().ok_or("fresh ledger offered no slots".to_string())?.to_string();

    engine
        .reserve("smoke-user-1", &slot, Owner("smoke-first".to_owned()))
        .map_err(|error| format!("first claim failed: {error}"))?;

    engine
        .choose_date("smoke-user-2", &today.to_string())
        .map_err(|error| format!("second date selection failed: {error}"))?;
    let conflict = engine.reserve("smoke-user-2", &slot, Owner("smoke-second".to_owned()));
    if !conflict.as_ref().is_err_and(|error| error.is_conflict()) {
        return Err("second identical claim should have conflicted".to_string());
    }

    if engine.available_slots(today).iter().any(|open| open.to_string() == slot) {
        return Err("claimed slot still listed as available".to_string());
    }

    Ok(format!("reserved {slot} on {today}, conflict detected, availability consistent"))
}

fn timed_check<T, E>(check: impl FnOnce() -> Result<T, E>) -> Result<(u64, T), (u64, E)> {
    let started = Instant::now();
    match check() {
        Ok(value) => Ok((started.elapsed().as_millis() as u64, value)),
        Err(error) => Err((started.elapsed().as_millis() as u64, error)),
    }
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult { exit_code: if failed { 6 } else { 0 }, output: format!("{human}\n{machine}") }
}
