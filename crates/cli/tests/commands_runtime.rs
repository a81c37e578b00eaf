use std::env;
use std::sync::{Mutex, OnceLock};

use roomy_cli::commands::{doctor, slots, smoke};
use serde_json::Value;

#[test]
fn smoke_returns_success_report_with_valid_env() {
    with_env(
        &[("ROOMY_CHAT_APP_TOKEN", "xapp-test"), ("ROOMY_CHAT_BOT_TOKEN", "xoxb-test")],
        || {
            let result = smoke::run();
            assert_eq!(result.exit_code, 0, "expected successful smoke report");

            let payload = parse_payload(last_line(&result.output));
            assert_eq!(payload["command"], "smoke");
            assert_eq!(payload["status"], "pass");

            let checks = payload["checks"].as_array().expect("checks array");
            assert!(checks
                .iter()
                .any(|check| check["name"] == "booking_round_trip" && check["status"] == "pass"));
        },
    );
}

#[test]
fn smoke_returns_failure_when_config_invalid() {
    with_env(&[], || {
        let result = smoke::run();
        assert_eq!(result.exit_code, 6, "expected smoke failure code");

        let payload = parse_payload(last_line(&result.output));
        assert_eq!(payload["command"], "smoke");
        assert_eq!(payload["status"], "fail");
    });
}

#[test]
fn smoke_fails_on_an_empty_slot_window() {
    with_env(
        &[
            ("ROOMY_CHAT_APP_TOKEN", "xapp-test"),
            ("ROOMY_CHAT_BOT_TOKEN", "xoxb-test"),
            ("ROOMY_BOOKING_START_HOUR", "18"),
            ("ROOMY_BOOKING_END_HOUR", "8"),
        ],
        || {
            let result = smoke::run();
            assert_eq!(result.exit_code, 6, "expected smoke failure code");

            let payload = parse_payload(last_line(&result.output));
            let checks = payload["checks"].as_array().expect("checks array");
            assert!(checks
                .iter()
                .any(|check| check["name"] == "slot_generation" && check["status"] == "fail"));
            assert!(checks
                .iter()
                .any(|check| check["name"] == "booking_round_trip" && check["status"] == "skipped"));
        },
    );
}

#[test]
fn slots_previews_the_configured_window_for_today() {
    with_env(
        &[("ROOMY_CHAT_APP_TOKEN", "xapp-test"), ("ROOMY_CHAT_BOT_TOKEN", "xoxb-test")],
        || {
            let result = slots::run(None);
            assert_eq!(result.exit_code, 0, "expected slot preview success");

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "slots");
            assert_eq!(payload["status"], "ok");

            let message = payload["message"].as_str().unwrap_or("");
            assert!(message.contains("10 bookable slots"));
            assert!(message.contains("08:00"));
            assert!(message.contains("17:00"));
        },
    );
}

#[test]
fn slots_rejects_past_and_malformed_dates() {
    with_env(
        &[("ROOMY_CHAT_APP_TOKEN", "xapp-test"), ("ROOMY_CHAT_BOT_TOKEN", "xoxb-test")],
        || {
            let past = slots::run(Some("2000-01-01"));
            assert_eq!(past.exit_code, 3, "expected past-date failure code");
            let payload = parse_payload(&past.output);
            assert_eq!(payload["error_class"], "invalid_date");

            let malformed = slots::run(Some("first of June"));
            assert_eq!(malformed.exit_code, 3, "expected malformed-date failure code");
            let payload = parse_payload(&malformed.output);
            assert_eq!(payload["error_class"], "invalid_date");
        },
    );
}

#[test]
fn doctor_emits_machine_readable_report() {
    with_env(
        &[("ROOMY_CHAT_APP_TOKEN", "xapp-test"), ("ROOMY_CHAT_BOT_TOKEN", "xoxb-test")],
        || {
            let output = doctor::run(true);
            let payload: Value =
                serde_json::from_str(&output).expect("doctor --json should emit valid JSON");

            assert_eq!(payload["overall_status"], "pass");
            let checks = payload["checks"].as_array().expect("checks array");
            assert!(checks.iter().any(|check| check["name"] == "slot_window_readiness"));
        },
    );
}

#[test]
fn doctor_reports_config_failure_without_tokens() {
    with_env(&[], || {
        let output = doctor::run(true);
        let payload: Value =
            serde_json::from_str(&output).expect("doctor --json should emit valid JSON");

        assert_eq!(payload["overall_status"], "fail");
        let checks = payload["checks"].as_array().expect("checks array");
        assert!(checks
            .iter()
            .any(|check| check["name"] == "config_validation" && check["status"] == "fail"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn last_line(output: &str) -> &str {
    output.lines().last().unwrap_or_default()
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "ROOMY_BOOKING_START_HOUR",
        "ROOMY_BOOKING_END_HOUR",
        "ROOMY_BOOKING_SLOT_MINUTES",
        "ROOMY_BOOKING_HORIZON_DAYS",
        "ROOMY_CHAT_APP_TOKEN",
        "ROOMY_CHAT_BOT_TOKEN",
        "ROOMY_CHAT_HOME_CHANNEL_ID",
        "ROOMY_CHAT_ADMIN_HANDLES",
        "ROOMY_SERVER_BIND_ADDRESS",
        "ROOMY_SERVER_HEALTH_CHECK_PORT",
        "ROOMY_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "ROOMY_LOGGING_LEVEL",
        "ROOMY_LOGGING_FORMAT",
        "ROOMY_LOG_LEVEL",
        "ROOMY_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
