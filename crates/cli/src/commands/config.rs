use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use roomy_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let booking_fields = [
        ("booking.start_hour", config.booking.start_hour.to_string(), "ROOMY_BOOKING_START_HOUR"),
        ("booking.end_hour", config.booking.end_hour.to_string(), "ROOMY_BOOKING_END_HOUR"),
        (
            "booking.slot_minutes",
            config.booking.slot_minutes.to_string(),
            "ROOMY_BOOKING_SLOT_MINUTES",
        ),
        (
            "booking.booking_horizon_days",
            config.booking.booking_horizon_days.to_string(),
            "ROOMY_BOOKING_HORIZON_DAYS",
        ),
    ];
    for (key, value, env_key) in booking_fields {
        lines.push(render_line(
            key,
            &value,
            field_source(key, Some(env_key), config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    }

    let app_token = redact_token(config.chat.app_token.expose_secret());
    let bot_token = redact_token(config.chat.bot_token.expose_secret());
    lines.push(render_line(
        "chat.app_token",
        &app_token,
        field_source(
            "chat.app_token",
            Some("ROOMY_CHAT_APP_TOKEN"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "chat.bot_token",
        &bot_token,
        field_source(
            "chat.bot_token",
            Some("ROOMY_CHAT_BOT_TOKEN"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    let home_channel = if config.chat.home_channel_id.is_empty() {
        "<unset>".to_string()
    } else {
        config.chat.home_channel_id.clone()
    };
    lines.push(render_line(
        "chat.home_channel_id",
        &home_channel,
        field_source(
            "chat.home_channel_id",
            Some("ROOMY_CHAT_HOME_CHANNEL_ID"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "chat.admin_handles",
        &format!("{} configured", config.chat.admin_handles.len()),
        field_source(
            "chat.admin_handles",
            Some("ROOMY_CHAT_ADMIN_HANDLES"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        field_source(
            "server.bind_address",
            Some("ROOMY_SERVER_BIND_ADDRESS"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "server.health_check_port",
        &config.server.health_check_port.to_string(),
        field_source(
            "server.health_check_port",
            Some("ROOMY_SERVER_HEALTH_CHECK_PORT"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source(
            "logging.level",
            Some("ROOMY_LOGGING_LEVEL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        field_source(
            "logging.format",
            Some("ROOMY_LOGGING_FORMAT"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("roomy.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/roomy.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
