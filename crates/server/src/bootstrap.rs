use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use roomy_chat::events::{BlockActionHandler, ChannelGate, EventDispatcher, SlashCommandHandler};
use roomy_chat::service::BookingService;
use roomy_chat::socket::{NoopSocketTransport, ReconnectPolicy, SocketModeRunner};
use roomy_core::audit::{AuditEvent, AuditSink};
use roomy_core::calendar::SlotWindow;
use roomy_core::config::{AppConfig, ConfigError, LoadOptions};
use roomy_core::engine::{ReservationEngine, SystemClock};
use roomy_core::ledger::ReservationLedger;

pub struct Application {
    pub config: AppConfig,
    pub ledger: Arc<ReservationLedger>,
    pub engine: Arc<ReservationEngine<SystemClock>>,
    pub chat_runner: SocketModeRunner,
}

/// Audit events go to the structured log; the in-memory ledger is the only
/// booking state this process holds.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        info!(
            event_name = %event.event_type,
            correlation_id = %event.correlation_id,
            user_id = event.user_id.as_deref().unwrap_or("unknown"),
            actor = %event.actor,
            outcome = ?event.outcome,
            metadata = ?event.metadata,
            "audit event"
        );
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let window = SlotWindow::new(config.booking.start_hour, config.booking.end_hour);
    let ledger = Arc::new(ReservationLedger::new(window));
    let engine = Arc::new(ReservationEngine::with_system_clock(
        Arc::clone(&ledger),
        config.booking.booking_horizon_days,
    ));
    info!(
        event_name = "system.bootstrap.engine_ready",
        correlation_id = "bootstrap",
        start_hour = config.booking.start_hour,
        end_hour = config.booking.end_hour,
        horizon_days = config.booking.booking_horizon_days,
        "reservation engine constructed"
    );

    let gate = ChannelGate::new(config.chat.home_channel_id.clone());
    let service = Arc::new(BookingService::new(
        Arc::clone(&engine),
        config.chat.clone(),
        Arc::new(TracingAuditSink),
    ));

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(SlashCommandHandler::new(Arc::clone(&service), gate.clone()));
    dispatcher.register(BlockActionHandler::new(service, gate));
    info!(
        event_name = "system.bootstrap.dispatcher_ready",
        correlation_id = "bootstrap",
        handlers = dispatcher.handler_count(),
        "event dispatcher wired"
    );

    let chat_runner = SocketModeRunner::new(
        Arc::new(NoopSocketTransport),
        dispatcher,
        ReconnectPolicy::default(),
    );

    Ok(Application { config, ledger, engine, chat_runner })
}

#[cfg(test)]
mod tests {
    use roomy_core::config::{ConfigOverrides, LoadOptions};
    use roomy_core::ledger::Owner;

    use crate::bootstrap::bootstrap;

    fn valid_overrides() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                chat_app_token: Some("xapp-test".to_string()),
                chat_bot_token: Some("xoxb-test".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[test]
    fn bootstrap_fails_fast_without_required_chat_tokens() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                chat_app_token: Some("invalid-token".to_string()),
                chat_bot_token: Some("xoxb-valid".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("chat.app_token"));
    }

    #[test]
    fn integration_smoke_covers_startup_and_one_booking_round_trip() {
        let app = bootstrap(valid_overrides()).expect("bootstrap should succeed");

        let window = app.ledger.window();
        assert_eq!(window.generate_slots().len(), 10, "default window is 08:00..18:00");

        let dates = app.engine.upcoming_dates();
        assert_eq!(dates.len(), 31, "default horizon offers today plus thirty days");

        let today = dates.first().copied().expect("today is offerable");
        let slots = app
            .engine
            .choose_date("U-smoke", &today.to_string())
            .expect("today passes validation");
        let first_slot = slots.first().expect("fresh ledger has open slots").to_string();

        let reservation = app
            .engine
            .reserve("U-smoke", &first_slot, Owner("smoke-test".to_owned()))
            .expect("first claim on a fresh ledger succeeds");
        assert_eq!(reservation.date, today);
        assert_eq!(app.ledger.reservation_count(), 1);
    }
}
