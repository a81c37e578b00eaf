use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use roomy_core::ledger::ReservationLedger;
use serde::Serialize;
use tracing::{error, info};

#[derive(Clone)]
pub struct HealthState {
    ledger: Arc<ReservationLedger>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub ledger: HealthCheck,
    pub checked_at: String,
}

pub fn router(ledger: Arc<ReservationLedger>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { ledger })
}

pub async fn spawn(
    bind_address: &str,
    port: u16,
    ledger: Arc<ReservationLedger>,
) -> std::io::Result<()> {
    let address = format!("{bind_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&address).await?;

    info!(
        event_name = "system.health.start",
        correlation_id = "bootstrap",
        bind_address = %address,
        "health endpoint started"
    );

    tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, router(ledger)).await {
            error!(
                event_name = "system.health.error",
                correlation_id = "bootstrap",
                error = %error,
                "health endpoint server terminated unexpectedly"
            );
        }
    });

    Ok(())
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let ledger = ledger_check(&state.ledger);
    let ready = ledger.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "roomy-server runtime initialized".to_string(),
        },
        ledger,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn ledger_check(ledger: &ReservationLedger) -> HealthCheck {
    let slots_per_day = ledger.window().generate_slots().len();
    if slots_per_day == 0 {
        return HealthCheck {
            status: "degraded",
            detail: "slot window is empty; no bookable slots per day".to_string(),
        };
    }

    HealthCheck {
        status: "ready",
        detail: format!(
            "{} reservations held; {slots_per_day} bookable slots per day",
            ledger.reservation_count()
        ),
    }
}
