//! Health-Check-Endpunkt fuer Fluester
//!
//! Endpoint: `GET /health`
//! Response: JSON mit Status, Version, Uptime und ob eine Sitzung aktiv ist

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::FluesterMetriken;

/// Status des Health-Checks
///
/// Solange der Prozess antwortet, ist er gesund. Ob gerade eine Sitzung
/// laeuft, steht separat in `session_active`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
}

/// Antwort des Health-Check-Endpunkts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub session_active: bool,
}

/// Geteilter Zustand fuer den Health-Check-Handler
#[derive(Clone)]
pub struct HealthState {
    pub start_time: Arc<Instant>,
    pub metriken: FluesterMetriken,
}

impl HealthState {
    pub fn neu(metriken: FluesterMetriken) -> Self {
        Self {
            start_time: Arc::new(Instant::now()),
            metriken,
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Baut die aktuelle Health-Antwort
    pub fn antwort(&self) -> HealthResponse {
        HealthResponse {
            status: HealthStatus::Healthy,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.uptime_seconds(),
            session_active: self.metriken.ist_sitzung_aktiv(),
        }
    }
}

/// Axum-Router fuer den `/health`-Endpunkt
pub fn health_router(metriken: FluesterMetriken) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(HealthState::neu(metriken))
}

/// `GET /health` – gibt den Serverstatus zurueck
async fn health_handler(State(state): State<HealthState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.antwort()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> HealthState {
        HealthState::neu(FluesterMetriken::neu().unwrap())
    }

    #[test]
    fn health_state_frisch_erstellt() {
        let state = state();
        assert!(state.uptime_seconds() < 5);
        let antwort = state.antwort();
        assert_eq!(antwort.status, HealthStatus::Healthy);
        assert!(!antwort.session_active);
    }

    #[test]
    fn session_active_folgt_metrik() {
        let state = state();
        state.metriken.sitzung_zugelassen();
        assert!(state.antwort().session_active);
        state.metriken.sitzung_beendet();
        assert!(!state.antwort().session_active);
    }

    #[test]
    fn health_response_serialisierung() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "0.1.0".to_string(),
            uptime_seconds: 3600,
            session_active: true,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"version\":\"0.1.0\""));
        assert!(json.contains("\"uptime_seconds\":3600"));
        assert!(json.contains("\"session_active\":true"));
    }

    #[test]
    fn health_response_deserialisierung() {
        let json =
            r#"{"status":"healthy","version":"0.1.0","uptime_seconds":100,"session_active":false}"#;
        let response: HealthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.status, HealthStatus::Healthy);
        assert_eq!(response.uptime_seconds, 100);
        assert!(!response.session_active);
    }
}
