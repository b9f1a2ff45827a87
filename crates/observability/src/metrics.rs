//! Prometheus-kompatible Metriken fuer Fluester
//!
//! Registrierte Metriken:
//! - `fluester_session_active` – Gauge: 1 solange eine Sitzung zugelassen ist
//! - `fluester_connections_admitted_total` – Counter: Zugelassene Verbindungen
//! - `fluester_connections_rejected_total` – Counter: Abgelehnte Verbindungen
//! - `fluester_messages_decrypted_total` – Counter: Entschluesselte Nachrichten
//! - `fluester_message_errors_total` – Counter: Fehler pro Nachricht (kind)

use anyhow::Result;
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use fluester_core::FehlerArt;

/// Alle Fluester-Prometheus-Metriken
///
/// Clone ist billig: alle Metriken teilen sich intern ihre Werte.
#[derive(Clone)]
pub struct FluesterMetriken {
    pub registry: Arc<Registry>,

    pub session_active: IntGauge,
    pub connections_admitted_total: IntCounter,
    pub connections_rejected_total: IntCounter,
    pub messages_decrypted_total: IntCounter,
    pub message_errors_total: IntCounterVec,
}

impl FluesterMetriken {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        let session_active = IntGauge::with_opts(Opts::new(
            "fluester_session_active",
            "1 wenn gerade eine Sitzung aktiv ist, sonst 0",
        ))?;
        registry.register(Box::new(session_active.clone()))?;

        let connections_admitted_total = IntCounter::with_opts(Opts::new(
            "fluester_connections_admitted_total",
            "Gesamtanzahl zugelassener Verbindungen",
        ))?;
        registry.register(Box::new(connections_admitted_total.clone()))?;

        let connections_rejected_total = IntCounter::with_opts(Opts::new(
            "fluester_connections_rejected_total",
            "Gesamtanzahl abgelehnter Verbindungen (Server belegt)",
        ))?;
        registry.register(Box::new(connections_rejected_total.clone()))?;

        let messages_decrypted_total = IntCounter::with_opts(Opts::new(
            "fluester_messages_decrypted_total",
            "Gesamtanzahl erfolgreich entschluesselter Nachrichten",
        ))?;
        registry.register(Box::new(messages_decrypted_total.clone()))?;

        let message_errors_total = IntCounterVec::new(
            Opts::new(
                "fluester_message_errors_total",
                "Fehlerhafte Nachrichten nach Fehlerart",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(message_errors_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            session_active,
            connections_admitted_total,
            connections_rejected_total,
            messages_decrypted_total,
            message_errors_total,
        })
    }

    /// Markiert die Sitzung als aktiv und zaehlt die Zulassung
    pub fn sitzung_zugelassen(&self) {
        self.connections_admitted_total.inc();
        self.session_active.set(1);
    }

    /// Markiert die Sitzung als beendet
    pub fn sitzung_beendet(&self) {
        self.session_active.set(0);
    }

    /// Zaehlt eine abgelehnte Verbindung
    pub fn verbindung_abgelehnt(&self) {
        self.connections_rejected_total.inc();
    }

    /// Zaehlt eine erfolgreich entschluesselte Nachricht
    pub fn nachricht_entschluesselt(&self) {
        self.messages_decrypted_total.inc();
    }

    /// Zaehlt einen Nachrichtenfehler mit der Fehlerart als Label
    pub fn fehler_zaehlen(&self, art: FehlerArt) {
        self.message_errors_total
            .with_label_values(&[art.as_str()])
            .inc();
    }

    /// Gibt true zurueck wenn gerade eine Sitzung aktiv ist
    pub fn ist_sitzung_aktiv(&self) -> bool {
        self.session_active.get() > 0
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: FluesterMetriken) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<FluesterMetriken>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
