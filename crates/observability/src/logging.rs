//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Konfigurationsdatei, ueberschreibbar per Umgebung:
//! - `FL_LOG_LEVEL`: Filter-Direktive (z.B. `debug` oder `fluester_session=trace`)
//! - `FL_LOG_FORMAT`: Format (`text`/`json`)
//!
//! Verbindungs-IDs werden als strukturierte Felder (`verbindung`) geloggt.

use std::str::FromStr;

use tracing_subscriber::{fmt, EnvFilter};

/// Umgebungsvariable fuer den Log-Filter
pub const ENV_LOG_LEVEL: &str = "FL_LOG_LEVEL";

/// Umgebungsvariable fuer das Log-Format
pub const ENV_LOG_FORMAT: &str = "FL_LOG_FORMAT";

/// Ausgabeformat der Logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Menschenlesbare Zeilen
    #[default]
    Text,
    /// Eine JSON-Zeile pro Event
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            anderes => Err(format!("Unbekanntes Log-Format: '{anderes}'")),
        }
    }
}

/// Initialisiert das Logging-System.
///
/// Umgebungsvariablen haben Vorrang vor den uebergebenen Werten.
/// Ein ungueltiges Format faellt auf `text` zurueck.
pub fn logging_initialisieren(level: &str, format: &str) {
    let filter = EnvFilter::try_from_env(ENV_LOG_LEVEL)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format = std::env::var(ENV_LOG_FORMAT)
        .ok()
        .and_then(|f| f.parse().ok())
        .unwrap_or_else(|| format.parse().unwrap_or_default());

    // try_init: ein bereits gesetzter Subscriber (z.B. in Tests) ist kein Fehler
    let ergebnis = match format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };

    if ergebnis.is_err() {
        tracing::debug!("Logging war bereits initialisiert");
    }
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}
