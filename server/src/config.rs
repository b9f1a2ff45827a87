//! Server-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Server ohne Konfigurationsdatei
//! lauffaehig ist.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use fluester_crypto::MINDEST_BITS;
use fluester_observability::logging::log_level_gueltig;
use serde::{Deserialize, Serialize};

/// Vollstaendige Server-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Allgemeine Server-Einstellungen
    pub server: ServerEinstellungen,
    /// Netzwerk-Einstellungen
    pub netzwerk: NetzwerkEinstellungen,
    /// Schluessel-Einstellungen
    pub schluessel: SchluesselEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

/// Allgemeine Server-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerEinstellungen {
    /// Anzeigename des Servers
    pub name: String,
}

impl Default for ServerEinstellungen {
    fn default() -> Self {
        Self {
            name: "Fluester".into(),
        }
    }
}

/// Netzwerk-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetzwerkEinstellungen {
    /// Bind-Adresse fuer den WebSocket-Listener
    pub bind_adresse: String,
    /// Port fuer den WebSocket-Listener
    pub port: u16,
    /// Groesste Nachricht in Bytes, die noch verarbeitet wird; groessere
    /// werden verworfen, ohne die Sitzung zu beenden
    pub max_nachrichten_bytes: usize,
}

impl Default for NetzwerkEinstellungen {
    fn default() -> Self {
        Self {
            bind_adresse: "0.0.0.0".into(),
            port: 8000,
            max_nachrichten_bytes: 64 * 1024,
        }
    }
}

/// Schluessel-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchluesselEinstellungen {
    /// Schluessellaenge in Bits fuer neu erzeugte Schluessel
    pub bits: usize,
    /// Privater Schluessel im PKCS#8-PEM-Format (leer = beim Start erzeugen)
    pub private_key_pfad: Option<PathBuf>,
}

impl Default for SchluesselEinstellungen {
    fn default() -> Self {
        Self {
            bits: fluester_crypto::STANDARD_BITS,
            private_key_pfad: None,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den Observability-Server
    pub aktiviert: bool,
    /// Port fuer Metriken und Health (Standard: 9300)
    pub port: u16,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: true,
            port: 9300,
        }
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str::<Self>(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };
        config.validieren()?;
        Ok(config)
    }

    /// Prueft Werte, die serde allein nicht abfangen kann
    pub fn validieren(&self) -> anyhow::Result<()> {
        if !log_level_gueltig(&self.logging.level) {
            anyhow::bail!("Ungueltiges Log-Level: '{}'", self.logging.level);
        }
        if self.schluessel.bits < MINDEST_BITS {
            anyhow::bail!(
                "Schluessellaenge {} Bit unter Minimum von {MINDEST_BITS} Bit",
                self.schluessel.bits
            );
        }
        if self.netzwerk.max_nachrichten_bytes == 0 {
            anyhow::bail!("max_nachrichten_bytes muss groesser als 0 sein");
        }
        self.ws_bind_adresse()?;
        self.observability_bind_adresse()?;
        Ok(())
    }

    /// Gibt die Bind-Adresse fuer den WebSocket-Listener zurueck
    pub fn ws_bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        let adresse = format!("{}:{}", self.netzwerk.bind_adresse, self.netzwerk.port);
        adresse
            .parse()
            .with_context(|| format!("Ungueltige Bind-Adresse '{adresse}'"))
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> anyhow::Result<SocketAddr> {
        let adresse = format!("{}:{}", self.netzwerk.bind_adresse, self.observability.port);
        adresse
            .parse()
            .with_context(|| format!("Ungueltige Bind-Adresse '{adresse}'"))
    }
}
