//! Gemeinsamer Server-Zustand fuer den Session-Service
//!
//! Haelt alle geteilten Komponenten als Arc-Referenzen, die sicher zwischen
//! tokio-Tasks geteilt werden koennen. Geteilt wird nur das Sitzungs-Tor und
//! der read-only Server-Schluessel; jede Verbindung besitzt ihre `Sitzung`
//! allein.

use std::sync::Arc;

use fluester_crypto::ServerSchluessel;
use fluester_observability::FluesterMetriken;

use crate::broadcast::{EmpfangeneNachricht, NachrichtenBroadcast};
use crate::gate::SitzungsTor;

/// Konfiguration fuer den Session-Service
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Anzeigename des Servers (nur fuer Logs)
    pub server_name: String,
    /// Groesste Nachricht in Bytes, die noch verarbeitet wird; groessere
    /// werden verworfen, ohne die Sitzung zu beenden
    pub max_nachrichten_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_name: "Fluester".to_string(),
            max_nachrichten_bytes: 64 * 1024,
        }
    }
}

/// Gemeinsamer Server-Zustand (thread-safe, Arc-geteilt)
pub struct SessionState {
    /// Server-Konfiguration
    pub config: Arc<SessionConfig>,
    /// Exklusive Zulassung
    pub tor: Arc<SitzungsTor>,
    /// Schluesselpaar des Servers (read-only)
    pub schluessel: Arc<ServerSchluessel>,
    /// Prometheus-Metriken
    pub metriken: FluesterMetriken,
    /// Entschluesselte Nachrichten
    pub nachrichten: NachrichtenBroadcast,
}

impl SessionState {
    /// Erstellt einen neuen SessionState mit offenem Tor
    pub fn neu(
        config: SessionConfig,
        schluessel: Arc<ServerSchluessel>,
        metriken: FluesterMetriken,
    ) -> Arc<Self> {
        Arc::new(Self {
            config: Arc::new(config),
            tor: Arc::new(SitzungsTor::neu()),
            schluessel,
            metriken,
            nachrichten: NachrichtenBroadcast::neu(),
        })
    }

    /// Abonniert alle entschluesselten Nachrichten
    pub fn nachrichten_abonnieren(
        &self,
    ) -> tokio::sync::broadcast::Receiver<EmpfangeneNachricht> {
        self.nachrichten.abonnieren()
    }
}
