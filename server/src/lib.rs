//! fluester-server – Bibliotheks-Root
//!
//! Deklariert alle Server-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Integrationstests bereit.

pub mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use config::ServerConfig;
use fluester_crypto::ServerSchluessel;
use fluester_observability::FluesterMetriken;
use fluester_session::{EmpfangeneNachricht, SessionConfig, SessionServer, SessionState};
use tokio::sync::{broadcast, watch};

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
}

impl Server {
    /// Erstellt einen neuen Server aus der gegebenen Konfiguration
    pub fn neu(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Laedt den privaten Schluessel oder erzeugt einen neuen
    ///
    /// Beides ist CPU-gebunden und laeuft daher auf `spawn_blocking`.
    /// Der Schluessel wird nie auf die Platte geschrieben.
    pub async fn schluessel_bereitstellen(&self) -> Result<Arc<ServerSchluessel>> {
        let schluessel = match self.config.schluessel.private_key_pfad.clone() {
            Some(pfad) => {
                tracing::info!(pfad = %pfad.display(), "Lade Server-Schluessel");
                tokio::task::spawn_blocking(move || ServerSchluessel::aus_datei(&pfad))
                    .await?
                    .context("Server-Schluessel konnte nicht geladen werden")?
            }
            None => {
                let bits = self.config.schluessel.bits;
                tracing::info!(bits, "Erzeuge Server-Schluessel");
                tokio::task::spawn_blocking(move || ServerSchluessel::generieren(bits))
                    .await?
                    .context("Server-Schluessel konnte nicht erzeugt werden")?
            }
        };
        Ok(Arc::new(schluessel))
    }

    /// Startet alle Server-Subsysteme und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Schluesselpaar bereitstellen
    /// 2. Observability-Server starten (optional)
    /// 3. WebSocket-Listener starten
    /// 4. Auf Ctrl-C warten, dann Listener und Verbindungen beenden
    pub async fn starten(self) -> Result<()> {
        let ws_addr = self.config.ws_bind_adresse()?;
        tracing::info!(
            server_name = %self.config.server.name,
            adresse = %ws_addr,
            "Server startet"
        );

        let schluessel = self.schluessel_bereitstellen().await?;
        let metriken = FluesterMetriken::neu()?;

        if self.config.observability.aktiviert {
            let obs_addr = self.config.observability_bind_adresse()?;
            let obs_metriken = metriken.clone();
            tokio::spawn(async move {
                if let Err(e) =
                    fluester_observability::observability_server_starten(obs_addr, obs_metriken).await
                {
                    tracing::error!(fehler = %e, "Observability-Server beendet");
                }
            });
        }

        let state = SessionState::neu(
            SessionConfig {
                server_name: self.config.server.name.clone(),
                max_nachrichten_bytes: self.config.netzwerk.max_nachrichten_bytes,
            },
            schluessel,
            metriken,
        );
        tokio::spawn(nachrichten_ausgeben(state.nachrichten_abonnieren()));

        let server = SessionServer::binden(state, ws_addr)
            .await
            .with_context(|| format!("WebSocket-Listener auf {ws_addr} nicht bindbar"))?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let server_task = tokio::spawn(server.starten(shutdown_rx));

        tracing::info!("Server laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Server wird beendet");

        // Fehler nur wenn alle Empfaenger weg sind, dann ist ohnehin alles beendet
        let _ = shutdown_tx.send(true);
        server_task.await??;

        Ok(())
    }
}

/// Gibt entschluesselte Nachrichten auf stdout aus
async fn nachrichten_ausgeben(mut rx: broadcast::Receiver<EmpfangeneNachricht>) {
    loop {
        match rx.recv().await {
            Ok(nachricht) => println!("{nachricht}"),
            Err(broadcast::error::RecvError::Lagged(verpasst)) => {
                tracing::warn!(verpasst, "Nachrichtenausgabe hinkt hinterher");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
