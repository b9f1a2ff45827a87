//! WebSocket-Listener – Bindet Socket, akzeptiert Verbindungen
//!
//! Der `SessionServer` bindet einen TCP-Socket und startet fuer jede
//! eingehende Verbindung einen eigenen tokio-Task: WebSocket-Handshake,
//! dann `ClientVerbindung`. Ueber die Zulassung entscheidet erst die
//! Verbindung selbst am `SitzungsTor`, damit auch abgelehnte Peers die
//! Ablehnung als Text-Frame erhalten.
//!
//! Das Transport-Limit liegt weit ueber `max_nachrichten_bytes`. Zu grosse
//! Nachrichten verwirft erst die Verbindung, damit sie die Sitzung nicht
//! beenden.
//!
//! Beim Shutdown wartet der Server auf alle Verbindungs-Tasks, damit offene
//! Peers noch ihren Close-Frame bekommen.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinSet};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

use crate::connection::ClientVerbindung;
use crate::server_state::SessionState;

/// Obergrenze fuer WebSocket-Nachrichten und -Frames auf Transportebene
const TRANSPORT_MAX_BYTES: usize = 16 * 1024 * 1024;

/// Wie lange der Shutdown auf offene Verbindungen wartet
const NACHLAUF_TIMEOUT: Duration = Duration::from_secs(5);

/// WebSocket-Chat-Server
pub struct SessionServer {
    state: Arc<SessionState>,
    listener: TcpListener,
}

impl SessionServer {
    /// Bindet den Listener
    ///
    /// Port 0 waehlt einen freien Port; die tatsaechliche Adresse liefert
    /// `lokale_adresse`.
    pub async fn binden(state: Arc<SessionState>, bind_addr: SocketAddr) -> std::io::Result<Self> {
        let listener = TcpListener::bind(bind_addr).await?;
        Ok(Self { state, listener })
    }

    /// Gibt die gebundene Adresse zurueck
    pub fn lokale_adresse(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Akzeptiert Verbindungen bis `shutdown_rx` ein `true`-Signal empfaengt
    pub async fn starten(self, mut shutdown_rx: watch::Receiver<bool>) -> std::io::Result<()> {
        let lokale_addr = self.listener.local_addr()?;
        tracing::info!(
            adresse = %lokale_addr,
            server = %self.state.config.server_name,
            "WebSocket-Server gestartet"
        );

        let transport_limit = self.state.config.max_nachrichten_bytes.max(TRANSPORT_MAX_BYTES);
        let ws_config = WebSocketConfig {
            max_message_size: Some(transport_limit),
            max_frame_size: Some(transport_limit),
            ..Default::default()
        };
        let mut verbindungen = JoinSet::new();

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            tracing::debug!(peer = %peer_addr, "TCP-Verbindung akzeptiert");
                            let _ = stream.set_nodelay(true);

                            let state = Arc::clone(&self.state);
                            let shutdown_rx_clone = shutdown_rx.clone();

                            verbindungen.spawn(async move {
                                match tokio_tungstenite::accept_async_with_config(stream, Some(ws_config)).await {
                                    Ok(ws) => {
                                        ClientVerbindung::neu(state, peer_addr)
                                            .verarbeiten(ws, shutdown_rx_clone)
                                            .await;
                                    }
                                    Err(e) => {
                                        tracing::warn!(
                                            peer = %peer_addr,
                                            fehler = %e,
                                            "WebSocket-Handshake fehlgeschlagen"
                                        );
                                    }
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!(fehler = %e, "TCP-Accept-Fehler");
                            tokio::time::sleep(Duration::from_millis(10)).await;
                        }
                    }
                }

                // Beendete Verbindungs-Tasks einsammeln
                Some(ergebnis) = verbindungen.join_next() => {
                    task_ergebnis_pruefen(ergebnis);
                }

                // Shutdown-Signal
                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!("WebSocket-Server: Shutdown-Signal empfangen");
                        break;
                    }
                }
            }
        }

        if !verbindungen.is_empty() {
            tracing::info!(offen = verbindungen.len(), "Warte auf offene Verbindungen");
        }
        let nachlauf = async {
            while let Some(ergebnis) = verbindungen.join_next().await {
                task_ergebnis_pruefen(ergebnis);
            }
        };
        if tokio::time::timeout(NACHLAUF_TIMEOUT, nachlauf).await.is_err() {
            tracing::warn!(
                offen = verbindungen.len(),
                "Verbindungen nicht rechtzeitig beendet, werden abgebrochen"
            );
            verbindungen.shutdown().await;
        }

        tracing::info!("WebSocket-Server gestoppt");
        Ok(())
    }
}

fn task_ergebnis_pruefen(ergebnis: Result<(), JoinError>) {
    if let Err(e) = ergebnis {
        if e.is_panic() {
            tracing::error!(fehler = %e, "Verbindungs-Task ist abgestuerzt");
        }
    }
}
