//! Client-Verbindung – Verwaltet eine einzelne WebSocket-Verbindung
//!
//! Jede Verbindung bekommt eine `ClientVerbindung` in einem eigenen
//! tokio-Task. Ablauf:
//!
//! 1. Zulassung am `SitzungsTor`; abgelehnt -> `"Server is in use"` + Close
//! 2. `public_key` senden
//! 3. Empfangsschleife bis `exit`, Verbindungsende, Transportfehler oder
//!    Shutdown
//! 4. Sitzung schliessen und Tor freigeben, danach ggf. Abschied + Close
//!
//! Die Verbindung ist generisch ueber den Stream, damit Tests sie ueber
//! `tokio::io::duplex` ohne Netzwerk betreiben koennen.

use std::sync::Arc;

use fluester_core::VerbindungsId;
use fluester_observability::FluesterMetriken;
use fluester_protocol::StatusZeile;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::dispatcher::{Aktion, NachrichtenVerteiler};
use crate::error::{SessionFehler, SessionResult};
use crate::gate::Zulassung;
use crate::handshake;
use crate::lifecycle::Sitzung;
use crate::server_state::SessionState;

// ---------------------------------------------------------------------------
// AktiveSitzung
// ---------------------------------------------------------------------------

/// Haelt Zulassung und Session-Gauge zusammen
///
/// Beim Drop wird zuerst die Gauge zurueckgesetzt, danach gibt das Feld
/// `_zulassung` das Tor frei.
struct AktiveSitzung {
    _zulassung: Zulassung,
    metriken: FluesterMetriken,
}

impl AktiveSitzung {
    fn neu(zulassung: Zulassung, metriken: FluesterMetriken) -> Self {
        metriken.sitzung_zugelassen();
        Self {
            _zulassung: zulassung,
            metriken,
        }
    }
}

impl Drop for AktiveSitzung {
    fn drop(&mut self) {
        self.metriken.sitzung_beendet();
    }
}

// ---------------------------------------------------------------------------
// ClientVerbindung
// ---------------------------------------------------------------------------

/// Verarbeitet eine einzelne WebSocket-Verbindung
pub struct ClientVerbindung {
    state: Arc<SessionState>,
    verbindung: VerbindungsId,
    peer: String,
}

impl ClientVerbindung {
    /// Erstellt eine neue ClientVerbindung mit frischer VerbindungsId
    pub fn neu(state: Arc<SessionState>, peer: impl std::fmt::Display) -> Self {
        Self {
            state,
            verbindung: VerbindungsId::new(),
            peer: peer.to_string(),
        }
    }

    pub fn verbindung(&self) -> VerbindungsId {
        self.verbindung
    }

    /// Startet die Verbindungs-Verarbeitung
    ///
    /// Laeuft bis die Verbindung endet oder ein Shutdown-Signal eingeht.
    pub async fn verarbeiten<S>(self, mut ws: WebSocketStream<S>, shutdown_rx: watch::Receiver<bool>)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(zulassung) = self.state.tor.zulassen(self.verbindung) else {
            self.ablehnen(&mut ws).await;
            return;
        };
        let aktive = AktiveSitzung::neu(zulassung, self.state.metriken.clone());

        tracing::info!(
            verbindung = %self.verbindung,
            peer = %self.peer,
            "Verbindung zugelassen"
        );

        let mut sitzung = Sitzung::neu(self.verbindung);
        let ende = self.sitzung_fuehren(&mut ws, &mut sitzung, shutdown_rx).await;

        // Tor freigeben bevor der Abschied rausgeht, damit der naechste
        // Client sofort zugelassen werden kann
        sitzung.schliessen();
        drop(aktive);

        match ende {
            Ok(Some(abschied)) => {
                if let Err(e) = ws.send(Message::Text(abschied.text())).await {
                    tracing::debug!(verbindung = %self.verbindung, fehler = %e, "Abschied nicht zugestellt");
                }
                let _ = ws.close(None).await;
            }
            Ok(None) => {
                let _ = ws.close(None).await;
            }
            Err(e) => {
                self.state.metriken.fehler_zaehlen(e.art());
                tracing::warn!(
                    verbindung = %self.verbindung,
                    art = %e.art(),
                    fehler = %e,
                    "Verbindung wegen Fehler beendet"
                );
            }
        }

        tracing::info!(verbindung = %self.verbindung, "Sitzung geschlossen");
    }

    /// Sendet die Ablehnung und schliesst ohne weitere Protokollschritte
    async fn ablehnen<S>(&self, ws: &mut WebSocketStream<S>)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.state.metriken.verbindung_abgelehnt();
        tracing::info!(
            verbindung = %self.verbindung,
            peer = %self.peer,
            aktive_verbindung = ?self.state.tor.aktive_verbindung(),
            "Server belegt, Verbindung abgelehnt"
        );

        if let Err(e) = ws.send(Message::Text(StatusZeile::ServerBelegt.text())).await {
            tracing::debug!(verbindung = %self.verbindung, fehler = %e, "Ablehnung nicht zugestellt");
        }
        let _ = ws.close(None).await;
    }

    /// Handshake und Empfangsschleife der zugelassenen Sitzung
    ///
    /// Gibt die abschliessende Statuszeile zurueck, falls eine gesendet
    /// werden soll.
    async fn sitzung_fuehren<S>(
        &self,
        ws: &mut WebSocketStream<S>,
        sitzung: &mut Sitzung,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> SessionResult<Option<StatusZeile>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let ankuendigung = handshake::schluessel_ankuendigung(&self.state.schluessel)?;
        ws.send(Message::Text(ankuendigung)).await?;
        tracing::debug!(verbindung = %self.verbindung, "Oeffentlicher Schluessel gesendet");

        let verteiler = NachrichtenVerteiler::neu(Arc::clone(&self.state));

        loop {
            tokio::select! {
                frame = ws.next() => {
                    let frame = match frame {
                        Some(frame) => frame?,
                        None => {
                            tracing::info!(verbindung = %self.verbindung, "Verbindung vom Client getrennt");
                            return Ok(None);
                        }
                    };

                    let text = match frame {
                        Message::Text(text) => Ok(text),
                        Message::Binary(bytes) => {
                            String::from_utf8(bytes).map_err(|_| SessionFehler::KeinText)
                        }
                        Message::Close(_) => {
                            tracing::info!(verbindung = %self.verbindung, "Close-Frame vom Client");
                            return Ok(None);
                        }
                        // Ping/Pong beantwortet tungstenite selbst
                        _ => continue,
                    };

                    let maximal = self.state.config.max_nachrichten_bytes;
                    let aktion = match text {
                        Ok(text) if text.len() > maximal => verteiler.fehler_behandeln(
                            sitzung,
                            SessionFehler::NachrichtZuGross {
                                bytes: text.len(),
                                maximal,
                            },
                        )?,
                        Ok(text) => verteiler.verarbeiten(&text, sitzung)?,
                        Err(fehler) => verteiler.fehler_behandeln(sitzung, fehler)?,
                    };

                    match aktion {
                        Aktion::Keine => {}
                        Aktion::Antworten(zeile) => ws.send(Message::Text(zeile.text())).await?,
                        Aktion::Beenden(zeile) => return Ok(Some(zeile)),
                    }
                }

                Ok(()) = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        tracing::info!(verbindung = %self.verbindung, "Shutdown-Signal, Verbindung wird getrennt");
                        return Ok(None);
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
