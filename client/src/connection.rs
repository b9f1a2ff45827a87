//! Client-seitige WebSocket-Verbindung zum Fluester-Server
//!
//! Jeder Text-Frame vom Server wird zuerst als JSON versucht; alles andere
//! ist eine Statuszeile. Solange der Schluessel nicht verifiziert ist, sendet
//! der Client nichts.

use fluester_crypto::SichererKanal;
use fluester_protocol::{ClientNachricht, ServerNachricht, ServerZeile, StatusZeile};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::error::{ClientFehler, ClientResult};

// ---------------------------------------------------------------------------
// ServerVerbindung
// ---------------------------------------------------------------------------

/// WebSocket-Verbindung zum Server samt verifiziertem Kanal
pub struct ServerVerbindung<S> {
    ws: WebSocketStream<S>,
    kanal: SichererKanal,
    username: Option<String>,
}

impl ServerVerbindung<MaybeTlsStream<TcpStream>> {
    /// Baut eine WebSocket-Verbindung zum Server auf
    pub async fn verbinden(url: &str) -> ClientResult<Self> {
        tracing::info!(url, "Verbinde mit Server");
        let (ws, _) = tokio_tungstenite::connect_async(url).await?;
        tracing::debug!(url, "WebSocket-Verbindung hergestellt");
        Ok(Self::aus_stream(ws))
    }
}

impl<S> ServerVerbindung<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Uebernimmt einen bereits verbundenen WebSocket-Stream
    pub fn aus_stream(ws: WebSocketStream<S>) -> Self {
        Self {
            ws,
            kanal: SichererKanal::neu(),
            username: None,
        }
    }

    /// Gibt true zurueck wenn der Server-Schluessel verifiziert wurde
    pub fn ist_verifiziert(&self) -> bool {
        self.kanal.ist_bereit()
    }

    /// Vom Server bestaetigter Benutzername
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Maximale Nachrichtenlaenge in Bytes (None vor dem Handshake)
    pub fn kapazitaet(&self) -> Option<usize> {
        self.kanal.kapazitaet()
    }

    /// Fuehrt den Handshake durch und gibt den bestaetigten Namen zurueck
    ///
    /// # Fehler
    /// - `ServerBelegt` wenn der Server bereits eine Sitzung hat
    /// - `Krypto` wenn die Signatur nicht verifiziert; die Verbindung ist
    ///   dann geschlossen und es wurde nichts gesendet
    /// - `UnerwarteteAntwort` bei jeder anderen ersten Zeile
    pub async fn handshake(&mut self, username: &str) -> ClientResult<String> {
        let ankuendigung = match self.naechste_zeile().await? {
            Some(ServerZeile::Nachricht(ServerNachricht::PublicKey(ankuendigung))) => ankuendigung,
            Some(ServerZeile::Status(StatusZeile::ServerBelegt)) => {
                tracing::info!("Server belegt");
                self.schliessen().await;
                return Err(ClientFehler::ServerBelegt);
            }
            Some(ServerZeile::Status(andere)) => {
                self.schliessen().await;
                return Err(ClientFehler::UnerwarteteAntwort(andere.text()));
            }
            None => return Err(ClientFehler::VerbindungGetrennt),
        };

        if let Err(e) = self.kanal.schluessel_uebernehmen(&ankuendigung) {
            tracing::error!(art = %e.art(), fehler = %e, "Server-Schluessel nicht verifizierbar, Abbruch");
            self.schliessen().await;
            return Err(e.into());
        }
        tracing::info!("Server-Schluessel verifiziert");

        self.senden(&ClientNachricht::Join {
            username: username.to_string(),
        })
        .await?;

        match self.naechste_zeile().await? {
            Some(ServerZeile::Status(StatusZeile::Willkommen(name))) => {
                tracing::info!(username = %name, "Beigetreten");
                self.username = Some(name.clone());
                Ok(name)
            }
            Some(ServerZeile::Status(andere)) => Err(ClientFehler::UnerwarteteAntwort(andere.text())),
            Some(ServerZeile::Nachricht(andere)) => {
                Err(ClientFehler::UnerwarteteAntwort(format!("{andere:?}")))
            }
            None => Err(ClientFehler::VerbindungGetrennt),
        }
    }

    /// Verschluesselt und sendet eine Chat-Nachricht
    ///
    /// Ohne verifizierten Schluessel wird nichts gesendet (`KeinSchluessel`).
    pub async fn nachricht_senden(&mut self, text: &str) -> ClientResult<()> {
        let nachricht = self.kanal.verschluesseln(text)?;
        self.senden(&nachricht).await
    }

    /// Sendet `exit` und wartet auf den Abschied
    ///
    /// Gibt die Abschiedszeile zurueck, falls der Server sie vor dem Close
    /// geschickt hat.
    pub async fn beenden(&mut self) -> ClientResult<Option<StatusZeile>> {
        self.senden(&ClientNachricht::Exit).await?;

        let mut abschied = None;
        while let Some(zeile) = self.naechste_zeile().await? {
            if let ServerZeile::Status(StatusZeile::Abschied) = zeile {
                abschied = Some(StatusZeile::Abschied);
                break;
            }
        }
        self.schliessen().await;
        self.username = None;
        Ok(abschied)
    }

    /// Wartet auf die naechste Zeile vom Server
    ///
    /// `None` wenn der Server die Verbindung geschlossen hat.
    pub async fn naechste_zeile(&mut self) -> ClientResult<Option<ServerZeile>> {
        loop {
            let frame = match self.ws.next().await {
                Some(frame) => frame?,
                None => return Ok(None),
            };
            let text = match frame {
                Message::Text(text) => text,
                Message::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Message::Close(_) => return Ok(None),
                _ => continue,
            };
            return Ok(Some(ServerZeile::klassifizieren(&text)));
        }
    }

    async fn senden(&mut self, nachricht: &ClientNachricht) -> ClientResult<()> {
        tracing::trace!(typ = nachricht.typ(), "Sende Nachricht");
        self.ws.send(Message::Text(nachricht.to_json()?)).await?;
        Ok(())
    }

    async fn schliessen(&mut self) {
        if let Err(e) = self.ws.close(None).await {
            tracing::debug!(fehler = %e, "Close fehlgeschlagen");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use fluester_core::FehlerArt;
    use tokio_tungstenite::tungstenite::protocol::Role;

    type Gegenstelle = WebSocketStream<tokio::io::DuplexStream>;

    async fn paar() -> (ServerVerbindung<tokio::io::DuplexStream>, Gegenstelle) {
        let (a, b) = tokio::io::duplex(64 * 1024);
        let client = WebSocketStream::from_raw_socket(a, Role::Client, None).await;
        let server = WebSocketStream::from_raw_socket(b, Role::Server, None).await;
        (ServerVerbindung::aus_stream(client), server)
    }

    /// Naechster Text-Frame der Gegenstelle, None bei Close/Ende
    async fn empfangen(server: &mut Gegenstelle) -> Option<String> {
        while let Some(frame) = server.next().await {
            match frame.ok()? {
                Message::Text(text) => return Some(text),
                Message::Close(_) => return None,
                _ => continue,
            }
        }
        None
    }

    #[tokio::test]
    async fn ohne_handshake_wird_nichts_gesendet() {
        let (mut client, mut server) = paar().await;
        let fehler = client.nachricht_senden("geheim").await.unwrap_err();
        assert_eq!(fehler.art(), FehlerArt::KeinSchluessel);

        drop(client);
        assert_eq!(empfangen(&mut server).await, None);
    }

    #[tokio::test]
    async fn ablehnung_wird_erkannt() {
        let (mut client, mut server) = paar().await;
        server
            .send(Message::Text("Server is in use".into()))
            .await
            .unwrap();

        let fehler = client.handshake("alice").await.unwrap_err();
        assert!(matches!(fehler, ClientFehler::ServerBelegt));
        assert_eq!(empfangen(&mut server).await, None);
    }

    #[tokio::test]
    async fn unerwartete_erste_zeile() {
        let (mut client, mut server) = paar().await;
        server.send(Message::Text("Hallo?".into())).await.unwrap();

        let fehler = client.handshake("alice").await.unwrap_err();
        assert!(matches!(fehler, ClientFehler::UnerwarteteAntwort(ref t) if t == "Hallo?"));
        assert!(!client.ist_verifiziert());
    }

    #[tokio::test]
    async fn kaputtes_base64_bricht_ab_ohne_join() {
        let (mut client, mut server) = paar().await;
        server
            .send(Message::Text(
                r#"{"type":"public_key","key":"%%%","signature":"%%%"}"#.into(),
            ))
            .await
            .unwrap();

        let fehler = client.handshake("alice").await.unwrap_err();
        assert_eq!(fehler.art(), FehlerArt::SignaturUngueltig);
        assert!(!client.ist_verifiziert());
        assert_eq!(empfangen(&mut server).await, None);
    }

    #[tokio::test]
    async fn getrennt_vor_ankuendigung() {
        let (mut client, mut server) = paar().await;
        server.close(None).await.unwrap();
        let fehler = client.handshake("alice").await.unwrap_err();
        assert!(matches!(fehler, ClientFehler::VerbindungGetrennt));
    }
}
