//! Fehlertypen fuer den Client

use fluester_core::FehlerArt;
use fluester_crypto::CryptoError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Fehler die bei der Server-Verbindung auftreten koennen
#[derive(Debug, Error)]
pub enum ClientFehler {
    /// Verbindungsaufbau oder Frame-Fehler
    #[error("WebSocket-Fehler: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// Server hat bereits eine aktive Sitzung
    #[error("Server is in use")]
    ServerBelegt,

    /// Schluessel-Verifikation oder Verschluesselung fehlgeschlagen
    #[error(transparent)]
    Krypto(#[from] CryptoError),

    /// Ausgehende Nachricht nicht serialisierbar
    #[error("Serialisierung fehlgeschlagen: {0}")]
    Serialisierung(#[from] serde_json::Error),

    /// Server hat nicht protokollgemaess geantwortet
    #[error("Unerwartete Antwort: {0}")]
    UnerwarteteAntwort(String),

    /// Server hat die Verbindung geschlossen
    #[error("Verbindung vom Server getrennt")]
    VerbindungGetrennt,
}

impl ClientFehler {
    /// Ordnet den Fehler einer protokollweiten Fehlerart zu
    pub fn art(&self) -> FehlerArt {
        match self {
            Self::WebSocket(_) | Self::VerbindungGetrennt => FehlerArt::Transport,
            Self::ServerBelegt => FehlerArt::ZulassungAbgelehnt,
            Self::Krypto(e) => e.art(),
            Self::Serialisierung(_) => FehlerArt::Intern,
            Self::UnerwarteteAntwort(_) => FehlerArt::UngueltigeNachricht,
        }
    }

    /// Gibt true zurueck wenn nur die einzelne Eingabe verworfen wurde und
    /// die Verbindung weiter nutzbar ist
    pub fn ist_eingabefehler(&self) -> bool {
        matches!(self.art(), FehlerArt::KapazitaetUeberschritten)
    }
}

/// Result-Typ fuer den Client
pub type ClientResult<T> = Result<T, ClientFehler>;
