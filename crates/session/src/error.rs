//! Fehlertypen fuer den Session-Service

use fluester_core::FehlerArt;
use fluester_crypto::CryptoError;
use fluester_protocol::ProtokollFehler;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::lifecycle::SitzungsZustand;

/// Fehlertyp fuer den Session-Service
#[derive(Debug, Error)]
pub enum SessionFehler {
    /// IO-Fehler (TCP, Socket)
    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket-Fehler (Handshake, Frame, Close)
    #[error("WebSocket-Fehler: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// Entschluesselung oder Dekodierung fehlgeschlagen
    #[error("Kryptografie-Fehler: {0}")]
    Krypto(#[from] CryptoError),

    /// Ungueltige Nachricht (JSON, Typ, Felder)
    #[error("Protokollfehler: {0}")]
    Protokoll(#[from] ProtokollFehler),

    /// Frame war weder Text noch UTF-8
    #[error("Binaer-Frame ist kein gueltiges UTF-8")]
    KeinText,

    /// Nachricht groesser als `max_nachrichten_bytes`
    #[error("Nachricht mit {bytes} Bytes ueberschreitet das Limit von {maximal} Bytes")]
    NachrichtZuGross { bytes: usize, maximal: usize },

    /// Ereignis im aktuellen Sitzungszustand nicht erlaubt
    #[error("Ungueltiger Uebergang: `{ereignis}` im Zustand {zustand}")]
    UngueltigerUebergang {
        zustand: SitzungsZustand,
        ereignis: &'static str,
    },

    /// Serialisierung einer ausgehenden Nachricht fehlgeschlagen
    #[error("Serialisierung fehlgeschlagen: {0}")]
    Serialisierung(#[from] serde_json::Error),
}

impl SessionFehler {
    /// Ordnet den Fehler einer protokollweiten Fehlerart zu
    pub fn art(&self) -> FehlerArt {
        match self {
            Self::Io(_) | Self::WebSocket(_) => FehlerArt::Transport,
            Self::Krypto(e) => e.art(),
            Self::Protokoll(e) => e.art(),
            Self::KeinText | Self::NachrichtZuGross { .. } | Self::UngueltigerUebergang { .. } => {
                FehlerArt::UngueltigeNachricht
            }
            Self::Serialisierung(_) => FehlerArt::Intern,
        }
    }
}

/// Result-Typ fuer den Session-Service
pub type SessionResult<T> = Result<T, SessionFehler>;
