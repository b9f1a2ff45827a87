//! Fehlertypen fuer das Wire-Format

use fluester_core::FehlerArt;
use thiserror::Error;

/// Fehler beim Parsen oder Dekodieren von Wire-Nachrichten
#[derive(Debug, Error)]
pub enum ProtokollFehler {
    #[error("Ungueltiges JSON: {0}")]
    UngueltigesJson(String),

    #[error("Nachricht ohne `type`-Feld")]
    FehlenderTyp,

    #[error("Unbekannter Nachrichtentyp: {0}")]
    UnbekannterTyp(String),

    #[error("Ungueltige Felder in `{typ}`-Nachricht: {grund}")]
    UngueltigeFelder { typ: String, grund: String },

    #[error("Base64-Dekodierung fehlgeschlagen: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl ProtokollFehler {
    /// Alle Wire-Fehler gelten als fehlerhafte Nachricht
    pub fn art(&self) -> FehlerArt {
        FehlerArt::UngueltigeNachricht
    }
}

/// Result-Typ fuer das Wire-Format
pub type ProtokollResult<T> = Result<T, ProtokollFehler>;
