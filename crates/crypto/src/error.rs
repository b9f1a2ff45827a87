//! Fehlertypen fuer das Kryptografie-Subsystem

use fluester_core::FehlerArt;
use fluester_protocol::ProtokollFehler;
use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Schluessel-Generierung fehlgeschlagen: {0}")]
    SchluesselGenerierung(String),

    #[error("Schluessel-Import fehlgeschlagen: {0}")]
    SchluesselImport(String),

    #[error("Signierung fehlgeschlagen: {0}")]
    Signierung(String),

    #[error("Signatur-Verifikation fehlgeschlagen: {0}")]
    SignaturVerifikation(String),

    #[error("Kein verifizierter Schluessel vorhanden")]
    KeinSchluessel,

    #[error("Klartext zu lang: maximal {maximal} Bytes, erhalten {erhalten}")]
    KapazitaetUeberschritten { maximal: usize, erhalten: usize },

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Entschluesselung fehlgeschlagen: {0}")]
    Entschluesselung(String),

    #[error("Klartext ist kein gueltiges UTF-8: {0}")]
    Kodierung(#[from] std::string::FromUtf8Error),

    #[error("Ungueltige Schluessel-Ankuendigung: {0}")]
    Protokoll(#[from] ProtokollFehler),

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),
}

impl CryptoError {
    /// Ordnet den Fehler einer protokollweiten Fehlerart zu
    pub fn art(&self) -> FehlerArt {
        match self {
            Self::SignaturVerifikation(_) | Self::Protokoll(_) => FehlerArt::SignaturUngueltig,
            Self::KeinSchluessel => FehlerArt::KeinSchluessel,
            Self::KapazitaetUeberschritten { .. } => FehlerArt::KapazitaetUeberschritten,
            Self::Entschluesselung(_) => FehlerArt::Entschluesselung,
            Self::Kodierung(_) => FehlerArt::Kodierung,
            Self::SchluesselGenerierung(_)
            | Self::SchluesselImport(_)
            | Self::Signierung(_)
            | Self::Verschluesselung(_)
            | Self::Io(_) => FehlerArt::Intern,
        }
    }
}

pub type CryptoResult<T> = Result<T, CryptoError>;
