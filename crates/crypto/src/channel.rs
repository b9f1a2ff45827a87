//! Client-seitiger sicherer Kanal
//!
//! Haelt den oeffentlichen Server-Schluessel erst, nachdem dessen
//! Selbst-Signatur verifiziert wurde. Ohne verifizierten Schluessel schlaegt
//! jede Verschluesselung fehl; es wird niemals Klartext gesendet.

use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPublicKey};
use sha2::Sha256;

use fluester_protocol::{ClientNachricht, PublicKeyAnkuendigung};

use crate::error::{CryptoError, CryptoResult};
use crate::identity::Attestierung;
use crate::keypair::oaep_kapazitaet;

/// Verschluesselt Chat-Nachrichten unter dem verifizierten Server-Schluessel
#[derive(Debug, Default)]
pub struct SichererKanal {
    public_key: Option<RsaPublicKey>,
}

impl SichererKanal {
    /// Erstellt einen Kanal ohne Schluessel
    pub fn neu() -> Self {
        Self::default()
    }

    /// Verifiziert die Ankuendigung des Servers und uebernimmt den Schluessel
    ///
    /// Bei jedem Fehler bleibt (bzw. wird) der Kanal schluessellos.
    pub fn schluessel_uebernehmen(&mut self, ankuendigung: &PublicKeyAnkuendigung) -> CryptoResult<()> {
        self.public_key = None;
        let attestierung = Attestierung::aus_ankuendigung(ankuendigung)?;
        self.attestierung_uebernehmen(&attestierung)
    }

    /// Wie `schluessel_uebernehmen`, fuer bereits dekodierte Attestierungen
    pub fn attestierung_uebernehmen(&mut self, attestierung: &Attestierung) -> CryptoResult<()> {
        self.public_key = None;
        let public_key = attestierung.verifizieren()?;
        tracing::debug!(
            fingerprint = %attestierung.fingerprint(),
            "Server-Schluessel verifiziert"
        );
        self.public_key = Some(public_key);
        Ok(())
    }

    /// Gibt true zurueck wenn ein verifizierter Schluessel vorliegt
    pub fn ist_bereit(&self) -> bool {
        self.public_key.is_some()
    }

    /// Maximale Klartextlaenge in Bytes (None ohne Schluessel)
    pub fn kapazitaet(&self) -> Option<usize> {
        self.public_key.as_ref().map(|k| oaep_kapazitaet(k.size()))
    }

    /// Verschluesselt eine Chat-Nachricht (RSA-OAEP, SHA-256)
    ///
    /// # Fehler
    /// - `KeinSchluessel` ohne verifizierten Schluessel
    /// - `KapazitaetUeberschritten` wenn der UTF-8-Klartext zu lang ist
    pub fn verschluesseln(&self, klartext: &str) -> CryptoResult<ClientNachricht> {
        let public_key = self.public_key.as_ref().ok_or(CryptoError::KeinSchluessel)?;

        let bytes = klartext.as_bytes();
        let maximal = oaep_kapazitaet(public_key.size());
        if bytes.len() > maximal {
            return Err(CryptoError::KapazitaetUeberschritten {
                maximal,
                erhalten: bytes.len(),
            });
        }

        let encrypted_data = public_key
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), bytes)
            .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

        Ok(ClientNachricht::Message { encrypted_data })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
