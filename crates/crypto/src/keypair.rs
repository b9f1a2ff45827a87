//! RSA-Schluesselpaar des Servers
//!
//! Das Schluesselpaar wird genau einmal beim Prozessstart erzeugt (oder aus
//! einer PKCS#8-Datei geladen) und bleibt fuer die gesamte Laufzeit gleich.
//! Der private Schluessel verlaesst den Prozess nie; er wird nur lesend
//! (via `Arc<ServerSchluessel>`) von allen Entschluesselungen geteilt.
//!
//! ## Verfahren
//! - Verschluesselung: RSA-OAEP mit SHA-256
//! - Attestierung: RSASSA-PKCS1-v1_5 mit SHA-256 ueber die SPKI-Bytes

use std::path::Path;

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};
use crate::identity::{signieren, Attestierung};

/// Standard-Schluessellaenge in Bits
pub const STANDARD_BITS: usize = 2048;

/// Kleinste akzeptierte Schluessellaenge in Bits
pub const MINDEST_BITS: usize = 2048;

/// Ausgabelaenge von SHA-256 in Bytes (OAEP-Overhead = 2 * hLen + 2)
const OAEP_HASH_LAENGE: usize = 32;

/// Maximale Klartextlaenge fuer RSA-OAEP-SHA256 bei gegebener Modulus-Groesse
///
/// Fuer 2048-Bit-Schluessel (256 Bytes) sind das 190 Bytes.
pub fn oaep_kapazitaet(modulus_bytes: usize) -> usize {
    modulus_bytes.saturating_sub(2 * OAEP_HASH_LAENGE + 2)
}

/// Schluesselpaar des Servers samt vorberechneter Attestierung
pub struct ServerSchluessel {
    private_key: RsaPrivateKey,
    attestierung: Attestierung,
}

impl ServerSchluessel {
    /// Erzeugt ein Schluesselpaar mit der Standardlaenge (2048 Bit)
    pub fn initialisieren() -> CryptoResult<Self> {
        Self::generieren(STANDARD_BITS)
    }

    /// Erzeugt ein neues Schluesselpaar mit `bits` Bit Modulus
    ///
    /// Teuer (CPU-gebunden), sollte im async-Kontext ueber
    /// `spawn_blocking` aufgerufen werden.
    pub fn generieren(bits: usize) -> CryptoResult<Self> {
        if bits < MINDEST_BITS {
            return Err(CryptoError::SchluesselGenerierung(format!(
                "Schluessellaenge {bits} Bit unter Minimum von {MINDEST_BITS} Bit"
            )));
        }

        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;

        let schluessel = Self::aus_private_key(private_key)?;
        tracing::info!(
            bits,
            fingerprint = %schluessel.attestierung.fingerprint(),
            "Server-Schluessel erzeugt"
        );
        Ok(schluessel)
    }

    /// Laedt einen privaten Schluessel im PKCS#8-PEM-Format
    pub fn aus_pkcs8_pem(pem: &str) -> CryptoResult<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .map_err(|e| CryptoError::SchluesselImport(e.to_string()))?;

        let bits = private_key.size() * 8;
        if bits < MINDEST_BITS {
            return Err(CryptoError::SchluesselImport(format!(
                "Schluessellaenge {bits} Bit unter Minimum von {MINDEST_BITS} Bit"
            )));
        }

        Self::aus_private_key(private_key)
    }

    /// Laedt einen privaten Schluessel aus einer PKCS#8-PEM-Datei
    pub fn aus_datei(pfad: impl AsRef<Path>) -> CryptoResult<Self> {
        let pfad = pfad.as_ref();
        let pem = std::fs::read_to_string(pfad)?;
        let schluessel = Self::aus_pkcs8_pem(&pem)?;
        tracing::info!(
            pfad = %pfad.display(),
            bits = schluessel.bits(),
            fingerprint = %schluessel.attestierung.fingerprint(),
            "Server-Schluessel geladen"
        );
        Ok(schluessel)
    }

    fn aus_private_key(private_key: RsaPrivateKey) -> CryptoResult<Self> {
        let public_key_bytes = RsaPublicKey::from(&private_key)
            .to_public_key_der()
            .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?
            .into_vec();

        let signatur_bytes = signieren(&private_key, &public_key_bytes)?;
        let attestierung = Attestierung {
            public_key_bytes,
            signatur_bytes,
        };

        // Die Selbst-Signatur muss bereits beim Erzeugen verifizieren
        attestierung.verifizieren()?;

        Ok(Self {
            private_key,
            attestierung,
        })
    }

    /// Oeffentlicher Schluessel samt Signatur
    pub fn attestierung(&self) -> &Attestierung {
        &self.attestierung
    }

    /// Modulus-Laenge in Bits
    pub fn bits(&self) -> usize {
        self.private_key.size() * 8
    }

    /// Maximale Klartextlaenge in Bytes
    pub fn kapazitaet(&self) -> usize {
        oaep_kapazitaet(self.private_key.size())
    }

    /// Entschluesselt einen RSA-OAEP(SHA-256)-Ciphertext
    ///
    /// # Fehler
    /// `Entschluesselung` bei falscher Laenge, fehlerhaftem Padding oder
    /// einem Ciphertext, der nicht zu diesem Schluessel gehoert.
    ///
    /// Nicht in konstanter Zeit (RUSTSEC-2023-0071), siehe Crate-Doku.
    pub fn entschluesseln(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        let erwartet = self.private_key.size();
        if ciphertext.len() != erwartet {
            return Err(CryptoError::Entschluesselung(format!(
                "Ciphertext hat {} Bytes, erwartet {erwartet}",
                ciphertext.len()
            )));
        }

        self.private_key
            .decrypt(Oaep::new::<Sha256>(), ciphertext)
            .map_err(|e| CryptoError::Entschluesselung(e.to_string()))
    }

    /// Entschluesselt und dekodiert als UTF-8
    pub fn entschluesseln_text(&self, ciphertext: &[u8]) -> CryptoResult<String> {
        let bytes = self.entschluesseln(ciphertext)?;
        Ok(String::from_utf8(bytes)?)
    }
}

impl std::fmt::Debug for ServerSchluessel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSchluessel")
            .field("bits", &self.bits())
            .field("fingerprint", &self.attestierung.fingerprint())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testhilfe::schluessel;
    use rsa::pkcs8::{EncodePrivateKey, LineEnding};

    fn verschluesseln(schluessel: &ServerSchluessel, daten: &[u8]) -> Vec<u8> {
        let public_key = schluessel.attestierung().verifizieren().unwrap();
        public_key
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), daten)
            .unwrap()
    }

    #[test]
    fn kapazitaet_fuer_2048_bit() {
        assert_eq!(oaep_kapazitaet(256), 190);
        assert_eq!(schluessel().bits(), 2048);
        assert_eq!(schluessel().kapazitaet(), 190);
    }

    #[test]
    fn zu_kurzer_schluessel_wird_abgelehnt() {
        let ergebnis = ServerSchluessel::generieren(1024);
        assert!(matches!(
            ergebnis,
            Err(CryptoError::SchluesselGenerierung(_))
        ));
    }

    #[test]
    fn attestierung_ist_bei_erzeugung_gueltig() {
        assert!(schluessel().attestierung().verifizieren().is_ok());
    }

    #[test]
    fn entschluesseln_round_trip() {
        let s = schluessel();
        let maximal = "x".repeat(190);
        for text in ["", "hallo", "äöü 🔒", maximal.as_str()] {
            let ct = verschluesseln(s, text.as_bytes());
            assert_eq!(ct.len(), 256);
            assert_eq!(s.entschluesseln_text(&ct).unwrap(), text);
        }
    }

    #[test]
    fn falsche_laenge_ist_entschluesselungsfehler() {
        let fehler = schluessel().entschluesseln(&[1, 2, 3]).unwrap_err();
        assert!(matches!(fehler, CryptoError::Entschluesselung(_)));
    }

    #[test]
    fn manipulierter_ciphertext_ist_entschluesselungsfehler() {
        let s = schluessel();
        let mut ct = verschluesseln(s, b"geheim");
        ct[100] ^= 0x01;
        let fehler = s.entschluesseln(&ct).unwrap_err();
        assert!(matches!(fehler, CryptoError::Entschluesselung(_)));
    }

    #[test]
    fn ungueltiges_utf8_ist_kodierungsfehler() {
        let s = schluessel();
        let ct = verschluesseln(s, &[0xff, 0xfe, 0xfd]);
        let fehler = s.entschluesseln_text(&ct).unwrap_err();
        assert!(matches!(fehler, CryptoError::Kodierung(_)));
        assert_eq!(fehler.art(), fluester_core::FehlerArt::Kodierung);
    }

    #[test]
    fn aus_pkcs8_datei_laden() {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let pem = private_key.to_pkcs8_pem(LineEnding::LF).unwrap();

        let verzeichnis = tempfile::tempdir().unwrap();
        let pfad = verzeichnis.path().join("server.pem");
        std::fs::write(&pfad, pem.as_bytes()).unwrap();

        let geladen = ServerSchluessel::aus_datei(&pfad).unwrap();
        let erwartet = RsaPublicKey::from(&private_key)
            .to_public_key_der()
            .unwrap()
            .into_vec();
        assert_eq!(geladen.attestierung().public_key_bytes, erwartet);
        assert!(geladen.attestierung().verifizieren().is_ok());
    }

    #[test]
    fn kaputtes_pem_wird_abgelehnt() {
        let fehler = ServerSchluessel::aus_pkcs8_pem("kein pem").unwrap_err();
        assert!(matches!(fehler, CryptoError::SchluesselImport(_)));
    }

    #[test]
    fn fehlende_datei_ist_io_fehler() {
        let fehler = ServerSchluessel::aus_datei("/nicht/vorhanden.pem").unwrap_err();
        assert!(matches!(fehler, CryptoError::Io(_)));
    }

    #[test]
    fn debug_zeigt_keinen_privaten_schluessel() {
        let ausgabe = format!("{:?}", schluessel());
        assert!(ausgabe.contains("ServerSchluessel"));
        assert!(ausgabe.contains("2048"));
        assert!(!ausgabe.contains("private"));
    }
}
