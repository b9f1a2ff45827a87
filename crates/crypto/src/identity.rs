//! Selbst-Attestierung des oeffentlichen Server-Schluessels
//!
//! Der Server signiert die DER-kodierten SPKI-Bytes seines oeffentlichen
//! Schluessels mit dem zugehoerigen privaten Schluessel. Der Client
//! importiert den Schluessel und prueft die Signatur mit genau diesem
//! Schluessel, bevor er irgendetwas sendet.

use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use fluester_protocol::PublicKeyAnkuendigung;

use crate::error::{CryptoError, CryptoResult};

/// Oeffentlicher Schluessel mit Signatur ueber sich selbst
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attestierung {
    /// DER-kodierter SubjectPublicKeyInfo
    pub public_key_bytes: Vec<u8>,
    /// RSASSA-PKCS1-v1_5/SHA-256-Signatur ueber `public_key_bytes`
    pub signatur_bytes: Vec<u8>,
}

impl Attestierung {
    /// Dekodiert eine Attestierung aus der Wire-Ankuendigung
    pub fn aus_ankuendigung(ankuendigung: &PublicKeyAnkuendigung) -> CryptoResult<Self> {
        let (public_key_bytes, signatur_bytes) = ankuendigung.dekodieren()?;
        Ok(Self {
            public_key_bytes,
            signatur_bytes,
        })
    }

    /// Kodiert die Attestierung fuer den Versand
    pub fn zu_ankuendigung(&self) -> PublicKeyAnkuendigung {
        PublicKeyAnkuendigung::neu(&self.public_key_bytes, &self.signatur_bytes)
    }

    /// Importiert den Schluessel und verifiziert die Selbst-Signatur
    ///
    /// Gibt den importierten Schluessel nur zurueck, wenn die Signatur gueltig
    /// ist. Jeder Fehler ist `SignaturVerifikation`.
    pub fn verifizieren(&self) -> CryptoResult<RsaPublicKey> {
        let public_key = RsaPublicKey::from_public_key_der(&self.public_key_bytes).map_err(|e| {
            CryptoError::SignaturVerifikation(format!("Schluessel nicht importierbar: {e}"))
        })?;

        let signatur = Signature::try_from(self.signatur_bytes.as_slice())
            .map_err(|e| CryptoError::SignaturVerifikation(e.to_string()))?;

        VerifyingKey::<Sha256>::new(public_key.clone())
            .verify(&self.public_key_bytes, &signatur)
            .map_err(|e| CryptoError::SignaturVerifikation(e.to_string()))?;

        Ok(public_key)
    }

    /// SHA-256 der SPKI-Bytes als Hex, fuer Logs und manuellen Vergleich
    pub fn fingerprint(&self) -> String {
        Sha256::digest(&self.public_key_bytes)
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

/// Signiert Daten mit dem privaten Schluessel (PKCS#1 v1.5, SHA-256)
pub(crate) fn signieren(private_key: &RsaPrivateKey, daten: &[u8]) -> CryptoResult<Vec<u8>> {
    let signing_key = SigningKey::<Sha256>::new(private_key.clone());
    let signatur = signing_key
        .try_sign(daten)
        .map_err(|e| CryptoError::Signierung(e.to_string()))?;
    Ok(signatur.to_vec())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
