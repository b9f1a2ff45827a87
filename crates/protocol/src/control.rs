//! JSON-Nachrichten des Chat-Protokolls
//!
//! ## Design
//! - Jede JSON-Nachricht traegt ein `type`-Feld (Tagged Enums via serde)
//! - Server → Client: nur `public_key`, direkt nach der Zulassung
//! - Client → Server: `join`, `message`, `exit`
//! - Alles, was der Client nicht als JSON erkennt, ist eine Statuszeile
//!
//! ```text
//! S→C {"type":"public_key","key":"<base64 SPKI>","signature":"<base64>"}
//! C→S {"type":"join","username":"alice"}
//! C→S {"type":"message","encryptedData":[12,200,...]}
//! C→S {"type":"exit"}
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::{ProtokollFehler, ProtokollResult};
use crate::status::StatusZeile;

/// Bekannte `type`-Werte fuer Client-Nachrichten
const CLIENT_TYPEN: [&str; 3] = ["join", "message", "exit"];

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Ankuendigung des oeffentlichen Server-Schluessels (Base64 auf dem Draht)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyAnkuendigung {
    /// DER-kodierter SubjectPublicKeyInfo, Base64
    pub key: String,
    /// Signatur ueber die SPKI-Bytes, Base64
    pub signature: String,
}

impl PublicKeyAnkuendigung {
    /// Erstellt eine Ankuendigung aus rohen Schluessel- und Signatur-Bytes
    pub fn neu(public_key_bytes: &[u8], signatur_bytes: &[u8]) -> Self {
        Self {
            key: STANDARD.encode(public_key_bytes),
            signature: STANDARD.encode(signatur_bytes),
        }
    }

    /// Dekodiert Schluessel und Signatur zurueck in rohe Bytes
    pub fn dekodieren(&self) -> ProtokollResult<(Vec<u8>, Vec<u8>)> {
        let key = STANDARD.decode(&self.key)?;
        let signature = STANDARD.decode(&self.signature)?;
        Ok((key, signature))
    }
}

/// JSON-Nachrichten vom Server an den Client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerNachricht {
    /// Oeffentlicher Schluessel samt Selbst-Signatur
    PublicKey(PublicKeyAnkuendigung),
}

impl ServerNachricht {
    /// Serialisiert die Nachricht als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// JSON-Nachrichten vom Client an den Server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientNachricht {
    /// Beitritt mit frei waehlbarem Benutzernamen
    Join { username: String },
    /// Eine verschluesselte Chat-Nachricht (RSA-OAEP Ciphertext)
    Message {
        #[serde(rename = "encryptedData")]
        encrypted_data: Vec<u8>,
    },
    /// Bitte um geordnetes Beenden
    Exit,
}

impl ClientNachricht {
    /// Serialisiert die Nachricht als JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parst eine eingehende Client-Nachricht
    ///
    /// Unterscheidet zwischen kaputtem JSON, fehlendem oder unbekanntem
    /// `type` und ungueltigen Feldern, damit der Server den Grund loggen kann.
    pub fn parsen(text: &str) -> ProtokollResult<Self> {
        let wert: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| ProtokollFehler::UngueltigesJson(e.to_string()))?;

        let typ = wert
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(ProtokollFehler::FehlenderTyp)?
            .to_string();

        if !CLIENT_TYPEN.contains(&typ.as_str()) {
            return Err(ProtokollFehler::UnbekannterTyp(typ));
        }

        serde_json::from_value(wert).map_err(|e| ProtokollFehler::UngueltigeFelder {
            typ,
            grund: e.to_string(),
        })
    }

    /// Kurzbezeichnung fuer Logs
    pub fn typ(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Message { .. } => "message",
            Self::Exit => "exit",
        }
    }
}

// ---------------------------------------------------------------------------
// Client-seitige Klassifizierung eingehender Frames
// ---------------------------------------------------------------------------

/// Ein vom Server empfangener Text-Frame aus Sicht des Clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerZeile {
    /// Erkannte JSON-Nachricht
    Nachricht(ServerNachricht),
    /// Alles andere ist eine Plain-Text-Statuszeile
    Status(StatusZeile),
}

impl ServerZeile {
    /// Versucht zuerst JSON, faellt sonst auf eine Statuszeile zurueck
    pub fn klassifizieren(text: &str) -> Self {
        match serde_json::from_str::<ServerNachricht>(text) {
            Ok(nachricht) => Self::Nachricht(nachricht),
            Err(_) => Self::Status(StatusZeile::aus_text(text)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_key_wire_format() {
        let nachricht = ServerNachricht::PublicKey(PublicKeyAnkuendigung::neu(b"key", b"sig"));
        let json = nachricht.to_json().unwrap();
        let wert: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(wert["type"], "public_key");
        assert_eq!(wert["key"], "a2V5");
        assert_eq!(wert["signature"], "c2ln");
    }

    #[test]
    fn ankuendigung_dekodieren() {
        let ankuendigung = PublicKeyAnkuendigung::neu(&[1, 2, 3], &[9, 8]);
        let (key, sig) = ankuendigung.dekodieren().unwrap();
        assert_eq!(key, vec![1, 2, 3]);
        assert_eq!(sig, vec![9, 8]);
    }

    #[test]
    fn ankuendigung_mit_kaputtem_base64() {
        let ankuendigung = PublicKeyAnkuendigung {
            key: "%%%".into(),
            signature: "AAAA".into(),
        };
        assert!(matches!(
            ankuendigung.dekodieren(),
            Err(ProtokollFehler::Base64(_))
        ));
    }

    #[test]
    fn join_parsen() {
        let n = ClientNachricht::parsen(r#"{"type":"join","username":"alice"}"#).unwrap();
        assert_eq!(
            n,
            ClientNachricht::Join {
                username: "alice".into()
            }
        );
    }

    #[test]
    fn message_feldname_ist_camel_case() {
        let n = ClientNachricht::Message {
            encrypted_data: vec![0, 255, 7],
        };
        let json = n.to_json().unwrap();
        assert_eq!(json, r#"{"type":"message","encryptedData":[0,255,7]}"#);

        let zurueck = ClientNachricht::parsen(&json).unwrap();
        assert_eq!(zurueck, n);
    }

    #[test]
    fn exit_parsen() {
        let n = ClientNachricht::parsen(r#"{"type":"exit"}"#).unwrap();
        assert_eq!(n, ClientNachricht::Exit);
        assert_eq!(n.typ(), "exit");
    }

    #[test]
    fn kaputtes_json_wird_erkannt() {
        let fehler = ClientNachricht::parsen("{not json").unwrap_err();
        assert!(matches!(fehler, ProtokollFehler::UngueltigesJson(_)));
    }

    #[test]
    fn fehlender_typ_wird_erkannt() {
        let fehler = ClientNachricht::parsen(r#"{"username":"bob"}"#).unwrap_err();
        assert!(matches!(fehler, ProtokollFehler::FehlenderTyp));
    }

    #[test]
    fn unbekannter_typ_wird_erkannt() {
        let fehler = ClientNachricht::parsen(r#"{"type":"shutdown"}"#).unwrap_err();
        match fehler {
            ProtokollFehler::UnbekannterTyp(t) => assert_eq!(t, "shutdown"),
            andere => panic!("Erwartet UnbekannterTyp, erhalten: {andere:?}"),
        }
    }

    #[test]
    fn ungueltige_bytes_im_ciphertext() {
        let fehler =
            ClientNachricht::parsen(r#"{"type":"message","encryptedData":[1,300]}"#).unwrap_err();
        assert!(matches!(fehler, ProtokollFehler::UngueltigeFelder { .. }));
    }

    #[test]
    fn join_ohne_username() {
        let fehler = ClientNachricht::parsen(r#"{"type":"join"}"#).unwrap_err();
        match fehler {
            ProtokollFehler::UngueltigeFelder { typ, .. } => assert_eq!(typ, "join"),
            andere => panic!("Erwartet UngueltigeFelder, erhalten: {andere:?}"),
        }
    }

    #[test]
    fn server_zeile_json_oder_status() {
        let json = ServerNachricht::PublicKey(PublicKeyAnkuendigung::neu(b"k", b"s"))
            .to_json()
            .unwrap();
        assert!(matches!(
            ServerZeile::klassifizieren(&json),
            ServerZeile::Nachricht(ServerNachricht::PublicKey(_))
        ));

        assert_eq!(
            ServerZeile::klassifizieren("Server is in use"),
            ServerZeile::Status(StatusZeile::ServerBelegt)
        );
    }

    #[test]
    fn unbekanntes_json_ist_statuszeile() {
        let zeile = ServerZeile::klassifizieren(r#"{"type":"other"}"#);
        assert!(matches!(zeile, ServerZeile::Status(StatusZeile::Sonstige(_))));
    }
}
