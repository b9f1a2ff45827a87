//! Server-Seite des Handshakes
//!
//! Reihenfolge:
//! 1. Direkt nach der Zulassung: `public_key` mit Schluessel und Selbst-Signatur
//! 2. Der Client verifiziert und sendet `join`
//! 3. Der Server merkt sich den Namen und antwortet mit der Willkommenszeile

use fluester_crypto::ServerSchluessel;
use fluester_protocol::{ServerNachricht, StatusZeile};

use crate::error::SessionResult;
use crate::lifecycle::Sitzung;

/// Serialisiert die Schluessel-Ankuendigung als JSON-Text-Frame
pub fn schluessel_ankuendigung(schluessel: &ServerSchluessel) -> SessionResult<String> {
    let nachricht = ServerNachricht::PublicKey(schluessel.attestierung().zu_ankuendigung());
    Ok(nachricht.to_json()?)
}

/// Verarbeitet `join` und liefert die Willkommenszeile
///
/// Der Benutzername wird nicht validiert.
pub fn beitritt_bestaetigen(sitzung: &mut Sitzung, username: String) -> SessionResult<StatusZeile> {
    let willkommen = StatusZeile::willkommen(username.as_str());
    sitzung.beitreten(username)?;
    Ok(willkommen)
}
