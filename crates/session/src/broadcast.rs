//! Nachrichten-Broadcast – Verteilt entschluesselte Nachrichten im Prozess
//!
//! Jede erfolgreich entschluesselte Chat-Nachricht wird hier veroeffentlicht.
//! Der Server-Binary gibt sie auf stdout aus, Tests abonnieren sie direkt.
//! Ohne Abonnenten wird die Nachricht verworfen.

use fluester_core::VerbindungsId;
use tokio::sync::broadcast;

/// Groesse des Broadcast-Kanals
const KANAL_GROESSE: usize = 256;

/// Eine entschluesselte Nachricht der aktiven Sitzung
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmpfangeneNachricht {
    pub verbindung: VerbindungsId,
    /// Benutzername oder Platzhalter, falls noch kein `join` kam
    pub username: String,
    pub text: String,
}

impl std::fmt::Display for EmpfangeneNachricht {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.username, self.text)
    }
}

/// Broadcast-Kanal fuer entschluesselte Nachrichten
///
/// Clone teilt den inneren Kanal.
#[derive(Clone)]
pub struct NachrichtenBroadcast {
    tx: broadcast::Sender<EmpfangeneNachricht>,
}

impl NachrichtenBroadcast {
    pub fn neu() -> Self {
        let (tx, _) = broadcast::channel(KANAL_GROESSE);
        Self { tx }
    }

    /// Abonniert alle ab jetzt veroeffentlichten Nachrichten
    pub fn abonnieren(&self) -> broadcast::Receiver<EmpfangeneNachricht> {
        self.tx.subscribe()
    }

    /// Veroeffentlicht eine Nachricht, gibt die Anzahl der Empfaenger zurueck
    pub fn veroeffentlichen(&self, nachricht: EmpfangeneNachricht) -> usize {
        self.tx.send(nachricht).unwrap_or(0)
    }
}

impl Default for NachrichtenBroadcast {
    fn default() -> Self {
        Self::neu()
    }
}
