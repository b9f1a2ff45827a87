//! Sitzungs-Tor – Laesst hoechstens eine Verbindung gleichzeitig zu
//!
//! Zulassung ist ein einziges atomares Pruefen-und-Setzen unter einem Mutex.
//! Zwei gleichzeitig eintreffende Verbindungen koennen daher nie beide
//! zugelassen werden.
//!
//! Das Tor ist ein injiziertes Objekt (via `SessionState`), kein globaler
//! Zustand; Tests erzeugen sich ihr eigenes.

use std::sync::Arc;

use fluester_core::VerbindungsId;
use parking_lot::Mutex;

/// Exklusive Zulassung fuer genau eine Sitzung
#[derive(Debug, Default)]
pub struct SitzungsTor {
    aktiv: Mutex<Option<VerbindungsId>>,
}

impl SitzungsTor {
    /// Erstellt ein offenes Tor
    pub fn neu() -> Self {
        Self::default()
    }

    /// Laesst die Verbindung zu, falls keine andere aktiv ist
    ///
    /// Gibt `false` zurueck wenn bereits eine Sitzung besteht. Der Aufrufer
    /// sendet dann die Ablehnung und schliesst die Verbindung.
    pub fn versuche_zulassen(&self, verbindung: VerbindungsId) -> bool {
        let mut aktiv = self.aktiv.lock();
        if aktiv.is_some() {
            return false;
        }
        *aktiv = Some(verbindung);
        true
    }

    /// Gibt das Tor frei, aber nur wenn `verbindung` die aktive ist
    ///
    /// Fuer jede andere Verbindung (oder ein bereits offenes Tor) ein No-op.
    /// Gibt `true` zurueck wenn tatsaechlich freigegeben wurde.
    pub fn freigeben(&self, verbindung: VerbindungsId) -> bool {
        let mut aktiv = self.aktiv.lock();
        if *aktiv == Some(verbindung) {
            *aktiv = None;
            true
        } else {
            false
        }
    }

    /// Die aktuell zugelassene Verbindung
    pub fn aktive_verbindung(&self) -> Option<VerbindungsId> {
        *self.aktiv.lock()
    }

    /// Gibt true zurueck wenn eine Sitzung aktiv ist
    pub fn ist_belegt(&self) -> bool {
        self.aktiv.lock().is_some()
    }

    /// Wie `versuche_zulassen`, liefert aber einen Guard, der beim Drop freigibt
    pub fn zulassen(self: &Arc<Self>, verbindung: VerbindungsId) -> Option<Zulassung> {
        self.versuche_zulassen(verbindung).then(|| Zulassung {
            tor: Arc::clone(self),
            verbindung,
        })
    }
}

/// RAII-Guard einer zugelassenen Verbindung
///
/// Gibt das Tor auf jedem Pfad frei, auch wenn der Verbindungs-Task panict.
#[derive(Debug)]
pub struct Zulassung {
    tor: Arc<SitzungsTor>,
    verbindung: VerbindungsId,
}

impl Zulassung {
    /// Die zugelassene Verbindung
    pub fn verbindung(&self) -> VerbindungsId {
        self.verbindung
    }
}

impl Drop for Zulassung {
    fn drop(&mut self) {
        if self.tor.freigeben(self.verbindung) {
            tracing::debug!(verbindung = %self.verbindung, "Sitzungs-Tor freigegeben");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
