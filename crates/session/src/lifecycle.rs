//! Sitzungs-Lebenszyklus
//!
//! ## State Machine
//! ```text
//! WartetAufBeitritt --join--> Beigetreten --message ok--> Aktiv
//!        |                        |                         |
//!        +--------- exit / Verbindungsende / Transportfehler --+--> Geschlossen
//! ```
//!
//! `Aktiv` ist rein beobachtend: es markiert die erste erfolgreich
//! entschluesselte Nachricht. `Geschlossen` ist terminal.

use fluester_core::VerbindungsId;

use crate::error::{SessionFehler, SessionResult};

/// Anzeige fuer einen noch unbekannten Benutzernamen
pub const UNBEKANNTER_BENUTZER: &str = "<unbekannt>";

/// Zustand der Sitzung
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitzungsZustand {
    /// Zugelassen, Schluessel angekuendigt, noch kein `join`
    WartetAufBeitritt,
    /// `join` empfangen und bestaetigt
    Beigetreten,
    /// Mindestens eine Nachricht entschluesselt
    Aktiv,
    /// Beendet (terminal)
    Geschlossen,
}

impl std::fmt::Display for SitzungsZustand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::WartetAufBeitritt => "WartetAufBeitritt",
            Self::Beigetreten => "Beigetreten",
            Self::Aktiv => "Aktiv",
            Self::Geschlossen => "Geschlossen",
        };
        f.write_str(name)
    }
}

/// Die eine zugelassene Sitzung
#[derive(Debug, Clone)]
pub struct Sitzung {
    verbindung: VerbindungsId,
    username: Option<String>,
    zustand: SitzungsZustand,
}

impl Sitzung {
    /// Neue Sitzung direkt nach der Zulassung
    pub fn neu(verbindung: VerbindungsId) -> Self {
        Self {
            verbindung,
            username: None,
            zustand: SitzungsZustand::WartetAufBeitritt,
        }
    }

    pub fn verbindung(&self) -> VerbindungsId {
        self.verbindung
    }

    pub fn zustand(&self) -> SitzungsZustand {
        self.zustand
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Benutzername oder Platzhalter fuer Logs
    pub fn anzeige_name(&self) -> &str {
        self.username().unwrap_or(UNBEKANNTER_BENUTZER)
    }

    pub fn ist_geschlossen(&self) -> bool {
        self.zustand == SitzungsZustand::Geschlossen
    }

    /// Verarbeitet `join`
    ///
    /// Ein wiederholtes `join` aktualisiert nur den Namen, der Zustand geht
    /// nicht zurueck.
    pub fn beitreten(&mut self, username: impl Into<String>) -> SessionResult<()> {
        if self.ist_geschlossen() {
            return Err(SessionFehler::UngueltigerUebergang {
                zustand: self.zustand,
                ereignis: "join",
            });
        }
        self.username = Some(username.into());
        if self.zustand == SitzungsZustand::WartetAufBeitritt {
            self.zustand = SitzungsZustand::Beigetreten;
        }
        Ok(())
    }

    /// Markiert eine erfolgreich entschluesselte Nachricht
    pub fn nachricht_entschluesselt(&mut self) {
        if self.zustand == SitzungsZustand::Beigetreten {
            self.zustand = SitzungsZustand::Aktiv;
        }
    }

    /// Schliesst die Sitzung; auf einer geschlossenen Sitzung ein No-op
    ///
    /// Gibt `true` zurueck wenn die Sitzung durch diesen Aufruf geschlossen wurde.
    pub fn schliessen(&mut self) -> bool {
        if self.ist_geschlossen() {
            return false;
        }
        self.zustand = SitzungsZustand::Geschlossen;
        self.username = None;
        true
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
