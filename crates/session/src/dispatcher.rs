//! Nachrichten-Verteiler – Routet Client-Nachrichten
//!
//! Jeder Text-Frame wird genau einem von `join`, `message` oder `exit`
//! zugeordnet. Nachrichtenlokale Fehler (siehe
//! `FehlerArt::ist_nachrichtenlokal`) werden geloggt und gezaehlt, aber nie
//! an den Client zurueckgemeldet und beenden die Sitzung nicht.

use std::sync::Arc;

use fluester_protocol::{ClientNachricht, StatusZeile};

use crate::broadcast::EmpfangeneNachricht;
use crate::error::{SessionFehler, SessionResult};
use crate::handshake;
use crate::lifecycle::Sitzung;
use crate::server_state::SessionState;

/// Was die Verbindung nach einer Nachricht tun soll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aktion {
    /// Nichts senden
    Keine,
    /// Statuszeile senden, Sitzung laeuft weiter
    Antworten(StatusZeile),
    /// Statuszeile senden und Verbindung schliessen
    Beenden(StatusZeile),
}

/// Zentraler Nachrichten-Verteiler einer Verbindung
pub struct NachrichtenVerteiler {
    state: Arc<SessionState>,
}

impl NachrichtenVerteiler {
    /// Erstellt einen neuen Verteiler
    pub fn neu(state: Arc<SessionState>) -> Self {
        Self { state }
    }

    /// Verarbeitet einen eingehenden Text-Frame
    ///
    /// Nachrichten werden strikt in Empfangsreihenfolge verarbeitet; der
    /// Aufrufer ruft diese Methode sequentiell auf. Nachrichtenlokale Fehler
    /// ergeben `Aktion::Keine`, alle anderen beenden die Verbindung.
    pub fn verarbeiten(&self, text: &str, sitzung: &mut Sitzung) -> SessionResult<Aktion> {
        match self.dispatch(text, sitzung) {
            Ok(aktion) => Ok(aktion),
            Err(fehler) => self.fehler_behandeln(sitzung, fehler),
        }
    }

    /// Entscheidet anhand der Fehlerart, ob die Sitzung weiterlaeuft
    ///
    /// Nachrichtenlokale Fehler werden geloggt, gezaehlt und verworfen.
    /// Alle anderen gehen an den Aufrufer zurueck.
    pub fn fehler_behandeln(&self, sitzung: &Sitzung, fehler: SessionFehler) -> SessionResult<Aktion> {
        if !fehler.art().ist_nachrichtenlokal() {
            return Err(fehler);
        }
        let art = fehler.art();
        self.state.metriken.fehler_zaehlen(art);
        tracing::warn!(
            verbindung = %sitzung.verbindung(),
            username = sitzung.anzeige_name(),
            art = %art,
            fehler = %fehler,
            "Nachricht verworfen"
        );
        Ok(Aktion::Keine)
    }

    fn dispatch(&self, text: &str, sitzung: &mut Sitzung) -> SessionResult<Aktion> {
        let nachricht = ClientNachricht::parsen(text)?;
        tracing::trace!(
            verbindung = %sitzung.verbindung(),
            typ = nachricht.typ(),
            "Nachricht empfangen"
        );

        match nachricht {
            ClientNachricht::Join { username } => {
                let willkommen = handshake::beitritt_bestaetigen(sitzung, username)?;
                tracing::info!(
                    verbindung = %sitzung.verbindung(),
                    username = sitzung.anzeige_name(),
                    "Benutzer beigetreten"
                );
                Ok(Aktion::Antworten(willkommen))
            }

            ClientNachricht::Message { encrypted_data } => {
                let klartext = self.state.schluessel.entschluesseln_text(&encrypted_data)?;
                sitzung.nachricht_entschluesselt();
                self.state.metriken.nachricht_entschluesselt();

                tracing::info!(
                    verbindung = %sitzung.verbindung(),
                    username = sitzung.anzeige_name(),
                    text = %klartext,
                    "Nachricht entschluesselt"
                );
                self.state.nachrichten.veroeffentlichen(EmpfangeneNachricht {
                    verbindung: sitzung.verbindung(),
                    username: sitzung.anzeige_name().to_string(),
                    text: klartext,
                });
                Ok(Aktion::Keine)
            }

            ClientNachricht::Exit => {
                tracing::info!(
                    verbindung = %sitzung.verbindung(),
                    username = sitzung.anzeige_name(),
                    "Benutzer hat den Chat verlassen"
                );
                Ok(Aktion::Beenden(StatusZeile::Abschied))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{SitzungsZustand, UNBEKANNTER_BENUTZER};
    use crate::test_util::{schluessel, test_state};
    use fluester_core::VerbindungsId;
    use fluester_crypto::SichererKanal;

    fn verschluesselt(text: &str) -> String {
        let mut kanal = SichererKanal::neu();
        kanal
            .schluessel_uebernehmen(&schluessel().attestierung().zu_ankuendigung())
            .unwrap();
        kanal.verschluesseln(text).unwrap().to_json().unwrap()
    }

    fn fehler(state: &SessionState, kind: &str) -> u64 {
        state
            .metriken
            .message_errors_total
            .with_label_values(&[kind])
            .get()
    }

    #[test]
    fn join_liefert_willkommen() {
        let state = test_state();
        let verteiler = NachrichtenVerteiler::neu(Arc::clone(&state));
        let mut sitzung = Sitzung::neu(VerbindungsId::new());

        let aktion = verteiler
            .verarbeiten(r#"{"type":"join","username":"alice"}"#, &mut sitzung)
            .unwrap();
        assert_eq!(aktion, Aktion::Antworten(StatusZeile::willkommen("alice")));
        assert_eq!(sitzung.zustand(), SitzungsZustand::Beigetreten);
    }

    #[tokio::test]
    async fn nachricht_wird_entschluesselt_und_veroeffentlicht() {
        let state = test_state();
        let mut rx = state.nachrichten_abonnieren();
        let verteiler = NachrichtenVerteiler::neu(Arc::clone(&state));
        let mut sitzung = Sitzung::neu(VerbindungsId::new());
        sitzung.beitreten("alice").unwrap();

        let aktion = verteiler
            .verarbeiten(&verschluesselt("hallo welt"), &mut sitzung)
            .unwrap();
        assert_eq!(aktion, Aktion::Keine);
        assert_eq!(sitzung.zustand(), SitzungsZustand::Aktiv);
        assert_eq!(state.metriken.messages_decrypted_total.get(), 1);

        let empfangen = rx.recv().await.unwrap();
        assert_eq!(empfangen.username, "alice");
        assert_eq!(empfangen.text, "hallo welt");
        assert_eq!(empfangen.verbindung, sitzung.verbindung());
    }

    #[tokio::test]
    async fn nachricht_vor_join_mit_platzhalter() {
        let state = test_state();
        let mut rx = state.nachrichten_abonnieren();
        let verteiler = NachrichtenVerteiler::neu(Arc::clone(&state));
        let mut sitzung = Sitzung::neu(VerbindungsId::new());

        verteiler
            .verarbeiten(&verschluesselt("frueh"), &mut sitzung)
            .unwrap();
        assert_eq!(sitzung.zustand(), SitzungsZustand::WartetAufBeitritt);
        assert_eq!(rx.recv().await.unwrap().username, UNBEKANNTER_BENUTZER);
    }

    #[test]
    fn exit_beendet() {
        let state = test_state();
        let verteiler = NachrichtenVerteiler::neu(state);
        let mut sitzung = Sitzung::neu(VerbindungsId::new());

        let aktion = verteiler.verarbeiten(r#"{"type":"exit"}"#, &mut sitzung).unwrap();
        assert_eq!(aktion, Aktion::Beenden(StatusZeile::Abschied));
    }

    #[test]
    fn fehlerhafte_nachrichten_werden_ignoriert() {
        let state = test_state();
        let verteiler = NachrichtenVerteiler::neu(Arc::clone(&state));
        let mut sitzung = Sitzung::neu(VerbindungsId::new());
        sitzung.beitreten("alice").unwrap();

        for text in [
            "kein json",
            r#"{"username":"ohne typ"}"#,
            r#"{"type":"tanzen"}"#,
            r#"{"type":"join"}"#,
            r#"{"type":"message","encryptedData":"text statt bytes"}"#,
        ] {
            assert_eq!(verteiler.verarbeiten(text, &mut sitzung).unwrap(), Aktion::Keine);
        }
        assert_eq!(fehler(&state, "malformed_message"), 5);
        assert_eq!(sitzung.zustand(), SitzungsZustand::Beigetreten);
        assert_eq!(sitzung.username(), Some("alice"));
    }

    #[test]
    fn kaputter_ciphertext_laesst_sitzung_weiterlaufen() {
        let state = test_state();
        let verteiler = NachrichtenVerteiler::neu(Arc::clone(&state));
        let mut sitzung = Sitzung::neu(VerbindungsId::new());
        sitzung.beitreten("alice").unwrap();

        let aktion = verteiler
            .verarbeiten(r#"{"type":"message","encryptedData":[1,2,3]}"#, &mut sitzung)
            .unwrap();
        assert_eq!(aktion, Aktion::Keine);
        assert_eq!(fehler(&state, "decryption_error"), 1);
        assert_eq!(sitzung.zustand(), SitzungsZustand::Beigetreten);

        // Die naechste gueltige Nachricht wird normal verarbeitet
        verteiler
            .verarbeiten(&verschluesselt("weiter"), &mut sitzung)
            .unwrap();
        assert_eq!(sitzung.zustand(), SitzungsZustand::Aktiv);
        assert_eq!(state.metriken.messages_decrypted_total.get(), 1);
    }

    #[test]
    fn join_auf_geschlossener_sitzung_wird_verworfen() {
        let state = test_state();
        let verteiler = NachrichtenVerteiler::neu(Arc::clone(&state));
        let mut sitzung = Sitzung::neu(VerbindungsId::new());
        sitzung.schliessen();

        let aktion = verteiler
            .verarbeiten(r#"{"type":"join","username":"x"}"#, &mut sitzung)
            .unwrap();
        assert_eq!(aktion, Aktion::Keine);
        assert!(sitzung.ist_geschlossen());
        assert_eq!(fehler(&state, "malformed_message"), 1);
    }

    #[test]
    fn zu_grosse_nachricht_ist_nachrichtenlokal() {
        let state = test_state();
        let verteiler = NachrichtenVerteiler::neu(Arc::clone(&state));
        let sitzung = Sitzung::neu(VerbindungsId::new());

        let aktion = verteiler
            .fehler_behandeln(
                &sitzung,
                SessionFehler::NachrichtZuGross {
                    bytes: 70 * 1024,
                    maximal: 64 * 1024,
                },
            )
            .unwrap();
        assert_eq!(aktion, Aktion::Keine);
        assert_eq!(fehler(&state, "malformed_message"), 1);
    }

    #[test]
    fn transportfehler_wird_weitergereicht() {
        let state = test_state();
        let verteiler = NachrichtenVerteiler::neu(Arc::clone(&state));
        let sitzung = Sitzung::neu(VerbindungsId::new());

        let ergebnis = verteiler.fehler_behandeln(
            &sitzung,
            SessionFehler::Io(std::io::Error::other("reset")),
        );
        assert!(matches!(ergebnis, Err(SessionFehler::Io(_))));
        // Zaehlen ist Sache der Verbindung, die daran endet
        assert_eq!(fehler(&state, "transport"), 0);
    }
}
