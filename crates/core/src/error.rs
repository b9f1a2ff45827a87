//! Fehlerarten fuer Fluester
//!
//! Jeder Crate-Fehler laesst sich einer `FehlerArt` zuordnen. Die Art wird
//! als strukturiertes Log-Feld und als Metrik-Label verwendet und bestimmt,
//! ob ein Fehler die Sitzung beendet.

/// Protokollweite Fehlerarten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FehlerArt {
    /// Peer wurde nicht zugelassen (Server belegt)
    ZulassungAbgelehnt,
    /// Signatur des oeffentlichen Schluessels ungueltig
    SignaturUngueltig,
    /// Ciphertext fehlerhaft, falsche Laenge oder Padding-Fehler
    Entschluesselung,
    /// Entschluesselte Bytes sind kein gueltiges UTF-8
    Kodierung,
    /// JSON ungueltig oder unbekannter Nachrichtentyp
    UngueltigeNachricht,
    /// Verschluesselung ohne verifizierten Schluessel
    KeinSchluessel,
    /// Klartext ueberschreitet die OAEP-Kapazitaet
    KapazitaetUeberschritten,
    /// Transport- oder IO-Fehler
    Transport,
    /// Schluesselerzeugung, Import oder sonstiger interner Fehler
    Intern,
}

impl FehlerArt {
    /// Stabiler Bezeichner fuer Logs und Metrik-Labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZulassungAbgelehnt => "admission_rejected",
            Self::SignaturUngueltig => "signature_verification_failed",
            Self::Entschluesselung => "decryption_error",
            Self::Kodierung => "encoding_error",
            Self::UngueltigeNachricht => "malformed_message",
            Self::KeinSchluessel => "no_key",
            Self::KapazitaetUeberschritten => "capacity_exceeded",
            Self::Transport => "transport",
            Self::Intern => "internal",
        }
    }

    /// Gibt true zurueck wenn der Fehler nur die einzelne Nachricht betrifft
    /// und die Sitzung weiterlaufen darf
    pub fn ist_nachrichtenlokal(&self) -> bool {
        matches!(
            self,
            Self::Entschluesselung | Self::Kodierung | Self::UngueltigeNachricht
        )
    }
}

impl std::fmt::Display for FehlerArt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehlerart_anzeige() {
        assert_eq!(FehlerArt::Entschluesselung.to_string(), "decryption_error");
        assert_eq!(
            FehlerArt::SignaturUngueltig.to_string(),
            "signature_verification_failed"
        );
    }

    #[test]
    fn nachrichtenlokale_fehler() {
        assert!(FehlerArt::Entschluesselung.ist_nachrichtenlokal());
        assert!(FehlerArt::Kodierung.ist_nachrichtenlokal());
        assert!(FehlerArt::UngueltigeNachricht.ist_nachrichtenlokal());
        assert!(!FehlerArt::SignaturUngueltig.ist_nachrichtenlokal());
        assert!(!FehlerArt::Transport.ist_nachrichtenlokal());
    }

    #[test]
    fn anzeige_entspricht_metrik_label() {
        for art in [
            FehlerArt::ZulassungAbgelehnt,
            FehlerArt::KeinSchluessel,
            FehlerArt::KapazitaetUeberschritten,
            FehlerArt::Transport,
            FehlerArt::Intern,
        ] {
            assert_eq!(art.to_string(), art.as_str());
        }
        assert_eq!(FehlerArt::KeinSchluessel.as_str(), "no_key");
    }
}
