//! Plain-Text-Statuszeilen vom Server
//!
//! Ablehnung, Willkommen und Abschied werden NICHT als JSON gesendet.
//! Der Client erkennt sie daran, dass der JSON-Parse fehlschlaegt.

/// Ablehnung, wenn bereits eine Sitzung aktiv ist
pub const SERVER_BELEGT: &str = "Server is in use";

/// Abschiedstext nach `exit`
pub const ABSCHIED: &str = "👋 You have exited the chat.";

const WILLKOMMEN_PRAEFIX: &str = "✅ Welcome, ";
const WILLKOMMEN_SUFFIX: &str = "!";

/// Statuszeilen des Servers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusZeile {
    /// Server ist belegt, Verbindung wird geschlossen
    ServerBelegt,
    /// Bestaetigung des Beitritts
    Willkommen(String),
    /// Antwort auf `exit`
    Abschied,
    /// Jede andere Zeile (wird dem Benutzer unveraendert angezeigt)
    Sonstige(String),
}

impl StatusZeile {
    /// Erstellt die Willkommenszeile fuer einen Benutzernamen
    pub fn willkommen(username: impl Into<String>) -> Self {
        Self::Willkommen(username.into())
    }

    /// Gibt den Text zurueck, der auf dem Draht gesendet wird
    pub fn text(&self) -> String {
        match self {
            Self::ServerBelegt => SERVER_BELEGT.to_string(),
            Self::Willkommen(name) => format!("{WILLKOMMEN_PRAEFIX}{name}{WILLKOMMEN_SUFFIX}"),
            Self::Abschied => ABSCHIED.to_string(),
            Self::Sonstige(text) => text.clone(),
        }
    }

    /// Erkennt eine empfangene Statuszeile
    pub fn aus_text(text: &str) -> Self {
        if text == SERVER_BELEGT {
            return Self::ServerBelegt;
        }
        if text == ABSCHIED {
            return Self::Abschied;
        }
        if let Some(name) = text
            .strip_prefix(WILLKOMMEN_PRAEFIX)
            .and_then(|rest| rest.strip_suffix(WILLKOMMEN_SUFFIX))
        {
            return Self::Willkommen(name.to_string());
        }
        Self::Sonstige(text.to_string())
    }
}

impl std::fmt::Display for StatusZeile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn willkommen_text() {
        assert_eq!(StatusZeile::willkommen("alice").text(), "✅ Welcome, alice!");
    }

    #[test]
    fn statuszeilen_erkennen() {
        assert_eq!(
            StatusZeile::aus_text("Server is in use"),
            StatusZeile::ServerBelegt
        );
        assert_eq!(
            StatusZeile::aus_text("👋 You have exited the chat."),
            StatusZeile::Abschied
        );
        assert_eq!(
            StatusZeile::aus_text("✅ Welcome, bob!"),
            StatusZeile::Willkommen("bob".into())
        );
        assert_eq!(
            StatusZeile::aus_text("irgendwas"),
            StatusZeile::Sonstige("irgendwas".into())
        );
    }

    #[test]
    fn leerer_name_im_willkommen() {
        // Der Benutzername wird nicht validiert
        let zeile = StatusZeile::willkommen("");
        assert_eq!(StatusZeile::aus_text(&zeile.text()), zeile);
    }
}
