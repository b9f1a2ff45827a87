//! fluester-session – Exklusive Chat-Sitzung ueber WebSocket
//!
//! Dieser Crate implementiert die Server-Seite von Fluester: Er nimmt
//! WebSocket-Verbindungen an, laesst genau einen Peer zu, kuendigt den
//! signierten oeffentlichen Schluessel an und entschluesselt die Nachrichten
//! der aktiven Sitzung.
//!
//! ## Architektur
//!
//! ```text
//! WebSocket Listener (SessionServer)
//!     |
//!     v
//! SitzungsTor (hoechstens eine Verbindung zugelassen)
//!     |  abgelehnt -> "Server is in use" + Close
//!     v
//! ClientVerbindung (pro Verbindung ein Task)
//!     |  public_key senden, dann Empfangsschleife
//!     |  State Machine: WartetAufBeitritt -> Beigetreten -> Aktiv -> Geschlossen
//!     v
//! NachrichtenVerteiler (join / message / exit)
//!     |
//!     +-- ServerSchluessel (RSA-OAEP-Entschluesselung)
//!     +-- NachrichtenBroadcast (entschluesselte Nachrichten an Abonnenten)
//! ```

pub mod broadcast;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod handshake;
pub mod lifecycle;
pub mod server_state;
pub mod tcp;

// Bequeme Re-Exporte
pub use broadcast::{EmpfangeneNachricht, NachrichtenBroadcast};
pub use connection::ClientVerbindung;
pub use dispatcher::{Aktion, NachrichtenVerteiler};
pub use error::{SessionFehler, SessionResult};
pub use gate::{SitzungsTor, Zulassung};
pub use lifecycle::{Sitzung, SitzungsZustand};
pub use server_state::{SessionConfig, SessionState};
pub use tcp::SessionServer;
