//! fluester-protocol – Wire-Format
//!
//! Definiert alle Nachrichten, die zwischen Client und Server ueber die
//! WebSocket-Verbindung ausgetauscht werden:
//! - JSON-Nachrichten mit `type`-Feld (`public_key`, `join`, `message`, `exit`)
//! - Plain-Text-Statuszeilen (Ablehnung, Willkommen, Abschied)

pub mod control;
pub mod error;
pub mod status;

pub use control::{ClientNachricht, PublicKeyAnkuendigung, ServerNachricht, ServerZeile};
pub use error::{ProtokollFehler, ProtokollResult};
pub use status::StatusZeile;
