//! fluester-client – Client-Bibliothek
//!
//! Treibt den Handshake aus Sicht des Clients:
//! 1. Auf `public_key` warten (oder die Ablehnung erkennen)
//! 2. Selbst-Signatur pruefen; bei Fehler sofort schliessen, nichts senden
//! 3. `join` senden und die Willkommenszeile abwarten
//! 4. Jede Chat-Nachricht unter dem verifizierten Schluessel verschluesseln

pub mod connection;
pub mod error;

pub use connection::ServerVerbindung;
pub use error::{ClientFehler, ClientResult};
