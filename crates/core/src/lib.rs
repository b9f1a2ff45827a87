//! fluester-core – Gemeinsame Typen und Fehlerarten
//!
//! Dieses Crate stellt die Bausteine bereit, die von allen anderen
//! Fluester-Crates gemeinsam genutzt werden.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::FehlerArt;
pub use types::VerbindungsId;
