//! # fluester-crypto
//!
//! Schluessel und Verschluesselung fuer Fluester.
//!
//! ## Module
//! - `keypair` - RSA-Schluesselpaar des Servers, Entschluesselung
//! - `identity` - Selbst-Attestierung des oeffentlichen Schluessels
//! - `channel` - Client-seitige Verschluesselung unter dem verifizierten Schluessel
//! - `error` - Fehlertypen
//!
//! ## Vertrauensmodell
//! Die Attestierung ist eine Selbst-Signatur: Sie beweist nur, dass der
//! Server den privaten Schluessel zum angekuendigten oeffentlichen Schluessel
//! besitzt. Sie schuetzt gegen einen unterwegs veraenderten Schluessel, aber
//! nicht gegen einen Angreifer, der schon den ersten Kontakt abfaengt.
//!
//! ## Timing-Seitenkanal
//! `rsa` 0.9 entschluesselt nicht in konstanter Zeit (RUSTSEC-2023-0071,
//! "Marvin"). Der Server entschluesselt jeden Ciphertext, den der zugelassene
//! Peer schickt. Ein Peer, der viele Ciphertexte senden und die Antwortzeiten
//! praezise messen kann, koennte daraus Informationen ueber den privaten
//! Schluessel gewinnen. Ein Fix in `rsa` steht noch aus.

pub mod channel;
pub mod error;
pub mod identity;
pub mod keypair;

// Bequeme Re-Exports
pub use channel::SichererKanal;
pub use error::{CryptoError, CryptoResult};
pub use identity::Attestierung;
pub use keypair::{oaep_kapazitaet, ServerSchluessel, MINDEST_BITS, STANDARD_BITS};
