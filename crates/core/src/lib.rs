//! passierschein-core – Gemeinsame Typen und Zeithilfen
//!
//! Dieses Crate stellt die Bausteine bereit, die von Datenbank-, Auth- und
//! Server-Crate gemeinsam genutzt werden.

pub mod types;
pub mod zeit;

// Re-Exporte fuer bequemen Zugriff
pub use types::UserId;
pub use zeit::ms_zu_datum;
