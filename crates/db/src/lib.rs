//! passierschein-db – Benutzer-Datenspeicher
//!
//! Dieses Crate stellt das Repository-Pattern fuer Benutzerkonten bereit.
//! `SqliteDb` ist das persistente Backend, `MemoryDb` ein In-Process-Speicher
//! fuer Tests und Einzelprozess-Betrieb.

pub mod error;
pub mod memory;
pub mod models;
pub mod repository;
pub mod sqlite;

pub use error::DbError;
pub use memory::MemoryDb;
pub use models::{BenutzerRecord, BenutzerUpdate, NeuerBenutzer, SitzungsToken};
pub use repository::{DatabaseConfig, DbResult, UserRepository};
pub use sqlite::SqliteDb;
