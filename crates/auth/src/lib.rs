//! passierschein-auth – Zugangsdaten und Session-Tokens
//!
//! Dieses Crate implementiert:
//! - Passwort-Hashing mit Argon2id (`PasswortHasher`)
//! - Ausstellung signierter Session-Tokens (`TokenAussteller`, JWT)
//! - Pruefung und Aufloesung von Tokens zum Benutzer (`TokenPruefer`)
//! - Benutzerkonten mit geschuetztem Passwortfeld (`Benutzerkonto`)
//! - AuthService (Registrierung, Login, Logout, Passwortwechsel)

pub mod error;
pub mod konto;
pub mod password;
pub mod service;
pub mod token;
pub mod validator;

// Bequeme Re-Exporte
pub use error::{AuthError, AuthResult};
pub use konto::Benutzerkonto;
pub use password::{PasswortHasher, PasswortParameter};
pub use service::{AuthService, NeuesKonto};
pub use token::{
    Signaturschluessel, SignaturAlgorithmus, TokenAussteller, TokenClaims, TokenEinstellungen,
    MAX_GUELTIGKEIT_MINUTEN, STANDARD_GUELTIGKEIT_MINUTEN,
};
pub use validator::TokenPruefer;
