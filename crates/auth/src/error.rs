//! Fehlertypen fuer den Auth-Service

use thiserror::Error;

/// Alle moeglichen Fehler im Auth-Service
#[derive(Debug, Error)]
pub enum AuthError {
    // --- Passwort ---
    #[error("Passwort-Hashing fehlgeschlagen: {0}")]
    PasswortHashing(String),

    #[error("Gespeicherter Passwort-Hash ist ungueltig: {0}")]
    HashFormat(String),

    #[error("Passwort darf nicht leer sein")]
    PasswortLeer,

    // --- Anmeldung ---
    #[error("E-Mail oder Passwort falsch")]
    UngueltigeAnmeldedaten,

    #[error("E-Mail bereits vergeben: {0}")]
    EmailVergeben(String),

    #[error("Benutzer nicht gefunden: {0}")]
    BenutzerNichtGefunden(String),

    // --- Token ---
    #[error("Token konnte nicht signiert werden: {0}")]
    Signierung(String),

    #[error("Token-Signatur ungueltig")]
    UngueltigeSignatur,

    #[error("Token fehlerhaft: {0}")]
    FehlerhaftesToken(String),

    #[error("Token abgelaufen")]
    TokenAbgelaufen,

    #[error("Kein Benutzer zu diesem Token")]
    NichtGefunden,

    #[error("Nicht authentifiziert")]
    NichtAuthentifiziert,

    // --- Datenbank ---
    #[error("Datenbankfehler: {0}")]
    Datenbank(#[from] passierschein_db::DbError),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl AuthError {
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Gibt true zurueck fuer gewoehnliche "nicht angemeldet"-Ergebnisse
    ///
    /// Diese Fehler werden nach aussen nicht unterschieden.
    pub fn ist_authentifizierungsfehler(&self) -> bool {
        matches!(
            self,
            Self::UngueltigeSignatur
                | Self::FehlerhaftesToken(_)
                | Self::TokenAbgelaufen
                | Self::NichtGefunden
                | Self::NichtAuthentifiziert
        )
    }
}

/// Result-Alias fuer den Auth-Service
pub type AuthResult<T> = Result<T, AuthError>;
