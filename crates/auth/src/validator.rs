//! Token-Pruefung und Aufloesung zum Benutzer
//!
//! `validieren` prueft nur Signatur und Claims. `aufloesen` verlangt
//! zusaetzlich, dass das Token exakt dem am Benutzer gespeicherten Wert
//! entspricht und weder laut Claim noch laut Datensatz abgelaufen ist.
//! Ein durch erneute Anmeldung ersetztes Token ist damit sofort ungueltig.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use passierschein_core::UserId;
use passierschein_db::{BenutzerRecord, UserRepository};

use crate::{
    error::{AuthError, AuthResult},
    token::{Signaturschluessel, TokenClaims},
};

/// Prueft Session-Tokens gegen Schluessel und Benutzer-Speicher
pub struct TokenPruefer<U: UserRepository> {
    schluessel: Arc<Signaturschluessel>,
    user_repo: Arc<U>,
}

impl<U: UserRepository> TokenPruefer<U> {
    pub fn neu(schluessel: Arc<Signaturschluessel>, user_repo: Arc<U>) -> Self {
        Self {
            schluessel,
            user_repo,
        }
    }

    /// Prueft die Signatur und liefert die Benutzer-ID aus dem Token
    pub fn validieren(&self, token: &str) -> AuthResult<UserId> {
        self.claims(token)?.user_id()
    }

    /// Prueft die Signatur und liefert alle Claims
    pub fn claims(&self, token: &str) -> AuthResult<TokenClaims> {
        self.schluessel.dekodieren(token)
    }

    /// Loest ein Token zum aktuell angemeldeten Benutzer auf
    pub async fn aufloesen(&self, token: &str) -> AuthResult<BenutzerRecord> {
        self.aufloesen_zu(token, Utc::now()).await
    }

    /// Wie [`aufloesen`](Self::aufloesen) mit vorgegebener Uhrzeit
    pub async fn aufloesen_zu(
        &self,
        token: &str,
        jetzt: DateTime<Utc>,
    ) -> AuthResult<BenutzerRecord> {
        let claims = self.claims(token)?;
        let user_id = claims.user_id()?;

        if !claims.ist_gueltig_zu(jetzt) {
            return Err(AuthError::TokenAbgelaufen);
        }

        let benutzer = self
            .user_repo
            .get_by_token(token)
            .await?
            .filter(|b| b.id == user_id)
            .ok_or(AuthError::NichtGefunden)?;

        let gespeichert = benutzer.token.as_ref().ok_or(AuthError::NichtGefunden)?;
        if gespeichert.wert != token {
            return Err(AuthError::NichtGefunden);
        }
        if !gespeichert.ist_gueltig_zu(jetzt.timestamp_millis()) {
            return Err(AuthError::TokenAbgelaufen);
        }

        Ok(benutzer)
    }
}
