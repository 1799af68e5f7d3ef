//! Benutzerkonto mit geschuetztem Passwortfeld
//!
//! Ein neues Passwort wird zunaechst nur vorgemerkt. Erst beim Speichern wird
//! es gehasht, und zwar genau dann, wenn seit dem Laden eines gesetzt wurde.
//! Ein bereits gehashter Wert wird so nie ein zweites Mal gehasht.

use passierschein_db::{BenutzerRecord, BenutzerUpdate, UserRepository};

use crate::{
    error::{AuthError, AuthResult},
    password::PasswortHasher,
};

/// Geladener Benutzer mit optional vorgemerktem neuem Passwort
pub struct Benutzerkonto {
    record: BenutzerRecord,
    neues_passwort: Option<String>,
}

impl std::fmt::Debug for Benutzerkonto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Benutzerkonto")
            .field("record", &self.record)
            .field("neues_passwort", &self.neues_passwort.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Benutzerkonto {
    pub fn aus_record(record: BenutzerRecord) -> Self {
        Self {
            record,
            neues_passwort: None,
        }
    }

    pub fn record(&self) -> &BenutzerRecord {
        &self.record
    }

    pub fn into_record(self) -> BenutzerRecord {
        self.record
    }

    /// Merkt ein neues Klartext-Passwort zum Speichern vor
    pub fn passwort_setzen(&mut self, klartext: impl Into<String>) -> AuthResult<()> {
        let klartext = klartext.into();
        if klartext.is_empty() {
            return Err(AuthError::PasswortLeer);
        }
        self.neues_passwort = Some(klartext);
        Ok(())
    }

    /// Gibt true zurueck wenn ein Passwort vorgemerkt ist
    pub fn passwort_geaendert(&self) -> bool {
        self.neues_passwort.is_some()
    }

    /// Speichert ein vorgemerktes Passwort als Hash
    ///
    /// Ohne vorgemerktes Passwort passiert nichts, auch kein Schreibzugriff.
    /// Gibt true zurueck wenn gespeichert wurde.
    pub async fn speichern<U: UserRepository>(
        &mut self,
        user_repo: &U,
        hasher: &PasswortHasher,
    ) -> AuthResult<bool> {
        self.speichern_mit(user_repo, hasher, BenutzerUpdate::default())
            .await
    }

    /// Wie [`speichern`](Self::speichern), schreibt `zusatz` aber im selben Update
    ///
    /// Hash und Zusatzfelder landen so atomar im Datensatz. Ohne vorgemerktes
    /// Passwort wird auch `zusatz` nicht geschrieben.
    pub async fn speichern_mit<U: UserRepository>(
        &mut self,
        user_repo: &U,
        hasher: &PasswortHasher,
        zusatz: BenutzerUpdate,
    ) -> AuthResult<bool> {
        let Some(klartext) = self.neues_passwort.clone() else {
            return Ok(false);
        };

        let hash = hasher.hashen_async(klartext).await?;
        self.record = user_repo
            .update(
                self.record.id,
                BenutzerUpdate {
                    password_hash: Some(hash),
                    ..zusatz
                },
            )
            .await?;
        self.neues_passwort = None;

        tracing::debug!(user_id = %self.record.id, "Neuer Passwort-Hash gespeichert");
        Ok(true)
    }
}
