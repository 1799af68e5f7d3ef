//! In-Memory-Implementierung des UserRepository
//!
//! Haelt alle Benutzer in einer HashMap hinter einem `RwLock`. Jede Operation
//! nimmt den Lock genau einmal, damit ist jedes Update pro Datensatz atomar.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use passierschein_core::UserId;

use crate::error::DbError;
use crate::models::{BenutzerRecord, BenutzerUpdate, NeuerBenutzer};
use crate::repository::{DbResult, UserRepository};

/// Fluechtiger Benutzer-Speicher
#[derive(Debug, Default)]
pub struct MemoryDb {
    benutzer: RwLock<HashMap<UserId, BenutzerRecord>>,
}

impl MemoryDb {
    /// Erstellt einen leeren Speicher
    pub fn neu() -> Self {
        Self::default()
    }

    /// Anzahl gespeicherter Benutzer
    pub async fn anzahl(&self) -> usize {
        self.benutzer.read().await.len()
    }
}

impl UserRepository for MemoryDb {
    async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
        let email = data.email.trim();
        let mut benutzer = self.benutzer.write().await;

        if benutzer.values().any(|b| b.email == email) {
            return Err(DbError::Eindeutigkeit(format!(
                "E-Mail '{email}' bereits vergeben"
            )));
        }

        let record = BenutzerRecord {
            id: UserId::new(),
            email: email.to_string(),
            name: data.name.map(str::to_string),
            lastname: data.lastname.map(str::to_string),
            password_hash: data.password_hash.to_string(),
            role: data.role,
            image: data.image.map(str::to_string),
            token: None,
            created_at: Utc::now(),
        };
        benutzer.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: UserId) -> DbResult<Option<BenutzerRecord>> {
        Ok(self.benutzer.read().await.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>> {
        let email = email.trim();
        Ok(self
            .benutzer
            .read()
            .await
            .values()
            .find(|b| b.email == email)
            .cloned())
    }

    async fn get_by_token(&self, token: &str) -> DbResult<Option<BenutzerRecord>> {
        Ok(self
            .benutzer
            .read()
            .await
            .values()
            .find(|b| b.token.as_ref().is_some_and(|t| t.wert == token))
            .cloned())
    }

    async fn update(&self, id: UserId, data: BenutzerUpdate) -> DbResult<BenutzerRecord> {
        let mut benutzer = self.benutzer.write().await;
        let record = benutzer
            .get_mut(&id)
            .ok_or_else(|| DbError::nicht_gefunden(format!("User {id}")))?;
        data.anwenden(record);
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SitzungsToken;

    fn neuer(email: &str) -> NeuerBenutzer<'_> {
        NeuerBenutzer {
            email,
            password_hash: "$argon2id$test",
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn erstellen_und_laden() {
        let db = MemoryDb::neu();
        let user = db.create(neuer("  alice@example.org ")).await.unwrap();

        assert_eq!(user.email, "alice@example.org");
        assert!(user.token.is_none());

        let geladen = db.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(geladen.email, user.email);

        let per_mail = db.get_by_email("alice@example.org").await.unwrap();
        assert!(per_mail.is_some());
    }

    #[tokio::test]
    async fn doppelte_email_abgelehnt() {
        let db = MemoryDb::neu();
        db.create(neuer("bob@example.org")).await.unwrap();
        let err = db.create(neuer("bob@example.org")).await.unwrap_err();
        assert!(err.ist_eindeutigkeit());
        assert_eq!(db.anzahl().await, 1);
    }

    #[tokio::test]
    async fn suche_nach_token() {
        let db = MemoryDb::neu();
        let user = db.create(neuer("carol@example.org")).await.unwrap();

        assert!(db.get_by_token("t1").await.unwrap().is_none());

        db.update(
            user.id,
            BenutzerUpdate::nur_token(Some(SitzungsToken {
                wert: "t1".into(),
                laeuft_ab_am: 1,
            })),
        )
        .await
        .unwrap();

        let gefunden = db.get_by_token("t1").await.unwrap().unwrap();
        assert_eq!(gefunden.id, user.id);
        assert!(db.get_by_token("t2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_unbekannter_benutzer() {
        let db = MemoryDb::neu();
        let err = db
            .update(UserId::new(), BenutzerUpdate::nur_token(None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NichtGefunden(_)));
    }
}
