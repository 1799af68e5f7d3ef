//! Auth-Service fuer Passierschein
//!
//! Zentraler Einstiegspunkt fuer Registrierung, Anmeldung, Abmeldung,
//! Passwortwechsel und die Aufloesung von Session-Tokens. Hashing laeuft auf
//! dem Blocking-Threadpool, alles andere direkt im aufrufenden Task.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use passierschein_core::UserId;
use passierschein_db::{
    BenutzerRecord, BenutzerUpdate, NeuerBenutzer, SitzungsToken, UserRepository,
};

use crate::{
    error::{AuthError, AuthResult},
    konto::Benutzerkonto,
    password::PasswortHasher,
    token::{Signaturschluessel, TokenAussteller, TokenEinstellungen},
    validator::TokenPruefer,
};

/// Eingabe fuer die Registrierung
#[derive(Debug, Clone, Default)]
pub struct NeuesKonto<'a> {
    pub email: &'a str,
    pub passwort: &'a str,
    pub name: Option<&'a str>,
    pub lastname: Option<&'a str>,
    pub image: Option<&'a str>,
}

/// Auth-Service – zentraler Einstiegspunkt fuer alle Authentifizierungsvorgaenge
pub struct AuthService<U: UserRepository> {
    user_repo: Arc<U>,
    hasher: PasswortHasher,
    aussteller: TokenAussteller,
    pruefer: TokenPruefer<U>,
}

impl<U: UserRepository> AuthService<U> {
    /// Erstellt einen neuen AuthService
    pub fn neu(user_repo: Arc<U>, hasher: PasswortHasher, token: &TokenEinstellungen) -> Self {
        let schluessel = Arc::new(Signaturschluessel::neu(token));
        Self {
            aussteller: TokenAussteller::neu(Arc::clone(&schluessel), token.gueltigkeit),
            pruefer: TokenPruefer::neu(schluessel, Arc::clone(&user_repo)),
            user_repo,
            hasher,
        }
    }

    pub fn pruefer(&self) -> &TokenPruefer<U> {
        &self.pruefer
    }

    /// Registriert einen neuen Benutzer
    ///
    /// Der Datensatz entsteht mit gesetztem Hash und ohne Token.
    pub async fn registrieren(&self, eingabe: NeuesKonto<'_>) -> AuthResult<BenutzerRecord> {
        if self.user_repo.get_by_email(eingabe.email).await?.is_some() {
            return Err(AuthError::EmailVergeben(eingabe.email.trim().to_string()));
        }

        if eingabe.passwort.is_empty() {
            return Err(AuthError::PasswortLeer);
        }
        let passwort_hash = self.hasher.hashen_async(eingabe.passwort.to_string()).await?;

        let benutzer = self
            .user_repo
            .create(NeuerBenutzer {
                email: eingabe.email,
                password_hash: &passwort_hash,
                name: eingabe.name,
                lastname: eingabe.lastname,
                role: 0,
                image: eingabe.image,
            })
            .await
            .map_err(|e| {
                if e.ist_eindeutigkeit() {
                    AuthError::EmailVergeben(eingabe.email.trim().to_string())
                } else {
                    e.into()
                }
            })?;

        tracing::info!(user_id = %benutzer.id, "Neuer Benutzer registriert");
        Ok(benutzer)
    }

    /// Meldet einen Benutzer an und stellt ein neues Session-Token aus
    ///
    /// Ein zuvor ausgestelltes Token wird dabei ersetzt und ist ab sofort ungueltig.
    pub async fn anmelden(
        &self,
        email: &str,
        passwort: &str,
    ) -> AuthResult<(BenutzerRecord, SitzungsToken)> {
        self.anmelden_zu(email, passwort, Utc::now()).await
    }

    /// Wie [`anmelden`](Self::anmelden) mit vorgegebener Uhrzeit
    pub async fn anmelden_zu(
        &self,
        email: &str,
        passwort: &str,
        jetzt: DateTime<Utc>,
    ) -> AuthResult<(BenutzerRecord, SitzungsToken)> {
        let benutzer = self
            .user_repo
            .get_by_email(email)
            .await?
            .ok_or(AuthError::UngueltigeAnmeldedaten)?;

        let korrekt = self
            .hasher
            .verifizieren_async(passwort.to_string(), benutzer.password_hash.clone())
            .await?;
        if !korrekt {
            tracing::warn!(user_id = %benutzer.id, "Fehlgeschlagener Login-Versuch");
            return Err(AuthError::UngueltigeAnmeldedaten);
        }

        // Hash mit veralteten Parametern bei Gelegenheit erneuern
        let mut konto = Benutzerkonto::aus_record(benutzer);
        if self.hasher.braucht_rehash(&konto.record().password_hash)? {
            konto.passwort_setzen(passwort)?;
            konto.speichern(self.user_repo.as_ref(), &self.hasher).await?;
            tracing::info!(user_id = %konto.record().id, "Passwort-Hash mit neuen Parametern erneuert");
        }
        let benutzer = konto.into_record();

        let token = self.aussteller.ausstellen_zu(benutzer.id, jetzt)?;
        let benutzer = self
            .user_repo
            .update(benutzer.id, BenutzerUpdate::nur_token(Some(token.clone())))
            .await?;

        tracing::info!(user_id = %benutzer.id, laeuft_ab_am = token.laeuft_ab_am, "Benutzer angemeldet");
        Ok((benutzer, token))
    }

    /// Loest ein Session-Token zum angemeldeten Benutzer auf
    ///
    /// Alle Gruende fuer ein Scheitern (Signatur, Ablauf, ersetztes Token,
    /// unbekannter Benutzer) werden zu `NichtAuthentifiziert` zusammengefasst.
    pub async fn benutzer_aufloesen(&self, token: &str) -> AuthResult<BenutzerRecord> {
        self.benutzer_aufloesen_zu(token, Utc::now()).await
    }

    /// Wie [`benutzer_aufloesen`](Self::benutzer_aufloesen) mit vorgegebener Uhrzeit
    pub async fn benutzer_aufloesen_zu(
        &self,
        token: &str,
        jetzt: DateTime<Utc>,
    ) -> AuthResult<BenutzerRecord> {
        self.pruefer
            .aufloesen_zu(token, jetzt)
            .await
            .map_err(verschleiern)
    }

    /// Meldet den zum Token gehoerenden Benutzer ab und entfernt das Token
    pub async fn abmelden(&self, token: &str) -> AuthResult<()> {
        let benutzer = self.benutzer_aufloesen(token).await?;
        self.user_repo
            .update(benutzer.id, BenutzerUpdate::nur_token(None))
            .await?;
        tracing::info!(user_id = %benutzer.id, "Benutzer abgemeldet");
        Ok(())
    }

    /// Prueft ein Klartext-Passwort gegen den gespeicherten Hash
    pub async fn passwort_pruefen(&self, user_id: UserId, passwort: &str) -> AuthResult<bool> {
        let benutzer = self.benutzer_laden(user_id).await?;
        self.hasher
            .verifizieren_async(passwort.to_string(), benutzer.password_hash)
            .await
    }

    /// Aendert das Passwort eines Benutzers
    ///
    /// Erfordert das alte Passwort. Das aktuelle Session-Token wird entfernt.
    pub async fn passwort_aendern(
        &self,
        user_id: UserId,
        altes_passwort: &str,
        neues_passwort: &str,
    ) -> AuthResult<()> {
        let benutzer = self.benutzer_laden(user_id).await?;

        let korrekt = self
            .hasher
            .verifizieren_async(altes_passwort.to_string(), benutzer.password_hash.clone())
            .await?;
        if !korrekt {
            tracing::warn!(user_id = %user_id, "Passwortwechsel mit falschem Passwort");
            return Err(AuthError::UngueltigeAnmeldedaten);
        }

        let mut konto = Benutzerkonto::aus_record(benutzer);
        konto.passwort_setzen(neues_passwort)?;
        konto
            .speichern_mit(
                self.user_repo.as_ref(),
                &self.hasher,
                BenutzerUpdate::nur_token(None),
            )
            .await?;

        tracing::info!(user_id = %user_id, "Passwort geaendert, Session-Token entfernt");
        Ok(())
    }

    async fn benutzer_laden(&self, user_id: UserId) -> AuthResult<BenutzerRecord> {
        self.user_repo
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::BenutzerNichtGefunden(user_id.to_string()))
    }
}

fn verschleiern(fehler: AuthError) -> AuthError {
    if fehler.ist_authentifizierungsfehler() {
        tracing::debug!(grund = %fehler, "Token-Aufloesung fehlgeschlagen");
        AuthError::NichtAuthentifiziert
    } else {
        fehler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Duration;
    use passierschein_db::{DbResult, MemoryDb};

    use crate::password::PasswortParameter;

    fn test_service() -> (Arc<MemoryDb>, AuthService<MemoryDb>) {
        let repo = Arc::new(MemoryDb::neu());
        let hasher = PasswortHasher::neu(PasswortParameter::minimal()).unwrap();
        let token = TokenEinstellungen {
            geheimnis: Some("test-geheimnis".into()),
            ..Default::default()
        };
        (Arc::clone(&repo), AuthService::neu(repo, hasher, &token))
    }

    fn konto<'a>(email: &'a str, passwort: &'a str) -> NeuesKonto<'a> {
        NeuesKonto {
            email,
            passwort,
            name: Some("Test"),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn registrieren_und_anmelden() {
        let (_, service) = test_service();

        let user = service
            .registrieren(konto("test@example.org", "hunter2"))
            .await
            .expect("Registrierung fehlgeschlagen");
        assert_ne!(user.password_hash, "hunter2");
        assert!(user.token.is_none());

        let (angemeldet, token) = service
            .anmelden("test@example.org", "hunter2")
            .await
            .expect("Anmeldung fehlgeschlagen");
        assert_eq!(angemeldet.id, user.id);
        assert_eq!(angemeldet.token.as_ref(), Some(&token));

        let aufgeloest = service.benutzer_aufloesen(&token.wert).await.unwrap();
        assert_eq!(aufgeloest.id, user.id);
    }

    #[tokio::test]
    async fn doppelte_email_schlaegt_fehl() {
        let (_, service) = test_service();
        service.registrieren(konto("dup@example.org", "a")).await.unwrap();
        let ergebnis = service.registrieren(konto("dup@example.org", "b")).await;
        assert!(matches!(ergebnis, Err(AuthError::EmailVergeben(_))));
    }

    #[tokio::test]
    async fn leeres_passwort_bei_registrierung() {
        let (repo, service) = test_service();
        let ergebnis = service.registrieren(konto("leer@example.org", "")).await;
        assert!(matches!(ergebnis, Err(AuthError::PasswortLeer)));
        assert_eq!(repo.anzahl().await, 0);
    }

    #[tokio::test]
    async fn falsches_passwort_abgelehnt() {
        let (_, service) = test_service();
        service.registrieren(konto("user@example.org", "richtig")).await.unwrap();

        let ergebnis = service.anmelden("user@example.org", "falsch").await;
        assert!(matches!(ergebnis, Err(AuthError::UngueltigeAnmeldedaten)));

        let unbekannt = service.anmelden("niemand@example.org", "richtig").await;
        assert!(matches!(unbekannt, Err(AuthError::UngueltigeAnmeldedaten)));
    }

    #[tokio::test]
    async fn erneute_anmeldung_ersetzt_token() {
        let (_, service) = test_service();
        service.registrieren(konto("re@example.org", "pw")).await.unwrap();

        let (_, erstes) = service.anmelden("re@example.org", "pw").await.unwrap();
        let (_, zweites) = service.anmelden("re@example.org", "pw").await.unwrap();

        let alt = service.benutzer_aufloesen(&erstes.wert).await;
        assert!(matches!(alt, Err(AuthError::NichtAuthentifiziert)));
        assert!(service.benutzer_aufloesen(&zweites.wert).await.is_ok());
    }

    #[tokio::test]
    async fn token_laeuft_nach_einer_stunde_ab() {
        let (_, service) = test_service();
        let user = service.registrieren(konto("u1@example.org", "pw")).await.unwrap();
        let t0 = Utc::now();

        let (_, token) = service.anmelden_zu("u1@example.org", "pw", t0).await.unwrap();

        let nach_30 = service
            .benutzer_aufloesen_zu(&token.wert, t0 + Duration::minutes(30))
            .await
            .unwrap();
        assert_eq!(nach_30.id, user.id);

        let nach_61 = service
            .benutzer_aufloesen_zu(&token.wert, t0 + Duration::minutes(61))
            .await;
        assert!(matches!(nach_61, Err(AuthError::NichtAuthentifiziert)));
    }

    #[tokio::test]
    async fn abmelden_entfernt_token() {
        let (repo, service) = test_service();
        let user = service.registrieren(konto("out@example.org", "pw")).await.unwrap();
        let (_, token) = service.anmelden("out@example.org", "pw").await.unwrap();

        service.abmelden(&token.wert).await.unwrap();

        let ergebnis = service.benutzer_aufloesen(&token.wert).await;
        assert!(matches!(ergebnis, Err(AuthError::NichtAuthentifiziert)));
        let gespeichert = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert!(gespeichert.token.is_none());
    }

    #[tokio::test]
    async fn passwort_aendern() {
        let (_, service) = test_service();
        let user = service.registrieren(konto("pw@example.org", "altes_pw")).await.unwrap();
        let (_, token) = service.anmelden("pw@example.org", "altes_pw").await.unwrap();

        let falsch = service.passwort_aendern(user.id, "falsch", "neues_pw").await;
        assert!(matches!(falsch, Err(AuthError::UngueltigeAnmeldedaten)));

        service
            .passwort_aendern(user.id, "altes_pw", "neues_pw")
            .await
            .unwrap();

        assert!(!service.passwort_pruefen(user.id, "altes_pw").await.unwrap());
        assert!(service.passwort_pruefen(user.id, "neues_pw").await.unwrap());

        // Altes Token gilt nach dem Wechsel nicht mehr
        let ergebnis = service.benutzer_aufloesen(&token.wert).await;
        assert!(matches!(ergebnis, Err(AuthError::NichtAuthentifiziert)));

        let ergebnis = service.anmelden("pw@example.org", "altes_pw").await;
        assert!(matches!(ergebnis, Err(AuthError::UngueltigeAnmeldedaten)));
        service.anmelden("pw@example.org", "neues_pw").await.unwrap();
    }

    /// Zaehlt Updates, alles andere geht an den MemoryDb durch
    #[derive(Default)]
    struct ZaehlendesRepo {
        inner: MemoryDb,
        updates: AtomicUsize,
    }

    impl UserRepository for ZaehlendesRepo {
        async fn create(&self, data: NeuerBenutzer<'_>) -> DbResult<BenutzerRecord> {
            self.inner.create(data).await
        }

        async fn get_by_id(&self, id: UserId) -> DbResult<Option<BenutzerRecord>> {
            self.inner.get_by_id(id).await
        }

        async fn get_by_email(&self, email: &str) -> DbResult<Option<BenutzerRecord>> {
            self.inner.get_by_email(email).await
        }

        async fn get_by_token(&self, token: &str) -> DbResult<Option<BenutzerRecord>> {
            self.inner.get_by_token(token).await
        }

        async fn update(
            &self,
            id: UserId,
            data: BenutzerUpdate,
        ) -> DbResult<BenutzerRecord> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.inner.update(id, data).await
        }
    }

    #[tokio::test]
    async fn passwort_aendern_schreibt_hash_und_token_gemeinsam() {
        let repo = Arc::new(ZaehlendesRepo::default());
        let service = AuthService::neu(
            Arc::clone(&repo),
            PasswortHasher::neu(PasswortParameter::minimal()).unwrap(),
            &TokenEinstellungen {
                geheimnis: Some("geheim".into()),
                ..Default::default()
            },
        );
        let user = service.registrieren(konto("eins@example.org", "alt")).await.unwrap();
        let (_, token) = service.anmelden("eins@example.org", "alt").await.unwrap();

        let vorher = repo.updates.load(Ordering::SeqCst);
        service.passwort_aendern(user.id, "alt", "neu").await.unwrap();
        assert_eq!(repo.updates.load(Ordering::SeqCst), vorher + 1);

        let gespeichert = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert!(gespeichert.token.is_none());
        assert!(repo.get_by_token(&token.wert).await.unwrap().is_none());
        assert!(service.passwort_pruefen(user.id, "neu").await.unwrap());
    }

    #[tokio::test]
    async fn anmeldung_erneuert_schwachen_hash() {
        let repo = Arc::new(MemoryDb::neu());
        let schwach = PasswortHasher::neu(PasswortParameter::minimal()).unwrap();
        let hash = schwach.hashen("pw").unwrap();
        repo.create(NeuerBenutzer {
            email: "alt@example.org",
            password_hash: &hash,
            ..Default::default()
        })
        .await
        .unwrap();

        let staerker = PasswortHasher::neu(PasswortParameter {
            iterationen: 2,
            ..PasswortParameter::minimal()
        })
        .unwrap();
        let service = AuthService::neu(
            Arc::clone(&repo),
            staerker.clone(),
            &TokenEinstellungen {
                geheimnis: Some("geheim".into()),
                ..Default::default()
            },
        );

        let (benutzer, _) = service.anmelden("alt@example.org", "pw").await.unwrap();
        assert_ne!(benutzer.password_hash, hash);
        assert!(!staerker.braucht_rehash(&benutzer.password_hash).unwrap());
        assert!(staerker.verifizieren("pw", &benutzer.password_hash).unwrap());
    }

    #[tokio::test]
    async fn ohne_geheimnis_keine_anmeldung() {
        let repo = Arc::new(MemoryDb::neu());
        let hasher = PasswortHasher::neu(PasswortParameter::minimal()).unwrap();
        let service = AuthService::neu(repo, hasher, &TokenEinstellungen::default());

        service.registrieren(konto("s@example.org", "pw")).await.unwrap();
        let ergebnis = service.anmelden("s@example.org", "pw").await;
        assert!(matches!(ergebnis, Err(AuthError::Signierung(_))));
    }
}
