//! Passwort-Hashing mit Argon2id
//!
//! Hashes werden als PHC-String gespeichert (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`).
//! Der String traegt seine eigenen Parameter, daher bleiben alte Hashes nach
//! einer Erhoehung der Kostenparameter verifizierbar.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// Kostenparameter fuer Argon2id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswortParameter {
    /// Speicherbedarf in KiB
    pub speicher_kib: u32,
    /// Anzahl Iterationen
    pub iterationen: u32,
    /// Parallelitaet (Lanes)
    pub parallelitaet: u32,
}

impl Default for PasswortParameter {
    /// Werte gemaess OWASP-Empfehlungen: 64 MiB, 3 Iterationen, 1 Lane
    fn default() -> Self {
        Self {
            speicher_kib: 64 * 1024,
            iterationen: 3,
            parallelitaet: 1,
        }
    }
}

impl PasswortParameter {
    /// Minimale Kosten, nur fuer Tests geeignet
    pub fn minimal() -> Self {
        Self {
            speicher_kib: Params::MIN_M_COST,
            iterationen: 1,
            parallelitaet: 1,
        }
    }
}

/// Berechnet und prueft gesalzene Passwort-Hashes
#[derive(Debug, Clone)]
pub struct PasswortHasher {
    params: Params,
}

impl PasswortHasher {
    /// Erstellt einen Hasher mit den angegebenen Parametern
    pub fn neu(parameter: PasswortParameter) -> AuthResult<Self> {
        let params = Params::new(
            parameter.speicher_kib,
            parameter.iterationen,
            parameter.parallelitaet,
            None,
        )
        .map_err(|e| AuthError::PasswortHashing(format!("Argon2-Parameter ungueltig: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hasht ein Passwort mit einem frischen zufaelligen Salt
    pub fn hashen(&self, klartext: &str) -> AuthResult<String> {
        if klartext.is_empty() {
            return Err(AuthError::PasswortLeer);
        }

        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(klartext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswortHashing(e.to_string()))
    }

    /// Verifiziert ein Passwort gegen einen gespeicherten PHC-Hash
    ///
    /// Ein falsches Passwort ist kein Fehler, sondern `Ok(false)`.
    pub fn verifizieren(&self, klartext: &str, hash: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::HashFormat(e.to_string()))?;

        // Parameter kommen aus dem Hash, nicht aus `self.params`
        match self.argon2().verify_password(klartext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AuthError::HashFormat(e.to_string())),
        }
    }

    /// Gibt true zurueck wenn der Hash mit schwaecheren Parametern erzeugt wurde
    pub fn braucht_rehash(&self, hash: &str) -> AuthResult<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::HashFormat(e.to_string()))?;

        if parsed.algorithm != Algorithm::Argon2id.ident()
            || parsed.version != Some(Version::V0x13.into())
        {
            return Ok(true);
        }

        let alt = Params::try_from(&parsed).map_err(|e| AuthError::HashFormat(e.to_string()))?;
        Ok(alt.m_cost() < self.params.m_cost()
            || alt.t_cost() < self.params.t_cost()
            || alt.p_cost() < self.params.p_cost())
    }

    /// Wie [`hashen`](Self::hashen), aber auf dem Blocking-Threadpool
    pub async fn hashen_async(&self, klartext: String) -> AuthResult<String> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hashen(&klartext))
            .await
            .map_err(|e| AuthError::intern(format!("Hash-Task abgebrochen: {e}")))?
    }

    /// Wie [`verifizieren`](Self::verifizieren), aber auf dem Blocking-Threadpool
    pub async fn verifizieren_async(&self, klartext: String, hash: String) -> AuthResult<bool> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verifizieren(&klartext, &hash))
            .await
            .map_err(|e| AuthError::intern(format!("Verifikations-Task abgebrochen: {e}")))?
    }
}
