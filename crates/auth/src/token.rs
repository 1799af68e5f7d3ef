//! Signierte Session-Tokens (JWT)
//!
//! Ein Token traegt `sub` (Benutzer-ID), `iat`, `exp` und eine zufaellige
//! `jti`, signiert mit einem prozessweiten HMAC-Schluessel. Der Ablauf wird
//! sowohl im Token als auch am Benutzer-Datensatz gespeichert.

use std::{str::FromStr, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use passierschein_core::UserId;
use passierschein_db::SitzungsToken;

use crate::error::{AuthError, AuthResult};

/// Standard-Gueltigkeit eines Session-Tokens: 1 Stunde
pub const STANDARD_GUELTIGKEIT_MINUTEN: i64 = 60;

/// Hoechste zulaessige Gueltigkeit: 365 Tage
pub const MAX_GUELTIGKEIT_MINUTEN: i64 = 365 * 24 * 60;

/// Erlaubte Signaturalgorithmen (symmetrisch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignaturAlgorithmus {
    #[default]
    Hs256,
    Hs384,
    Hs512,
}

impl SignaturAlgorithmus {
    fn jwt(self) -> Algorithm {
        match self {
            Self::Hs256 => Algorithm::HS256,
            Self::Hs384 => Algorithm::HS384,
            Self::Hs512 => Algorithm::HS512,
        }
    }
}

impl FromStr for SignaturAlgorithmus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "HS256" => Ok(Self::Hs256),
            "HS384" => Ok(Self::Hs384),
            "HS512" => Ok(Self::Hs512),
            other => Err(format!("Unbekannter Signaturalgorithmus: {other}")),
        }
    }
}

impl std::fmt::Display for SignaturAlgorithmus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Hs256 => "HS256",
            Self::Hs384 => "HS384",
            Self::Hs512 => "HS512",
        };
        f.write_str(name)
    }
}

/// Einstellungen fuer Ausstellung und Pruefung von Tokens
#[derive(Clone)]
pub struct TokenEinstellungen {
    /// Geheimer Signaturschluessel (`None` = nicht konfiguriert)
    pub geheimnis: Option<String>,
    pub algorithmus: SignaturAlgorithmus,
    pub gueltigkeit: Duration,
}

impl Default for TokenEinstellungen {
    fn default() -> Self {
        Self {
            geheimnis: None,
            algorithmus: SignaturAlgorithmus::default(),
            gueltigkeit: Duration::minutes(STANDARD_GUELTIGKEIT_MINUTEN),
        }
    }
}

impl std::fmt::Debug for TokenEinstellungen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEinstellungen")
            .field("geheimnis", &self.geheimnis.as_ref().map(|_| "***"))
            .field("algorithmus", &self.algorithmus)
            .field("gueltigkeit", &self.gueltigkeit)
            .finish()
    }
}

/// Claims eines Session-Tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Benutzer-ID
    pub sub: String,
    /// Ausstellungszeitpunkt (Sekunden seit Epoche)
    pub iat: i64,
    /// Ablaufzeitpunkt (Sekunden seit Epoche)
    pub exp: i64,
    /// Zufaellige Token-ID
    pub jti: String,
}

impl TokenClaims {
    /// Liest die Benutzer-ID aus `sub`
    pub fn user_id(&self) -> AuthResult<UserId> {
        self.sub
            .parse()
            .map_err(|e| AuthError::FehlerhaftesToken(format!("sub ist keine Benutzer-ID: {e}")))
    }

    /// Gibt true zurueck solange `jetzt` vor `exp` liegt
    pub fn ist_gueltig_zu(&self, jetzt: DateTime<Utc>) -> bool {
        jetzt.timestamp() < self.exp
    }
}

struct Schluesselpaar {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Prozessweiter Signaturschluessel, nach der Initialisierung nur gelesen
pub struct Signaturschluessel {
    algorithmus: SignaturAlgorithmus,
    paar: Option<Schluesselpaar>,
}

impl std::fmt::Debug for Signaturschluessel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signaturschluessel")
            .field("algorithmus", &self.algorithmus)
            .field("konfiguriert", &self.paar.is_some())
            .finish()
    }
}

impl Signaturschluessel {
    /// Erstellt den Schluessel aus den Einstellungen
    ///
    /// Ein fehlendes oder leeres Geheimnis ist hier noch kein Fehler; erst
    /// Signieren und Pruefen schlagen dann mit `Signierung` fehl.
    pub fn neu(einstellungen: &TokenEinstellungen) -> Self {
        let paar = einstellungen
            .geheimnis
            .as_deref()
            .filter(|g| !g.is_empty())
            .map(|g| Schluesselpaar {
                encoding: EncodingKey::from_secret(g.as_bytes()),
                decoding: DecodingKey::from_secret(g.as_bytes()),
            });

        if paar.is_none() {
            tracing::warn!("Kein Token-Geheimnis konfiguriert, Anmeldungen sind nicht moeglich");
        }

        Self {
            algorithmus: einstellungen.algorithmus,
            paar,
        }
    }

    pub fn algorithmus(&self) -> SignaturAlgorithmus {
        self.algorithmus
    }

    fn paar(&self) -> AuthResult<&Schluesselpaar> {
        self.paar
            .as_ref()
            .ok_or_else(|| AuthError::Signierung("kein Geheimnis konfiguriert".into()))
    }

    /// Signiert Claims zu einem kompakten JWT
    pub fn signieren(&self, claims: &TokenClaims) -> AuthResult<String> {
        let paar = self.paar()?;
        encode(&Header::new(self.algorithmus.jwt()), claims, &paar.encoding)
            .map_err(|e| AuthError::Signierung(e.to_string()))
    }

    /// Prueft die Signatur und dekodiert die Claims
    ///
    /// Der Ablauf wird hier nicht geprueft, das uebernimmt der `TokenPruefer`.
    pub fn dekodieren(&self, token: &str) -> AuthResult<TokenClaims> {
        let paar = self.paar()?;

        let mut validation = Validation::new(self.algorithmus.jwt());
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        decode::<TokenClaims>(token, &paar.decoding, &validation)
            .map(|daten| daten.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    AuthError::UngueltigeSignatur
                }
                _ => AuthError::FehlerhaftesToken(e.to_string()),
            })
    }
}

/// Stellt signierte, zeitlich begrenzte Session-Tokens aus
#[derive(Debug, Clone)]
pub struct TokenAussteller {
    schluessel: Arc<Signaturschluessel>,
    gueltigkeit: Duration,
}

impl TokenAussteller {
    pub fn neu(schluessel: Arc<Signaturschluessel>, gueltigkeit: Duration) -> Self {
        Self {
            schluessel,
            gueltigkeit,
        }
    }

    pub fn gueltigkeit(&self) -> Duration {
        self.gueltigkeit
    }

    /// Stellt ein Token fuer `user_id` mit Ablauf `jetzt + gueltigkeit` aus
    pub fn ausstellen(&self, user_id: UserId) -> AuthResult<SitzungsToken> {
        self.ausstellen_zu(user_id, Utc::now())
    }

    /// Wie [`ausstellen`](Self::ausstellen) mit vorgegebener Uhrzeit
    pub fn ausstellen_zu(&self, user_id: UserId, jetzt: DateTime<Utc>) -> AuthResult<SitzungsToken> {
        let iat = jetzt.timestamp();
        let exp = iat
            .checked_add(self.gueltigkeit.num_seconds())
            .ok_or_else(ablauf_ausserhalb)?;
        let laeuft_ab_am = exp.checked_mul(1000).ok_or_else(ablauf_ausserhalb)?;

        let claims = TokenClaims {
            sub: user_id.to_string(),
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
        };
        let wert = self.schluessel.signieren(&claims)?;

        tracing::debug!(user_id = %user_id, exp = exp, "Session-Token ausgestellt");

        Ok(SitzungsToken {
            wert,
            laeuft_ab_am,
        })
    }
}

fn ablauf_ausserhalb() -> AuthError {
    AuthError::Signierung("Ablaufzeitpunkt ausserhalb des Wertebereichs".into())
}
