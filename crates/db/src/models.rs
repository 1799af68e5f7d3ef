//! Datenbankmodelle fuer Passierschein
//!
//! Diese Typen repraesentieren Benutzer-Datensaetze und dienen als reine
//! Datenuebertragungsobjekte zwischen Speicher und Auth-Service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use passierschein_core::UserId;

/// Aktuelles Session-Token eines Benutzers samt Ablaufzeitpunkt
///
/// Token und Ablauf existieren nur gemeinsam, deshalb sind sie ein Typ.
/// `Debug` zeigt den Token-Wert nicht an.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitzungsToken {
    /// Signierter Token-String
    pub wert: String,
    /// Ablaufzeitpunkt in Millisekunden seit der Epoche
    pub laeuft_ab_am: i64,
}

impl SitzungsToken {
    /// Gibt `true` zurueck solange `jetzt_ms` vor dem Ablaufzeitpunkt liegt
    pub fn ist_gueltig_zu(&self, jetzt_ms: i64) -> bool {
        jetzt_ms < self.laeuft_ab_am
    }
}

impl std::fmt::Debug for SitzungsToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SitzungsToken")
            .field("wert", &"***")
            .field("laeuft_ab_am", &self.laeuft_ab_am)
            .finish()
    }
}

/// Benutzer-Datensatz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenutzerRecord {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub lastname: Option<String>,
    /// Immer ein PHC-Hash, nie Klartext
    pub password_hash: String,
    pub role: i64,
    pub image: Option<String>,
    pub token: Option<SitzungsToken>,
    pub created_at: DateTime<Utc>,
}

/// Daten zum Erstellen eines neuen Benutzers
#[derive(Debug, Clone, Default)]
pub struct NeuerBenutzer<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: Option<&'a str>,
    pub lastname: Option<&'a str>,
    pub role: i64,
    pub image: Option<&'a str>,
}

/// Daten zum Aktualisieren eines Benutzers
///
/// `None` laesst ein Feld unveraendert. `token: Some(None)` entfernt das
/// aktuelle Session-Token.
#[derive(Debug, Clone, Default)]
pub struct BenutzerUpdate {
    pub name: Option<Option<String>>,
    pub lastname: Option<Option<String>>,
    pub password_hash: Option<String>,
    pub role: Option<i64>,
    pub image: Option<Option<String>>,
    pub token: Option<Option<SitzungsToken>>,
}

impl BenutzerUpdate {
    /// Update das nur das Session-Token setzt oder entfernt
    pub fn nur_token(token: Option<SitzungsToken>) -> Self {
        Self {
            token: Some(token),
            ..Default::default()
        }
    }

    /// Gibt true zurueck wenn kein Feld gesetzt ist
    pub fn ist_leer(&self) -> bool {
        self.name.is_none()
            && self.lastname.is_none()
            && self.password_hash.is_none()
            && self.role.is_none()
            && self.image.is_none()
            && self.token.is_none()
    }

    /// Wendet das Update auf einen Datensatz im Speicher an
    pub fn anwenden(self, record: &mut BenutzerRecord) {
        if let Some(v) = self.name {
            record.name = v;
        }
        if let Some(v) = self.lastname {
            record.lastname = v;
        }
        if let Some(v) = self.password_hash {
            record.password_hash = v;
        }
        if let Some(v) = self.role {
            record.role = v;
        }
        if let Some(v) = self.image {
            record.image = v;
        }
        if let Some(v) = self.token {
            record.token = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> BenutzerRecord {
        BenutzerRecord {
            id: UserId::new(),
            email: "a@example.org".into(),
            name: Some("Alice".into()),
            lastname: None,
            password_hash: "$argon2id$alt".into(),
            role: 0,
            image: None,
            token: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn sitzungs_token_ablauf() {
        let token = SitzungsToken {
            wert: "t".into(),
            laeuft_ab_am: 1_000,
        };
        assert!(token.ist_gueltig_zu(999));
        assert!(!token.ist_gueltig_zu(1_000));
    }

    #[test]
    fn debug_verbirgt_token_wert() {
        let mut r = record();
        r.token = Some(SitzungsToken {
            wert: "eyJ.geheimes.token".into(),
            laeuft_ab_am: 42,
        });

        let ausgabe = format!("{r:?}");
        assert!(!ausgabe.contains("eyJ.geheimes.token"));
        assert!(ausgabe.contains("laeuft_ab_am: 42"));

        let update = format!("{:?}", BenutzerUpdate::nur_token(r.token.clone()));
        assert!(!update.contains("eyJ.geheimes.token"));
    }

    #[test]
    fn update_nur_gesetzte_felder() {
        let mut r = record();
        BenutzerUpdate {
            password_hash: Some("$argon2id$neu".into()),
            ..Default::default()
        }
        .anwenden(&mut r);

        assert_eq!(r.password_hash, "$argon2id$neu");
        assert_eq!(r.name.as_deref(), Some("Alice"));
    }

    #[test]
    fn update_token_setzen_und_entfernen() {
        let mut r = record();
        let token = SitzungsToken {
            wert: "abc".into(),
            laeuft_ab_am: 42,
        };
        BenutzerUpdate::nur_token(Some(token.clone())).anwenden(&mut r);
        assert_eq!(r.token, Some(token));

        BenutzerUpdate::nur_token(None).anwenden(&mut r);
        assert!(r.token.is_none());
    }

    #[test]
    fn leeres_update() {
        assert!(BenutzerUpdate::default().ist_leer());
        assert!(!BenutzerUpdate::nur_token(None).ist_leer());
    }
}
