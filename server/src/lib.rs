//! passierschein-server – Bibliotheks-Root
//!
//! Verbindet Konfiguration, Datenbank und Auth-Service. Die Kommandozeile in
//! `main.rs` ist nur eine duenne Schicht darueber.

pub mod config;

use std::sync::Arc;

use anyhow::Result;
use passierschein_auth::{AuthService, PasswortHasher};
use passierschein_db::SqliteDb;

use config::ServerConfig;

/// Haelt die initialisierten Subsysteme zusammen
pub struct Server {
    pub config: ServerConfig,
    pub auth: AuthService<SqliteDb>,
}

impl Server {
    /// Oeffnet die Datenbank und baut den Auth-Service auf
    ///
    /// Reihenfolge:
    /// 1. Konfiguration validieren
    /// 2. Datenbank oeffnen und migrieren
    /// 3. Passwort-Hasher und Token-Schluessel initialisieren
    pub async fn starten(config: ServerConfig) -> Result<Self> {
        config.validieren()?;

        let db = SqliteDb::oeffnen(&config.datenbank_config()).await?;
        let hasher = PasswortHasher::neu(config.passwort)?;
        let token = config.token_einstellungen()?;

        tracing::info!(
            datenbank = %config.datenbank.url,
            algorithmus = %token.algorithmus,
            gueltigkeit_minuten = token.gueltigkeit.num_minutes(),
            "Passierschein initialisiert"
        );

        let auth = AuthService::neu(Arc::new(db), hasher, &token);
        Ok(Self { config, auth })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use passierschein_auth::{AuthError, NeuesKonto, PasswortParameter};

    fn test_config(dir: &tempfile::TempDir) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.datenbank.url = format!("sqlite://{}", dir.path().join("test.db").display());
        config.passwort = PasswortParameter::minimal();
        config.token.geheimnis = Some("test-geheimnis".into());
        config
    }

    #[tokio::test]
    async fn starten_und_anmelden() {
        let dir = tempfile::tempdir().unwrap();
        let server = Server::starten(test_config(&dir)).await.unwrap();

        server
            .auth
            .registrieren(NeuesKonto {
                email: "admin@example.org",
                passwort: "hunter2",
                ..Default::default()
            })
            .await
            .unwrap();
        let (_, token) = server.auth.anmelden("admin@example.org", "hunter2").await.unwrap();
        let user = server.auth.benutzer_aufloesen(&token.wert).await.unwrap();
        assert_eq!(user.email, "admin@example.org");
    }

    #[tokio::test]
    async fn daten_ueberleben_neustart() {
        let dir = tempfile::tempdir().unwrap();

        let token = {
            let server = Server::starten(test_config(&dir)).await.unwrap();
            server
                .auth
                .registrieren(NeuesKonto {
                    email: "persist@example.org",
                    passwort: "pw",
                    ..Default::default()
                })
                .await
                .unwrap();
            server.auth.anmelden("persist@example.org", "pw").await.unwrap().1
        };

        let server = Server::starten(test_config(&dir)).await.unwrap();
        let user = server.auth.benutzer_aufloesen(&token.wert).await.unwrap();
        assert_eq!(user.email, "persist@example.org");
    }

    #[tokio::test]
    async fn ungueltige_konfiguration_abgelehnt() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(&dir);
        config.token.algorithmus = "none".into();
        assert!(Server::starten(config).await.is_err());
    }

    #[tokio::test]
    async fn ohne_geheimnis_startet_aber_meldet_signierungsfehler() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(&dir);
        config.token.geheimnis = None;

        let server = Server::starten(config).await.unwrap();
        server
            .auth
            .registrieren(NeuesKonto {
                email: "x@example.org",
                passwort: "pw",
                ..Default::default()
            })
            .await
            .unwrap();
        let ergebnis = server.auth.anmelden("x@example.org", "pw").await;
        assert!(matches!(ergebnis, Err(AuthError::Signierung(_))));
    }
}
