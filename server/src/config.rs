//! Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, nur das Token-Geheimnis muss gesetzt werden
//! (Datei oder `PASSIERSCHEIN_TOKEN_GEHEIMNIS`).

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use passierschein_auth::{
    PasswortParameter, SignaturAlgorithmus, TokenEinstellungen, MAX_GUELTIGKEIT_MINUTEN,
    STANDARD_GUELTIGKEIT_MINUTEN,
};
use passierschein_db::DatabaseConfig;
use passierschein_observability::{log_format_gueltig, log_level_gueltig};

/// Umgebungsvariable fuer das Token-Geheimnis
pub const ENV_TOKEN_GEHEIMNIS: &str = "PASSIERSCHEIN_TOKEN_GEHEIMNIS";

/// Vollstaendige Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Datenbank-Einstellungen
    pub datenbank: DatenbankEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Argon2id-Kostenparameter
    pub passwort: PasswortParameter,
    /// Session-Token-Einstellungen
    pub token: TokenKonfig,
}

/// Datenbank-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatenbankEinstellungen {
    /// Verbindungs-URL
    pub url: String,
    /// Maximale Verbindungspool-Groesse
    pub max_verbindungen: u32,
    /// WAL-Journal fuer SQLite
    pub sqlite_wal: bool,
}

impl Default for DatenbankEinstellungen {
    fn default() -> Self {
        let standard = DatabaseConfig::default();
        Self {
            url: standard.url,
            max_verbindungen: standard.max_verbindungen,
            sqlite_wal: standard.sqlite_wal,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Session-Token-Einstellungen
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenKonfig {
    /// Symmetrischer Signaturschluessel
    pub geheimnis: Option<String>,
    /// "HS256", "HS384" oder "HS512"
    pub algorithmus: String,
    /// Gueltigkeit eines Tokens in Minuten
    pub gueltigkeit_minuten: i64,
}

impl Default for TokenKonfig {
    fn default() -> Self {
        Self {
            geheimnis: None,
            algorithmus: SignaturAlgorithmus::default().to_string(),
            gueltigkeit_minuten: STANDARD_GUELTIGKEIT_MINUTEN,
        }
    }
}

// Geheimnis nie in Logs oder Debug-Ausgaben
impl std::fmt::Debug for TokenKonfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKonfig")
            .field("geheimnis", &self.geheimnis.as_ref().map(|_| "***"))
            .field("algorithmus", &self.algorithmus)
            .field("gueltigkeit_minuten", &self.gueltigkeit_minuten)
            .finish()
    }
}

impl ServerConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    /// Das Token-Geheimnis aus der Umgebung hat Vorrang vor der Datei.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        let mut config = match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str::<Self>(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Self::default()
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
                ))
            }
        };

        config.geheimnis_uebernehmen(std::env::var(ENV_TOKEN_GEHEIMNIS).ok());
        Ok(config)
    }

    /// Uebernimmt ein Geheimnis von ausserhalb der Datei, falls nicht leer
    pub fn geheimnis_uebernehmen(&mut self, geheimnis: Option<String>) {
        if let Some(g) = geheimnis.filter(|g| !g.is_empty()) {
            self.token.geheimnis = Some(g);
        }
    }

    /// Prueft Werte, die serde allein nicht abfangen kann
    pub fn validieren(&self) -> anyhow::Result<()> {
        if !log_level_gueltig(&self.logging.level) {
            bail!("Ungueltiges Log-Level: {}", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            bail!("Ungueltiges Log-Format: {}", self.logging.format);
        }
        if !(1..=MAX_GUELTIGKEIT_MINUTEN).contains(&self.token.gueltigkeit_minuten) {
            bail!(
                "Token-Gueltigkeit muss zwischen 1 und {MAX_GUELTIGKEIT_MINUTEN} Minuten liegen, ist {}",
                self.token.gueltigkeit_minuten
            );
        }
        self.token
            .algorithmus
            .parse::<SignaturAlgorithmus>()
            .map_err(anyhow::Error::msg)?;
        Ok(())
    }

    /// Einstellungen fuer Token-Aussteller und -Pruefer
    pub fn token_einstellungen(&self) -> anyhow::Result<TokenEinstellungen> {
        let algorithmus = self
            .token
            .algorithmus
            .parse::<SignaturAlgorithmus>()
            .map_err(anyhow::Error::msg)
            .context("Token-Konfiguration")?;
        let gueltigkeit = chrono::Duration::try_minutes(self.token.gueltigkeit_minuten)
            .with_context(|| {
                format!(
                    "Token-Gueltigkeit {} Minuten nicht darstellbar",
                    self.token.gueltigkeit_minuten
                )
            })?;

        Ok(TokenEinstellungen {
            geheimnis: self.token.geheimnis.clone(),
            algorithmus,
            gueltigkeit,
        })
    }

    /// Verbindungsdaten fuer das Datenbank-Crate
    pub fn datenbank_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.datenbank.url.clone(),
            max_verbindungen: self.datenbank.max_verbindungen,
            sqlite_wal: self.datenbank.sqlite_wal,
        }
    }
}
