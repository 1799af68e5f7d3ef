//! Passierschein – Verwaltungswerkzeug fuer Benutzerkonten
//!
//! Laedt die Konfiguration, initialisiert das Logging und fuehrt ein
//! Kommando gegen die Benutzerdatenbank aus.

use anyhow::Result;
use clap::{Parser, Subcommand};
use passierschein_auth::NeuesKonto;
use passierschein_core::ms_zu_datum;
use passierschein_observability::logging_initialisieren;
use passierschein_server::{config::ServerConfig, Server};

#[derive(Debug, Parser)]
#[command(name = "passierschein", version, about = "Benutzerkonten und Session-Tokens verwalten")]
struct Cli {
    /// Pfad zur Konfigurationsdatei
    #[arg(long, env = "PASSIERSCHEIN_CONFIG", default_value = "passierschein.toml")]
    config: String,

    #[command(subcommand)]
    befehl: Befehl,
}

#[derive(Debug, Subcommand)]
enum Befehl {
    /// Neues Benutzerkonto anlegen
    Registrieren {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PASSIERSCHEIN_PASSWORT", hide_env_values = true)]
        passwort: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        lastname: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    /// Anmelden und ein Session-Token ausgeben
    Anmelden {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PASSIERSCHEIN_PASSWORT", hide_env_values = true)]
        passwort: String,
    },
    /// Session-Token pruefen und Benutzer anzeigen
    Pruefen { token: String },
    /// Session-Token entfernen
    Abmelden { token: String },
    /// Passwort des zum Token gehoerenden Benutzers aendern
    Passwort {
        token: String,
        #[arg(long, env = "PASSIERSCHEIN_PASSWORT_ALT", hide_env_values = true)]
        alt: String,
        #[arg(long, env = "PASSIERSCHEIN_PASSWORT_NEU", hide_env_values = true)]
        neu: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ServerConfig::laden(&cli.config)?;
    logging_initialisieren(&config.logging.level, &config.logging.format);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config,
        "Passierschein wird initialisiert"
    );

    let server = Server::starten(config).await?;
    ausfuehren(&server, cli.befehl).await
}

async fn ausfuehren(server: &Server, befehl: Befehl) -> Result<()> {
    let auth = &server.auth;

    match befehl {
        Befehl::Registrieren {
            email,
            passwort,
            name,
            lastname,
            image,
        } => {
            let benutzer = auth
                .registrieren(NeuesKonto {
                    email: &email,
                    passwort: &passwort,
                    name: name.as_deref(),
                    lastname: lastname.as_deref(),
                    image: image.as_deref(),
                })
                .await?;
            println!("{}", benutzer.id);
        }
        Befehl::Anmelden { email, passwort } => {
            let (_, token) = auth.anmelden(&email, &passwort).await?;
            println!("{}", token.wert);
            if let Some(ablauf) = ms_zu_datum(token.laeuft_ab_am) {
                eprintln!("gueltig bis {}", ablauf.to_rfc3339());
            }
        }
        Befehl::Pruefen { token } => {
            let benutzer = auth.benutzer_aufloesen(&token).await?;
            println!("{} {}", benutzer.id, benutzer.email);
        }
        Befehl::Abmelden { token } => {
            auth.abmelden(&token).await?;
        }
        Befehl::Passwort { token, alt, neu } => {
            let benutzer = auth.benutzer_aufloesen(&token).await?;
            auth.passwort_aendern(benutzer.id, &alt, &neu).await?;
        }
    }

    Ok(())
}
