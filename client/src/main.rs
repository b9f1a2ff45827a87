//! Fluester Client – Einstiegspunkt
//!
//! Verbindet sich mit dem Server, prueft dessen Schluessel, tritt bei und
//! verschluesselt jede Eingabezeile. `exit` beendet die Sitzung.

use anyhow::Result;
use clap::Parser;
use fluester_client::{ClientFehler, ServerVerbindung};
use fluester_protocol::ServerZeile;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "fluester-client")]
#[command(version)]
#[command(about = "Ende-zu-Ende-verschluesselter Chat mit einem Fluester-Server")]
struct Cli {
    /// WebSocket-URL des Servers
    #[arg(long, default_value = "ws://127.0.0.1:8000")]
    server: String,

    /// Benutzername (wird sonst abgefragt)
    #[arg(long)]
    name: Option<String>,

    /// Log-Filter fuer stderr
    #[arg(long, default_value = "warn", env = "FL_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs auf stderr, damit der Chat auf stdout lesbar bleibt
    fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut eingabe = BufReader::new(tokio::io::stdin()).lines();

    let name = match cli.name {
        Some(name) => name,
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(b"Username: ").await?;
            stdout.flush().await?;
            eingabe.next_line().await?.unwrap_or_default().trim().to_string()
        }
    };

    let mut verbindung = ServerVerbindung::verbinden(&cli.server).await?;
    match verbindung.handshake(&name).await {
        Ok(bestaetigt) => println!("✅ Welcome, {bestaetigt}!"),
        Err(ClientFehler::ServerBelegt) => {
            println!("Server is in use");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    loop {
        tokio::select! {
            zeile = eingabe.next_line() => {
                let Some(zeile) = zeile? else {
                    // stdin geschlossen
                    verbindung.beenden().await?;
                    break;
                };
                let text = zeile.trim();
                if text.is_empty() {
                    continue;
                }
                if text.eq_ignore_ascii_case("exit") {
                    if let Some(abschied) = verbindung.beenden().await? {
                        println!("{abschied}");
                    }
                    break;
                }
                match verbindung.nachricht_senden(text).await {
                    Ok(()) => {}
                    Err(e) if e.ist_eingabefehler() => eprintln!("Nachricht nicht gesendet: {e}"),
                    Err(e) => return Err(e.into()),
                }
            }

            zeile = verbindung.naechste_zeile() => {
                match zeile? {
                    Some(ServerZeile::Status(status)) => println!("{status}"),
                    Some(ServerZeile::Nachricht(nachricht)) => {
                        tracing::debug!(?nachricht, "Unerwartete JSON-Nachricht ignoriert");
                    }
                    None => {
                        println!("Verbindung vom Server getrennt");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}
