use anyhow::Result;
use clap::{Parser, Subcommand};
use ourawatch_auth::{CredentialStore, TokenStore};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use ourawatch::cache::SnapshotCache;
use ourawatch::channel::spawn_inbound_reader;
use ourawatch::logging::init_logging;
use ourawatch::{live_bridge, CycleOutcome, ScoreSource, Settings};

#[derive(Parser)]
#[command(name = "ourawatch", version, about = "Relay Oura ring scores to a Pebble watch")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Mirror logs to stderr at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Send demo scores instead of calling the Oura API
    #[arg(long, global = true)]
    mock: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Relay scores over stdin/stdout until interrupted (default)
    Run,
    /// Open the consent page, then read the redirect payload from stdin
    Authorize,
    /// Run a single refresh cycle
    Refresh,
    /// Forget the stored credential and cached scores
    Logout,
    /// Show the stored credential's state
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_path = init_logging(cli.verbose)?;
    tracing::info!("ourawatch starting, logging to {}", log_path.display());

    let settings = Settings::new()?;
    let source = if cli.mock {
        ScoreSource::Mock
    } else {
        ScoreSource::Live
    };

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&settings, source).await,
        Command::Authorize => authorize(&settings).await,
        Command::Refresh => refresh(&settings, source).await,
        Command::Logout => logout().await,
        Command::Status => status(),
    }
}

async fn run(settings: &Settings, source: ScoreSource) -> Result<()> {
    let bridge = live_bridge(settings, source).await?;

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let reader = spawn_inbound_reader(
        BufReader::new(tokio::io::stdin()),
        settings.bridge.wire,
        events_tx,
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };
    bridge.run(events_rx, shutdown).await;

    reader.abort();
    tracing::info!("ourawatch stopped");
    Ok(())
}

async fn authorize(settings: &Settings) -> Result<()> {
    let bridge = live_bridge(settings, ScoreSource::Live).await?;
    let url = bridge.coordinator().auth().authorization_url()?;

    eprintln!("Opening {}", url);
    if let Err(e) = open::that(&url) {
        tracing::warn!("Failed to open browser: {}", e);
        eprintln!("Open the link above in a browser to continue.");
    }
    eprintln!("Paste the redirect payload and press enter:");

    let mut payload = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut payload)
        .await?;

    match bridge.complete_authorization(payload.trim()).await? {
        None => eprintln!("Authorization cancelled"),
        Some(CycleOutcome::Unauthorized) => anyhow::bail!("Authorization failed"),
        Some(_) => eprintln!("Authorized"),
    }
    Ok(())
}

async fn refresh(settings: &Settings, source: ScoreSource) -> Result<()> {
    let bridge = live_bridge(settings, source).await?;

    match bridge.cycle().await {
        Some(CycleOutcome::Published(snapshot)) => {
            let scores = snapshot.scores();
            eprintln!(
                "Sent scores: sleep {}, readiness {}, activity {}",
                scores.sleep, scores.readiness, scores.activity
            );
        }
        Some(CycleOutcome::Unauthorized) => eprintln!("Not authorized, run `ourawatch authorize`"),
        Some(CycleOutcome::Deferred) => eprintln!("Token refresh failed, try again later"),
        None => anyhow::bail!("Refresh cycle failed, see the log file"),
    }
    Ok(())
}

async fn logout() -> Result<()> {
    TokenStore::new()?.clear()?;
    SnapshotCache::new().await?.clear().await?;
    eprintln!("Signed out");
    Ok(())
}

fn status() -> Result<()> {
    let store = TokenStore::new()?;
    let credential = store.get()?;

    println!("Credential file: {}", store.path().display());
    if !credential.is_authenticated() {
        println!("Not authorized");
        return Ok(());
    }

    match credential.expires_at {
        Some(expires_at) if !credential.is_expired() => {
            println!("Authorized, access token valid until {}", expires_at)
        }
        _ => println!("Authorized, access token expired (will refresh)"),
    }
    println!(
        "Refresh token: {}",
        if credential.refresh_token.is_some() {
            "stored"
        } else {
            "missing"
        }
    );
    Ok(())
}
