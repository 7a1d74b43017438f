mod helper;
mod logging;
mod peer;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::history::DefaultHistory;

use helper::CliHelper;
use moov_application::{Collaborators, EngineHandle, SyncEngine};
use moov_core::command::command_catalog;
use moov_core::config::MoovConfig;
use moov_core::conversation::InboundMessage;
use moov_core::player::PlayerLauncher;
use moov_core::session::SessionStore;
use moov_infrastructure::{ConfigService, JsonSessionRepository, MoovPaths, YoutubeDlResolver};
use peer::{PeerLink, TerminalSink};

/// Watch videos in sync with someone you are chatting with.
#[derive(Parser, Debug)]
#[command(name = "moov", version, about)]
struct Args {
    /// Name shown for you (overrides the config file)
    #[arg(long)]
    nick: Option<String>,

    /// Name shown for the other side
    #[arg(long, default_value = "peer")]
    peer_nick: String,

    /// Configuration file (default: the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Wait for the peer on this address, e.g. 0.0.0.0:7070
    #[arg(long, conflicts_with = "connect")]
    listen: Option<String>,

    /// Connect to a listening peer
    #[arg(long)]
    connect: Option<String>,
}

#[cfg(unix)]
fn player_launcher(config: &MoovConfig) -> Result<Arc<dyn PlayerLauncher>> {
    Ok(Arc::new(moov_infrastructure::MpvLauncher::new(
        config.player.clone(),
    )))
}

#[cfg(not(unix))]
fn player_launcher(_config: &MoovConfig) -> Result<Arc<dyn PlayerLauncher>> {
    anyhow::bail!("the mpv player adapter needs Unix domain sockets")
}

fn print_help() {
    println!("{}", "Commands:".bright_magenta());
    for cmd in command_catalog() {
        let marker = if cmd.requires_player() { "*" } else { " " };
        println!(
            "  {} {:<36} {}",
            marker,
            cmd.usage.bright_cyan(),
            cmd.description.bright_black()
        );
    }
    println!("{}", "  (* needs an open player)".bright_black());
}

/// The main entry point for the Moov terminal host.
///
/// 1. Loads configuration and the session store
/// 2. Connects to the peer (or runs alone)
/// 3. Starts the sync engine
/// 4. Reads chat lines until `quit`
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // ===== Configuration =====
    let config_service = match &args.config {
        Some(path) => ConfigService::new(path.clone()),
        None => ConfigService::default_location()?,
    };
    let mut config = config_service
        .get_config()
        .with_context(|| format!("Failed to load {:?}", config_service.path()))?;
    if let Some(nick) = args.nick.clone() {
        config.nick = nick;
    }

    let _log_guard = logging::init(&MoovPaths::logs_dir()?)?;
    tracing::info!(nick = %config.nick, "Starting moov");

    // ===== Backend Initialization =====
    let store_path = config_service.store_path(&config)?;
    let repository = Arc::new(JsonSessionRepository::new(store_path.clone()));
    let store = SessionStore::load(repository)
        .await
        .with_context(|| format!("Failed to load sessions from {:?}", store_path))?;

    let stream = match (&args.listen, &args.connect) {
        (Some(addr), _) => Some(peer::listen(addr).await?),
        (None, Some(addr)) => Some(peer::connect(addr).await?),
        (None, None) => None,
    };
    let (link, read_half) = match stream {
        Some(stream) => {
            let (link, read_half) = PeerLink::split(stream);
            (link, Some(read_half))
        }
        None => (PeerLink::offline(), None),
    };

    let collaborators = Collaborators {
        sink: Arc::new(TerminalSink::new(config.nick.clone(), link.clone())),
        resolver: Arc::new(YoutubeDlResolver::new(config.resolver.binary.clone())),
        launcher: player_launcher(&config)?,
    };
    let (engine, engine_task) = SyncEngine::spawn(config.clone(), store, collaborators);

    let reader = read_half
        .map(|read_half| peer::spawn_reader(read_half, args.peer_nick.clone(), engine.clone()));

    // ===== REPL =====
    repl(&config, &link, &engine)?;

    // ===== Shutdown =====
    if let Err(e) = engine.shutdown().await {
        tracing::warn!("Engine shutdown: {}", e);
    }
    let _ = engine_task.await;
    if let Some(reader) = reader {
        reader.abort();
    }
    Ok(())
}

fn repl(config: &MoovConfig, link: &PeerLink, engine: &EngineHandle) -> Result<()> {
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper));

    println!("{}", "=== Moov ===".bright_magenta().bold());
    println!(
        "{}",
        "Chat away. Type '/help' for commands or 'quit' to exit.".bright_black()
    );
    println!();

    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                let trimmed = line.trim();

                if trimmed == "quit" || trimmed == "exit" {
                    println!("{}", "Goodbye!".bright_green());
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if trimmed == "/help" {
                    print_help();
                    continue;
                }

                println!("{}", format!("{}: {}", config.nick, trimmed).green());
                link.send_line(trimmed);
                engine
                    .handle_message(InboundMessage::local(config.nick.clone(), trimmed))
                    .context("Sync engine stopped")?;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }
    Ok(())
}
