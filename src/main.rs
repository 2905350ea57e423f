//! # muse-voice
//!
//! Hands-free control of an MPD music player. A speech recognizer (or stdin)
//! produces transcripts; after the wake word the next phrase is matched to a
//! command and executed.
//!
//! ## Architecture
//!
//! - `interpreter`: single task owning the session state
//! - `recognition`: transcript sources and the restart policy
//! - `resolver` / `registry` / `normalizer`: phrase to action
//! - `executor` / `search`: actions against the host capabilities
//! - `host`: MPD player, SQLite catalog, console output
//!
//! ## Usage
//!
//! ```bash
//! # Try a phrase without a microphone
//! muse-voice say "hey computer" "play believer"
//!
//! # Pipe a recognizer into the assistant
//! my-recognizer | muse-voice listen
//!
//! # Fill the catalog used by "play <song>"
//! muse-voice import tracks.json
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{info, warn};
use muse_voice::capabilities::AppContext;
use muse_voice::cli;
use muse_voice::completion;
use muse_voice::config::{self, VoiceConfig};
use muse_voice::host::catalog::Catalog;
use muse_voice::host::console::{ConsoleNavigator, ConsoleNotifier};
use muse_voice::host::mpd::MpdPlayer;
use muse_voice::interpreter::Interpreter;
use muse_voice::recognition::{self, ScriptedSource, StdinSource, TranscriptSource};
use muse_voice::registry::CommandRegistry;
use std::path::PathBuf;
use std::sync::Arc;

/// Main entry point for muse-voice.
///
/// # Logging
///
/// Initializes environment logger which can be controlled via `RUST_LOG`:
/// - `RUST_LOG=debug muse-voice listen` - Enable debug logging
/// - `RUST_LOG=muse_voice::search=trace muse-voice say ...` - Module-specific logging
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    match &args.command {
        cli::Command::Listen => {
            run_session(&args, StdinSource::new()).await?;
        }
        cli::Command::Say { phrases } => {
            run_session(&args, ScriptedSource::new(phrases.clone())).await?;
        }
        cli::Command::Commands { filter } => {
            print_commands(filter.as_deref());
        }
        cli::Command::Import { path } => {
            let catalog = Catalog::open(&catalog_path(&args)?)?;
            let added = catalog.import_json(path)?;
            println!("Imported {added} tracks ({} in catalog)", catalog.track_count()?);
        }
        cli::Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(shell), &mut cmd);
        }
        cli::Command::CompletePhrases => {
            completion::print_phrase_completions(&CommandRegistry::with_default_commands());
        }
    }

    Ok(())
}

fn load_config(args: &cli::Args) -> Result<VoiceConfig> {
    let config = match &args.config {
        Some(path) => VoiceConfig::load(path)?,
        None => VoiceConfig::load_default()?,
    };
    Ok(match &args.wake_word {
        Some(word) => config.with_wake_word(word),
        None => config,
    })
}

fn catalog_path(args: &cli::Args) -> Result<PathBuf> {
    match &args.catalog {
        Some(path) => Ok(path.clone()),
        None => config::get_catalog_path(),
    }
}

/// Wire the host capabilities. MPD is optional: when it cannot be reached the
/// assistant still runs, with playback commands skipped.
fn build_context(args: &cli::Args) -> Result<AppContext> {
    let mut ctx = AppContext::new(Arc::new(ConsoleNotifier))
        .with_navigation(Arc::new(ConsoleNavigator::new()));

    let player = if args.no_mpd {
        None
    } else {
        match MpdPlayer::connect() {
            Ok(player) => Some(Arc::new(player)),
            Err(e) => {
                warn!("{e:#}");
                eprintln!("MPD not available, playback commands are disabled.");
                None
            }
        }
    };

    let mut catalog = Catalog::open(&catalog_path(args)?)?;
    if let Some(player) = &player {
        ctx = ctx
            .with_playback(player.clone())
            .with_volume(player.clone());
        catalog = catalog.with_player(player.clone());
    }

    let catalog = Arc::new(catalog);
    Ok(ctx.with_search(catalog.clone()).with_library(catalog))
}

/// Run the interpreter on `source` until the input ends and the last session
/// has closed.
async fn run_session<S: TranscriptSource + 'static>(args: &cli::Args, source: S) -> Result<()> {
    let config = load_config(args)?;
    let ctx = build_context(args)?;
    info!("Capabilities: {ctx:?}");

    let (interpreter, handle) =
        Interpreter::new(ctx, CommandRegistry::with_default_commands(), config.clone())?;
    let worker = interpreter.spawn();
    let listener = tokio::spawn(recognition::listen(
        source,
        handle.sender(),
        config.recognition.clone(),
    ));

    println!("Say \"{}\" to start.", config.activation.wake_word);

    handle.settled().await?;
    handle.shutdown()?;
    worker.await.context("Interpreter task failed")?;
    listener.abort();

    Ok(())
}

fn print_commands(filter: Option<&str>) {
    let registry = CommandRegistry::with_default_commands();
    let filter = filter.map(str::to_lowercase);

    let mut shown = 0;
    for (phrase, action) in registry.iter() {
        if let Some(filter) = &filter {
            if !phrase.contains(filter.as_str()) {
                continue;
            }
        }
        println!("{phrase:<32} {action:?}");
        shown += 1;
    }

    println!();
    println!("{shown} phrases. Also: \"play <song>\", \"find <song>\", \"volume to <n>\", \"forward <n> seconds\".");
}
