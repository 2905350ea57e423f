//! # Command-Line Interface Module
//!
//! This module defines the command-line interface for muse-voice using Clap
//! derive macros.
//!
//! ## Commands
//!
//! - `listen`: Read transcripts from stdin and react to them
//! - `say`: Feed a fixed list of transcripts, then exit once idle
//! - `commands`: Print every phrase the assistant understands
//! - `import`: Add tracks from a JSON file to the catalog
//! - `completion`: Generate shell completion scripts
//!
//! ## Examples
//!
//! ```bash
//! muse-voice say "hey computer" "play believer"
//! muse-voice --wake-word jarvis listen
//! muse-voice commands volume
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "muse-voice")]
#[command(about = "Muse voice: hands-free voice commands for your music player")]
#[command(version)]
pub struct Args {
    /// Path to config.json (defaults to the platform config directory)
    #[arg(long, global = true, env = "MUSE_VOICE_CONFIG", value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Word that opens a command session
    #[arg(short, long, global = true, env = "MUSE_VOICE_WAKE_WORD")]
    pub wake_word: Option<String>,

    /// Path to the SQLite music catalog
    #[arg(long, global = true, env = "MUSE_VOICE_CATALOG", value_hint = clap::ValueHint::FilePath)]
    pub catalog: Option<PathBuf>,

    /// Do not control MPD (playback and volume commands become no-ops)
    #[arg(long, global = true)]
    pub no_mpd: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Listen for transcripts on standard input
    ///
    /// Each line is one final transcript from a speech recognizer. Lines
    /// starting with `~` are interim results. The wake word opens a session;
    /// the next command is executed.
    ///
    /// Exits at end of input once the last session has closed.
    Listen,

    /// Run a fixed sequence of transcripts
    ///
    /// Useful for scripting and for trying out phrases without a recognizer.
    /// Exits once the last session has closed.
    ///
    /// Example: muse-voice say "hey computer" "volume to 40"
    Say {
        /// Transcripts, in order
        #[arg(required = true, value_hint = clap::ValueHint::Other)]
        phrases: Vec<String>,
    },

    /// Print the phrases the assistant understands
    Commands {
        /// Only show phrases containing this text
        filter: Option<String>,
    },

    /// Add tracks from a JSON file to the catalog
    ///
    /// The file holds an array of objects with `uri`, `title` and `artist`
    /// (and optionally `image_url`). Tracks whose uri is
    /// already catalogued are skipped.
    Import {
        /// JSON file to import
        #[arg(value_hint = clap::ValueHint::FilePath)]
        path: PathBuf,
    },

    /// Generate shell completions
    ///
    /// Usage: muse-voice completion bash > ~/.local/share/bash-completion/completions/muse-voice
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// List command phrases for completion (hidden command)
    #[command(hide = true)]
    CompletePhrases,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_say_with_global_flags() {
        let args = Args::try_parse_from([
            "muse-voice",
            "say",
            "hey computer",
            "next song",
            "--wake-word",
            "jarvis",
            "--no-mpd",
        ])
        .unwrap();

        assert_eq!(args.wake_word.as_deref(), Some("jarvis"));
        assert!(args.no_mpd);
        match args.command {
            Command::Say { phrases } => assert_eq!(phrases, vec!["hey computer", "next song"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_say_requires_phrases() {
        assert!(Args::try_parse_from(["muse-voice", "say"]).is_err());
    }
}
