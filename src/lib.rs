//! Voice commands for a music player.
//!
//! Core modules:
//! - [`registry`] - Spoken phrases and the actions they map to
//! - [`normalizer`] - Wake word detection and transcript cleanup
//! - [`resolver`] - Transcript to action, search or nothing
//! - [`activation`] - Dormant / awaiting-command session state
//! - [`executor`] - Actions against the host capabilities
//! - [`search`] - Search-and-play workflow
//! - [`interpreter`] - The task tying it all together
//!
//! ### Supporting Modules
//!
//! - [`capabilities`] - Traits the host implements
//! - [`recognition`] - Transcript sources and their restart policy
//! - [`host`] - MPD, SQLite catalog and console adapters
//! - [`config`] - Configuration and data directory management
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use muse_voice::capabilities::AppContext;
//! use muse_voice::config::VoiceConfig;
//! use muse_voice::host::console::ConsoleNotifier;
//! use muse_voice::interpreter::Interpreter;
//! use muse_voice::registry::CommandRegistry;
//! use std::sync::Arc;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let ctx = AppContext::new(Arc::new(ConsoleNotifier));
//! let (interpreter, handle) = Interpreter::new(
//!     ctx,
//!     CommandRegistry::with_default_commands(),
//!     VoiceConfig::default(),
//! )?;
//! interpreter.spawn();
//!
//! handle.transcript("hey computer", true)?;
//! handle.transcript("what time is it", true)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Resolution order
//!
//! 1. `play <query>` / `find <query>` start a search, unless the query is a
//!    filler word ("play music" is a command, not a search)
//! 2. numeric templates: `volume to 40`, `forward 30 seconds`
//! 3. exact phrase
//! 4. fuzzy phrase, tolerating one missing word
//!
//! ## Error Handling
//!
//! Host-facing functions return `anyhow::Result`. Inside a session nothing
//! fails loudly: a missing capability is skipped, a failing one is logged
//! with `warn!` and skipped. Capability calls run on tokio's blocking pool
//! under a time limit, and one that outlives it counts as failed.

pub mod activation;
pub mod capabilities;
pub mod cli;
pub mod completion;
pub mod config;
pub mod executor;
pub mod host;
pub mod interpreter;
pub mod normalizer;
pub mod recognition;
pub mod registry;
pub mod resolver;
pub mod search;
