//! # Host Adapters
//!
//! Concrete capabilities for running the interpreter from a terminal:
//!
//! - [`mpd::MpdPlayer`] - playback and volume through the `mpc` client
//! - [`catalog::Catalog`] - SQLite music catalog for search, likes and playlists
//! - [`console`] - notifications and navigation printed to the terminal

pub mod catalog;
pub mod console;
pub mod mpd;

use crate::capabilities::Playback;
use anyhow::Result;

/// A player that can tell which catalog entry is loaded.
///
/// The catalog keys likes and playlist entries by this uri.
pub trait Player: Playback {
    fn current_uri(&self) -> Result<Option<String>>;
}
