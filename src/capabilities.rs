//! # Capabilities
//!
//! The interpreter never touches audio, UI or storage directly. Everything it
//! can do to the outside world is one of the traits below, bundled in an
//! [`AppContext`] that the host builds once at startup.
//!
//! Every capability except the notifier is optional. A missing capability is
//! not an error: the executor logs and skips the effect.
//!
//! Capability methods are plain blocking calls. Hosts shell out to `mpc` or
//! query SQLite, so async code never calls them directly but goes through
//! [`offload`], which runs them on tokio's blocking pool under a time limit.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A track as shown in search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub image_url: String,
    pub preview_url: String,
}

/// What the player reports about the current track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub title: String,
    pub artist: String,
}

/// Playback position of the current track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackPosition {
    pub elapsed: Duration,
    pub duration: Duration,
}

impl TrackPosition {
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.elapsed)
    }
}

/// Progress of the search view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchState {
    Idle,
    Loading,
    HasResults,
    NoResults,
}

/// Application sections the navigation capability can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Dashboard,
    Search,
    Library,
    Profile,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Dashboard => "dashboard",
            Section::Search => "search",
            Section::Library => "library",
            Section::Profile => "profile",
        };
        f.write_str(name)
    }
}

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

/// Transport control of the audio player.
pub trait Playback: Send + Sync {
    fn is_playing(&self) -> Result<bool>;
    fn toggle(&self) -> Result<()>;
    fn next(&self) -> Result<()>;
    fn previous(&self) -> Result<()>;
    /// Move the play head by `delta_secs` (negative rewinds).
    fn seek(&self, delta_secs: i64) -> Result<()>;
    fn restart(&self) -> Result<()>;
    fn play_track(&self, track: &SearchResult) -> Result<()>;
    /// `None` when nothing is loaded or the duration is unknown.
    fn position(&self) -> Result<Option<TrackPosition>>;
    fn now_playing(&self) -> Result<Option<TrackInfo>>;
}

/// Output volume in percent.
pub trait Volume: Send + Sync {
    fn get(&self) -> Result<u8>;
    fn set(&self, level: u8) -> Result<()>;
    /// Silence the output. `level` is the volume the user chose, for players
    /// that can only mute by turning the volume down to zero.
    fn mute(&self, level: u8) -> Result<()>;
    fn unmute(&self) -> Result<()>;
}

pub trait Navigation: Send + Sync {
    fn show_section(&self, section: Section) -> Result<()>;
}

/// The search view. Triggering does not block; results appear later and are
/// observed by polling [`Search::state`] and [`Search::current_results`].
pub trait Search: Send + Sync {
    fn trigger(&self, query: &str) -> Result<()>;
    /// Results in display order, first result first.
    fn current_results(&self) -> Result<Vec<SearchResult>>;
    fn state(&self) -> Result<SearchState>;
}

/// Favourites and playlists for the current track.
pub trait Library: Send + Sync {
    /// `None` when no track is current.
    fn is_current_liked(&self) -> Result<Option<bool>>;
    fn like_current(&self) -> Result<()>;
    fn unlike_current(&self) -> Result<()>;
    fn add_current_to_playlist(&self) -> Result<()>;
    /// Start a random track, returning what was started.
    fn play_random(&self) -> Result<Option<TrackInfo>>;
}

/// User-facing toasts.
pub trait Notifier: Send + Sync {
    fn show(&self, message: &str, severity: Severity, duration: Duration);
}

/// Default toast duration.
pub const DEFAULT_TOAST: Duration = Duration::from_millis(3000);

/// Default limit for a single capability call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(3);

/// Run a blocking capability call on the blocking pool.
///
/// A call that outlives `limit` is reported as an error and abandoned; its
/// thread finishes in the background.
pub async fn offload<T, R, F>(cap: &Arc<T>, limit: Duration, f: F) -> Result<R>
where
    T: ?Sized + Send + Sync + 'static,
    R: Send + 'static,
    F: FnOnce(&T) -> Result<R> + Send + 'static,
{
    let cap = Arc::clone(cap);
    let task = tokio::task::spawn_blocking(move || f(&*cap));
    match tokio::time::timeout(limit, task).await {
        Ok(joined) => joined.context("Capability call panicked")?,
        Err(_) => anyhow::bail!("Capability call timed out after {limit:?}"),
    }
}

/// Everything the interpreter may call into. Built once by the host.
#[derive(Clone)]
pub struct AppContext {
    pub playback: Option<Arc<dyn Playback>>,
    pub volume: Option<Arc<dyn Volume>>,
    pub navigation: Option<Arc<dyn Navigation>>,
    pub search: Option<Arc<dyn Search>>,
    pub library: Option<Arc<dyn Library>>,
    pub notifier: Arc<dyn Notifier>,
    /// Limit for each call through [`offload`].
    pub call_timeout: Duration,
}

impl AppContext {
    /// A context with no capabilities besides notifications.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            playback: None,
            volume: None,
            navigation: None,
            search: None,
            library: None,
            notifier,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn with_playback(mut self, playback: Arc<dyn Playback>) -> Self {
        self.playback = Some(playback);
        self
    }

    pub fn with_volume(mut self, volume: Arc<dyn Volume>) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_navigation(mut self, navigation: Arc<dyn Navigation>) -> Self {
        self.navigation = Some(navigation);
        self
    }

    pub fn with_search(mut self, search: Arc<dyn Search>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_library(mut self, library: Arc<dyn Library>) -> Self {
        self.library = Some(library);
        self
    }

    pub fn notify(&self, message: &str, severity: Severity) {
        self.notifier.show(message, severity, DEFAULT_TOAST);
    }

    pub fn notify_for(&self, message: &str, severity: Severity, duration: Duration) {
        self.notifier.show(message, severity, duration);
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("playback", &self.playback.is_some())
            .field("volume", &self.volume.is_some())
            .field("navigation", &self.navigation.is_some())
            .field("search", &self.search.is_some())
            .field("library", &self.library.is_some())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}
