//! # Music Catalog
//!
//! A small SQLite catalog of playable tracks. It backs the [`Search`] and
//! [`Library`] capabilities: searches run a `LIKE` query over titles and
//! artists, likes and playlist entries are keyed by the uri of the track the
//! player has loaded.
//!
//! ## Schema
//!
//! ```sql
//! tracks(id, uri, title, artist, image_url, loved)
//! playlist_entries(id, track_id, added_at)
//! ```
//!
//! `uri` is what the player understands (an MPD-relative file path); it is
//! handed to [`Playback::play_track`](crate::capabilities::Playback::play_track)
//! as the result's `preview_url`.

use super::Player;
use crate::capabilities::{Library, Search, SearchResult, SearchState, TrackInfo};
use anyhow::{Context, Result};
use log::{debug, info};
use rand::seq::SliceRandom;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Maximum number of rows a search returns.
const SEARCH_LIMIT: usize = 20;

/// One catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub uri: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Default)]
struct SearchView {
    query: Option<String>,
    results: Vec<SearchResult>,
}

/// SQLite-backed search and library.
pub struct Catalog {
    conn: Mutex<Connection>,
    player: Option<Arc<dyn Player>>,
    view: Mutex<SearchView>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("player", &self.player.is_some())
            .finish()
    }
}

/// `%text%` with the `LIKE` wildcards in `text` matched literally.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Create the tables if they do not exist.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tracks (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            uri         TEXT    NOT NULL UNIQUE,
            title       TEXT    NOT NULL,
            artist      TEXT    NOT NULL DEFAULT '',
            image_url   TEXT    NOT NULL DEFAULT '',
            loved       INTEGER NOT NULL DEFAULT 0
        );
        CREATE TABLE IF NOT EXISTS playlist_entries (
            id       INTEGER PRIMARY KEY AUTOINCREMENT,
            track_id INTEGER NOT NULL REFERENCES tracks(id),
            added_at TEXT    NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_tracks_title ON tracks(title);
        CREATE INDEX IF NOT EXISTS idx_tracks_artist ON tracks(artist);",
    )
    .context("Failed to create catalog tables")?;
    Ok(())
}

impl Catalog {
    /// Open (or create) the catalog at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create catalog directory {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open catalog at {}", path.display()))?;
        init_schema(&conn)?;

        debug!("Catalog opened at {}", path.display());
        Ok(Self::from_connection(conn))
    }

    /// In-memory catalog, handy for demos and tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory catalog")?;
        init_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            player: None,
            view: Mutex::new(SearchView::default()),
        }
    }

    /// Use `player` to find the current track and to start random tracks.
    pub fn with_player(mut self, player: Arc<dyn Player>) -> Self {
        self.player = Some(player);
        self
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("Catalog connection lock poisoned"))
    }

    fn view(&self) -> Result<MutexGuard<'_, SearchView>> {
        self.view
            .lock()
            .map_err(|_| anyhow::anyhow!("Search view lock poisoned"))
    }

    /// Insert tracks, skipping uris that are already catalogued. Returns how
    /// many were added.
    pub fn insert_tracks(&self, tracks: &[Track]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut added = 0;

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO tracks (uri, title, artist, image_url)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;

            for track in tracks {
                added += stmt
                    .execute(params![track.uri, track.title, track.artist, track.image_url])
                    .with_context(|| format!("Failed to insert track {}", track.uri))?;
            }
        }

        tx.commit().context("Committing catalog transaction failed")?;
        info!("Added {added} of {} tracks to the catalog", tracks.len());
        Ok(added)
    }

    /// Load tracks from a JSON array of [`Track`]s.
    pub fn import_json(&self, path: &Path) -> Result<usize> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let tracks: Vec<Track> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid track list in {}", path.display()))?;
        self.insert_tracks(&tracks)
    }

    pub fn track_count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM tracks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Tracks whose title or artist contains `query`, in catalog order.
    pub fn find(&self, query: &str) -> Result<Vec<SearchResult>> {
        self.select(query, SEARCH_LIMIT as i64)
            .with_context(|| format!("Failed to search catalog for '{query}'"))
    }

    /// `limit` of -1 means no limit.
    fn select(&self, query: &str, limit: i64) -> Result<Vec<SearchResult>> {
        let conn = self.conn()?;
        let pattern = like_pattern(query.trim());

        let mut stmt = conn.prepare(
            "SELECT id, uri, title, artist, image_url FROM tracks
             WHERE title LIKE ?1 ESCAPE '\\' OR artist LIKE ?1 ESCAPE '\\'
             ORDER BY id
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![pattern, limit], |row| {
            let id: i64 = row.get(0)?;
            Ok(SearchResult {
                id: id.to_string(),
                preview_url: row.get(1)?,
                title: row.get(2)?,
                artist: row.get(3)?,
                image_url: row.get(4)?,
            })
        })?;

        let tracks = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tracks)
    }

    fn current_id(&self) -> Result<Option<i64>> {
        let Some(player) = &self.player else {
            return Ok(None);
        };
        let Some(uri) = player.current_uri()? else {
            return Ok(None);
        };

        let conn = self.conn()?;
        conn.query_row("SELECT id FROM tracks WHERE uri = ?1", [&uri], |row| row.get(0))
            .optional()
            .with_context(|| format!("Failed to look up {uri}"))
    }

    fn require_current(&self) -> Result<i64> {
        self.current_id()?
            .context("The current track is not in the catalog")
    }

    fn set_loved(&self, loved: bool) -> Result<()> {
        let id = self.require_current()?;
        self.conn()?
            .execute("UPDATE tracks SET loved = ?1 WHERE id = ?2", params![loved, id])
            .context("Failed to update loved flag")?;
        Ok(())
    }

    pub fn playlist_len(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM playlist_entries", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl Search for Catalog {
    fn trigger(&self, query: &str) -> Result<()> {
        let results = self.find(query)?;
        debug!("Search '{query}' found {} tracks", results.len());

        let mut view = self.view()?;
        view.query = Some(query.to_string());
        view.results = results;
        Ok(())
    }

    fn current_results(&self) -> Result<Vec<SearchResult>> {
        Ok(self.view()?.results.clone())
    }

    fn state(&self) -> Result<SearchState> {
        let view = self.view()?;
        Ok(match (&view.query, view.results.is_empty()) {
            (None, _) => SearchState::Idle,
            (Some(_), false) => SearchState::HasResults,
            (Some(_), true) => SearchState::NoResults,
        })
    }
}

impl Library for Catalog {
    fn is_current_liked(&self) -> Result<Option<bool>> {
        let Some(id) = self.current_id()? else {
            return Ok(None);
        };
        let loved: bool = self
            .conn()?
            .query_row("SELECT loved FROM tracks WHERE id = ?1", [id], |row| row.get(0))?;
        Ok(Some(loved))
    }

    fn like_current(&self) -> Result<()> {
        self.set_loved(true)
    }

    fn unlike_current(&self) -> Result<()> {
        self.set_loved(false)
    }

    fn add_current_to_playlist(&self) -> Result<()> {
        let id = self.require_current()?;
        let added_at = chrono::Local::now().to_rfc3339();
        self.conn()?
            .execute(
                "INSERT INTO playlist_entries (track_id, added_at) VALUES (?1, ?2)",
                params![id, added_at],
            )
            .context("Failed to add track to playlist")?;
        Ok(())
    }

    fn play_random(&self) -> Result<Option<TrackInfo>> {
        let all = self.select("", -1)?;
        let Some(pick) = all.choose(&mut rand::thread_rng()) else {
            return Ok(None);
        };

        let player = self
            .player
            .as_ref()
            .context("No player attached to the catalog")?;
        player.play_track(pick)?;

        Ok(Some(TrackInfo {
            title: pick.title.clone(),
            artist: pick.artist.clone(),
        }))
    }
}
