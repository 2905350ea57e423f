//! # MPD Player
//!
//! Implements [`Playback`] and [`Volume`] by shelling out to `mpc`, the
//! command-line client for the Music Player Daemon.
//!
//! All state is read back from `mpc status`:
//!
//! ```text
//! artist/album/song.mp3	Imagine Dragons	Believer
//! [playing] #5/20   1:23/3:45 (37%)
//! volume: 80%   repeat: on    random: off   single: off   consume: off
//! ```
//!
//! When nothing is loaded only the `volume:` line is printed.

use super::Player;
use crate::capabilities::{Playback, SearchResult, TrackInfo, TrackPosition, Volume};
use anyhow::{Context, Result};
use log::debug;
use std::process::Command;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Field separator for the `mpc status -f` line.
const STATUS_FORMAT: &str = "%file%\t%artist%\t%title%";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Play,
    Pause,
    Stop,
}

/// The loaded track as reported by `mpc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentSong {
    pub file: String,
    pub artist: String,
    pub title: String,
}

/// Parsed `mpc status` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpdStatus {
    pub current_song: Option<CurrentSong>,
    pub elapsed: Duration,
    /// `None` for streams or when stopped.
    pub duration: Option<Duration>,
    pub state: PlayerState,
    /// `None` when the output has no mixer.
    pub volume: Option<u8>,
}

impl MpdStatus {
    pub fn parse(text: &str) -> Self {
        let mut current_song = None;
        let mut elapsed = Duration::ZERO;
        let mut duration = None;
        let mut state = PlayerState::Stop;
        let mut volume = None;

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if trimmed.starts_with("volume:") {
                volume = parse_volume(trimmed);
            } else if trimmed.starts_with('[') {
                if trimmed.starts_with("[playing]") {
                    state = PlayerState::Play;
                } else if trimmed.starts_with("[paused]") {
                    state = PlayerState::Pause;
                }

                // format: [playing] #1/50   0:32/3:45 (13%)
                let times = trimmed
                    .split_whitespace()
                    .filter(|s| s.contains(':') && s.contains('/'))
                    .find_map(|s| s.split_once('/'));
                if let Some((pos, total)) = times {
                    if let Ok(secs) = parse_time(pos) {
                        elapsed = secs;
                    }
                    duration = parse_time(total).ok().filter(|d| !d.is_zero());
                }
            } else if current_song.is_none() {
                current_song = Some(parse_song_line(line));
            }
        }

        Self {
            current_song,
            elapsed,
            duration,
            state,
            volume,
        }
    }
}

fn parse_song_line(line: &str) -> CurrentSong {
    let mut fields = line.split('\t').map(str::trim);
    let file = fields.next().unwrap_or_default().to_string();
    let artist = fields.next().unwrap_or_default().to_string();
    let title = fields.next().unwrap_or_default().to_string();
    CurrentSong { file, artist, title }
}

/// `volume: 80%` or `volume:100%`. Mixer-less outputs print `n/a`.
fn parse_volume(line: &str) -> Option<u8> {
    let rest = line.strip_prefix("volume:")?.trim_start();
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    digits.parse::<u8>().ok().map(|v| v.min(100))
}

/// Parse `M:SS` or `H:MM:SS` into a duration.
fn parse_time(time_str: &str) -> Result<Duration> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        anyhow::bail!("Invalid time format: {time_str}");
    }

    let mut secs = 0u64;
    for part in parts {
        let value: u64 = part
            .parse()
            .with_context(|| format!("Invalid time format: {time_str}"))?;
        secs = secs * 60 + value;
    }
    Ok(Duration::from_secs(secs))
}

/// Fall back to the file name when tags are missing.
fn display_title(song: &CurrentSong) -> String {
    if !song.title.is_empty() {
        return song.title.clone();
    }
    song.file
        .rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.').map(|(stem, _)| stem).or(Some(name)))
        .unwrap_or_default()
        .to_string()
}

/// Playback and volume through `mpc`.
#[derive(Debug, Default)]
pub struct MpdPlayer {
    /// Volume to restore on unmute. MPD has no mute of its own.
    muted_from: Mutex<Option<u8>>,
}

impl MpdPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `mpc` is installed and MPD answers.
    pub fn connect() -> Result<Self> {
        mpc(&["version"]).context("MPD is not reachable. Is mpd running and mpc installed?")?;
        Ok(Self::new())
    }

    fn mute_state(&self) -> Result<MutexGuard<'_, Option<u8>>> {
        self.muted_from
            .lock()
            .map_err(|_| anyhow::anyhow!("Mute state lock poisoned"))
    }

    pub fn status(&self) -> Result<MpdStatus> {
        let output = mpc(&["status", "-f", STATUS_FORMAT])?;
        Ok(MpdStatus::parse(&output))
    }
}

/// Run `mpc` with `args` and return its stdout.
fn mpc(args: &[&str]) -> Result<String> {
    debug!("mpc {}", args.join(" "));

    let output = Command::new("mpc")
        .args(args)
        .output()
        .with_context(|| format!("Failed to run mpc {}", args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("mpc {} failed: {}", args.join(" "), stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

impl Playback for MpdPlayer {
    fn is_playing(&self) -> Result<bool> {
        Ok(self.status()?.state == PlayerState::Play)
    }

    fn toggle(&self) -> Result<()> {
        mpc(&["toggle"]).map(drop)
    }

    fn next(&self) -> Result<()> {
        mpc(&["next"]).map(drop)
    }

    fn previous(&self) -> Result<()> {
        mpc(&["prev"]).map(drop)
    }

    fn seek(&self, delta_secs: i64) -> Result<()> {
        let arg = format!("{delta_secs:+}");
        mpc(&["seek", &arg]).map(drop)
    }

    fn restart(&self) -> Result<()> {
        mpc(&["seek", "0"]).map(drop)
    }

    /// Append the track to the queue and jump to it.
    fn play_track(&self, track: &SearchResult) -> Result<()> {
        mpc(&["add", &track.preview_url])
            .with_context(|| format!("Failed to queue {}", track.title))?;
        let queue_len = mpc(&["playlist"])?.lines().count();
        mpc(&["play", &queue_len.to_string()]).map(drop)
    }

    fn position(&self) -> Result<Option<TrackPosition>> {
        let status = self.status()?;
        if status.state == PlayerState::Stop {
            return Ok(None);
        }
        Ok(status.duration.map(|duration| TrackPosition {
            elapsed: status.elapsed,
            duration,
        }))
    }

    fn now_playing(&self) -> Result<Option<TrackInfo>> {
        let status = self.status()?;
        if status.state == PlayerState::Stop {
            return Ok(None);
        }
        Ok(status.current_song.map(|song| TrackInfo {
            title: display_title(&song),
            artist: if song.artist.is_empty() { "Unknown Artist".to_string() } else { song.artist },
        }))
    }
}

impl Player for MpdPlayer {
    fn current_uri(&self) -> Result<Option<String>> {
        let status = self.status()?;
        Ok(status.current_song.map(|song| song.file).filter(|f| !f.is_empty()))
    }
}

impl Volume for MpdPlayer {
    fn get(&self) -> Result<u8> {
        self.status()?
            .volume
            .context("MPD output has no volume control")
    }

    fn set(&self, level: u8) -> Result<()> {
        mpc(&["volume", &level.min(100).to_string()]).map(drop)
    }

    fn mute(&self, level: u8) -> Result<()> {
        let mut muted_from = self.mute_state()?;
        self.set(0)?;
        // a second mute keeps the level from the first
        if muted_from.is_none() {
            *muted_from = Some(level);
        }
        Ok(())
    }

    fn unmute(&self) -> Result<()> {
        match self.mute_state()?.take() {
            Some(level) => self.set(level),
            None => Ok(()),
        }
    }
}
