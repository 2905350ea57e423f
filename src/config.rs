//! # Configuration Module
//!
//! This module handles configuration management and data directory setup for
//! muse-voice. It provides platform-appropriate storage locations and the
//! runtime tuning knobs of the interpreter (wake word, timers, search polling).
//!
//! ## Data Storage
//!
//! The music catalog lives in the platform-standard data directory:
//! - Linux: `~/.local/share/muse-voice/`
//! - macOS: `~/Library/Application Support/muse-voice/`
//! - Windows: `%APPDATA%\muse-voice\`
//!
//! The optional `config.json` lives in the matching config directory.
//! Every field has a default, so a partial file is fine:
//!
//! ```json
//! { "activation": { "wake_word": "jarvis", "idle_timeout_ms": 10000 } }
//! ```

use crate::capabilities::DEFAULT_CALL_TIMEOUT;
use anyhow::{Result, Context};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "muse-voice";

/// Returns the platform-appropriate data directory for muse-voice,
/// creating it if needed.
///
/// # Errors
///
/// This function will return an error if:
/// - The system data directory cannot be determined
/// - The subdirectory cannot be created due to permissions
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        ))?;

    let app_dir = data_dir.join(APP_DIR);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!(
            "Failed to create muse-voice data directory at {}. Please check file permissions.",
            app_dir.display()
        ))?;

    Ok(app_dir)
}

/// Returns the default path of the SQLite music catalog.
///
/// # Examples
///
/// ```no_run
/// use muse_voice::config::get_catalog_path;
///
/// let path = get_catalog_path()?;
/// println!("Catalog location: {}", path.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn get_catalog_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("catalog.db"))
}

/// Returns the default location of `config.json`. The file itself may not exist.
pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine system config directory"))?;
    Ok(config_dir.join(APP_DIR).join("config.json"))
}

/// How the resolver picks between several phrases that pass the fuzzy threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuzzyPolicy {
    /// First phrase in registration order that passes the threshold.
    #[default]
    FirstMatch,
    /// Phrase with the most matched words; longer phrases win ties.
    MostSpecific,
}

/// Wake word and session timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    pub wake_word: String,
    /// Idle window after which an open session closes by itself.
    pub idle_timeout_ms: u64,
    /// Delay before a single-shot command closes the session.
    pub post_command_delay_ms: u64,
    /// Delay before the "try saying help" hint after an unmatched command.
    pub help_hint_delay_ms: u64,
    /// Lower playback volume while a session is open.
    pub duck_volume: bool,
    /// Ducked level as a percentage of the current volume.
    pub duck_percent: u8,
    /// Ducked volume never goes below this level.
    pub duck_floor: u8,
    /// A player or catalog call that takes longer is abandoned.
    pub capability_timeout_ms: u64,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            wake_word: "computer".to_string(),
            idle_timeout_ms: 8_000,
            post_command_delay_ms: 1_500,
            help_hint_delay_ms: 2_000,
            duck_volume: true,
            duck_percent: 15,
            duck_floor: 10,
            capability_timeout_ms: DEFAULT_CALL_TIMEOUT.as_millis() as u64,
        }
    }
}

impl ActivationConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn post_command_delay(&self) -> Duration {
        Duration::from_millis(self.post_command_delay_ms)
    }

    pub fn help_hint_delay(&self) -> Duration {
        Duration::from_millis(self.help_hint_delay_ms)
    }

    pub fn capability_timeout(&self) -> Duration {
        Duration::from_millis(self.capability_timeout_ms)
    }
}

/// Resolver tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub fuzzy_policy: FuzzyPolicy,
    /// Queries that are too generic to be searched for ("play music").
    pub filler_words: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fuzzy_policy: FuzzyPolicy::FirstMatch,
            filler_words: ["music", "song", "something", "random", "it", "this", "that"]
                .iter()
                .map(|w| w.to_string())
                .collect(),
        }
    }
}

/// Search-and-play polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Wait after switching to the search section before triggering the search.
    pub settle_delay_ms: u64,
    /// Wait after triggering before the first poll.
    pub first_poll_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
    /// Delay before the session closes after a result started playing.
    pub success_close_delay_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 1_000,
            first_poll_delay_ms: 2_000,
            poll_interval_ms: 1_000,
            max_attempts: 10,
            success_close_delay_ms: 2_000,
        }
    }
}

impl SearchConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn first_poll_delay(&self) -> Duration {
        Duration::from_millis(self.first_poll_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        // tokio intervals panic on a zero period
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn success_close_delay(&self) -> Duration {
        Duration::from_millis(self.success_close_delay_ms)
    }
}

/// Speech stream restart policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Wait before reopening a stream that ended normally.
    pub restart_backoff_ms: u64,
    /// Wait before retrying after a failed reopen.
    pub retry_backoff_ms: u64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            restart_backoff_ms: 1_000,
            retry_backoff_ms: 2_000,
        }
    }
}

impl RecognitionConfig {
    pub fn restart_backoff(&self) -> Duration {
        Duration::from_millis(self.restart_backoff_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Complete interpreter configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub activation: ActivationConfig,
    pub resolver: ResolverConfig,
    pub search: SearchConfig,
    pub recognition: RecognitionConfig,
}

impl VoiceConfig {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_json(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from the platform config directory.
    pub fn load_default() -> Result<Self> {
        Self::load(&get_config_path()?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(raw).context("Failed to parse config JSON")?;
        config.activation.wake_word = config.activation.wake_word.trim().to_lowercase();
        if config.activation.wake_word.is_empty() {
            anyhow::bail!("Wake word must not be empty");
        }
        Ok(config)
    }

    /// Override the wake word (CLI flag).
    pub fn with_wake_word(mut self, wake_word: &str) -> Self {
        let wake_word = wake_word.trim().to_lowercase();
        if !wake_word.is_empty() {
            self.activation.wake_word = wake_word;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_assistant_timings() {
        let config = VoiceConfig::default();

        assert_eq!(config.activation.wake_word, "computer");
        assert_eq!(config.activation.idle_timeout(), Duration::from_secs(8));
        assert_eq!(config.activation.post_command_delay(), Duration::from_millis(1500));
        assert_eq!(config.activation.capability_timeout(), Duration::from_secs(3));
        assert_eq!(config.search.max_attempts, 10);
        assert_eq!(config.search.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.resolver.fuzzy_policy, FuzzyPolicy::FirstMatch);
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let config = VoiceConfig::from_json(
            r#"{ "activation": { "wake_word": "  Jarvis " }, "resolver": { "fuzzy_policy": "most_specific" } }"#,
        ).expect("Should parse");

        assert_eq!(config.activation.wake_word, "jarvis");
        assert_eq!(config.activation.idle_timeout_ms, 8_000);
        assert_eq!(config.resolver.fuzzy_policy, FuzzyPolicy::MostSpecific);
        assert_eq!(config.search, SearchConfig::default());
    }

    #[test]
    fn test_empty_wake_word_rejected() {
        let result = VoiceConfig::from_json(r#"{ "activation": { "wake_word": " " } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = VoiceConfig::load(&temp_dir.path().join("nope.json"))
            .expect("Missing file is not an error");

        assert_eq!(config, VoiceConfig::default());
    }

    #[test]
    fn test_load_reads_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{ "search": { "max_attempts": 3 } }"#).expect("Failed to write config");

        let config = VoiceConfig::load(&path).expect("Should load");
        assert_eq!(config.search.max_attempts, 3);
    }

    #[test]
    fn test_wake_word_override() {
        let config = VoiceConfig::default().with_wake_word("Muse");
        assert_eq!(config.activation.wake_word, "muse");

        let unchanged = VoiceConfig::default().with_wake_word("   ");
        assert_eq!(unchanged.activation.wake_word, "computer");
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let search = SearchConfig { poll_interval_ms: 0, ..SearchConfig::default() };
        assert_eq!(search.poll_interval(), Duration::from_millis(1));
    }
}
