//! # Command Registry
//!
//! Maps canonical spoken phrases to [`Action`]s. Phrases are stored lowercased
//! with single spaces, so `"Next  Song"` and `"next song"` are the same key.
//! Re-registering a phrase replaces its action but keeps its position in
//! iteration order, which matters for fuzzy matching.

use crate::capabilities::Section;
use std::collections::HashMap;

/// A zero-argument operation the executor knows how to perform.
///
/// Parametric commands ("volume to 40") carry their already-parsed argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Play,
    Pause,
    Next,
    Previous,
    Restart,
    VolumeUp,
    VolumeDown,
    SetVolume(u8),
    Mute,
    Unmute,
    SeekForward(u32),
    SeekBackward(u32),
    SongLength,
    TimeRemaining,
    ShowSection(Section),
    NowPlaying,
    PlayRandom,
    ShowTrending,
    Like,
    Unlike,
    AddToPlaylist,
    CreatePlaylist,
    TellTime,
    TellDate,
    Greet,
    Respond(&'static str),
    Joke,
    Introduce,
    ThankYou,
    Deactivate,
    Goodbye,
    Help,
    Repeat,
}

impl Action {
    /// Whether "repeat that" should remember this action.
    pub fn is_repeatable(&self) -> bool {
        !matches!(self, Action::Repeat)
    }
}

/// Lowercase and collapse whitespace.
pub fn normalize_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Phrase table with last-write-wins registration.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    entries: Vec<(String, Action)>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `phrase`, or overwrite its action if already present.
    /// Blank phrases are ignored.
    pub fn register(&mut self, phrase: &str, action: Action) {
        let key = normalize_phrase(phrase);
        if key.is_empty() {
            return;
        }

        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 = action,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, action));
            }
        }
    }

    pub fn lookup(&self, phrase: &str) -> Option<&Action> {
        self.index
            .get(&normalize_phrase(phrase))
            .map(|&slot| &self.entries[slot].1)
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Action)> {
        self.entries.iter().map(|(phrase, action)| (phrase.as_str(), action))
    }

    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(phrase, _)| phrase.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The full assistant command set.
    pub fn with_default_commands() -> Self {
        let mut registry = Self::new();
        for (phrases, action) in default_commands() {
            for phrase in phrases {
                registry.register(phrase, action.clone());
            }
        }
        registry
    }
}

type Entry = (&'static [&'static str], Action);

fn entry(phrases: &'static [&'static str], action: Action) -> Entry {
    (phrases, action)
}

fn default_commands() -> Vec<Entry> {
    use Action::*;

    vec![
        // playback
        entry(&["play", "start music", "start playing", "play music"], Play),
        entry(&["pause", "stop", "stop music", "pause music", "hold on"], Pause),
        entry(&["resume", "continue", "keep playing"], Play),
        entry(
            &["next", "next song", "skip", "skip this", "skip this song", "next track", "forward"],
            Next,
        ),
        entry(&["previous", "last song", "back", "previous song"], Previous),
        entry(&["replay", "restart song", "start over"], Restart),
        // volume
        entry(
            &["volume up", "turn up volume", "louder", "increase volume", "turn it up"],
            VolumeUp,
        ),
        entry(
            &["volume down", "turn down volume", "softer", "quieter", "decrease volume", "turn it down"],
            VolumeDown,
        ),
        entry(&["mute", "silence", "turn off sound", "be quiet"], Mute),
        entry(&["unmute", "turn sound back on", "sound on"], Unmute),
        entry(
            &["max volume", "full volume", "maximum volume", "turn it all the way up"],
            SetVolume(100),
        ),
        entry(&["half volume", "medium volume"], SetVolume(50)),
        // navigation
        entry(
            &["go to home", "show home", "main screen", "home page", "dashboard"],
            ShowSection(Section::Dashboard),
        ),
        entry(
            &["search", "find music", "browse", "search music", "discover"],
            ShowSection(Section::Search),
        ),
        entry(
            &[
                "library", "go to library", "my music", "playlists", "my library",
                "show library", "my playlists",
            ],
            ShowSection(Section::Library),
        ),
        entry(
            &[
                "profile", "go to profile", "my account", "settings", "my profile",
                "account settings",
            ],
            ShowSection(Section::Profile),
        ),
        // what's on
        entry(
            &[
                "what's playing", "what is this song", "who sings this", "song info",
                "current song", "what song is this", "track info", "tell me about this song",
            ],
            NowPlaying,
        ),
        entry(
            &[
                "play something random", "shuffle music", "surprise me", "random song",
                "play random", "something random",
            ],
            PlayRandom,
        ),
        entry(
            &[
                "trending", "popular songs", "what's hot", "show trending", "top songs",
                "popular music",
            ],
            ShowTrending,
        ),
        // favourites and playlists
        entry(
            &[
                "like this", "like this song", "add to favorites", "favorite this",
                "save this song", "i love this",
            ],
            Like,
        ),
        entry(&["unlike this", "remove from favorites", "unfavorite"], Unlike),
        entry(&["add to playlist", "save to playlist"], AddToPlaylist),
        entry(&["create playlist", "new playlist"], CreatePlaylist),
        entry(&["show playlists"], ShowSection(Section::Library)),
        // seeking
        entry(
            &["fast forward", "skip ahead", "forward ten seconds", "forward 10 seconds"],
            SeekForward(10),
        ),
        entry(&["rewind", "go back ten seconds", "back 10 seconds"], SeekBackward(10)),
        entry(&["how long", "song length"], SongLength),
        entry(&["how much time left", "time remaining"], TimeRemaining),
        // clock
        entry(&["what time is it", "time", "current time"], TellTime),
        entry(&["what date is it", "what's the date", "today's date"], TellDate),
        // personality
        entry(
            &["hello", "hi", "hey", "good morning", "good afternoon", "good evening"],
            Greet,
        ),
        entry(&["how are you"], Respond("I'm doing great! Ready to help you with music.")),
        entry(&["how's it going"], Respond("All systems operational and ready to rock!")),
        entry(&["tell me a joke", "joke", "make me laugh"], Joke),
        entry(&["who are you", "what are you", "introduce yourself"], Introduce),
        // assistant control
        entry(&["thank you", "thanks", "appreciate it", "good job"], ThankYou),
        entry(
            &["stop listening", "never mind", "cancel", "go to sleep", "that's all"],
            Deactivate,
        ),
        entry(&["goodbye", "bye"], Goodbye),
        entry(
            &["help", "what can you do", "commands", "show commands", "list commands"],
            Help,
        ),
        entry(&["repeat that", "say that again", "do that again"], Repeat),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup_normalizes() {
        let mut registry = CommandRegistry::new();
        registry.register("  Next   Song ", Action::Next);

        assert_eq!(registry.lookup("next song"), Some(&Action::Next));
        assert_eq!(registry.lookup("NEXT SONG"), Some(&Action::Next));
        assert_eq!(registry.lookup("next"), None);
    }

    #[test]
    fn test_last_write_wins_keeps_position() {
        let mut registry = CommandRegistry::new();
        registry.register("stop", Action::Pause);
        registry.register("next", Action::Next);
        registry.register("stop", Action::Deactivate);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("stop"), Some(&Action::Deactivate));

        let order: Vec<&str> = registry.phrases().collect();
        assert_eq!(order, vec!["stop", "next"]);
    }

    #[test]
    fn test_blank_phrase_ignored() {
        let mut registry = CommandRegistry::new();
        registry.register("   ", Action::Help);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_default_commands_cover_core_phrases() {
        let registry = CommandRegistry::with_default_commands();

        assert!(registry.len() > 100);
        assert_eq!(registry.lookup("next song"), Some(&Action::Next));
        assert_eq!(registry.lookup("turn up volume"), Some(&Action::VolumeUp));
        assert_eq!(registry.lookup("max volume"), Some(&Action::SetVolume(100)));
        assert_eq!(registry.lookup("stop listening"), Some(&Action::Deactivate));
        assert_eq!(registry.lookup("play music"), Some(&Action::Play));
        assert_eq!(
            registry.lookup("show playlists"),
            Some(&Action::ShowSection(Section::Library))
        );
    }

    #[test]
    fn test_default_registration_order_starts_with_playback() {
        let registry = CommandRegistry::with_default_commands();
        let first: Vec<&str> = registry.phrases().take(3).collect();
        assert_eq!(first, vec!["play", "start music", "start playing"]);
    }

    #[test]
    fn test_repeat_is_not_repeatable() {
        assert!(!Action::Repeat.is_repeatable());
        assert!(Action::Next.is_repeatable());
    }
}
