//! # Command Resolver
//!
//! Turns a normalized transcript into a [`Resolution`]. Strategies are tried
//! in a fixed order and the first one that produces something wins:
//!
//! 1. search prefixes (`play <query>`, `find <query>`, ...), unless the
//!    query is a filler word such as "music";
//! 2. numeric templates (`volume to 40`, `forward 30 seconds`, ...);
//! 3. exact registry match;
//! 4. fuzzy match, tolerating one missing word.

use crate::config::{FuzzyPolicy, ResolverConfig};
use crate::registry::{normalize_phrase, Action, CommandRegistry};
use lazy_static::lazy_static;
use log::{debug, trace};
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref VOLUME_TO: Regex = Regex::new(r"\bvolume to (\d+)").unwrap();
    static ref SET_VOLUME_TO: Regex = Regex::new(r"\bset volume to (\d+)").unwrap();
    static ref VOLUME_N: Regex = Regex::new(r"\bvolume (\d+)").unwrap();
    static ref FORWARD_SECS: Regex = Regex::new(r"\bforward (\d+) seconds?").unwrap();
    static ref BACK_SECS: Regex = Regex::new(r"\bback (\d+) seconds?").unwrap();
    static ref SKIP_SECS: Regex = Regex::new(r"\bskip (\d+) seconds?").unwrap();
}

const PLAY_PREFIX: &str = "play";
const SEARCH_PREFIXES: [&str; 4] = ["find", "search for", "search and play", "look for"];

#[derive(Clone, Copy)]
enum Template {
    Volume,
    Forward,
    Back,
}

/// How a command resolution was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    Numeric,
    Exact,
    Fuzzy { phrase: String },
}

/// Outcome of resolving one transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing left after normalization.
    Empty,
    /// Start the search-and-play workflow.
    Search { query: String },
    Command { action: Action, kind: MatchKind },
    Unmatched,
}

impl Resolution {
    /// Single-shot commands close the session shortly after running.
    /// Searches keep it open until the workflow finishes.
    pub fn closes_session(&self) -> bool {
        matches!(self, Resolution::Command { .. })
    }
}

/// Resolves transcripts against a registry.
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: CommandRegistry,
    policy: FuzzyPolicy,
    filler_words: HashSet<String>,
}

impl Resolver {
    pub fn new(registry: CommandRegistry, config: &ResolverConfig) -> Self {
        Self {
            registry,
            policy: config.fuzzy_policy,
            filler_words: config
                .filler_words
                .iter()
                .map(|w| normalize_phrase(w))
                .collect(),
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Resolve an already-normalized transcript.
    pub fn resolve(&self, transcript: &str) -> Resolution {
        let transcript = normalize_phrase(transcript);
        if transcript.is_empty() {
            return Resolution::Empty;
        }

        if let Some(query) = self.match_search(&transcript) {
            debug!("Resolved search for '{query}'");
            return Resolution::Search { query };
        }

        if let Some(action) = match_numeric(&transcript) {
            debug!("Resolved numeric command {action:?}");
            return Resolution::Command { action, kind: MatchKind::Numeric };
        }

        if let Some(action) = self.registry.lookup(&transcript) {
            debug!("Resolved exact command '{transcript}'");
            return Resolution::Command { action: action.clone(), kind: MatchKind::Exact };
        }

        if let Some((phrase, action)) = self.match_fuzzy(&transcript) {
            debug!("Resolved '{transcript}' as similar to '{phrase}'");
            return Resolution::Command {
                action: action.clone(),
                kind: MatchKind::Fuzzy { phrase: phrase.to_string() },
            };
        }

        debug!("No command matched '{transcript}'");
        Resolution::Unmatched
    }

    fn match_search(&self, transcript: &str) -> Option<String> {
        let query = std::iter::once(PLAY_PREFIX)
            .chain(SEARCH_PREFIXES)
            .find_map(|prefix| strip_word_prefix(transcript, prefix))?;

        if query.is_empty() || self.filler_words.contains(query) {
            trace!("Search query '{query}' is filler, falling through");
            return None;
        }
        Some(query.to_string())
    }

    fn match_fuzzy(&self, transcript: &str) -> Option<(&str, &Action)> {
        let mut best: Option<(usize, usize, &str, &Action)> = None;

        for (phrase, action) in self.registry.iter() {
            let words: Vec<&str> = phrase.split(' ').collect();
            let hits = words.iter().filter(|w| transcript.contains(*w)).count();
            if hits < words.len().saturating_sub(1).max(1) {
                continue;
            }

            match self.policy {
                FuzzyPolicy::FirstMatch => return Some((phrase, action)),
                FuzzyPolicy::MostSpecific => {
                    let better = best.map_or(true, |(best_hits, best_len, _, _)| {
                        (hits, words.len()) > (best_hits, best_len)
                    });
                    if better {
                        best = Some((hits, words.len(), phrase, action));
                    }
                }
            }
        }

        best.map(|(_, _, phrase, action)| (phrase, action))
    }
}

/// `"play the one"` with prefix `"play"` gives `Some("the one")`.
/// The prefix must be followed by a space.
fn strip_word_prefix<'a>(transcript: &'a str, prefix: &str) -> Option<&'a str> {
    transcript
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix(' '))
        .map(str::trim)
}

fn match_numeric(transcript: &str) -> Option<Action> {
    // first matching template wins
    let templates: [(&Regex, Template); 6] = [
        (&*VOLUME_TO, Template::Volume),
        (&*SET_VOLUME_TO, Template::Volume),
        (&*VOLUME_N, Template::Volume),
        (&*FORWARD_SECS, Template::Forward),
        (&*BACK_SECS, Template::Back),
        (&*SKIP_SECS, Template::Forward),
    ];

    templates.iter().find_map(|(pattern, template)| {
        let digits = pattern.captures(transcript)?.get(1)?.as_str();
        // digits only, so the parse can fail only on overflow
        let n = digits.parse::<u32>().unwrap_or(u32::MAX);
        Some(match template {
            Template::Volume => Action::SetVolume(n.min(100) as u8),
            Template::Forward => Action::SeekForward(n),
            Template::Back => Action::SeekBackward(n),
        })
    })
}
