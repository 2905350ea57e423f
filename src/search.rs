//! # Search-and-Play Workflow
//!
//! `"play believer"` opens the search view, types the query, waits for the
//! results to show up and plays the first one. The search capability is
//! asynchronous, so the workflow polls it on a fixed interval with a bounded
//! number of attempts.
//!
//! Only the most recent search may act. Every workflow carries a
//! [`SearchTicket`]; starting a new search makes all older tickets stale,
//! and a stale workflow stops at its next check without touching anything.

use crate::capabilities::{offload, AppContext, SearchResult, SearchState, Section, Severity};
use crate::config::{ActivationConfig, SearchConfig};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::time::{self, Duration, Instant};

/// Issues tickets and remembers which generation is current.
#[derive(Debug, Clone, Default)]
pub struct SearchTickets {
    current: Arc<AtomicU64>,
}

impl SearchTickets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation. Every ticket issued before is now stale.
    pub fn issue(&self) -> SearchTicket {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        SearchTicket {
            generation,
            current: Arc::clone(&self.current),
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current.load(Ordering::SeqCst) == generation
    }
}

/// Permission for one workflow to act, valid until the next search starts.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    generation: u64,
    current: Arc<AtomicU64>,
}

impl SearchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.generation
    }
}

/// How a workflow ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Played(SearchResult),
    NoResults,
    TimedOut,
    /// No usable search or playback capability.
    Unavailable,
    /// A newer search took over. Nothing was reported to the user.
    Superseded,
}

impl SearchOutcome {
    /// How long the session stays open after this outcome. `None` leaves the
    /// session alone.
    pub fn close_delay(&self, search: &SearchConfig, activation: &ActivationConfig) -> Option<Duration> {
        match self {
            SearchOutcome::Played(_) => Some(search.success_close_delay()),
            SearchOutcome::NoResults | SearchOutcome::TimedOut | SearchOutcome::Unavailable => {
                Some(activation.post_command_delay())
            }
            SearchOutcome::Superseded => None,
        }
    }
}

/// Run one search-and-play workflow to completion.
pub async fn run(ctx: AppContext, query: String, ticket: SearchTicket, config: SearchConfig) -> SearchOutcome {
    if !ticket.is_current() {
        return SearchOutcome::Superseded;
    }

    info!("Search #{} started for '{query}'", ticket.generation());
    ctx.notify(&format!("Searching for: {query}"), Severity::Info);
    if let Some(navigation) = &ctx.navigation {
        let shown = offload(navigation, ctx.call_timeout, |n| n.show_section(Section::Search)).await;
        if let Err(e) = shown {
            warn!("Could not show search view: {e:#}");
        }
    }

    time::sleep(config.settle_delay()).await;
    if !ticket.is_current() {
        debug!("Search #{} superseded before trigger", ticket.generation());
        return SearchOutcome::Superseded;
    }

    let Some(search) = ctx.search.clone() else {
        ctx.notify("Search functionality not available", Severity::Error);
        return SearchOutcome::Unavailable;
    };
    let typed = query.clone();
    if let Err(e) = offload(&search, ctx.call_timeout, move |s| s.trigger(&typed)).await {
        warn!("Search trigger failed for '{query}': {e:#}");
        return SearchOutcome::Unavailable;
    }

    let mut polls = time::interval_at(
        Instant::now() + config.first_poll_delay(),
        config.poll_interval(),
    );

    for attempt in 1..=config.max_attempts {
        polls.tick().await;
        if !ticket.is_current() {
            debug!("Search #{} superseded at attempt {attempt}", ticket.generation());
            return SearchOutcome::Superseded;
        }

        let results = offload(&search, ctx.call_timeout, |s| s.current_results())
            .await
            .unwrap_or_else(|e| {
                warn!("Reading search results failed: {e:#}");
                Vec::new()
            });

        if let Some(first) = results.into_iter().next() {
            return play_first(&ctx, first, &ticket).await;
        }

        match offload(&search, ctx.call_timeout, |s| s.state()).await {
            Ok(SearchState::NoResults) => {
                ctx.notify(&format!("No results for: {query}"), Severity::Warning);
                return SearchOutcome::NoResults;
            }
            Ok(state) => debug!("Search attempt {attempt}/{}: {state:?}", config.max_attempts),
            Err(e) => warn!("Reading search state failed: {e:#}"),
        }
    }

    ctx.notify("Search timeout", Severity::Warning);
    SearchOutcome::TimedOut
}

async fn play_first(ctx: &AppContext, track: SearchResult, ticket: &SearchTicket) -> SearchOutcome {
    if !ticket.is_current() {
        return SearchOutcome::Superseded;
    }

    let Some(playback) = &ctx.playback else {
        debug!("Playback capability not available, cannot play '{}'", track.title);
        return SearchOutcome::Unavailable;
    };
    let queued = track.clone();
    if let Err(e) = offload(playback, ctx.call_timeout, move |p| p.play_track(&queued)).await {
        warn!("Playing '{}' failed: {e:#}", track.title);
        return SearchOutcome::Unavailable;
    }

    ctx.notify(&format!("Playing: {}", track.title), Severity::Success);
    SearchOutcome::Played(track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{Notifier, Playback, Search, TrackInfo, TrackPosition};
    use anyhow::Result;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Toasts(Mutex<Vec<String>>);

    impl Notifier for Toasts {
        fn show(&self, message: &str, _severity: Severity, _duration: Duration) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    /// Results appear after `ready_after` polls.
    struct SlowSearch {
        ready_after: usize,
        no_results: bool,
        polls: Mutex<usize>,
        queries: Mutex<Vec<String>>,
    }

    impl SlowSearch {
        fn new(ready_after: usize) -> Self {
            Self { ready_after, no_results: false, polls: Mutex::new(0), queries: Mutex::new(Vec::new()) }
        }
    }

    impl Search for SlowSearch {
        fn trigger(&self, query: &str) -> Result<()> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(())
        }

        fn current_results(&self) -> Result<Vec<SearchResult>> {
            let mut polls = self.polls.lock().unwrap();
            *polls += 1;
            if self.no_results || *polls < self.ready_after {
                return Ok(Vec::new());
            }
            let query = self.queries.lock().unwrap().last().cloned().unwrap_or_default();
            Ok(vec![track(&query), track("other")])
        }

        fn state(&self) -> Result<SearchState> {
            Ok(if self.no_results { SearchState::NoResults } else { SearchState::Loading })
        }
    }

    #[derive(Default)]
    struct Player(Mutex<Vec<String>>);

    impl Playback for Player {
        fn is_playing(&self) -> Result<bool> { Ok(false) }
        fn toggle(&self) -> Result<()> { Ok(()) }
        fn next(&self) -> Result<()> { Ok(()) }
        fn previous(&self) -> Result<()> { Ok(()) }
        fn seek(&self, _delta_secs: i64) -> Result<()> { Ok(()) }
        fn restart(&self) -> Result<()> { Ok(()) }
        fn play_track(&self, track: &SearchResult) -> Result<()> {
            self.0.lock().unwrap().push(track.title.clone());
            Ok(())
        }
        fn position(&self) -> Result<Option<TrackPosition>> { Ok(None) }
        fn now_playing(&self) -> Result<Option<TrackInfo>> { Ok(None) }
    }

    fn track(title: &str) -> SearchResult {
        SearchResult {
            id: title.to_string(),
            title: title.to_string(),
            artist: "Someone".to_string(),
            image_url: String::new(),
            preview_url: String::new(),
        }
    }

    fn context(search: Arc<SlowSearch>) -> (AppContext, Arc<Toasts>, Arc<Player>) {
        let toasts = Arc::new(Toasts::default());
        let player = Arc::new(Player::default());
        let ctx = AppContext::new(toasts.clone())
            .with_search(search)
            .with_playback(player.clone());
        (ctx, toasts, player)
    }

    #[test]
    fn test_new_ticket_makes_old_stale() {
        let tickets = SearchTickets::new();
        let first = tickets.issue();
        assert!(first.is_current());

        let second = tickets.issue();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert!(tickets.is_current(second.generation()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_plays_first_result() {
        let search = Arc::new(SlowSearch::new(3));
        let (ctx, toasts, player) = context(search.clone());
        let tickets = SearchTickets::new();

        let start = Instant::now();
        let outcome = run(ctx, "believer".to_string(), tickets.issue(), SearchConfig::default()).await;

        assert_eq!(outcome, SearchOutcome::Played(track("believer")));
        assert_eq!(*player.0.lock().unwrap(), vec!["believer".to_string()]);
        // settle 1s, first poll at +2s, then two more 1s polls
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert_eq!(
            *toasts.0.lock().unwrap(),
            vec!["Searching for: believer".to_string(), "Playing: believer".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_results_stops_early() {
        let search = Arc::new(SlowSearch { no_results: true, ..SlowSearch::new(1) });
        let (ctx, toasts, player) = context(search.clone());

        let outcome = run(ctx, "zzz".to_string(), SearchTickets::new().issue(), SearchConfig::default()).await;

        assert_eq!(outcome, SearchOutcome::NoResults);
        assert!(player.0.lock().unwrap().is_empty());
        assert_eq!(*search.polls.lock().unwrap(), 1);
        assert_eq!(toasts.0.lock().unwrap().last().map(String::as_str), Some("No results for: zzz"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_max_attempts() {
        let search = Arc::new(SlowSearch::new(usize::MAX));
        let (ctx, toasts, _) = context(search.clone());

        let start = Instant::now();
        let outcome = run(ctx, "slow".to_string(), SearchTickets::new().issue(), SearchConfig::default()).await;

        assert_eq!(outcome, SearchOutcome::TimedOut);
        assert_eq!(*search.polls.lock().unwrap(), 10);
        assert_eq!(start.elapsed(), Duration::from_secs(1 + 2 + 9));
        assert_eq!(toasts.0.lock().unwrap().last().map(String::as_str), Some("Search timeout"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_search_capability() {
        let toasts = Arc::new(Toasts::default());
        let ctx = AppContext::new(toasts.clone());

        let outcome = run(ctx, "x".to_string(), SearchTickets::new().issue(), SearchConfig::default()).await;

        assert_eq!(outcome, SearchOutcome::Unavailable);
        assert_eq!(
            toasts.0.lock().unwrap().last().map(String::as_str),
            Some("Search functionality not available")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_search_supersedes_older() {
        let search = Arc::new(SlowSearch::new(1));
        let (ctx, toasts, player) = context(search.clone());
        let tickets = SearchTickets::new();

        let alpha = tokio::spawn(run(ctx.clone(), "alpha".to_string(), tickets.issue(), SearchConfig::default()));
        time::sleep(Duration::from_millis(500)).await;
        let beta = tokio::spawn(run(ctx, "beta".to_string(), tickets.issue(), SearchConfig::default()));

        assert_eq!(alpha.await.unwrap(), SearchOutcome::Superseded);
        assert_eq!(beta.await.unwrap(), SearchOutcome::Played(track("beta")));
        assert_eq!(*player.0.lock().unwrap(), vec!["beta".to_string()]);
        assert_eq!(*search.queries.lock().unwrap(), vec!["beta".to_string()]);
        assert!(!toasts.0.lock().unwrap().iter().any(|t| t == "Playing: alpha"));
    }

    #[test]
    fn test_close_delays() {
        let search = SearchConfig::default();
        let activation = ActivationConfig::default();

        assert_eq!(
            SearchOutcome::Played(track("a")).close_delay(&search, &activation),
            Some(Duration::from_secs(2))
        );
        assert_eq!(
            SearchOutcome::TimedOut.close_delay(&search, &activation),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(SearchOutcome::Superseded.close_delay(&search, &activation), None);
    }
}
