//! # Action Executor
//!
//! Performs resolved [`Action`]s against the capabilities in an
//! [`AppContext`] and confirms each effect with a notification.
//!
//! A capability that is missing is skipped with a debug log. A capability
//! that fails is skipped with a warning. Neither is reported to the user and
//! neither is an error for the caller.
//!
//! The executor also owns volume ducking: while a session is open the music
//! is lowered so the command can be heard, and restored when it closes.

use crate::capabilities::{offload, AppContext, Section, Severity, TrackPosition};
use crate::config::ActivationConfig;
use crate::registry::Action;
use anyhow::Result;
use chrono::{DateTime, Local, TimeZone, Timelike};
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use std::sync::Arc;
use std::time::Duration;

const VOLUME_STEP: i16 = 20;

const JOKES: [&str; 8] = [
    "Why did the music teacher need a ladder? To reach the high notes!",
    "What's Beethoven's favorite fruit? Ba-na-na-naaaa!",
    "Why did the pianist keep banging his head? He was playing by ear!",
    "What do you call a musical insect? A humbug!",
    "Why was the musician arrested? For getting into treble!",
    "What's a skeleton's favorite instrument? The trom-bone!",
    "Why did the guitar go to school? To get better at chord-reading!",
    "What do you get when you drop a piano down a mine shaft? A flat minor!",
];

const THANKS_REPLIES: [&str; 6] = [
    "You're welcome!",
    "Happy to help!",
    "Anytime!",
    "My pleasure!",
    "Glad I could help!",
    "You got it!",
];

const GOODBYES: [&str; 4] = [
    "Goodbye! Enjoy your music!",
    "See you later!",
    "Catch you later!",
    "Have a great day!",
];

const INTRODUCTION: &str = "I'm your Muse voice assistant! I can help you control music, \
search for songs, and more. Say 'help' to see what I can do!";

pub const HELP_TEXT: &str = "Muse Voice Assistant - Available Commands:

PLAYBACK:
  \"Play/Pause/Resume\" - Control playback
  \"Next/Previous/Skip\" - Navigate tracks
  \"Replay/Restart song\" - Start over

VOLUME:
  \"Volume up/down\" - Adjust volume
  \"Volume to [number]\" - Set specific level
  \"Mute/Unmute\" - Toggle sound
  \"Max volume\" - Set to 100%

SEARCH:
  \"Play [song name]\" - Search and play
  \"Find [song name]\" - Search for music
  \"Play something random\" - Surprise me

NAVIGATION:
  \"Go home/Search/Library/Profile\"
  \"Show trending\" - Popular songs

TIME CONTROLS:
  \"Forward/Back [X] seconds\" - Skip time
  \"How long/Time remaining\" - Track info

SMART FEATURES:
  \"What's playing?\" - Current song info
  \"Like this/Unlike this\" - Favorites
  \"Add to playlist\" - Save songs

INFORMATION:
  \"What time is it?\" - Current time
  \"What's the date?\" - Today's date
  \"Tell me a joke\" - Have fun!

CONTROL:
  \"Help\" - Show this menu
  \"Stop listening\" - Deactivate
  \"Repeat that\" - Redo last command";

/// What the interpreter should do after an action ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecOutcome {
    Done,
    /// Close the session now.
    Deactivate,
}

fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn format_time<Tz: TimeZone>(now: &DateTime<Tz>) -> String {
    let hour = now.hour();
    let ampm = if hour >= 12 { "PM" } else { "AM" };
    let display_hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("It's {display_hour}:{:02} {ampm}", now.minute())
}

fn greeting_for_hour(hour: u32) -> &'static str {
    match hour {
        0..=11 => "Good morning! Ready for some music?",
        12..=17 => "Good afternoon! What would you like to hear?",
        _ => "Good evening! Let's play some music!",
    }
}

fn pick(options: &[&'static str]) -> &'static str {
    options.choose(&mut rand::thread_rng()).copied().unwrap_or_default()
}

/// Executes actions against the host capabilities.
#[derive(Debug)]
pub struct Executor {
    ctx: AppContext,
    duck_enabled: bool,
    duck_percent: u8,
    duck_floor: u8,
    /// Volume to restore when the session closes.
    ducked_from: Option<u8>,
}

impl Executor {
    pub fn new(ctx: AppContext, config: &ActivationConfig) -> Self {
        Self {
            ctx,
            duck_enabled: config.duck_volume,
            duck_percent: config.duck_percent.min(100),
            duck_floor: config.duck_floor.min(100),
            ducked_from: None,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn is_ducked(&self) -> bool {
        self.ducked_from.is_some()
    }

    /// Run `f` against an optional capability off the runtime thread,
    /// logging absence and failure.
    async fn call<T, R, F>(&self, cap: &Option<Arc<T>>, name: &str, f: F) -> Option<R>
    where
        T: ?Sized + Send + Sync + 'static,
        R: Send + 'static,
        F: FnOnce(&T) -> Result<R> + Send + 'static,
    {
        let Some(cap) = cap else {
            debug!("{name} capability not available, skipping");
            return None;
        };
        match offload(cap, self.ctx.call_timeout, f).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("{name} capability failed: {e:#}");
                None
            }
        }
    }

    /// Lower the volume while music is playing. Does nothing if already ducked.
    pub async fn duck(&mut self) {
        if !self.duck_enabled || self.ducked_from.is_some() {
            return;
        }
        let playing = self
            .call(&self.ctx.playback, "playback", |p| p.is_playing())
            .await
            .unwrap_or(false);
        if !playing {
            return;
        }
        // muted output has nothing to duck
        let Some(level) = self.call(&self.ctx.volume, "volume", |v| v.get()).await.filter(|l| *l > 0) else {
            return;
        };

        let ducked = (u16::from(level) * u16::from(self.duck_percent) / 100) as u8;
        let ducked = ducked.max(self.duck_floor).min(level);
        if self.call(&self.ctx.volume, "volume", move |v| v.set(ducked)).await.is_some() {
            debug!("Volume ducked from {level}% to {ducked}%");
            self.ducked_from = Some(level);
        }
    }

    /// Restore the volume saved by [`Executor::duck`].
    pub async fn restore(&mut self) {
        if let Some(level) = self.ducked_from.take() {
            self.call(&self.ctx.volume, "volume", move |v| v.set(level)).await;
            debug!("Volume restored to {level}%");
        }
    }

    /// The volume the user hears outside of ducking.
    async fn base_volume(&self) -> Option<u8> {
        match self.ducked_from {
            Some(level) => Some(level),
            None => self.call(&self.ctx.volume, "volume", |v| v.get()).await,
        }
    }

    /// Set an explicit volume. An explicit level replaces whatever ducking
    /// would have restored.
    async fn apply_volume(&mut self, level: u8) -> Option<u8> {
        let level = level.min(100);
        self.call(&self.ctx.volume, "volume", move |v| v.set(level)).await?;
        self.ducked_from = None;
        Some(level)
    }

    fn say(&self, message: &str, severity: Severity) {
        self.ctx.notify(message, severity);
    }

    fn say_for(&self, message: &str, severity: Severity, millis: u64) {
        self.ctx.notify_for(message, severity, Duration::from_millis(millis));
    }

    async fn is_playing(&self) -> Option<bool> {
        self.call(&self.ctx.playback, "playback", |p| p.is_playing()).await
    }

    async fn position(&self) -> Option<TrackPosition> {
        self.call(&self.ctx.playback, "playback", |p| p.position()).await.flatten()
    }

    async fn show_section(&self, section: Section) -> bool {
        self.call(&self.ctx.navigation, "navigation", move |n| n.show_section(section))
            .await
            .is_some()
    }

    /// Perform `action`. [`Action::Repeat`] is resolved by the caller and is a
    /// no-op here.
    pub async fn execute(&mut self, action: &Action) -> ExecOutcome {
        info!("Executing {action:?}");

        match action {
            Action::Play => match self.is_playing().await {
                Some(false) => {
                    if self.call(&self.ctx.playback, "playback", |p| p.toggle()).await.is_some() {
                        self.say("Playing music", Severity::Success);
                    }
                }
                Some(true) => self.say("Music is already playing", Severity::Info),
                None => {}
            },
            Action::Pause => match self.is_playing().await {
                Some(true) => {
                    if self.call(&self.ctx.playback, "playback", |p| p.toggle()).await.is_some() {
                        self.say("Music paused", Severity::Success);
                    }
                }
                Some(false) => self.say("Music is already paused", Severity::Info),
                None => {}
            },
            Action::Next => {
                if self.call(&self.ctx.playback, "playback", |p| p.next()).await.is_some() {
                    self.say("Skipping to next track", Severity::Success);
                }
            }
            Action::Previous => {
                if self.call(&self.ctx.playback, "playback", |p| p.previous()).await.is_some() {
                    self.say("Going to previous track", Severity::Success);
                }
            }
            Action::Restart => {
                if self.call(&self.ctx.playback, "playback", |p| p.restart()).await.is_some() {
                    self.say("Restarting song", Severity::Success);
                }
            }
            Action::VolumeUp | Action::VolumeDown => {
                let step = if *action == Action::VolumeUp { VOLUME_STEP } else { -VOLUME_STEP };
                let Some(current) = self.base_volume().await else {
                    return ExecOutcome::Done;
                };
                let target = (i16::from(current) + step).clamp(0, 100) as u8;
                if let Some(level) = self.apply_volume(target).await {
                    let verb = if step > 0 { "increased" } else { "decreased" };
                    self.say(&format!("Volume {verb} to {level}%"), Severity::Success);
                }
            }
            Action::SetVolume(level) => {
                if let Some(level) = self.apply_volume(*level).await {
                    self.say(&format!("Volume set to {level}%"), Severity::Success);
                }
            }
            Action::Mute => {
                let Some(level) = self.base_volume().await else {
                    return ExecOutcome::Done;
                };
                if self.call(&self.ctx.volume, "volume", move |v| v.mute(level)).await.is_some() {
                    // closing the session must not turn the sound back on
                    self.ducked_from = None;
                    self.say("Music muted", Severity::Success);
                }
            }
            Action::Unmute => {
                self.restore().await;
                if self.call(&self.ctx.volume, "volume", |v| v.unmute()).await.is_some() {
                    let level = self.base_volume().await.unwrap_or(0);
                    self.say(&format!("Sound on - Volume at {level}%"), Severity::Success);
                }
            }
            Action::SeekForward(secs) => {
                let secs = u64::from(*secs);
                let delta = match self.position().await {
                    Some(pos) => secs.min(pos.remaining().as_secs()),
                    None => secs,
                };
                if self.call(&self.ctx.playback, "playback", move |p| p.seek(delta as i64)).await.is_some() {
                    self.say(&format!("Skipped forward {delta} seconds"), Severity::Success);
                }
            }
            Action::SeekBackward(secs) => {
                let secs = u64::from(*secs);
                let delta = match self.position().await {
                    Some(pos) => secs.min(pos.elapsed.as_secs()),
                    None => secs,
                };
                if self.call(&self.ctx.playback, "playback", move |p| p.seek(-(delta as i64))).await.is_some() {
                    self.say(&format!("Rewound {delta} seconds"), Severity::Success);
                }
            }
            Action::SongLength => match self.position().await {
                Some(pos) => self.say(
                    &format!("Song length: {}", format_clock(pos.duration)),
                    Severity::Info,
                ),
                None => self.say("No song is playing", Severity::Info),
            },
            Action::TimeRemaining => match self.position().await {
                Some(pos) => self.say(
                    &format!("Time remaining: {}", format_clock(pos.remaining())),
                    Severity::Info,
                ),
                None => self.say("No song is playing", Severity::Info),
            },
            Action::ShowSection(section) => {
                if self.show_section(*section).await {
                    self.say(&format!("Showing {section}"), Severity::Success);
                }
            }
            Action::NowPlaying => {
                if let Some(track) = self.call(&self.ctx.playback, "playback", |p| p.now_playing()).await {
                    match track {
                        Some(track) => self.say_for(
                            &format!("Now playing: {} by {}", track.title, track.artist),
                            Severity::Info,
                            5000,
                        ),
                        None => self.say("No music is currently playing", Severity::Info),
                    }
                }
            }
            Action::PlayRandom => {
                if let Some(started) = self.call(&self.ctx.library, "library", |l| l.play_random()).await {
                    match started {
                        Some(_) => self.say("Playing random track", Severity::Success),
                        None => self.say("No tracks available to play", Severity::Warning),
                    }
                }
            }
            Action::ShowTrending => {
                self.show_section(Section::Dashboard).await;
                self.say("Showing trending music", Severity::Info);
            }
            Action::Like => match self.call(&self.ctx.library, "library", |l| l.is_current_liked()).await {
                Some(Some(false)) => {
                    if self.call(&self.ctx.library, "library", |l| l.like_current()).await.is_some() {
                        self.say("Added to liked songs", Severity::Success);
                    }
                }
                Some(Some(true)) => self.say("This song is already liked", Severity::Info),
                Some(None) => self.say("No song is playing", Severity::Info),
                None => {}
            },
            Action::Unlike => match self.call(&self.ctx.library, "library", |l| l.is_current_liked()).await {
                Some(Some(true)) => {
                    if self.call(&self.ctx.library, "library", |l| l.unlike_current()).await.is_some() {
                        self.say("Removed from liked songs", Severity::Success);
                    }
                }
                Some(Some(false)) => self.say("This song is not liked", Severity::Info),
                Some(None) => self.say("No song is playing", Severity::Info),
                None => {}
            },
            Action::AddToPlaylist => {
                if self
                    .call(&self.ctx.library, "library", |l| l.add_current_to_playlist())
                    .await
                    .is_some()
                {
                    self.say("Added to playlist", Severity::Success);
                }
            }
            Action::CreatePlaylist => {
                self.show_section(Section::Library).await;
                self.say("Navigate to library to create a playlist", Severity::Info);
            }
            Action::TellTime => self.say_for(&format_time(&Local::now()), Severity::Info, 4000),
            Action::TellDate => {
                let date = Local::now().format("%A, %B %-d, %Y");
                self.say_for(&format!("Today is {date}"), Severity::Info, 5000);
            }
            Action::Greet => {
                self.say_for(greeting_for_hour(Local::now().hour()), Severity::Info, 4000);
            }
            Action::Respond(message) => self.say_for(message, Severity::Info, 4000),
            Action::Joke => self.say_for(pick(&JOKES), Severity::Info, 7000),
            Action::Introduce => self.say_for(INTRODUCTION, Severity::Info, 6000),
            Action::ThankYou => self.say(pick(&THANKS_REPLIES), Severity::Success),
            Action::Deactivate => return ExecOutcome::Deactivate,
            Action::Goodbye => {
                self.say(pick(&GOODBYES), Severity::Info);
                return ExecOutcome::Deactivate;
            }
            Action::Help => self.say_for(HELP_TEXT, Severity::Info, 15000),
            Action::Repeat => debug!("Repeat reached the executor, ignoring"),
        }

        ExecOutcome::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{Notifier, Playback, SearchResult, TrackInfo, Volume};
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Toasts(Mutex<Vec<String>>);

    impl Notifier for Toasts {
        fn show(&self, message: &str, _severity: Severity, _duration: Duration) {
            self.0.lock().unwrap().push(message.to_string());
        }
    }

    impl Toasts {
        fn last(&self) -> Option<String> {
            self.0.lock().unwrap().last().cloned()
        }
    }

    struct Player {
        playing: Mutex<bool>,
        seeks: Mutex<Vec<i64>>,
        position: Option<TrackPosition>,
    }

    impl Player {
        fn new(playing: bool) -> Self {
            Self { playing: Mutex::new(playing), seeks: Mutex::new(Vec::new()), position: None }
        }
    }

    impl Playback for Player {
        fn is_playing(&self) -> Result<bool> { Ok(*self.playing.lock().unwrap()) }
        fn toggle(&self) -> Result<()> {
            let mut playing = self.playing.lock().unwrap();
            *playing = !*playing;
            Ok(())
        }
        fn next(&self) -> Result<()> { Ok(()) }
        fn previous(&self) -> Result<()> { anyhow::bail!("no previous track") }
        fn seek(&self, delta_secs: i64) -> Result<()> {
            self.seeks.lock().unwrap().push(delta_secs);
            Ok(())
        }
        fn restart(&self) -> Result<()> { Ok(()) }
        fn play_track(&self, _track: &SearchResult) -> Result<()> { Ok(()) }
        fn position(&self) -> Result<Option<TrackPosition>> { Ok(self.position) }
        fn now_playing(&self) -> Result<Option<TrackInfo>> {
            Ok(Some(TrackInfo { title: "Believer".to_string(), artist: "Imagine Dragons".to_string() }))
        }
    }

    /// Mutes by turning the level down to zero, like MPD.
    struct Knob(Mutex<u8>, Mutex<Option<u8>>);

    impl Volume for Knob {
        fn get(&self) -> Result<u8> { Ok(*self.0.lock().unwrap()) }
        fn set(&self, level: u8) -> Result<()> {
            *self.0.lock().unwrap() = level;
            Ok(())
        }
        fn mute(&self, level: u8) -> Result<()> {
            self.set(0)?;
            self.1.lock().unwrap().get_or_insert(level);
            Ok(())
        }
        fn unmute(&self) -> Result<()> {
            match self.1.lock().unwrap().take() {
                Some(level) => self.set(level),
                None => Ok(()),
            }
        }
    }

    fn setup(playing: bool, volume: u8) -> (Executor, Arc<Toasts>, Arc<Player>, Arc<Knob>) {
        let toasts = Arc::new(Toasts::default());
        let player = Arc::new(Player::new(playing));
        let knob = Arc::new(Knob(Mutex::new(volume), Mutex::new(None)));
        let ctx = AppContext::new(toasts.clone())
            .with_playback(player.clone())
            .with_volume(knob.clone());
        (Executor::new(ctx, &ActivationConfig::default()), toasts, player, knob)
    }

    #[tokio::test]
    async fn test_play_when_paused_toggles() {
        let (mut exec, toasts, player, _) = setup(false, 50);
        assert_eq!(exec.execute(&Action::Play).await, ExecOutcome::Done);
        assert!(*player.playing.lock().unwrap());
        assert_eq!(toasts.last().as_deref(), Some("Playing music"));
    }

    #[tokio::test]
    async fn test_play_when_playing_only_informs() {
        let (mut exec, toasts, player, _) = setup(true, 50);
        exec.execute(&Action::Play).await;
        assert!(*player.playing.lock().unwrap());
        assert_eq!(toasts.last().as_deref(), Some("Music is already playing"));
    }

    #[tokio::test]
    async fn test_failing_capability_is_silent() {
        let (mut exec, toasts, _, _) = setup(true, 50);
        assert_eq!(exec.execute(&Action::Previous).await, ExecOutcome::Done);
        assert_eq!(toasts.last(), None);
    }

    #[tokio::test]
    async fn test_missing_capability_is_silent() {
        let toasts = Arc::new(Toasts::default());
        let mut exec = Executor::new(AppContext::new(toasts.clone()), &ActivationConfig::default());

        for action in [Action::Next, Action::SetVolume(40), Action::Like, Action::ShowSection(Section::Library)] {
            assert_eq!(exec.execute(&action).await, ExecOutcome::Done);
        }
        assert_eq!(toasts.last(), None);
    }

    #[tokio::test]
    async fn test_volume_steps_clamp() {
        let (mut exec, toasts, _, knob) = setup(false, 90);
        exec.execute(&Action::VolumeUp).await;
        assert_eq!(*knob.0.lock().unwrap(), 100);
        assert_eq!(toasts.last().as_deref(), Some("Volume increased to 100%"));

        *knob.0.lock().unwrap() = 10;
        exec.execute(&Action::VolumeDown).await;
        assert_eq!(*knob.0.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_set_volume_clamps() {
        let (mut exec, toasts, _, knob) = setup(false, 50);
        exec.execute(&Action::SetVolume(200)).await;
        assert_eq!(*knob.0.lock().unwrap(), 100);
        assert_eq!(toasts.last().as_deref(), Some("Volume set to 100%"));
    }

    #[tokio::test]
    async fn test_duck_and_restore() {
        let (mut exec, _, _, knob) = setup(true, 80);
        exec.duck().await;
        assert!(exec.is_ducked());
        assert_eq!(*knob.0.lock().unwrap(), 12);

        // a second duck must not overwrite the saved level
        exec.duck().await;
        exec.restore().await;
        assert_eq!(*knob.0.lock().unwrap(), 80);
        assert!(!exec.is_ducked());
    }

    #[tokio::test]
    async fn test_duck_respects_floor_and_paused_playback() {
        let (mut exec, _, _, knob) = setup(true, 40);
        exec.duck().await;
        assert_eq!(*knob.0.lock().unwrap(), 10);

        let (mut paused, _, _, knob) = setup(false, 40);
        paused.duck().await;
        assert!(!paused.is_ducked());
        assert_eq!(*knob.0.lock().unwrap(), 40);
    }

    #[tokio::test]
    async fn test_explicit_volume_cancels_restore() {
        let (mut exec, _, _, knob) = setup(true, 80);
        exec.duck().await;
        exec.execute(&Action::SetVolume(30)).await;
        exec.restore().await;
        assert_eq!(*knob.0.lock().unwrap(), 30);
    }

    #[tokio::test]
    async fn test_volume_up_while_ducked_uses_base_level() {
        let (mut exec, toasts, _, knob) = setup(true, 50);
        exec.duck().await;
        exec.execute(&Action::VolumeUp).await;
        assert_eq!(*knob.0.lock().unwrap(), 70);
        assert_eq!(toasts.last().as_deref(), Some("Volume increased to 70%"));
    }

    #[tokio::test]
    async fn test_mute_survives_session_close() {
        let (mut exec, toasts, _, knob) = setup(true, 80);
        exec.duck().await;
        assert_eq!(*knob.0.lock().unwrap(), 12);

        exec.execute(&Action::Mute).await;
        assert_eq!(toasts.last().as_deref(), Some("Music muted"));
        exec.restore().await;
        assert_eq!(*knob.0.lock().unwrap(), 0);

        // muted output is not ducked, and unmute returns to the level before ducking
        exec.duck().await;
        assert!(!exec.is_ducked());
        exec.execute(&Action::Unmute).await;
        assert_eq!(*knob.0.lock().unwrap(), 80);
        assert_eq!(toasts.last().as_deref(), Some("Sound on - Volume at 80%"));
    }

    #[tokio::test]
    async fn test_unmute_while_ducked_restores_level() {
        let (mut exec, toasts, _, knob) = setup(true, 50);
        exec.duck().await;
        exec.execute(&Action::Unmute).await;
        assert_eq!(*knob.0.lock().unwrap(), 50);

        exec.restore().await;
        assert_eq!(*knob.0.lock().unwrap(), 50);
        assert_eq!(toasts.last().as_deref(), Some("Sound on - Volume at 50%"));
    }

    #[tokio::test]
    async fn test_seek_clamps_to_track() {
        let toasts = Arc::new(Toasts::default());
        let player = Arc::new(Player {
            position: Some(TrackPosition {
                elapsed: Duration::from_secs(5),
                duration: Duration::from_secs(200),
            }),
            ..Player::new(true)
        });
        let ctx = AppContext::new(toasts.clone()).with_playback(player.clone());
        let mut exec = Executor::new(ctx, &ActivationConfig::default());

        exec.execute(&Action::SeekBackward(10)).await;
        exec.execute(&Action::SeekForward(500)).await;
        assert_eq!(*player.seeks.lock().unwrap(), vec![-5, 195]);
        assert_eq!(
            *toasts.0.lock().unwrap(),
            vec!["Rewound 5 seconds".to_string(), "Skipped forward 195 seconds".to_string()]
        );
    }

    #[tokio::test]
    async fn test_song_length_without_position() {
        let (mut exec, toasts, _, _) = setup(true, 50);
        exec.execute(&Action::SongLength).await;
        assert_eq!(toasts.last().as_deref(), Some("No song is playing"));
    }

    #[tokio::test]
    async fn test_now_playing() {
        let (mut exec, toasts, _, _) = setup(true, 50);
        exec.execute(&Action::NowPlaying).await;
        assert_eq!(
            toasts.last().as_deref(),
            Some("Now playing: Believer by Imagine Dragons")
        );
    }

    #[tokio::test]
    async fn test_deactivating_actions() {
        let (mut exec, toasts, _, _) = setup(true, 50);
        assert_eq!(exec.execute(&Action::Deactivate).await, ExecOutcome::Deactivate);
        assert_eq!(toasts.last(), None);

        assert_eq!(exec.execute(&Action::Goodbye).await, ExecOutcome::Deactivate);
        let said = toasts.last().expect("goodbye should say something");
        assert!(GOODBYES.contains(&said.as_str()));
    }

    #[tokio::test]
    async fn test_joke_comes_from_list() {
        let (mut exec, toasts, _, _) = setup(true, 50);
        exec.execute(&Action::Joke).await;
        let said = toasts.last().expect("joke expected");
        assert!(JOKES.contains(&said.as_str()));
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_clock(Duration::from_secs(225)), "3:45");
        assert_eq!(format_clock(Duration::from_secs(9)), "0:09");

        let noon = Utc.with_ymd_and_hms(2024, 5, 1, 12, 5, 0).unwrap();
        assert_eq!(format_time(&noon), "It's 12:05 PM");
        let midnight = Utc.with_ymd_and_hms(2024, 5, 1, 0, 30, 0).unwrap();
        assert_eq!(format_time(&midnight), "It's 12:30 AM");

        assert!(greeting_for_hour(8).starts_with("Good morning"));
        assert!(greeting_for_hour(13).starts_with("Good afternoon"));
        assert!(greeting_for_hour(22).starts_with("Good evening"));
    }
}
