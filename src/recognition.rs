//! # Recognition Listener
//!
//! Bridges a speech source to the interpreter. Speech platforms end their
//! streams on their own (silence, network hiccups), so the listener reopens
//! the source after a short backoff for as long as the interpreter runs.
//!
//! ## Restart policy
//!
//! - stream ended: reopen after `recognition.restart_backoff`
//! - reopen failed: retry after `recognition.retry_backoff`
//! - very first open failed: the platform is unavailable, report once and stop
//! - source finished for good (`Ok(None)`): report and stop
//!
//! Two sources ship with the crate. [`StdinSource`] reads one transcript per
//! line, [`ScriptedSource`] replays a fixed list. In both, a line starting with
//! `~` is an interim result.

use crate::config::RecognitionConfig;
use crate::interpreter::InterpreterEvent;
use anyhow::Result;
use log::{debug, error, info, trace, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time;

/// Error code speech platforms use for "heard nothing". Not worth a warning.
const NO_SPEECH: &str = "no-speech";

/// Prefix marking an interim transcript in line-based sources.
const INTERIM_MARKER: char = '~';

/// One event from the speech platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Transcript { text: String, is_final: bool },
    Error(String),
}

impl SpeechEvent {
    /// Parse one line of a line-based source. Blank lines yield `None`.
    pub fn from_line(line: &str) -> Option<Self> {
        let line = line.trim();
        let (text, is_final) = match line.strip_prefix(INTERIM_MARKER) {
            Some(rest) => (rest.trim(), false),
            None => (line, true),
        };
        if text.is_empty() {
            return None;
        }
        Some(SpeechEvent::Transcript {
            text: text.to_string(),
            is_final,
        })
    }
}

/// A speech platform that can be (re)opened.
pub trait TranscriptSource: Send {
    /// Open a new recognition stream. `Ok(None)` means the source is finished
    /// and must not be reopened.
    fn open(&mut self) -> Result<Option<mpsc::Receiver<SpeechEvent>>>;
}

/// Transcripts from standard input, one per line.
#[derive(Debug, Default)]
pub struct StdinSource {
    opened: bool,
}

impl StdinSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TranscriptSource for StdinSource {
    fn open(&mut self) -> Result<Option<mpsc::Receiver<SpeechEvent>>> {
        // stdin only ends at EOF, there is nothing to reopen
        if self.opened {
            return Ok(None);
        }
        self.opened = true;

        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let Some(event) = SpeechEvent::from_line(&line) else {
                            continue;
                        };
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        let _ = tx.send(SpeechEvent::Error(e.to_string())).await;
                        break;
                    }
                }
            }
            debug!("Standard input closed");
        });

        Ok(Some(rx))
    }
}

/// Replays a fixed list of transcripts once.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    lines: Vec<String>,
    opened: bool,
}

impl ScriptedSource {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            opened: false,
        }
    }
}

impl TranscriptSource for ScriptedSource {
    fn open(&mut self) -> Result<Option<mpsc::Receiver<SpeechEvent>>> {
        if self.opened {
            return Ok(None);
        }
        self.opened = true;

        let events: Vec<SpeechEvent> = self.lines.iter().filter_map(|l| SpeechEvent::from_line(l)).collect();
        let (tx, rx) = mpsc::channel(events.len().max(1));
        for event in events {
            tx.try_send(event)?;
        }
        Ok(Some(rx))
    }
}

/// Drive `source` until it finishes or the interpreter goes away.
pub async fn listen<S: TranscriptSource>(
    mut source: S,
    events: mpsc::UnboundedSender<InterpreterEvent>,
    config: RecognitionConfig,
) {
    let mut opened_once = false;

    while !events.is_closed() {
        let mut stream = match source.open() {
            Ok(Some(stream)) => stream,
            Ok(None) => {
                info!("Speech source finished");
                let _ = events.send(InterpreterEvent::InputClosed);
                return;
            }
            Err(e) if !opened_once => {
                error!("Speech recognition unavailable: {e:#}");
                let _ = events.send(InterpreterEvent::RecognitionUnavailable(format!("{e:#}")));
                return;
            }
            Err(e) => {
                warn!("Reopening speech source failed, retrying in {:?}: {e:#}", config.retry_backoff());
                time::sleep(config.retry_backoff()).await;
                continue;
            }
        };

        opened_once = true;
        let _ = events.send(InterpreterEvent::ListeningChanged(true));

        while let Some(event) = stream.recv().await {
            match event {
                SpeechEvent::Transcript { text, is_final } => {
                    trace!("Heard '{text}' (final: {is_final})");
                    if events.send(InterpreterEvent::Transcript { text, is_final }).is_err() {
                        return;
                    }
                }
                SpeechEvent::Error(code) if code == NO_SPEECH => trace!("No speech detected"),
                SpeechEvent::Error(code) => warn!("Speech recognition error: {code}"),
            }
        }

        let _ = events.send(InterpreterEvent::ListeningChanged(false));
        debug!("Speech stream ended, restarting in {:?}", config.restart_backoff());
        time::sleep(config.restart_backoff()).await;
    }
}
