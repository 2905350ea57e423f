//! # Activation State Machine
//!
//! The interpreter is either `Dormant` (only the wake word matters) or
//! `AwaitingCommand`. The deadline that closes an open session lives inside
//! the `AwaitingCommand` state, so an open session always has exactly one
//! pending deadline and a dormant one never has any. Rescheduling is an
//! assignment; there is no timer handle that could be left behind.

use log::debug;
use tokio::time::{Duration, Instant};

/// Why the current deadline was set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Nothing was said for the idle window.
    Idle,
    /// A command finished and the session closes on its own.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Dormant,
    AwaitingCommand { deadline: Instant, reason: CloseReason },
}

#[derive(Debug, Clone)]
pub struct ActivationMachine {
    state: Activation,
    idle_timeout: Duration,
}

impl ActivationMachine {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            state: Activation::Dormant,
            idle_timeout,
        }
    }

    pub fn state(&self) -> Activation {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, Activation::AwaitingCommand { .. })
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            Activation::Dormant => None,
            Activation::AwaitingCommand { deadline, .. } => Some(deadline),
        }
    }

    /// Wake word heard. Returns `false` if a session was already open, in
    /// which case only the idle window is restarted.
    pub fn activate(&mut self, now: Instant) -> bool {
        let was_active = self.is_active();
        self.schedule(now + self.idle_timeout, CloseReason::Idle);
        !was_active
    }

    /// Restart the idle window. No-op while dormant.
    pub fn touch(&mut self, now: Instant) {
        if self.is_active() {
            self.schedule(now + self.idle_timeout, CloseReason::Idle);
        }
    }

    /// Close the session `delay` from now. No-op while dormant.
    pub fn close_after(&mut self, now: Instant, delay: Duration) {
        if self.is_active() {
            self.schedule(now + delay, CloseReason::Finished);
        }
    }

    /// Close immediately. Returns `false` (and does nothing) when already
    /// dormant.
    pub fn deactivate(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = Activation::Dormant;
        true
    }

    /// The reason of the elapsed deadline, if it has elapsed at `now`.
    pub fn expired(&self, now: Instant) -> Option<CloseReason> {
        match self.state {
            Activation::AwaitingCommand { deadline, reason } if deadline <= now => Some(reason),
            _ => None,
        }
    }

    fn schedule(&mut self, deadline: Instant, reason: CloseReason) {
        debug!("Session closes in {:?} ({reason:?})", deadline.saturating_duration_since(Instant::now()));
        self.state = Activation::AwaitingCommand { deadline, reason };
    }
}
