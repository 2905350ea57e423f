//! Terminal stand-ins for the notification toast and the section navigator.

use crate::capabilities::{Navigation, Notifier, Section, Severity};
use anyhow::Result;
use log::debug;
use std::sync::Mutex;
use std::time::Duration;

fn label(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "info",
        Severity::Success => " ok ",
        Severity::Warning => "warn",
        Severity::Error => "fail",
    }
}

/// Prints notifications to stdout, one per line. Multi-line messages (the
/// help text) are indented under the first line.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn format(message: &str, severity: Severity) -> String {
        let mut lines = message.lines();
        let mut out = format!("[{}] {}", label(severity), lines.next().unwrap_or_default());
        for line in lines {
            out.push_str("\n       ");
            out.push_str(line);
        }
        out
    }
}

impl Notifier for ConsoleNotifier {
    fn show(&self, message: &str, severity: Severity, duration: Duration) {
        debug!("Toast for {duration:?}");
        println!("{}", Self::format(message, severity));
    }
}

/// Remembers the shown section and prints changes.
#[derive(Debug, Default)]
pub struct ConsoleNavigator {
    current: Mutex<Option<Section>>,
}

impl ConsoleNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Section> {
        self.current.lock().ok().and_then(|current| *current)
    }
}

impl Navigation for ConsoleNavigator {
    fn show_section(&self, section: Section) -> Result<()> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| anyhow::anyhow!("Navigator lock poisoned"))?;
        if *current != Some(section) {
            println!("  → {section}");
            *current = Some(section);
        }
        Ok(())
    }
}
