//! # Shell Completion Module
//!
//! Static completion scripts come from clap. The hidden `complete-phrases`
//! command prints every registered phrase so shells can offer them for
//! `muse-voice say`.
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! muse-voice completion bash > ~/.local/share/bash-completion/completions/muse-voice
//!
//! # Generate zsh completions
//! muse-voice completion zsh > ~/.config/zsh/completions/_muse-voice
//! ```

use crate::registry::CommandRegistry;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io;

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Convert our Shell enum to clap_complete's Shell enum
pub fn shell_to_completion_shell(shell: &crate::cli::Shell) -> CompletionShell {
    match shell {
        crate::cli::Shell::Bash => CompletionShell::Bash,
        crate::cli::Shell::Zsh => CompletionShell::Zsh,
        crate::cli::Shell::Fish => CompletionShell::Fish,
        crate::cli::Shell::PowerShell => CompletionShell::PowerShell,
        crate::cli::Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Registered phrases, sorted and quoted when they contain spaces.
pub fn phrase_completions(registry: &CommandRegistry) -> Vec<String> {
    let mut phrases: Vec<String> = registry
        .phrases()
        .map(|phrase| {
            if phrase.contains(' ') || phrase.contains('\'') {
                format!("\"{}\"", phrase.replace('"', "\\\""))
            } else {
                phrase.to_string()
            }
        })
        .collect();
    phrases.sort();
    phrases
}

/// Print phrase completions, one per line.
pub fn print_phrase_completions(registry: &CommandRegistry) {
    for phrase in phrase_completions(registry) {
        println!("{phrase}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Action;

    #[test]
    fn test_shell_conversion() {
        assert_eq!(
            shell_to_completion_shell(&crate::cli::Shell::Bash),
            CompletionShell::Bash
        );
        assert_eq!(
            shell_to_completion_shell(&crate::cli::Shell::Zsh),
            CompletionShell::Zsh
        );
    }

    #[test]
    fn test_phrase_completions_quote_multiword() {
        let mut registry = CommandRegistry::new();
        registry.register("next song", Action::Next);
        registry.register("pause", Action::Pause);
        registry.register("what's playing", Action::NowPlaying);

        assert_eq!(
            phrase_completions(&registry),
            vec!["\"next song\"", "\"what's playing\"", "pause"]
        );
    }
}
