use std::str::FromStr;

use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Remove every message from the conversation
    Clear,
    /// Show help
    Help,
    /// Exit the application
    Quit,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Clear => "clear the conversation",
            SlashCommand::Help => "show available commands",
            SlashCommand::Quit => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }

    /// Whether this command can run while a response is streaming.
    pub fn available_during_streaming(self) -> bool {
        match self {
            SlashCommand::Help | SlashCommand::Quit => true,
            // Clearing mid-turn would orphan the open assistant message
            SlashCommand::Clear => false,
        }
    }
}

/// Parse a slash command from user input.
///
/// Only a lone command word counts; `/c is a language` is an ordinary message.
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let head = input.trim().strip_prefix('/')?;
    if head.is_empty() || head.chars().any(char::is_whitespace) {
        return None;
    }

    SlashCommand::from_str(head).ok().or_else(|| match head.to_lowercase().as_str() {
        "q" | "exit" | "bye" => Some(SlashCommand::Quit),
        "c" | "cls" | "reset" => Some(SlashCommand::Clear),
        "h" | "?" => Some(SlashCommand::Help),
        _ => None,
    })
}

/// One-line summary of the available commands
pub fn get_help_text() -> String {
    let commands: Vec<String> = SlashCommand::iter()
        .map(|c| format!("/{} {}", c.command(), c.description()))
        .collect();
    format!("{} · Ctrl+L clears · Esc quits", commands.join(" · "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_names() {
        for command in SlashCommand::iter() {
            assert_eq!(parse_slash_command(&format!("/{}", command.command())), Some(command));
        }
    }

    #[test]
    fn parses_aliases() {
        assert_eq!(parse_slash_command("/q"), Some(SlashCommand::Quit));
        assert_eq!(parse_slash_command("  /cls "), Some(SlashCommand::Clear));
        assert_eq!(parse_slash_command("/?"), Some(SlashCommand::Help));
    }

    #[test]
    fn command_word_followed_by_text_is_a_message() {
        assert_eq!(parse_slash_command("/c is my favourite language, explain pointers"), None);
        assert_eq!(parse_slash_command("/clear now please"), None);
        assert_eq!(parse_slash_command("/q\nwhat next?"), None);
    }

    #[test]
    fn plain_text_and_unknown_commands_are_not_commands() {
        assert_eq!(parse_slash_command("hello /clear"), None);
        assert_eq!(parse_slash_command("/frobnicate"), None);
        assert_eq!(parse_slash_command("/"), None);
    }

    #[test]
    fn help_mentions_every_command() {
        let help = get_help_text();
        for entry in command_entries() {
            assert!(help.contains(&format!("/{}", entry.keyword)));
        }
    }
}
