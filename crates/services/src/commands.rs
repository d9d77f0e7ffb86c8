//! Moderation command parsing.
//!
//! A message is a command only when its first character is [`COMMAND_MARKER`].
//! The command word ends at the first whitespace; the rest is the raw
//! argument string.

use domains::Role;

pub const COMMAND_MARKER: char = '/';

/// Reserved `/destroy` pattern prefix for colour-based matching, which is
/// not supported.
pub const COLOR_PATTERN_PREFIX: &str = "(color)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/clear`: delete every post.
    Clear,
    /// `/del N...`: 1-based display positions, deduplicated, in request order.
    /// Empty when no argument parsed as a decimal integer.
    Del(Vec<usize>),
    /// `/destroy PATTERN`: argument tokens rejoined with single spaces.
    Destroy(String),
    /// Any other `/word`.
    Unknown(String),
}

impl Command {
    /// Returns `None` when `text` is an ordinary post.
    pub fn parse(text: &str) -> Option<Command> {
        if !text.starts_with(COMMAND_MARKER) {
            return None;
        }

        let (word, args) = text
            .split_once(char::is_whitespace)
            .unwrap_or((text, ""));

        let command = match word {
            "/clear" => Command::Clear,
            "/del" => {
                let mut positions: Vec<usize> = Vec::new();
                for n in args.split_whitespace().filter_map(parse_position) {
                    if !positions.contains(&n) {
                        positions.push(n);
                    }
                }
                Command::Del(positions)
            }
            "/destroy" => Command::Destroy(args.split_whitespace().collect::<Vec<_>>().join(" ")),
            other => Command::Unknown(other.to_string()),
        };
        Some(command)
    }

    /// Minimum role allowed to run the command; `None` for unknown commands.
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Command::Clear | Command::Destroy(_) => Some(Role::Moderator),
            Command::Del(_) => Some(Role::Manager),
            Command::Unknown(_) => None,
        }
    }

    /// Bounded label for metrics; every unknown command shares `"unknown"`.
    pub fn label(&self) -> &'static str {
        match self {
            Command::Clear => "clear",
            Command::Del(_) => "del",
            Command::Destroy(_) => "destroy",
            Command::Unknown(_) => "unknown",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Command::Clear => "clear",
            Command::Del(_) => "del",
            Command::Destroy(_) => "destroy",
            Command::Unknown(word) => word.trim_start_matches(COMMAND_MARKER),
        }
    }
}

/// Plain decimal digits only; signs and other forms are skipped.
fn parse_position(token: &str) -> Option<usize> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}
