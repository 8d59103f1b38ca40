//! Deciding which tokens need shell quoting, and the quoting transform itself.
//!
//! Single quotes are used rather than double quotes because almost nothing is special inside
//! them, which keeps the set of characters the transform has to rewrite as small as possible.

use std::str::FromStr;

use crate::print::ConfigError;

/// Characters that force a token to be quoted under [`QuoteMode::Auto`].
const SPECIAL_CHARS: &[char] = &[
    ' ', '"', '\'', '`', '|', '$', '*', '?', '>', '<', '(', ')', '[', ']', '{', '}', '&', '\\',
    ';', '#',
];

/// Quoting policy for rendered tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuoteMode {
    /// Quote only tokens that contain special shell characters.
    #[default]
    Auto,
    /// Quote every token, special characters or not.
    ExtraSafe,
}

impl FromStr for QuoteMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "auto" => Ok(Self::Auto),
            "extra-safe" => Ok(Self::ExtraSafe),
            _ => Err(ConfigError::new("quoting", value, &["auto", "extra-safe"])),
        }
    }
}

/// Escape a single token for a POSIX-like shell.
///
/// Tokens in the command-name position additionally treat `=` as special, so that a program name
/// which looks like a `NAME=value` environment assignment is always quoted.
///
/// Quoted tokens are wrapped in single quotes after doubling every backslash and prefixing every
/// single quote with a backslash; unquoted tokens are returned unchanged.
pub fn escape(token: &str, is_command_name: bool, quoting: QuoteMode) -> String {
    if needs_quoting(token, is_command_name, quoting) {
        quote(token)
    } else {
        token.to_owned()
    }
}

fn needs_quoting(token: &str, is_command_name: bool, quoting: QuoteMode) -> bool {
    match quoting {
        QuoteMode::ExtraSafe => true,
        QuoteMode::Auto => {
            // An unquoted empty token would vanish from the printed line entirely.
            token.is_empty()
                || token
                    .chars()
                    .any(|ch| SPECIAL_CHARS.contains(&ch) || (is_command_name && ch == '='))
        }
    }
}

fn quote(token: &str) -> String {
    // Backslashes first, so the backslashes inserted for quotes don't get doubled themselves.
    let escaped = token.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}
