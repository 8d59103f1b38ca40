//! Shell commands as structured argument entries: validation, flattening, parsing.

use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

use miette::miette;
use miette::IntoDiagnostic;
use miette::WrapErr;

/// One element of a command's argument list.
///
/// Grouping only affects how [`Command::render`][crate::Command::render] lays tokens out on
/// continuation lines; once flattened into an argv, the members of a group are indistinguishable
/// from separate scalar entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgEntry {
    /// A single positional or flag-like token.
    Scalar(String),
    /// Two or more tokens that form one semantic unit, like a flag and its value
    /// (`["--exclude", ".git"]`). Members are rendered adjacently and line-wrapped as a unit.
    Group(Vec<String>),
}

impl ArgEntry {
    /// Construct a scalar entry.
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    /// Construct a group entry. [`Command::new`] rejects groups with fewer than two members.
    pub fn group(values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Group(values.into_iter().map(|value| value.into()).collect())
    }

    /// The tokens of this entry, in order.
    pub fn values(&self) -> &[String] {
        match self {
            Self::Scalar(value) => std::slice::from_ref(value),
            Self::Group(values) => values,
        }
    }
}

impl From<&str> for ArgEntry {
    fn from(value: &str) -> Self {
        Self::scalar(value)
    }
}

impl From<String> for ArgEntry {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<&String> for ArgEntry {
    fn from(value: &String) -> Self {
        Self::scalar(value.clone())
    }
}

/// A failure to construct a [`Command`].
///
/// Construction is the only place these can occur; a constructed [`Command`] is immutable, so
/// rendering and spawning never revalidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The program name was empty.
    InvalidCommandName,
    /// The entry at the contained index was a group with fewer than two members.
    InvalidArgumentEntry {
        /// Index of the offending entry in the argument list.
        index: usize,
    },
}

impl Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCommandName => write!(f, "Command name must be a non-empty string"),
            Self::InvalidArgumentEntry { index } => write!(
                f,
                "Argument entry at index {index} is a group with fewer than two members"
            ),
        }
    }
}

impl Error for CommandError {}

impl miette::Diagnostic for CommandError {}

/// A program name with a list of argument entries.
///
/// Immutable once constructed and cheap to reuse: [`Command::render`][crate::Command::render] and
/// [`Command::flatten_arguments`] are pure, so a single value can back any number of
/// display and spawn calls without coordination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// The program to run. Always non-empty.
    program: String,
    /// The argument entries, in the order given at construction.
    args: Vec<ArgEntry>,
}

impl Command {
    /// Construct a command, validating the argument entries.
    ///
    /// Fails fast: an empty program name or a group entry with fewer than two members is rejected
    /// here, never deferred to render or spawn time, and no partial [`Command`] is produced.
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = ArgEntry>,
    ) -> Result<Self, CommandError> {
        let program = program.into();
        if program.is_empty() {
            return Err(CommandError::InvalidCommandName);
        }

        let args = args.into_iter().collect::<Vec<_>>();
        for (index, entry) in args.iter().enumerate() {
            if let ArgEntry::Group(values) = entry {
                if values.len() < 2 {
                    return Err(CommandError::InvalidArgumentEntry { index });
                }
            }
        }

        Ok(Self { program, args })
    }

    /// The program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The argument entries, in construction order.
    pub fn args(&self) -> &[ArgEntry] {
        &self.args
    }

    /// Flatten the argument entries into the argv tail, excluding the program name.
    ///
    /// Entry order and intra-group order match the order given at construction; nothing is
    /// reordered or deduplicated. This flattening is the single source of truth shared by
    /// execution and (after escaping) rendering.
    pub fn flatten_arguments(&self) -> Vec<String> {
        self.args
            .iter()
            .flat_map(|entry| entry.values().iter().cloned())
            .collect()
    }

    /// The canonical argv for execution: the program name paired with
    /// [`Command::flatten_arguments`].
    pub fn command_and_flat_args(&self) -> (&str, Vec<String>) {
        (&self.program, self.flatten_arguments())
    }
}

impl FromStr for Command {
    type Err = miette::Report;

    /// Parse a string of shell-quoted arguments into a command of scalar entries with
    /// [`shell_words::split`].
    fn from_str(shell_command: &str) -> Result<Self, Self::Err> {
        let tokens = shell_words::split(shell_command)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to split shell command: {shell_command:?}"))?;

        match &*tokens {
            [] => Err(miette!("Command has no program: {shell_command:?}")),
            [program, args @ ..] => {
                Self::new(program.as_str(), args.iter().map(ArgEntry::from)).into_diagnostic()
            }
        }
    }
}
