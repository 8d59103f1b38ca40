//! `prettycmd` builds shell commands from structured argument entries and guarantees that the
//! command you print is the command you run.
//!
//! A [`Command`] holds a program name and a list of [`ArgEntry`] values, where each entry is
//! either a single token or a group of related tokens (like `["--exclude", ".git"]`) that are laid
//! out together. The same flattening of those entries produces both the argv handed to
//! [`tokio::process::Command`] and, after escaping, the pretty-printed rendering, so the two can
//! never disagree.
//!
//! Rendering is controlled by [`PrintOptions`]: quoting policy, indentation, line wrapping, and an
//! optional terminal style applied as a final cosmetic pass. Tokens containing shell
//! metacharacters are single-quoted; everything else passes through byte-for-byte.
//!
//! On top of the core there's thin glue for actually running commands: spawning with an explicit
//! completion handle, capturing output as text or JSON, detached (process-group) spawning, and an
//! incremental splitter for NUL-delimited output like `find -print0`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod buffers;
mod command;
mod escape;
mod nul_delimited;
mod print;
mod process;

pub use command::ArgEntry;
pub use command::Command;
pub use command::CommandError;
pub use escape::escape;
pub use escape::QuoteMode;
pub use nul_delimited::read_nul_delimited;
pub use nul_delimited::NulSplitter;
pub use nul_delimited::TruncatedStreamError;
pub use print::ConfigError;
pub use print::LineWrapping;
pub use print::PrintOptions;
pub use process::CapturedOutput;
pub use process::DetachedCommand;
pub use process::ExitStatusError;
pub use process::SpawnedCommand;

#[cfg(test)]
mod fake_reader;
