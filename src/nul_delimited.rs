//! Incremental splitting of NUL-delimited streams, like the output of `find -print0`.
//!
//! NUL-delimited output can't be consumed with line buffering, and records routinely straddle
//! read boundaries. [`NulSplitter`] is fed chunks as they arrive, yields the records each chunk
//! completes, and buffers the partial tail for the next chunk.

use std::error::Error;
use std::fmt::Display;

use miette::IntoDiagnostic;
use miette::WrapErr;
use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;

use crate::buffers::READ_BUFFER_CAPACITY;
use crate::buffers::RECORD_BUFFER_CAPACITY;

/// The stream ended in the middle of a record.
///
/// A well-formed NUL-delimited stream ends with a delimiter; leftover bytes at end-of-stream mean
/// the producer was cut off, and the partial record is reported rather than silently dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncatedStreamError {
    /// The number of bytes pending after the last delimiter.
    pub pending: usize,
}

impl Display for TruncatedStreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "NUL-delimited stream ended with {} byte(s) after the last delimiter; missing trailing NUL?",
            self.pending
        )
    }
}

impl Error for TruncatedStreamError {}

impl miette::Diagnostic for TruncatedStreamError {}

/// An incremental parser for NUL-delimited records.
#[derive(Debug)]
pub struct NulSplitter {
    /// Bytes of the record currently being accumulated.
    pending: Vec<u8>,
}

impl Default for NulSplitter {
    fn default() -> Self {
        Self {
            pending: Vec::with_capacity(RECORD_BUFFER_CAPACITY),
        }
    }
}

impl NulSplitter {
    /// Construct a splitter with an empty record buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk, returning the records it completes.
    ///
    /// Records must be valid UTF-8. Bytes after the chunk's last delimiter are buffered until a
    /// later chunk completes them.
    pub fn feed(&mut self, chunk: &[u8]) -> miette::Result<Vec<String>> {
        let mut records = Vec::new();
        let mut rest = chunk;

        while let Some(position) = rest.iter().position(|byte| *byte == 0) {
            self.pending.extend_from_slice(&rest[..position]);
            let record = std::mem::replace(
                &mut self.pending,
                Vec::with_capacity(RECORD_BUFFER_CAPACITY),
            );
            records.push(
                String::from_utf8(record)
                    .into_diagnostic()
                    .wrap_err("NUL-delimited record contained invalid UTF-8")?,
            );
            rest = &rest[position + 1..];
        }

        self.pending.extend_from_slice(rest);
        tracing::trace!(
            records = records.len(),
            pending = self.pending.len(),
            "Fed chunk"
        );
        Ok(records)
    }

    /// Finish the stream.
    ///
    /// A non-empty pending tail means the final record never got its delimiter, reported as
    /// [`TruncatedStreamError`].
    pub fn finish(self) -> Result<(), TruncatedStreamError> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            Err(TruncatedStreamError {
                pending: self.pending.len(),
            })
        }
    }
}

/// Read a reader to end-of-stream, splitting it into NUL-delimited records.
///
/// This drives a [`NulSplitter`] with fixed-size reads, so it handles records of any length and
/// delimiters landing anywhere relative to read boundaries.
pub async fn read_nul_delimited<R>(reader: R) -> miette::Result<Vec<String>>
where
    R: AsyncRead + Unpin,
{
    let mut reader = reader;
    let mut splitter = NulSplitter::new();
    let mut records = Vec::new();
    let mut buffer = vec![0; READ_BUFFER_CAPACITY];

    loop {
        let n = reader
            .read(&mut buffer)
            .await
            .into_diagnostic()
            .wrap_err("Failed to read from NUL-delimited stream")?;
        if n == 0 {
            // EOF
            break;
        }
        records.extend(splitter.feed(&buffer[..n])?);
    }

    splitter.finish()?;
    Ok(records)
}
