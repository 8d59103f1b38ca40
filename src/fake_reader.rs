//! A fake [`AsyncRead`] for tests, delivering data in caller-controlled chunks.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::Context;
use std::task::Poll;

use tokio::io::AsyncRead;
use tokio::io::ReadBuf;

/// A fake [`AsyncRead`] that yields one queued chunk per read call.
///
/// This simulates streaming conditions where a record can straddle read boundaries: each
/// `poll_read` delivers the next chunk, and an empty queue reads as end-of-stream.
#[derive(Debug, Default, Clone)]
pub struct FakeReader {
    chunks: VecDeque<Vec<u8>>,
}

impl FakeReader {
    /// Construct a `FakeReader` from an iterator of byte chunks.
    pub fn with_chunks(chunks: impl IntoIterator<Item = Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
        }
    }
}

impl AsyncRead for FakeReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.chunks.pop_front() {
            Some(mut chunk) => {
                let remaining = buf.remaining();
                if chunk.len() <= remaining {
                    buf.put_slice(&chunk);
                } else {
                    // Deliver what fits and requeue the rest.
                    let rest = chunk.split_off(remaining);
                    buf.put_slice(&chunk);
                    self.chunks.push_front(rest);
                }
                Poll::Ready(Ok(()))
            }
            None => {
                // Ok(()) without writing any data means EOF.
                Poll::Ready(Ok(()))
            }
        }
    }
}
