//! Cooperative line reader for tokio streams.
//!
//! Same line semantics as [`LineReader`](crate::LineReader); each
//! `read_line().await` is a single suspension point, so callers can bound it
//! with `tokio::time::timeout`.

use std::io::ErrorKind;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{Result, TransportError};
use crate::line::{take_line, DEFAULT_MAX_LINE_LEN};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads `\n`-delimited lines from any `AsyncRead` stream.
pub struct AsyncLineReader<T> {
    inner: T,
    buf: BytesMut,
    max_line_len: usize,
}

impl<T: AsyncRead + Unpin> AsyncLineReader<T> {
    pub fn new(inner: T) -> Self {
        Self::with_max_line_len(inner, DEFAULT_MAX_LINE_LEN)
    }

    pub fn with_max_line_len(inner: T, max_line_len: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
            max_line_len,
        }
    }

    /// Read the next line without its terminator.
    pub async fn read_line(&mut self) -> Result<String> {
        loop {
            if let Some(line) = take_line(&mut self.buf, self.max_line_len)? {
                return Ok(line);
            }

            self.buf.reserve(READ_CHUNK_SIZE);
            let read = match self.inner.read_buf(&mut self.buf).await {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::ReadFailed(err)),
            };

            if read == 0 {
                return Err(TransportError::EndOfStream);
            }
        }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[tokio::test]
    async fn reads_lines_from_slice() {
        let mut reader = AsyncLineReader::new(&b"one\r\ntwo\n"[..]);
        assert_eq!(reader.read_line().await.unwrap(), "one");
        assert_eq!(reader.read_line().await.unwrap(), "two");
        assert!(matches!(
            reader.read_line().await.unwrap_err(),
            TransportError::EndOfStream
        ));
        assert!(reader.into_inner().is_empty());
    }

    #[tokio::test]
    async fn waits_for_split_writes() {
        let (mut tx, rx) = tokio::io::duplex(16);
        let mut reader = AsyncLineReader::new(rx);

        let writer = tokio::spawn(async move {
            tx.write_all(b"Batch").await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            tx.write_all(b"Command finished: OK\n").await.unwrap();
        });

        assert_eq!(
            reader.read_line().await.unwrap(),
            "BatchCommand finished: OK"
        );
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn long_line_fails() {
        let bytes = vec![b'x'; 40];
        let mut reader = AsyncLineReader::with_max_line_len(&bytes[..], 8);
        assert!(matches!(
            reader.read_line().await.unwrap_err(),
            TransportError::LineTooLong { max: 8, .. }
        ));
    }
}
