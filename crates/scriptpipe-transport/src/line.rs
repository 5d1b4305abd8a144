use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::LineSource;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Default maximum line length: 64 KiB.
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

/// Configuration for the channel transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Maximum bytes buffered for one line before giving up. Default: 64 KiB.
    pub max_line_len: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

/// Reads `\n`-delimited lines from any `Read` stream.
///
/// Bytes past the current line stay buffered for the next call, so one reader
/// must be kept for the whole lifetime of the stream. `read_line` blocks until
/// a full line is available, the stream ends, or the underlying read fails.
pub struct LineReader<T> {
    inner: T,
    buf: BytesMut,
    max_line_len: usize,
}

impl<T: Read> LineReader<T> {
    /// Create a new line reader with the default line limit.
    pub fn new(inner: T) -> Self {
        Self::with_max_line_len(inner, DEFAULT_MAX_LINE_LEN)
    }

    /// Create a new line reader with an explicit line limit.
    pub fn with_max_line_len(inner: T, max_line_len: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_line_len,
        }
    }

    /// Read the next line (blocking), without its terminator.
    ///
    /// Returns `Err(TransportError::EndOfStream)` when EOF is reached before a
    /// `\n`, even if a partial line was buffered.
    pub fn read_line(&mut self) -> Result<String> {
        loop {
            if let Some(line) = take_line(&mut self.buf, self.max_line_len)? {
                trace!(len = line.len(), "line received");
                return Ok(line);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::ReadFailed(err)),
            };

            if read == 0 {
                if !self.buf.is_empty() {
                    trace!(pending = self.buf.len(), "end of stream mid-line");
                }
                return Err(TransportError::EndOfStream);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Bytes received but not yet returned as a line.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> LineSource for LineReader<T> {
    fn read_line(&mut self) -> Result<String> {
        LineReader::read_line(self)
    }
}

/// Split one line off the front of `buf`.
///
/// Returns `Ok(None)` if no `\n` has arrived yet. The `\n` and a preceding
/// `\r` are removed. Invalid UTF-8 is replaced with U+FFFD.
pub(crate) fn take_line(buf: &mut BytesMut, max_line_len: usize) -> Result<Option<String>> {
    let Some(pos) = buf.iter().position(|&b| b == b'\n') else {
        // A trailing `\r` may still turn out to be part of the terminator.
        let pending = match buf.last() {
            Some(b'\r') => buf.len() - 1,
            _ => buf.len(),
        };
        if pending > max_line_len {
            return Err(TransportError::LineTooLong {
                len: pending,
                max: max_line_len,
            });
        }
        return Ok(None);
    };

    let len = if pos > 0 && buf[pos - 1] == b'\r' {
        pos - 1
    } else {
        pos
    };
    if len > max_line_len {
        return Err(TransportError::LineTooLong {
            len,
            max: max_line_len,
        });
    }

    let raw = buf.split_to(pos + 1);
    Ok(Some(String::from_utf8_lossy(&raw[..len]).into_owned()))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn reads_lines_in_order() {
        let mut reader = LineReader::new(Cursor::new(b"hello\nworld\n\n".to_vec()));
        assert_eq!(reader.read_line().unwrap(), "hello");
        assert_eq!(reader.read_line().unwrap(), "world");
        assert_eq!(reader.read_line().unwrap(), "");
        assert!(matches!(
            reader.read_line().unwrap_err(),
            TransportError::EndOfStream
        ));
    }

    #[test]
    fn strips_carriage_return() {
        let mut reader = LineReader::new(Cursor::new(b"ok\r\n\r\n".to_vec()));
        assert_eq!(reader.read_line().unwrap(), "ok");
        assert_eq!(reader.read_line().unwrap(), "");
    }

    #[test]
    fn keeps_interior_carriage_return() {
        let mut reader = LineReader::new(Cursor::new(b"a\rb\n".to_vec()));
        assert_eq!(reader.read_line().unwrap(), "a\rb");
    }

    #[test]
    fn unterminated_tail_is_end_of_stream() {
        let mut reader = LineReader::new(Cursor::new(b"partial".to_vec()));
        let err = reader.read_line().unwrap_err();
        assert!(matches!(err, TransportError::EndOfStream));
        assert_eq!(reader.buffered(), 7);
    }

    #[test]
    fn empty_stream_is_end_of_stream() {
        let mut reader = LineReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(matches!(
            reader.read_line().unwrap_err(),
            TransportError::EndOfStream
        ));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut reader = LineReader::new(Cursor::new(b"a\xffb\n".to_vec()));
        assert_eq!(reader.read_line().unwrap(), "a\u{fffd}b");
    }

    #[test]
    fn partial_read_handling() {
        let mut reader = LineReader::new(ByteByByteReader {
            bytes: b"slow\nline\n".to_vec(),
            pos: 0,
        });
        assert_eq!(reader.read_line().unwrap(), "slow");
        assert_eq!(reader.read_line().unwrap(), "line");
    }

    #[test]
    fn line_longer_than_limit_fails() {
        let mut reader = LineReader::with_max_line_len(Cursor::new(vec![b'x'; 64]), 16);
        let err = reader.read_line().unwrap_err();
        assert!(matches!(err, TransportError::LineTooLong { max: 16, .. }));
    }

    #[test]
    fn terminated_line_longer_than_limit_fails() {
        let mut bytes = vec![b'x'; 20];
        bytes.push(b'\n');
        let mut reader = LineReader::with_max_line_len(Cursor::new(bytes), 16);
        let err = reader.read_line().unwrap_err();
        assert!(matches!(
            err,
            TransportError::LineTooLong { len: 20, max: 16 }
        ));
    }

    #[test]
    fn line_at_limit_is_accepted() {
        let mut bytes = vec![b'x'; 16];
        bytes.push(b'\n');
        let mut reader = LineReader::with_max_line_len(Cursor::new(bytes), 16);
        assert_eq!(reader.read_line().unwrap().len(), 16);
    }

    #[test]
    fn crlf_line_at_limit_is_accepted() {
        let mut bytes = vec![b'x'; 16];
        bytes.extend_from_slice(b"\r\n");
        let mut reader = LineReader::with_max_line_len(Cursor::new(bytes), 16);
        assert_eq!(reader.read_line().unwrap(), "x".repeat(16));
        assert_eq!(reader.get_ref().position(), 18);
    }

    #[test]
    fn crlf_line_over_limit_reports_content_length() {
        let mut bytes = vec![b'x'; 17];
        bytes.extend_from_slice(b"\r\n");
        let mut reader = LineReader::with_max_line_len(Cursor::new(bytes), 16);
        assert!(matches!(
            reader.read_line().unwrap_err(),
            TransportError::LineTooLong { len: 17, max: 16 }
        ));
    }

    #[test]
    fn carriage_return_split_from_newline_at_limit() {
        let mut bytes = vec![b'x'; 16];
        bytes.extend_from_slice(b"\r\n");
        let mut reader = LineReader::with_max_line_len(
            ByteByByteReader { bytes, pos: 0 },
            16,
        );
        assert_eq!(reader.read_line().unwrap().len(), 16);
        assert_eq!(reader.into_inner().pos, 18);
    }

    #[test]
    fn interrupted_read_retries() {
        let mut reader = LineReader::new(InterruptedThenData {
            interrupted: false,
            bytes: b"ok\n".to_vec(),
            pos: 0,
        });
        assert_eq!(reader.read_line().unwrap(), "ok");
    }

    #[test]
    fn read_error_is_read_failed() {
        let mut reader = LineReader::new(FailingReader);
        let err = reader.read_line().unwrap_err();
        assert!(matches!(
            err,
            TransportError::ReadFailed(e) if e.kind() == ErrorKind::BrokenPipe
        ));
    }

    #[test]
    #[cfg(unix)]
    fn reads_over_unix_pipe() {
        use std::io::Write;

        let (mut left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut reader = LineReader::new(right);

        let writer = std::thread::spawn(move || {
            left.write_all(b"BatchCommand finished: ").unwrap();
            std::thread::sleep(std::time::Duration::from_millis(10));
            left.write_all(b"OK\n\n").unwrap();
        });

        assert_eq!(reader.read_line().unwrap(), "BatchCommand finished: OK");
        assert_eq!(reader.read_line().unwrap(), "");
        writer.join().unwrap();
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }
    }
}
