use crate::error::Result;

/// A blocking source of text lines.
///
/// Each call returns one line without its terminator, or
/// [`TransportError::EndOfStream`](crate::TransportError::EndOfStream) when the
/// peer has closed its end.
pub trait LineSource {
    fn read_line(&mut self) -> Result<String>;
}

impl<L: LineSource + ?Sized> LineSource for &mut L {
    fn read_line(&mut self) -> Result<String> {
        (**self).read_line()
    }
}

/// A bidirectional script channel: raw writes out, lines in.
///
/// [`PipeTransport`](crate::PipeTransport) is the named-pipe implementation.
/// Sessions are generic over this trait so another transport (in-memory,
/// socket, timeout-bounded) can be substituted.
///
/// Implementations are not required to be thread-safe; callers drive one
/// channel from one thread at a time.
pub trait ScriptChannel: LineSource {
    /// Write all of `bytes` to the outbound side and flush.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Release both sides. Must be safe to call more than once.
    fn close(&mut self) -> Result<()>;

    /// Whether both sides are currently open.
    fn is_open(&self) -> bool;
}
