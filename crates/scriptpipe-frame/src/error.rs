use scriptpipe_transport::TransportError;

/// Errors that can occur while assembling a response.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Reading a line from the transport failed.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// The peer closed the channel before the terminating blank line.
    #[error("incomplete response: peer closed the channel after {lines} line(s), {received} byte(s)")]
    IncompleteResponse { received: usize, lines: usize },

    /// The accumulated response exceeds the configured maximum size.
    #[error("response too large ({size} bytes, max {max})")]
    ResponseTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
