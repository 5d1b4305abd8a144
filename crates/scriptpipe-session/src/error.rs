use scriptpipe_frame::FrameError;
use scriptpipe_transport::TransportError;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error (missing endpoint, open, read, write, close).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Framing error other than a transport failure.
    #[error("frame error: {0}")]
    Frame(FrameError),

    /// `connect` was called on a session that is connected or closed.
    #[error("session already connected or closed")]
    AlreadyConnected,

    /// The operation needs a connected session.
    #[error("session is not connected")]
    NotConnected,
}

impl From<FrameError> for SessionError {
    fn from(err: FrameError) -> Self {
        // Keep read failures in one place regardless of which layer saw them.
        match err {
            FrameError::Transport(err) => SessionError::Transport(err),
            other => SessionError::Frame(other),
        }
    }
}

impl SessionError {
    /// True when a channel object was missing at connect time.
    pub fn is_endpoint_missing(&self) -> bool {
        matches!(
            self,
            SessionError::Transport(TransportError::EndpointNotFound { .. })
        )
    }

    /// True when the peer went away mid-exchange.
    pub fn is_peer_gone(&self) -> bool {
        match self {
            SessionError::Transport(err) => err.is_peer_gone(),
            SessionError::Frame(FrameError::IncompleteResponse { .. }) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_transport_errors_are_flattened() {
        let err: SessionError = FrameError::Transport(TransportError::EndOfStream).into();
        assert!(matches!(
            err,
            SessionError::Transport(TransportError::EndOfStream)
        ));
    }

    #[test]
    fn incomplete_response_counts_as_peer_gone() {
        let err: SessionError = FrameError::IncompleteResponse {
            received: 3,
            lines: 1,
        }
        .into();
        assert!(err.is_peer_gone());
        assert!(!err.is_endpoint_missing());
        assert!(!SessionError::NotConnected.is_peer_gone());
    }
}
