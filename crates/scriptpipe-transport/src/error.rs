use std::fmt;
use std::path::PathBuf;

use crate::endpoint::ChannelRole;

/// Errors that can occur in channel transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// A channel object the peer should have created does not exist.
    #[error(
        "{role} channel {} does not exist; ensure Audacity is running with mod-script-pipe enabled",
        path.display()
    )]
    EndpointNotFound { role: ChannelRole, path: PathBuf },

    /// The channel exists but could not be opened.
    #[error("failed to open {role} channel {}: {source}", path.display())]
    ChannelOpenFailed {
        role: ChannelRole,
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing to the outbound channel failed.
    #[error("write to outbound channel failed: {0}")]
    WriteFailed(std::io::Error),

    /// Reading from the inbound channel failed.
    #[error("read from inbound channel failed: {0}")]
    ReadFailed(std::io::Error),

    /// The peer closed the inbound channel before a line terminator arrived.
    #[error("inbound channel closed by peer (end of stream)")]
    EndOfStream,

    /// A line grew past the configured limit without a terminator.
    #[error("line too long ({len} bytes without terminator, max {max})")]
    LineTooLong { len: usize, max: usize },

    /// Releasing one or both channel handles failed.
    #[error("failed to release channel handles: {0}")]
    ChannelCloseFailed(CloseFailures),

    /// The transport has already been closed.
    #[error("channel transport is not open")]
    NotOpen,
}

impl TransportError {
    /// True when the peer went away (closed its end or broke the pipe).
    pub fn is_peer_gone(&self) -> bool {
        match self {
            TransportError::EndOfStream => true,
            TransportError::WriteFailed(err) | TransportError::ReadFailed(err) => {
                err.kind() == std::io::ErrorKind::BrokenPipe
            }
            _ => false,
        }
    }
}

/// Per-side failures collected while closing a channel pair.
///
/// Both sides are always attempted; each slot holds the error for that side,
/// if any.
#[derive(Debug, Default)]
pub struct CloseFailures {
    pub outbound: Option<std::io::Error>,
    pub inbound: Option<std::io::Error>,
}

impl CloseFailures {
    pub fn is_empty(&self) -> bool {
        self.outbound.is_none() && self.inbound.is_none()
    }
}

impl fmt::Display for CloseFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.outbound, &self.inbound) {
            (Some(out), Some(inb)) => write!(f, "outbound: {out}; inbound: {inb}"),
            (Some(out), None) => write!(f, "outbound: {out}"),
            (None, Some(inb)) => write!(f, "inbound: {inb}"),
            (None, None) => write!(f, "no failures"),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
