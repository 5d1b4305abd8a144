//! Channel address resolution.
//!
//! Audacity's `mod-script-pipe` creates two pipes: one it reads commands from
//! and one it writes responses to. Their names depend only on the platform and,
//! outside Windows, on the numeric user id, so resolution is a pure function.

use std::fmt;
use std::path::{Path, PathBuf};

/// Application name used in the unix pipe names.
pub const DEFAULT_APP: &str = "audacity";

/// Windows pipe the peer reads commands from.
pub const WINDOWS_TO_PIPE: &str = r"\\.\pipe\ToSrvPipe";

/// Windows pipe the peer writes responses to.
pub const WINDOWS_FROM_PIPE: &str = r"\\.\pipe\FromSrvPipe";

/// Line-ending sequence used for outgoing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTerminator {
    /// `"\n"`
    Lf,
    /// `"\r\n"`
    CrLf,
}

impl LineTerminator {
    pub fn as_str(self) -> &'static str {
        match self {
            LineTerminator::Lf => "\n",
            LineTerminator::CrLf => "\r\n",
        }
    }

    pub fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }

    /// Name for diagnostics ("LF" / "CRLF").
    pub fn name(self) -> &'static str {
        match self {
            LineTerminator::Lf => "LF",
            LineTerminator::CrLf => "CRLF",
        }
    }
}

/// Which of the two channels an address or error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    /// Commands flowing to the peer.
    Outbound,
    /// Responses flowing from the peer.
    Inbound,
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelRole::Outbound => f.write_str("outbound"),
            ChannelRole::Inbound => f.write_str("inbound"),
        }
    }
}

/// Resolved addresses of the two channels plus the command terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    outbound: PathBuf,
    inbound: PathBuf,
    terminator: LineTerminator,
}

impl Endpoints {
    /// Build endpoints from explicit addresses.
    pub fn new(
        outbound: impl Into<PathBuf>,
        inbound: impl Into<PathBuf>,
        terminator: LineTerminator,
    ) -> Self {
        Self {
            outbound: outbound.into(),
            inbound: inbound.into(),
            terminator,
        }
    }

    /// Resolve endpoints for the current platform and user.
    ///
    /// No I/O is performed; the addresses are not checked for existence.
    pub fn resolve() -> Self {
        Self::resolve_for_app(DEFAULT_APP)
    }

    /// Like [`Endpoints::resolve`] with a custom application name.
    ///
    /// The name only affects unix pipe paths; Windows pipe names are fixed.
    pub fn resolve_for_app(app: &str) -> Self {
        #[cfg(windows)]
        {
            let _ = app;
            Self::windows()
        }

        #[cfg(not(windows))]
        {
            Self::unix(app, current_uid())
        }
    }

    /// The fixed Windows named-pipe endpoints.
    pub fn windows() -> Self {
        Self::new(WINDOWS_TO_PIPE, WINDOWS_FROM_PIPE, LineTerminator::CrLf)
    }

    /// The per-user FIFO endpoints used on Linux and macOS.
    pub fn unix(app: &str, uid: u32) -> Self {
        Self::new(
            format!("/tmp/{app}_script_pipe.to.{uid}"),
            format!("/tmp/{app}_script_pipe.from.{uid}"),
            LineTerminator::Lf,
        )
    }

    pub fn outbound(&self) -> &Path {
        &self.outbound
    }

    pub fn inbound(&self) -> &Path {
        &self.inbound
    }

    pub fn terminator(&self) -> LineTerminator {
        self.terminator
    }

    /// Address for the given channel role.
    pub fn path(&self, role: ChannelRole) -> &Path {
        match role {
            ChannelRole::Outbound => &self.outbound,
            ChannelRole::Inbound => &self.inbound,
        }
    }
}

#[cfg(unix)]
fn current_uid() -> u32 {
    // SAFETY: getuid has no preconditions and cannot fail.
    unsafe { libc::getuid() }
}

#[cfg(not(any(unix, windows)))]
fn current_uid() -> u32 {
    0
}
