use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::endpoint::{ChannelRole, Endpoints};
use crate::error::{CloseFailures, Result, TransportError};
use crate::line::{LineReader, TransportConfig};
use crate::traits::{LineSource, ScriptChannel};

/// Named-pipe transport for `mod-script-pipe`.
///
/// Holds the outbound handle (opened read-write) and the inbound handle
/// (opened read-only) as one unit: both are open or both are released.
/// The pipes themselves are created by the peer; this type never creates them.
pub struct PipeTransport {
    handles: Option<Handles>,
}

struct Handles {
    outbound: File,
    inbound: LineReader<File>,
}

impl PipeTransport {
    /// Open both channels with the default configuration.
    pub fn open(endpoints: &Endpoints) -> Result<Self> {
        Self::open_with_config(endpoints, &TransportConfig::default())
    }

    /// Open both channels with explicit configuration.
    ///
    /// Both addresses are checked for existence before anything is opened. The
    /// inbound open blocks until the peer has its write end open.
    pub fn open_with_config(endpoints: &Endpoints, config: &TransportConfig) -> Result<Self> {
        ensure_exists(ChannelRole::Outbound, endpoints.outbound())?;
        ensure_exists(ChannelRole::Inbound, endpoints.inbound())?;
        debug!(
            outbound = ?endpoints.outbound(),
            inbound = ?endpoints.inbound(),
            "both channels exist"
        );

        // Read-write so opening a FIFO does not wait for the peer's reader.
        let outbound = open_channel(
            ChannelRole::Outbound,
            endpoints.outbound(),
            OpenOptions::new().read(true).write(true),
        )?;
        debug!(path = ?endpoints.outbound(), "outbound channel opened");

        let inbound = match open_channel(
            ChannelRole::Inbound,
            endpoints.inbound(),
            OpenOptions::new().read(true),
        ) {
            Ok(file) => file,
            Err(err) => {
                if let Err(release_err) = release(outbound) {
                    debug!(error = %release_err, "outbound rollback release failed");
                }
                return Err(err);
            }
        };
        debug!(path = ?endpoints.inbound(), "inbound channel opened");

        info!(
            outbound = ?endpoints.outbound(),
            inbound = ?endpoints.inbound(),
            "script pipe transport open"
        );

        Ok(Self {
            handles: Some(Handles {
                outbound,
                inbound: LineReader::with_max_line_len(inbound, config.max_line_len),
            }),
        })
    }

    /// Release both handles.
    ///
    /// Both releases are attempted even if the first fails. Closing an already
    /// closed transport is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(Handles { outbound, inbound }) = self.handles.take() else {
            debug!("transport already closed");
            return Ok(());
        };

        let failures = CloseFailures {
            inbound: release(inbound.into_inner()).err(),
            outbound: release(outbound).err(),
        };

        if failures.is_empty() {
            debug!("transport closed");
            Ok(())
        } else {
            Err(TransportError::ChannelCloseFailed(failures))
        }
    }

    /// Write `bytes` to the outbound channel and flush.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let handles = self.handles.as_mut().ok_or(TransportError::NotOpen)?;
        handles
            .outbound
            .write_all(bytes)
            .map_err(TransportError::WriteFailed)?;
        handles.outbound.flush().map_err(TransportError::WriteFailed)
    }

    /// Read one line from the inbound channel (blocking).
    pub fn read_line(&mut self) -> Result<String> {
        let handles = self.handles.as_mut().ok_or(TransportError::NotOpen)?;
        handles.inbound.read_line()
    }

    pub fn is_open(&self) -> bool {
        self.handles.is_some()
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        if cfg!(windows) {
            "named-pipe"
        } else {
            "fifo"
        }
    }
}

impl LineSource for PipeTransport {
    fn read_line(&mut self) -> Result<String> {
        PipeTransport::read_line(self)
    }
}

impl ScriptChannel for PipeTransport {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        PipeTransport::write_all(self, bytes)
    }

    fn close(&mut self) -> Result<()> {
        PipeTransport::close(self)
    }

    fn is_open(&self) -> bool {
        PipeTransport::is_open(self)
    }
}

impl std::fmt::Debug for PipeTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeTransport")
            .field("type", &self.transport_name())
            .field("open", &self.is_open())
            .finish()
    }
}

fn ensure_exists(role: ChannelRole, path: &Path) -> Result<()> {
    match path.try_exists() {
        Ok(true) => {}
        Ok(false) => {
            return Err(TransportError::EndpointNotFound {
                role,
                path: path.to_path_buf(),
            })
        }
        Err(source) => {
            return Err(TransportError::ChannelOpenFailed {
                role,
                path: path.to_path_buf(),
                source,
            })
        }
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        if let Ok(metadata) = std::fs::metadata(path) {
            if !metadata.file_type().is_fifo() {
                debug!(%role, ?path, "channel exists but is not a FIFO");
            }
        }
    }

    Ok(())
}

fn open_channel(role: ChannelRole, path: &Path, options: &OpenOptions) -> Result<File> {
    options
        .open(path)
        .map_err(|source| TransportError::ChannelOpenFailed {
            role,
            path: path.to_path_buf(),
            source,
        })
}

/// Close a handle and report the OS error, which dropping a `File` discards.
#[cfg(unix)]
fn release(file: File) -> std::io::Result<()> {
    use std::os::fd::IntoRawFd;

    let fd = file.into_raw_fd();
    // SAFETY: `fd` was taken out of an owned `File`, so it is open and is
    // closed exactly once here.
    let rc = unsafe { libc::close(fd) };
    if rc == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn release(file: File) -> std::io::Result<()> {
    drop(file);
    Ok(())
}
