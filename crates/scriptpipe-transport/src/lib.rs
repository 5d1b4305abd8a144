//! Channel transport for Audacity's `mod-script-pipe`.
//!
//! The peer exposes two unidirectional pipes:
//! - a command pipe it reads from (outbound for us)
//! - a response pipe it writes to (inbound for us)
//!
//! This is the lowest layer of scriptpipe: address resolution, opening and
//! releasing the pipe pair, raw writes, and line reading. Everything else
//! builds on the [`ScriptChannel`] and [`LineSource`] traits provided here.

pub mod endpoint;
pub mod error;
pub mod line;
pub mod pipe;
pub mod traits;

#[cfg(feature = "async")]
pub mod async_line;

pub use endpoint::{ChannelRole, Endpoints, LineTerminator, DEFAULT_APP};
pub use error::{CloseFailures, Result, TransportError};
pub use line::{LineReader, TransportConfig, DEFAULT_MAX_LINE_LEN};
pub use pipe::PipeTransport;
pub use traits::{LineSource, ScriptChannel};

#[cfg(feature = "async")]
pub use async_line::AsyncLineReader;
