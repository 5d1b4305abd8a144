//! Response framing for Audacity's `mod-script-pipe`.
//!
//! The peer sends no length prefix. A response is:
//! - zero or more content lines
//! - one empty line, which only counts once some content has arrived
//!
//! Content lines are concatenated without separators. The framer turns a
//! stream of lines into complete responses and distinguishes a peer that hung
//! up mid-response from a plain read failure.

pub mod assembler;
pub mod error;
pub mod framer;

#[cfg(feature = "async")]
pub mod async_framer;

pub use assembler::{FramerConfig, ResponseAssembler, DEFAULT_MAX_RESPONSE};
pub use error::{FrameError, Result};
pub use framer::{read_response, ResponseFramer};

#[cfg(feature = "async")]
pub use async_framer::read_response_async;
