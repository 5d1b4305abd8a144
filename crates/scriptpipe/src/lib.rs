//! Client for Audacity's `mod-script-pipe` scripting protocol.
//!
//! scriptpipe talks to a running Audacity through the two named pipes its
//! scripting module creates: commands go out one line at a time, responses
//! come back as lines closed by a blank line.
//!
//! # Crate Structure
//!
//! - [`transport`]: Pipe address resolution, open/close, line reading
//! - [`frame`]: Blank-line response framing
//! - [`session`]: Connect / send-command / close state machine
//!
//! The `cli` feature builds the `scriptpipe` binary; the `async` feature adds a
//! tokio line reader and framer.

/// Re-export transport types.
pub mod transport {
    pub use scriptpipe_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use scriptpipe_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use scriptpipe_session::*;
}

pub use scriptpipe_session::{Session, SessionConfig, SessionError, SessionState};
pub use scriptpipe_transport::{Endpoints, LineTerminator};
