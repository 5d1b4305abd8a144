//! Request/response sessions over Audacity's `mod-script-pipe`.
//!
//! This is the "just works" layer: resolve the pipe names, connect, send
//! commands one at a time and get complete responses back, close.
//!
//! ```no_run
//! use scriptpipe_session::Session;
//!
//! let mut session = Session::resolve();
//! session.connect()?;
//! let response = session.send_command("Help: Command=Help")?;
//! println!("{response}");
//! session.close()?;
//! # Ok::<(), scriptpipe_session::SessionError>(())
//! ```

pub mod error;
pub mod session;

pub use error::{Result, SessionError};
pub use session::{Session, SessionConfig, SessionState};
