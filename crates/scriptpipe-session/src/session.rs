use scriptpipe_frame::{FramerConfig, ResponseFramer};
use scriptpipe_transport::{Endpoints, PipeTransport, ScriptChannel, TransportConfig};
use tracing::{debug, info, trace, warn};

use crate::error::{Result, SessionError};

/// Configuration for a session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub transport: TransportConfig,
    pub framer: FramerConfig,
}

/// Observable lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Connected,
    Closed,
}

enum State<C> {
    Unconnected,
    Connected(C),
    Closed,
}

/// One request/response conversation with the scripting peer.
///
/// `Unconnected → Connected → Closed`; there is no way back to
/// `Unconnected`. Exactly one command is in flight at a time and every call
/// blocks the calling thread. A session is not reentrant: share it across
/// threads only behind external mutual exclusion.
pub struct Session<C: ScriptChannel = PipeTransport> {
    endpoints: Endpoints,
    config: SessionConfig,
    framer: ResponseFramer,
    state: State<C>,
}

impl Session<PipeTransport> {
    /// Session for the endpoints of the current platform and user.
    pub fn resolve() -> Self {
        Self::new(Endpoints::resolve())
    }

    /// Open both named pipes.
    ///
    /// Fails with `EndpointNotFound` if the peer has not created them, and
    /// with `AlreadyConnected` unless the session is `Unconnected`.
    pub fn connect(&mut self) -> Result<()> {
        let config = self.config.transport.clone();
        self.connect_with(|endpoints| PipeTransport::open_with_config(endpoints, &config))
    }
}

impl<C: ScriptChannel> Session<C> {
    pub fn new(endpoints: Endpoints) -> Self {
        Self::with_config(endpoints, SessionConfig::default())
    }

    pub fn with_config(endpoints: Endpoints, config: SessionConfig) -> Self {
        Self {
            framer: ResponseFramer::new(config.framer.clone()),
            endpoints,
            config,
            state: State::Unconnected,
        }
    }

    /// Connect using a custom opener for the channel pair.
    ///
    /// The opener either returns both sides open or an error with nothing
    /// left open.
    pub fn connect_with<F>(&mut self, open: F) -> Result<()>
    where
        F: FnOnce(&Endpoints) -> scriptpipe_transport::Result<C>,
    {
        if !matches!(self.state, State::Unconnected) {
            return Err(SessionError::AlreadyConnected);
        }

        let channel = open(&self.endpoints)?;
        self.state = State::Connected(channel);
        info!(
            outbound = ?self.endpoints.outbound(),
            inbound = ?self.endpoints.inbound(),
            "session connected"
        );
        Ok(())
    }

    /// Send one command and wait for its complete response.
    ///
    /// Writes `command` followed by the endpoint terminator, then reads lines
    /// until the response is complete. Any failure in the exchange leaves the
    /// channels unusable, so the session releases them and moves to `Closed`
    /// before returning the error.
    pub fn send_command(&mut self, command: &str) -> Result<String> {
        let State::Connected(channel) = &mut self.state else {
            return Err(SessionError::NotConnected);
        };

        let terminator = self.endpoints.terminator();
        let mut wire = String::with_capacity(command.len() + terminator.as_str().len());
        wire.push_str(command);
        wire.push_str(terminator.as_str());
        trace!(command, "sending command");

        match exchange(channel, &self.framer, wire.as_bytes()) {
            Ok(response) => {
                trace!(len = response.len(), "response received");
                Ok(response)
            }
            Err(err) => {
                warn!(error = %err, "command exchange failed; closing session");
                self.teardown();
                Err(err)
            }
        }
    }

    /// Release both channels.
    ///
    /// A no-op on a session that was never connected or is already closed.
    /// Otherwise the session is `Closed` afterwards even if a release failed;
    /// that failure is still returned.
    pub fn close(&mut self) -> Result<()> {
        if matches!(self.state, State::Unconnected) {
            debug!("close on unconnected session");
            return Ok(());
        }

        match std::mem::replace(&mut self.state, State::Closed) {
            State::Connected(mut channel) => {
                channel.close()?;
                info!("session closed");
                Ok(())
            }
            _ => {
                debug!("session already closed");
                Ok(())
            }
        }
    }

    pub fn state(&self) -> SessionState {
        match self.state {
            State::Unconnected => SessionState::Unconnected,
            State::Connected(_) => SessionState::Connected,
            State::Closed => SessionState::Closed,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, State::Connected(_))
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn teardown(&mut self) {
        if let State::Connected(mut channel) = std::mem::replace(&mut self.state, State::Closed) {
            if let Err(err) = channel.close() {
                debug!(error = %err, "release after failed exchange also failed");
            }
        }
    }
}

impl<C: ScriptChannel> Drop for Session<C> {
    fn drop(&mut self) {
        if self.is_connected() {
            debug!("dropping connected session");
            self.teardown();
        }
    }
}

impl<C: ScriptChannel> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoints", &self.endpoints)
            .field("state", &self.state())
            .finish()
    }
}

fn exchange<C: ScriptChannel>(
    channel: &mut C,
    framer: &ResponseFramer,
    wire: &[u8],
) -> Result<String> {
    channel.write_all(wire)?;
    Ok(framer.read_response(channel)?)
}
