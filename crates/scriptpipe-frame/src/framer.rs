use scriptpipe_transport::{LineSource, TransportError};
use tracing::debug;

use crate::assembler::{FramerConfig, ResponseAssembler};
use crate::error::Result;

/// Drives a [`LineSource`] until one complete response has been read.
#[derive(Debug, Clone, Default)]
pub struct ResponseFramer {
    config: FramerConfig,
}

impl ResponseFramer {
    pub fn new(config: FramerConfig) -> Self {
        Self { config }
    }

    /// Read one response (blocking).
    ///
    /// End of stream before the terminating blank line is reported as
    /// `IncompleteResponse`; every other transport error is returned as is,
    /// without retry.
    pub fn read_response<L: LineSource + ?Sized>(&self, source: &mut L) -> Result<String> {
        let mut assembler = ResponseAssembler::new(self.config.max_response_len);
        loop {
            let line = match source.read_line() {
                Ok(line) => line,
                Err(TransportError::EndOfStream) => return Err(assembler.incomplete()),
                Err(err) => return Err(err.into()),
            };

            let lines = assembler.lines() + 1;
            if let Some(response) = assembler.push_line(&line)? {
                debug!(lines, len = response.len(), "response complete");
                return Ok(response);
            }
        }
    }

    pub fn config(&self) -> &FramerConfig {
        &self.config
    }
}

/// Read one response with the default configuration.
pub fn read_response<L: LineSource + ?Sized>(source: &mut L) -> Result<String> {
    ResponseFramer::default().read_response(source)
}
