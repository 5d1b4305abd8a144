use crate::error::{FrameError, Result};

/// Default maximum response size: 16 MiB.
pub const DEFAULT_MAX_RESPONSE: usize = 16 * 1024 * 1024;

/// Configuration for response framing.
#[derive(Debug, Clone)]
pub struct FramerConfig {
    /// Maximum accumulated response size in bytes. Default: 16 MiB.
    pub max_response_len: usize,
}

impl Default for FramerConfig {
    fn default() -> Self {
        Self {
            max_response_len: DEFAULT_MAX_RESPONSE,
        }
    }
}

/// Push-based state machine for the blank-line response convention.
///
/// A response is zero or more content lines followed by an empty line. Lines
/// are concatenated with no separator. An empty line only terminates once at
/// least one character has been accumulated, so leading blank lines are
/// absorbed.
///
/// A response whose only content is a blank line therefore never completes:
/// the peer convention cannot tell it apart from "nothing written yet".
#[derive(Debug)]
pub struct ResponseAssembler {
    buf: String,
    lines: usize,
    max_response_len: usize,
}

impl ResponseAssembler {
    pub fn new(max_response_len: usize) -> Self {
        Self {
            buf: String::new(),
            lines: 0,
            max_response_len,
        }
    }

    /// Feed one line (without terminator).
    ///
    /// Returns `Ok(Some(response))` when this line completes the response and
    /// resets the assembler for the next one.
    pub fn push_line(&mut self, line: &str) -> Result<Option<String>> {
        self.lines += 1;

        if line.is_empty() {
            if self.buf.is_empty() {
                return Ok(None);
            }
            self.lines = 0;
            return Ok(Some(std::mem::take(&mut self.buf)));
        }

        let size = self.buf.len() + line.len();
        if size > self.max_response_len {
            return Err(FrameError::ResponseTooLarge {
                size,
                max: self.max_response_len,
            });
        }
        self.buf.push_str(line);
        Ok(None)
    }

    /// Bytes accumulated so far.
    pub fn received(&self) -> usize {
        self.buf.len()
    }

    /// Lines consumed for the response in progress.
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Error describing a stream that ended before completion.
    pub fn incomplete(&self) -> FrameError {
        FrameError::IncompleteResponse {
            received: self.buf.len(),
            lines: self.lines,
        }
    }
}

impl Default for ResponseAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESPONSE)
    }
}
