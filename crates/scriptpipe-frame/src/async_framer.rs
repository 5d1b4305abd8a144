use scriptpipe_transport::{AsyncLineReader, TransportError};
use tokio::io::AsyncRead;
use tracing::debug;

use crate::assembler::{FramerConfig, ResponseAssembler};
use crate::error::Result;

/// Read one response from an async line reader.
///
/// Same termination rule as [`ResponseFramer`](crate::ResponseFramer). Each
/// line read is an await point; dropping the future abandons the response and
/// leaves the reader mid-response.
pub async fn read_response_async<T: AsyncRead + Unpin>(
    reader: &mut AsyncLineReader<T>,
    config: &FramerConfig,
) -> Result<String> {
    let mut assembler = ResponseAssembler::new(config.max_response_len);
    loop {
        let line = match reader.read_line().await {
            Ok(line) => line,
            Err(TransportError::EndOfStream) => return Err(assembler.incomplete()),
            Err(err) => return Err(err.into()),
        };

        if let Some(response) = assembler.push_line(&line)? {
            debug!(len = response.len(), "response complete");
            return Ok(response);
        }
    }
}
