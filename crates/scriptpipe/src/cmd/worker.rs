use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use scriptpipe_session::{Session, SessionConfig, SessionError};
use scriptpipe_transport::Endpoints;
use tracing::debug;

use crate::exit::{session_error, CliError, CliResult, INTERNAL, TIMEOUT};

enum Request {
    Send(String),
    Close,
}

enum Reply {
    Connected(Result<(), SessionError>),
    Response(Result<String, SessionError>),
    Closed(Result<(), SessionError>),
}

/// Runs a blocking [`Session`] on its own thread so each step can be bounded
/// by a timeout. A timed-out worker is abandoned; the process exits soon after.
pub struct Worker {
    requests: Sender<Request>,
    replies: Receiver<Reply>,
    timeout: Option<Duration>,
}

impl Worker {
    pub fn connect(
        endpoints: Endpoints,
        config: SessionConfig,
        timeout: Option<Duration>,
    ) -> CliResult<Self> {
        let (requests, request_rx) = mpsc::channel();
        let (reply_tx, replies) = mpsc::channel();

        thread::Builder::new()
            .name("scriptpipe-session".to_string())
            .spawn(move || serve(Session::with_config(endpoints, config), request_rx, reply_tx))
            .map_err(|err| crate::exit::io_error("failed to start session thread", err))?;

        let worker = Self {
            requests,
            replies,
            timeout,
        };
        match worker.wait("connect")? {
            Reply::Connected(result) => {
                result.map_err(|err| session_error("connect failed", err))?;
                Ok(worker)
            }
            _ => Err(unexpected_reply("connect")),
        }
    }

    pub fn send(&mut self, command: &str) -> CliResult<String> {
        self.submit(Request::Send(command.to_string()))?;
        match self.wait("send")? {
            Reply::Response(result) => result.map_err(|err| session_error("send failed", err)),
            _ => Err(unexpected_reply("send")),
        }
    }

    pub fn close(self) -> CliResult<()> {
        self.submit(Request::Close)?;
        match self.wait("close")? {
            Reply::Closed(result) => result.map_err(|err| session_error("close failed", err)),
            _ => Err(unexpected_reply("close")),
        }
    }

    fn submit(&self, request: Request) -> CliResult<()> {
        self.requests
            .send(request)
            .map_err(|_| CliError::new(INTERNAL, "session thread exited unexpectedly"))
    }

    fn wait(&self, step: &str) -> CliResult<Reply> {
        let Some(timeout) = self.timeout else {
            return self
                .replies
                .recv()
                .map_err(|_| CliError::new(INTERNAL, "session thread exited unexpectedly"));
        };

        match self.replies.recv_timeout(timeout) {
            Ok(reply) => Ok(reply),
            Err(RecvTimeoutError::Timeout) => Err(CliError::new(
                TIMEOUT,
                format!("{step} timed out after {}ms", timeout.as_millis()),
            )),
            Err(RecvTimeoutError::Disconnected) => Err(CliError::new(
                INTERNAL,
                "session thread exited unexpectedly",
            )),
        }
    }
}

fn serve(mut session: Session, requests: Receiver<Request>, replies: Sender<Reply>) {
    let connected = session.connect();
    let failed = connected.is_err();
    if replies.send(Reply::Connected(connected)).is_err() || failed {
        return;
    }

    while let Ok(request) = requests.recv() {
        let reply = match request {
            Request::Send(command) => Reply::Response(session.send_command(&command)),
            Request::Close => {
                let _ = replies.send(Reply::Closed(session.close()));
                return;
            }
        };
        if replies.send(reply).is_err() {
            break;
        }
    }
    debug!("session thread finished without explicit close");
}

fn unexpected_reply(step: &str) -> CliError {
    CliError::new(INTERNAL, format!("unexpected reply from session thread during {step}"))
}

#[cfg(all(test, unix))]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::exit::TRANSPORT_ERROR;
    use scriptpipe_transport::LineTerminator;

    fn missing_dir() -> PathBuf {
        std::env::temp_dir().join(format!("scriptpipe-worker-missing-{}", std::process::id()))
    }

    #[test]
    fn connect_reports_missing_pipes() {
        let dir = missing_dir();
        let endpoints = Endpoints::new(dir.join("to"), dir.join("from"), LineTerminator::Lf);
        let err = Worker::connect(
            endpoints,
            SessionConfig::default(),
            Some(Duration::from_secs(5)),
        )
        .err()
        .expect("connect should fail");
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert!(err.message.contains("mod-script-pipe"));
    }

    #[test]
    fn connect_times_out_without_writer() {
        let dir = std::env::temp_dir().join(format!(
            "scriptpipe-worker-timeout-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let to = dir.join("to");
        let from = dir.join("from");
        for path in [&to, &from] {
            let c = std::ffi::CString::new(path.to_str().unwrap()).unwrap();
            // SAFETY: valid NUL-terminated path.
            assert_eq!(unsafe { libc::mkfifo(c.as_ptr(), 0o600) }, 0);
        }

        // Nobody opens the write side of `from`, so opening it for reading blocks.
        let err = Worker::connect(
            Endpoints::new(&to, &from, LineTerminator::Lf),
            SessionConfig::default(),
            Some(Duration::from_millis(100)),
        )
        .err()
        .expect("connect should time out");
        assert_eq!(err.code, TIMEOUT);

        // Release the blocked open so the worker thread can exit.
        let _ = std::fs::OpenOptions::new().write(true).open(&from);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
