//! Agent connection
//!
//! Line-oriented I/O over one Unix domain socket.

use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::time::Duration;

use super::Endpoint;
use crate::error::{AgentError, Result};
use crate::protocol::MAX_LINE_LENGTH;

/// Socket timeouts of zero are rejected by the OS
const MIN_TIMEOUT: Duration = Duration::from_millis(1);

/// One connection to the agent
pub struct Transport {
    /// Socket reader (buffered for line splitting)
    reader: Option<BufReader<UnixStream>>,

    /// Socket writer (buffered so a line goes out in one write)
    writer: Option<BufWriter<UnixStream>>,

    /// Bytes of a line that was cut short by a read timeout
    pending: Vec<u8>,

    /// Socket path for logging
    path: PathBuf,
}

impl Transport {
    /// Verify the endpoint and connect to it
    pub fn open(endpoint: &Endpoint, write_timeout: Duration) -> Result<Self> {
        endpoint.verify()?;

        let path = endpoint.path().to_path_buf();
        let stream = UnixStream::connect(&path).map_err(|e| match e.kind() {
            io::ErrorKind::ConnectionRefused => AgentError::ConnectionRefused { path: path.clone() },
            io::ErrorKind::NotFound => AgentError::EndpointNotFound { path: path.clone() },
            _ => AgentError::Transport(format!("connect {}: {}", path.display(), e)),
        })?;

        stream
            .set_write_timeout(Some(write_timeout.max(MIN_TIMEOUT)))
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        // Clone stream for separate read/write handles
        let read_stream = stream
            .try_clone()
            .map_err(|e| AgentError::Transport(e.to_string()))?;

        tracing::debug!("Connected to agent socket {}", path.display());

        Ok(Self {
            reader: Some(BufReader::new(read_stream)),
            writer: Some(BufWriter::new(stream)),
            pending: Vec::new(),
            path,
        })
    }

    /// Write one encoded line (terminator included) and flush it
    ///
    /// Any failure closes the connection.
    pub fn send_line(&mut self, line: &[u8]) -> Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| AgentError::Transport("connection is closed".to_string()))?;

        let written = writer.write_all(line).and_then(|()| writer.flush());
        if let Err(e) = written {
            tracing::warn!("Write to {} failed: {}", self.path.display(), e);
            self.close();
            return Err(AgentError::Transport(e.to_string()));
        }

        Ok(())
    }

    /// Read one line, without its terminator
    ///
    /// On `Timeout` the connection stays open and any partial line is kept
    /// for the next call. EOF and I/O failures close the connection.
    pub fn read_line(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| AgentError::Transport("connection is closed".to_string()))?;

        if let Err(e) = reader.get_ref().set_read_timeout(Some(timeout.max(MIN_TIMEOUT))) {
            self.close();
            return Err(AgentError::Transport(e.to_string()));
        }

        match read_until_newline(reader, &mut self.pending) {
            Ok(Some(line)) => Ok(line),
            Ok(None) => {
                tracing::debug!("Agent {} closed the connection", self.path.display());
                self.close();
                Err(AgentError::Transport("connection closed by agent".to_string()))
            }
            Err(AgentError::Timeout) => Err(AgentError::Timeout),
            Err(e) => {
                self.close();
                Err(e)
            }
        }
    }

    /// Release the socket; closing twice is a no-op
    pub fn close(&mut self) {
        let writer = self.writer.take();
        let reader = self.reader.take();
        self.pending.clear();

        if let Some(reader) = reader {
            // Shutdown fails with NotConnected once the peer is gone
            let _ = reader.get_ref().shutdown(Shutdown::Both);
            tracing::debug!("Closed connection to {}", self.path.display());
        }
        drop(writer);
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some() && self.writer.is_some()
    }
}

/// Pull bytes until LF; `Ok(None)` means EOF
fn read_until_newline(
    reader: &mut BufReader<UnixStream>,
    pending: &mut Vec<u8>,
) -> Result<Option<Vec<u8>>> {
    loop {
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(AgentError::from_io(e)),
        };

        if available.is_empty() {
            return Ok(None);
        }

        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                pending.extend_from_slice(&available[..pos]);
                reader.consume(pos + 1);
                if pending.len() >= MAX_LINE_LENGTH {
                    return Err(line_too_long(pending.len() + 1));
                }
                return Ok(Some(std::mem::take(pending)));
            }
            None => {
                let len = available.len();
                pending.extend_from_slice(available);
                reader.consume(len);
                if pending.len() >= MAX_LINE_LENGTH {
                    return Err(line_too_long(pending.len()));
                }
            }
        }
    }
}

fn line_too_long(len: usize) -> AgentError {
    AgentError::ProtocolViolation(format!(
        "line of at least {} bytes exceeds limit of {}",
        len, MAX_LINE_LENGTH
    ))
}
