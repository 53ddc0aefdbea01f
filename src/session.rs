//! Session Module
//!
//! Sequences command/response exchanges over one agent connection.
//!
//! ## State Machine
//! ```text
//!  Unconnected ──connect──▶ Connected ──issue──▶ Busy
//!                              ▲  │               │
//!                              │  │   terminal /  │
//!                              │  │   timeout     │
//!                              │  └───────◀───────┘
//!                              │close       │ transport failure /
//!                              ▼            │ protocol violation
//!                            Closed ◀───────┘
//! ```
//!
//! ## Invariants
//! - One connection carries both the liveness probe and all commands
//! - At most one command is in flight; a second `issue` while `Busy` is
//!   rejected with `SessionBusy` before any byte is written
//! - A timed-out command's late response is drained before the next one

use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{AgentError, Result};
use crate::protocol::{
    decode_line, encode_cancel, encode_command, encode_data, encode_end, Command, Inquiry, Line,
    Progress, Response, ResponseBuilder,
};
use crate::transport::{Endpoint, Transport};

/// How long `close` waits for the reply to `BYE`
const BYE_TIMEOUT: Duration = Duration::from_millis(250);

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Connected,
    Busy,
    Closed,
}

/// Connection-owning half of the session, locked for a whole exchange
struct Channel {
    transport: Transport,

    /// Responses still owed by the agent for commands that timed out
    abandoned: usize,
}

/// A live conversation with one agent
///
/// The session owns its transport exclusively. Independent sessions share
/// nothing and may be used from different threads.
pub struct Session {
    /// Gate checked and flipped before the channel is touched
    state: Mutex<SessionState>,

    channel: Mutex<Channel>,

    endpoint: Endpoint,

    /// Version reported by the liveness probe
    agent_version: String,
}

impl Session {
    /// Connect, read the greeting and run the `GETINFO version` probe
    ///
    /// Endpoint and dial errors pass through; anything that goes wrong
    /// after the socket accepted us is `NotAnAgent`, and the connection is
    /// closed before returning.
    pub fn connect(endpoint: &Endpoint, config: &Config) -> Result<Self> {
        let transport = Transport::open(endpoint, config.write_timeout())?;
        let mut channel = Channel {
            transport,
            abandoned: 0,
        };

        let agent_version = match channel.handshake(config.probe_timeout()) {
            Ok(version) => version,
            Err(e) => {
                channel.transport.close();
                tracing::warn!("Liveness probe on {} failed: {}", endpoint, e);
                return Err(AgentError::NotAnAgent(e.to_string()));
            }
        };

        tracing::debug!("Session established with gpg-agent {} at {}", agent_version, endpoint);

        Ok(Self {
            state: Mutex::new(SessionState::Connected),
            channel: Mutex::new(channel),
            endpoint: endpoint.clone(),
            agent_version,
        })
    }

    /// Send a command and read its complete response
    ///
    /// An `ERR` reply is a successful exchange; inspect the outcome. Any
    /// inquiry is cancelled and reported as `UnsupportedInquiry`.
    pub fn issue(&self, command: &Command, timeout: Duration) -> Result<Response> {
        self.issue_with_inquiry(command, timeout, |_| None)
    }

    /// Like [`Session::issue`], but inquiries go to `responder`
    ///
    /// `Some(data)` is sent as `D` lines followed by `END`; `None` cancels
    /// the inquiry and the call fails with `UnsupportedInquiry` once the
    /// agent has finished its response.
    pub fn issue_with_inquiry<F>(
        &self,
        command: &Command,
        timeout: Duration,
        responder: F,
    ) -> Result<Response>
    where
        F: FnMut(&Inquiry) -> Option<Vec<u8>>,
    {
        self.begin()?;

        let mut channel = self.channel.lock();

        // A close that held the channel while we waited has won
        if *self.state.lock() == SessionState::Closed {
            return Err(AgentError::SessionClosed);
        }

        let result = channel.exchange(command, timeout, responder);

        let next = match &result {
            Err(e) if e.is_fatal() => {
                tracing::warn!("Closing session to {} after {}", self.endpoint, e);
                channel.transport.close();
                SessionState::Closed
            }
            _ => SessionState::Connected,
        };
        *self.state.lock() = next;

        result
    }

    /// Close the session; closing twice is a no-op
    ///
    /// Says `BYE` first when the connection is idle and healthy. Waits for
    /// an in-flight command to finish.
    pub fn close(&self) -> Result<()> {
        let mut channel = self.channel.lock();
        let mut state = self.state.lock();

        if *state == SessionState::Closed {
            return Ok(());
        }

        if *state == SessionState::Connected && channel.abandoned == 0 {
            channel.say_bye();
        }

        channel.transport.close();
        *state = SessionState::Closed;
        tracing::debug!("Session to {} closed", self.endpoint);

        Ok(())
    }

    /// Close the session because a caller found the conversation out of
    /// sync; returns `error` for propagation
    ///
    /// No `BYE` is sent.
    pub fn fail(&self, error: AgentError) -> AgentError {
        let mut channel = self.channel.lock();
        let mut state = self.state.lock();

        if *state != SessionState::Closed {
            tracing::warn!("Closing session to {} after {}", self.endpoint, error);
            channel.transport.close();
            *state = SessionState::Closed;
        }

        error
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Version string the agent reported while connecting
    pub fn agent_version(&self) -> &str {
        &self.agent_version
    }

    /// Connected → Busy, or the reason the command cannot start
    fn begin(&self) -> Result<()> {
        let mut state = self.state.lock();
        match *state {
            SessionState::Connected => {
                *state = SessionState::Busy;
                Ok(())
            }
            SessionState::Busy => Err(AgentError::SessionBusy),
            SessionState::Unconnected | SessionState::Closed => Err(AgentError::SessionClosed),
        }
    }
}

impl Channel {
    /// Greeting plus `GETINFO version`; returns the version
    fn handshake(&mut self, timeout: Duration) -> Result<String> {
        loop {
            let raw = self.transport.read_line(timeout)?;
            match decode_line(&raw)? {
                Line::Comment(_) => continue,
                Line::Ok(_) => break,
                other => {
                    return Err(AgentError::ProtocolViolation(format!(
                        "unexpected greeting {:?}",
                        other
                    )))
                }
            }
        }

        let response = self
            .exchange(&Command::getinfo("version"), timeout, |_| None)?
            .into_result()?;

        let version = response.text();
        if version.is_empty() {
            return Err(AgentError::ProtocolViolation(
                "empty version in probe response".to_string(),
            ));
        }
        Ok(version)
    }

    /// One command from send to terminal line
    fn exchange<F>(&mut self, command: &Command, timeout: Duration, mut responder: F) -> Result<Response>
    where
        F: FnMut(&Inquiry) -> Option<Vec<u8>>,
    {
        self.drain_abandoned(timeout)?;

        let line = encode_command(command)?;
        self.transport.send_line(&line)?;
        tracing::trace!("-> {}", command);

        let mut builder = ResponseBuilder::new();
        let mut declined: Option<String> = None;

        loop {
            let raw = match self.transport.read_line(timeout) {
                Ok(raw) => raw,
                Err(AgentError::Timeout) => {
                    self.abandoned += 1;
                    tracing::debug!("{} timed out after {:?}", command, timeout);
                    return Err(AgentError::Timeout);
                }
                Err(e) => return Err(e),
            };

            match builder.push(decode_line(&raw)?) {
                Progress::Pending => {}
                Progress::Inquire(inquiry) => {
                    tracing::trace!("<- INQUIRE {}", inquiry.keyword);
                    match responder(&inquiry) {
                        Some(data) => self.send_inquiry_data(&data)?,
                        None => {
                            self.transport.send_line(&encode_cancel())?;
                            declined = Some(inquiry.keyword);
                        }
                    }
                }
                Progress::Complete(response) => {
                    tracing::trace!(
                        "<- {:?} ({} data bytes, {} status lines)",
                        response.outcome,
                        response.data.len(),
                        response.status.len()
                    );
                    if let Some(keyword) = declined {
                        return Err(AgentError::UnsupportedInquiry { keyword });
                    }
                    return Ok(response);
                }
            }
        }
    }

    fn send_inquiry_data(&mut self, data: &[u8]) -> Result<()> {
        for line in encode_data(data) {
            self.transport.send_line(&line)?;
        }
        self.transport.send_line(&encode_end())?;
        tracing::trace!("-> {} inquiry bytes", data.len());
        Ok(())
    }

    /// Skip the responses of commands that timed out earlier
    fn drain_abandoned(&mut self, timeout: Duration) -> Result<()> {
        while self.abandoned > 0 {
            loop {
                let raw = self.transport.read_line(timeout)?;
                match decode_line(&raw)? {
                    line if line.is_terminal() => break,
                    Line::Inquire(_) => self.transport.send_line(&encode_cancel())?,
                    _ => {}
                }
            }
            self.abandoned -= 1;
            tracing::debug!("Discarded a late response, {} still owed", self.abandoned);
        }
        Ok(())
    }

    /// Best-effort `BYE`; the socket is closed right after regardless
    fn say_bye(&mut self) {
        let Ok(line) = encode_command(&Command::bye()) else {
            return;
        };
        if self.transport.send_line(&line).is_ok() {
            if let Err(e) = self.transport.read_line(BYE_TIMEOUT) {
                tracing::trace!("No reply to BYE: {}", e);
            }
        }
    }
}
