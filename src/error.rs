//! Error types for gpgagent
//!
//! Provides a unified error type for all operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::protocol::ErrorCode;

/// Result type alias using AgentError
pub type Result<T> = std::result::Result<T, AgentError>;

/// Unified error type for agent client operations
#[derive(Debug, Error)]
pub enum AgentError {
    // -------------------------------------------------------------------------
    // Endpoint Errors
    // -------------------------------------------------------------------------
    #[error("socket \"{}\" does not exist", .path.display())]
    EndpointNotFound { path: PathBuf },

    #[error("file \"{}\" is not a socket", .path.display())]
    EndpointNotASocket { path: PathBuf },

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("connection refused by \"{}\"", .path.display())]
    ConnectionRefused { path: PathBuf },

    /// The connection is dead and must be reopened
    #[error("transport error: {0}")]
    Transport(String),

    /// No complete line arrived in time; the connection is still open
    #[error("timed out waiting for the agent")]
    Timeout,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unsupported inquiry from agent: {keyword}")]
    UnsupportedInquiry { keyword: String },

    #[error("peer is not a gpg-agent: {0}")]
    NotAnAgent(String),

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("session busy: a command is already in flight")]
    SessionBusy,

    #[error("session closed")]
    SessionClosed,

    // -------------------------------------------------------------------------
    // Agent-reported Errors
    // -------------------------------------------------------------------------
    #[error("agent error {code}: {description}")]
    Agent { code: ErrorCode, description: String },

    #[error("no secret key for keygrip {0}")]
    KeyNotFound(String),

    #[error("operation declined by user: {0}")]
    UserDeclined(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}

impl AgentError {
    /// Classify an I/O error raised while talking to the agent
    ///
    /// Read/write timeouts surface as `WouldBlock` on Unix and `TimedOut`
    /// elsewhere; everything else means the connection is gone.
    pub fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => AgentError::Timeout,
            _ => AgentError::Transport(err.to_string()),
        }
    }

    /// True when the same command may be issued again on the same session
    pub fn is_retriable(&self) -> bool {
        matches!(self, AgentError::Timeout)
    }

    /// True when the session must be discarded and a new one opened
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AgentError::Transport(_) | AgentError::ProtocolViolation(_)
        )
    }

    /// The numeric agent error code, if the agent reported one
    pub fn agent_code(&self) -> Option<ErrorCode> {
        match self {
            AgentError::Agent { code, .. } => Some(*code),
            _ => None,
        }
    }
}
