//! Response definitions
//!
//! Represents lines and assembled responses from the agent.

use std::fmt;

use bytes::Bytes;

use crate::error::{AgentError, Result};

/// Numeric code from an `ERR` line, kept verbatim
///
/// gpg-agent sends libgpg-error values: the error source sits in bits
/// 24..31 and the error code in the low 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    /// GPG_ERR_NO_SECKEY
    pub const NO_SECKEY: u16 = 17;
    /// GPG_ERR_CANCELED
    pub const CANCELED: u16 = 99;
    /// GPG_ERR_FULLY_CANCELED
    pub const FULLY_CANCELED: u16 = 198;

    /// Raw value as sent on the wire
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Error code without the source bits
    pub fn code(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Error source (4 is gpg-agent)
    pub fn source(self) -> u8 {
        ((self.0 >> 24) & 0x7F) as u8
    }

    pub fn is_no_secret_key(self) -> bool {
        self.code() == Self::NO_SECKEY
    }

    pub fn is_canceled(self) -> bool {
        matches!(self.code(), Self::CANCELED | Self::FULLY_CANCELED)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An `S` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub keyword: String,
    pub args: String,
}

/// An `INQUIRE` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inquiry {
    pub keyword: String,
    pub params: String,
}

/// One decoded response line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Ok(String),
    Err { code: ErrorCode, description: String },
    /// Already unescaped payload
    Data(Vec<u8>),
    Status(StatusLine),
    Inquire(Inquiry),
    Comment(String),
}

impl Line {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Line::Ok(_) | Line::Err { .. })
    }
}

/// How a command ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok(String),
    Err { code: ErrorCode, description: String },
}

/// A complete response to one command
#[derive(Debug, Clone)]
pub struct Response {
    /// Terminal outcome
    pub outcome: Outcome,

    /// Concatenated `D` payloads
    pub data: Bytes,

    /// `S` lines in arrival order
    pub status: Vec<StatusLine>,
}

impl Response {
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, Outcome::Ok(_))
    }

    /// Text following `OK`, if the command succeeded
    pub fn info(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Ok(info) => Some(info),
            Outcome::Err { .. } => None,
        }
    }

    /// The code of an `ERR` outcome
    pub fn error_code(&self) -> Option<ErrorCode> {
        match &self.outcome {
            Outcome::Ok(_) => None,
            Outcome::Err { code, .. } => Some(*code),
        }
    }

    /// Data as trimmed text, or the `OK` info when no data was sent
    pub fn text(&self) -> String {
        if self.data.is_empty() {
            self.info().unwrap_or_default().trim().to_string()
        } else {
            String::from_utf8_lossy(&self.data).trim().to_string()
        }
    }

    /// First status line with the given keyword
    pub fn status(&self, keyword: &str) -> Option<&StatusLine> {
        self.status.iter().find(|s| s.keyword == keyword)
    }

    /// Turn an `ERR` outcome into `AgentError::Agent`
    pub fn into_result(self) -> Result<Response> {
        match self.outcome {
            Outcome::Ok(_) => Ok(self),
            Outcome::Err { code, description } => Err(AgentError::Agent { code, description }),
        }
    }
}
