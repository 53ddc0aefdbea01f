//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol. Pure: no I/O.
//!
//! ## Line Classification
//! ```text
//! ┌───────────┬──────────────────────────────┬───────────────┐
//! │ First tok │ Meaning                      │ Terminal?     │
//! ├───────────┼──────────────────────────────┼───────────────┤
//! │ OK        │ success, optional info       │ yes           │
//! │ ERR       │ failure, numeric code + text │ yes           │
//! │ D         │ data chunk (escaped)         │ no            │
//! │ S         │ status keyword + args        │ no            │
//! │ INQUIRE   │ agent needs client data      │ no            │
//! │ #...      │ comment                      │ no (ignored)  │
//! └───────────┴──────────────────────────────┴───────────────┘
//! ```

use bytes::BytesMut;

use super::escape::{escape_arg, push_data_byte, unescape};
use super::{Command, ErrorCode, Inquiry, Line, Outcome, Response, StatusLine, MAX_LINE_LENGTH};
use crate::error::{AgentError, Result};

/// Room for payload in a `D` line: "D " prefix and LF take three bytes
const MAX_DATA_PAYLOAD: usize = MAX_LINE_LENGTH - 3;

// =============================================================================
// Request Encoding
// =============================================================================

/// Encode a command to one wire line, terminator included
///
/// Format: VERB[ SP ARG]* LF
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    let verb = command.verb();
    if verb.is_empty() || !verb.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
        return Err(AgentError::InvalidArgument(format!("invalid verb {:?}", verb)));
    }

    let mut line = Vec::with_capacity(verb.len() + 1);
    line.extend_from_slice(verb.as_bytes());

    for (index, arg) in command.args().iter().enumerate() {
        if arg.is_empty() {
            return Err(AgentError::InvalidArgument(format!(
                "{}: argument {} is empty",
                verb, index
            )));
        }
        if arg.bytes().any(|b| b == b'\n' || b == b'\r') {
            return Err(AgentError::InvalidArgument(format!(
                "{}: argument {} contains a line terminator",
                verb, index
            )));
        }
        line.push(b' ');
        line.extend_from_slice(&escape_arg(arg.as_bytes()));
    }

    line.push(b'\n');

    if line.len() > MAX_LINE_LENGTH {
        return Err(AgentError::InvalidArgument(format!(
            "{}: encoded line is {} bytes (max {})",
            verb,
            line.len(),
            MAX_LINE_LENGTH
        )));
    }

    Ok(line)
}

/// Encode a payload as `D` lines, each within the line limit
///
/// An empty payload produces no lines.
pub fn encode_data(data: &[u8]) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    let mut current = Vec::with_capacity(MAX_LINE_LENGTH);

    for &byte in data {
        if current.len() + 3 > MAX_DATA_PAYLOAD {
            lines.push(finish_data_line(&current));
            current.clear();
        }
        push_data_byte(&mut current, byte);
    }

    if !current.is_empty() {
        lines.push(finish_data_line(&current));
    }

    lines
}

fn finish_data_line(payload: &[u8]) -> Vec<u8> {
    let mut line = Vec::with_capacity(payload.len() + 3);
    line.extend_from_slice(b"D ");
    line.extend_from_slice(payload);
    line.push(b'\n');
    line
}

/// Terminates inquiry data
pub fn encode_end() -> Vec<u8> {
    b"END\n".to_vec()
}

/// Cancels an inquiry
pub fn encode_cancel() -> Vec<u8> {
    b"CAN\n".to_vec()
}

// =============================================================================
// Response Decoding
// =============================================================================

/// Split at the first space: (token, rest)
fn split_token(bytes: &[u8]) -> (&[u8], &[u8]) {
    match bytes.iter().position(|&b| b == b' ') {
        Some(pos) => (&bytes[..pos], &bytes[pos + 1..]),
        None => (bytes, &[]),
    }
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decode one line (without its terminator)
pub fn decode_line(raw: &[u8]) -> Result<Line> {
    if raw.is_empty() {
        return Err(AgentError::ProtocolViolation("empty line".to_string()));
    }
    if raw[0] == b'#' {
        return Ok(Line::Comment(text(&raw[1..]).trim_start().to_string()));
    }

    let (token, rest) = split_token(raw);

    match token {
        b"OK" => Ok(Line::Ok(text(rest))),
        b"ERR" => decode_err(rest),
        b"D" => Ok(Line::Data(unescape(rest)?)),
        b"S" => {
            let (keyword, args) = split_token(rest);
            if keyword.is_empty() {
                return Err(AgentError::ProtocolViolation(
                    "status line without keyword".to_string(),
                ));
            }
            Ok(Line::Status(StatusLine {
                keyword: text(keyword),
                args: text(args),
            }))
        }
        b"INQUIRE" => {
            let (keyword, params) = split_token(rest);
            if keyword.is_empty() {
                return Err(AgentError::ProtocolViolation(
                    "inquiry without keyword".to_string(),
                ));
            }
            Ok(Line::Inquire(Inquiry {
                keyword: text(keyword),
                params: text(params),
            }))
        }
        _ => Err(AgentError::ProtocolViolation(format!(
            "unexpected line {:?}",
            text(&raw[..raw.len().min(64)])
        ))),
    }
}

/// Decode the part of an `ERR` line after the verb
fn decode_err(rest: &[u8]) -> Result<Line> {
    let (code, description) = split_token(rest);
    let code = std::str::from_utf8(code)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| {
            AgentError::ProtocolViolation(format!("ERR line with invalid code {:?}", text(code)))
        })?;

    Ok(Line::Err {
        code: ErrorCode(code),
        description: text(description),
    })
}

// =============================================================================
// Response Assembly
// =============================================================================

/// What the caller should do after feeding a line
#[derive(Debug)]
pub enum Progress {
    /// Keep reading
    Pending,

    /// The agent wants data; answer with `D`/`END` or `CAN`
    Inquire(Inquiry),

    /// A terminal line arrived
    Complete(Response),
}

/// Accumulates the lines of one in-flight command
#[derive(Debug, Default)]
pub struct ResponseBuilder {
    data: BytesMut,
    status: Vec<StatusLine>,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one decoded line
    pub fn push(&mut self, line: Line) -> Progress {
        match line {
            Line::Data(chunk) => {
                self.data.extend_from_slice(&chunk);
                Progress::Pending
            }
            Line::Status(status) => {
                self.status.push(status);
                Progress::Pending
            }
            Line::Comment(_) => Progress::Pending,
            Line::Inquire(inquiry) => Progress::Inquire(inquiry),
            Line::Ok(info) => Progress::Complete(self.finish(Outcome::Ok(info))),
            Line::Err { code, description } => {
                Progress::Complete(self.finish(Outcome::Err { code, description }))
            }
        }
    }

    /// Bytes of data accumulated so far
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    fn finish(&mut self, outcome: Outcome) -> Response {
        Response {
            outcome,
            data: std::mem::take(&mut self.data).freeze(),
            status: std::mem::take(&mut self.status),
        }
    }
}
