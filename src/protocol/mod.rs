//! Protocol Module
//!
//! Defines the Assuan line protocol spoken by gpg-agent.
//!
//! ## Wire Format
//!
//! Every message is one newline-terminated line of at most
//! [`MAX_LINE_LENGTH`] bytes (terminator included).
//!
//! ### Requests
//! ```text
//! VERB[ SP ARG]* LF        command, arguments percent-escaped
//! D SP PAYLOAD LF          inquiry data, percent-escaped
//! END LF                   end of inquiry data
//! CAN LF                   cancel an inquiry
//! ```
//!
//! ### Responses
//! ```text
//! OK[ SP TEXT] LF          terminal success
//! ERR SP CODE[ SP TEXT] LF terminal failure
//! D SP PAYLOAD LF          data, concatenated across lines
//! S SP KEYWORD[ SP ARGS] LF status annotation
//! INQUIRE SP KEYWORD[ SP PARAMS] LF  agent asks the client for data
//! # TEXT LF                comment, ignored
//! ```

mod command;
mod escape;
mod response;
mod codec;

pub use command::Command;
pub use escape::{escape_arg, escape_data, unescape};
pub use response::{ErrorCode, Inquiry, Line, Outcome, Response, StatusLine};
pub use codec::{
    decode_line, encode_cancel, encode_command, encode_data, encode_end, Progress,
    ResponseBuilder,
};

/// Maximum protocol line length, including the trailing LF
pub const MAX_LINE_LENGTH: usize = 1000;
