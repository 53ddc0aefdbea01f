//! Percent escaping
//!
//! Reserved bytes travel as `%XX` with uppercase hex digits.

use crate::error::{AgentError, Result};

const HEX: &[u8; 16] = b"0123456789ABCDEF";

fn push_escaped(out: &mut Vec<u8>, byte: u8) {
    out.push(b'%');
    out.push(HEX[(byte >> 4) as usize]);
    out.push(HEX[(byte & 0x0F) as usize]);
}

/// Escape a command argument
///
/// Everything outside printable ASCII, plus space and `%`, is escaped so
/// the argument stays a single token.
pub fn escape_arg(arg: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(arg.len());
    for &byte in arg {
        match byte {
            b' ' | b'%' => push_escaped(&mut out, byte),
            0x21..=0x7E => out.push(byte),
            _ => push_escaped(&mut out, byte),
        }
    }
    out
}

/// Escape a `D` line payload
///
/// Only `%`, CR and LF are reserved inside data lines.
pub fn escape_data(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for &byte in data {
        push_data_byte(&mut out, byte);
    }
    out
}

/// Append one data byte, escaped if reserved
pub(crate) fn push_data_byte(out: &mut Vec<u8>, byte: u8) {
    match byte {
        b'%' | b'\r' | b'\n' => push_escaped(out, byte),
        _ => out.push(byte),
    }
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

/// Reverse either escaping; accepts lowercase hex as well
pub fn unescape(input: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        if input[i] != b'%' {
            out.push(input[i]);
            i += 1;
            continue;
        }

        let pair = input.get(i + 1..i + 3).ok_or_else(|| {
            AgentError::ProtocolViolation(format!("truncated escape at offset {}", i))
        })?;
        match (hex_value(pair[0]), hex_value(pair[1])) {
            (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
            _ => {
                return Err(AgentError::ProtocolViolation(format!(
                    "invalid escape %{}{} at offset {}",
                    pair[0] as char, pair[1] as char, i
                )))
            }
        }
        i += 3;
    }

    Ok(out)
}
