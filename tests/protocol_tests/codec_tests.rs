//! Codec Tests
//!
//! Tests for command encoding, line decoding and response assembly.

use gpgagent::protocol::{
    decode_line, encode_cancel, encode_command, encode_data, encode_end, Command, ErrorCode,
    Inquiry, Line, Outcome, Progress, ResponseBuilder, StatusLine, MAX_LINE_LENGTH,
};
use gpgagent::AgentError;

// =============================================================================
// Command Encoding Tests
// =============================================================================

#[test]
fn test_encode_getinfo() {
    let encoded = encode_command(&Command::getinfo("version")).unwrap();
    assert_eq!(encoded, b"GETINFO version\n");
}

#[test]
fn test_encode_uses_supplied_arguments() {
    let encoded = encode_command(&Command::havekey("aabbccddeeff11223344556677889900")).unwrap();
    assert_eq!(encoded, b"HAVEKEY aabbccddeeff11223344556677889900\n");

    let encoded = encode_command(&Command::setkey("0123")).unwrap();
    assert_eq!(encoded, b"SETKEY 0123\n");
}

#[test]
fn test_encode_no_arguments() {
    assert_eq!(encode_command(&Command::pkdecrypt()).unwrap(), b"PKDECRYPT\n");
    assert_eq!(encode_command(&Command::bye()).unwrap(), b"BYE\n");
}

#[test]
fn test_encode_escapes_space_and_percent() {
    let cmd = Command::option("ttyname", "/dev/pts 1%");
    let encoded = encode_command(&cmd).unwrap();
    assert_eq!(encoded, b"OPTION ttyname=/dev/pts%201%25\n");
}

#[test]
fn test_encode_escapes_control_and_non_ascii() {
    let cmd = Command::new("GETINFO").arg("a\tb").arg("é");
    let encoded = encode_command(&cmd).unwrap();
    assert_eq!(encoded, b"GETINFO a%09b %C3%A9\n");
}

#[test]
fn test_encode_multiple_arguments() {
    let cmd = Command::new("KEYINFO").arg("--list").arg("ABC");
    assert_eq!(encode_command(&cmd).unwrap(), b"KEYINFO --list ABC\n");
}

#[test]
fn test_encode_rejects_line_terminator() {
    for bad in ["abc\ndef", "abc\r", "\n"] {
        let result = encode_command(&Command::havekey(bad));
        assert!(
            matches!(result, Err(AgentError::InvalidArgument(_))),
            "{:?} should be rejected",
            bad
        );
    }
}

#[test]
fn test_encode_rejects_empty_argument() {
    let result = encode_command(&Command::havekey(""));
    assert!(matches!(result, Err(AgentError::InvalidArgument(_))));
}

#[test]
fn test_encode_rejects_bad_verb() {
    for verb in ["", "GET INFO", "GETINFO\n", "HAVE%KEY"] {
        let result = encode_command(&Command::new(verb));
        assert!(matches!(result, Err(AgentError::InvalidArgument(_))), "{:?}", verb);
    }
}

#[test]
fn test_encode_rejects_oversized_line() {
    let result = encode_command(&Command::havekey("a".repeat(MAX_LINE_LENGTH)));
    assert!(matches!(result, Err(AgentError::InvalidArgument(_))));

    // Escaping triples the size
    let result = encode_command(&Command::havekey(" ".repeat(400)));
    assert!(matches!(result, Err(AgentError::InvalidArgument(_))));
}

#[test]
fn test_command_display_hides_arguments() {
    let shown = Command::havekey("secretgrip").to_string();
    assert_eq!(shown, "HAVEKEY (1 args)");
}

// =============================================================================
// Data Line Encoding Tests
// =============================================================================

#[test]
fn test_encode_data_empty() {
    assert!(encode_data(b"").is_empty());
}

#[test]
fn test_encode_data_escapes_reserved() {
    let lines = encode_data(b"a b%\r\n");
    assert_eq!(lines, vec![b"D a b%25%0D%0A\n".to_vec()]);
}

#[test]
fn test_encode_data_splits_within_line_limit() {
    let payload: Vec<u8> = (0..5000u32).map(|i| (i % 256) as u8).collect();
    let lines = encode_data(&payload);

    assert!(lines.len() > 1);

    let mut reassembled = Vec::new();
    for line in &lines {
        assert!(line.len() <= MAX_LINE_LENGTH, "line of {} bytes", line.len());
        assert_eq!(line.last(), Some(&b'\n'));
        match decode_line(&line[..line.len() - 1]).unwrap() {
            Line::Data(chunk) => reassembled.extend(chunk),
            other => panic!("Expected data line, got {:?}", other),
        }
    }
    assert_eq!(reassembled, payload);
}

#[test]
fn test_encode_data_all_escaped_stays_within_limit() {
    let payload = vec![b'%'; 2000];
    for line in encode_data(&payload) {
        assert!(line.len() <= MAX_LINE_LENGTH);
        // Never split an escape sequence across lines
        assert_eq!((line.len() - 3) % 3, 0);
    }
}

#[test]
fn test_inquiry_terminators() {
    assert_eq!(encode_end(), b"END\n");
    assert_eq!(encode_cancel(), b"CAN\n");
}

// =============================================================================
// Line Decoding Tests
// =============================================================================

#[test]
fn test_decode_ok() {
    assert_eq!(decode_line(b"OK").unwrap(), Line::Ok(String::new()));
    assert_eq!(
        decode_line(b"OK Pleased to meet you").unwrap(),
        Line::Ok("Pleased to meet you".to_string())
    );
}

#[test]
fn test_decode_err_preserves_code_and_text() {
    let line = decode_line(b"ERR 67108881 No secret key <GPG Agent>").unwrap();
    assert_eq!(
        line,
        Line::Err {
            code: ErrorCode(67108881),
            description: "No secret key <GPG Agent>".to_string(),
        }
    );
}

#[test]
fn test_decode_err_without_text() {
    let line = decode_line(b"ERR 17").unwrap();
    assert_eq!(
        line,
        Line::Err {
            code: ErrorCode(17),
            description: String::new(),
        }
    );
}

#[test]
fn test_decode_err_with_bad_code() {
    for raw in [&b"ERR"[..], b"ERR abc text", b"ERR -1 text", b"ERR  17"] {
        let result = decode_line(raw);
        assert!(matches!(result, Err(AgentError::ProtocolViolation(_))), "{:?}", raw);
    }
}

#[test]
fn test_decode_data_unescapes() {
    let line = decode_line(b"D a%25b%0Ac").unwrap();
    assert_eq!(line, Line::Data(b"a%b\nc".to_vec()));
}

#[test]
fn test_decode_data_empty_payload() {
    assert_eq!(decode_line(b"D").unwrap(), Line::Data(Vec::new()));
    assert_eq!(decode_line(b"D ").unwrap(), Line::Data(Vec::new()));
}

#[test]
fn test_decode_data_bad_escape() {
    let result = decode_line(b"D abc%4");
    assert!(matches!(result, Err(AgentError::ProtocolViolation(_))));
}

#[test]
fn test_decode_status() {
    let line = decode_line(b"S PROGRESS need_entropy X 30 120").unwrap();
    assert_eq!(
        line,
        Line::Status(StatusLine {
            keyword: "PROGRESS".to_string(),
            args: "need_entropy X 30 120".to_string(),
        })
    );

    let line = decode_line(b"S PADDING").unwrap();
    assert_eq!(
        line,
        Line::Status(StatusLine {
            keyword: "PADDING".to_string(),
            args: String::new(),
        })
    );
}

#[test]
fn test_decode_inquire() {
    let line = decode_line(b"INQUIRE CIPHERTEXT").unwrap();
    assert_eq!(
        line,
        Line::Inquire(Inquiry {
            keyword: "CIPHERTEXT".to_string(),
            params: String::new(),
        })
    );

    let line = decode_line(b"INQUIRE PINENTRY_LAUNCHED 1234 gtk2").unwrap();
    assert_eq!(
        line,
        Line::Inquire(Inquiry {
            keyword: "PINENTRY_LAUNCHED".to_string(),
            params: "1234 gtk2".to_string(),
        })
    );
}

#[test]
fn test_decode_missing_keyword() {
    assert!(matches!(decode_line(b"S"), Err(AgentError::ProtocolViolation(_))));
    assert!(matches!(decode_line(b"INQUIRE"), Err(AgentError::ProtocolViolation(_))));
}

#[test]
fn test_decode_comment() {
    assert_eq!(
        decode_line(b"# debug output").unwrap(),
        Line::Comment("debug output".to_string())
    );
}

#[test]
fn test_decode_unknown_prefix() {
    for raw in [&b"HELLO"[..], b"OKAY", b"ok", b"", b" OK", b"Data"] {
        let result = decode_line(raw);
        assert!(matches!(result, Err(AgentError::ProtocolViolation(_))), "{:?}", raw);
    }
}

#[test]
fn test_terminal_lines() {
    assert!(decode_line(b"OK").unwrap().is_terminal());
    assert!(decode_line(b"ERR 1 x").unwrap().is_terminal());
    assert!(!decode_line(b"D x").unwrap().is_terminal());
    assert!(!decode_line(b"S X").unwrap().is_terminal());
    assert!(!decode_line(b"INQUIRE X").unwrap().is_terminal());
}

// =============================================================================
// Response Assembly Tests
// =============================================================================

fn feed(builder: &mut ResponseBuilder, raw: &[u8]) -> Progress {
    builder.push(decode_line(raw).unwrap())
}

#[test]
fn test_builder_concatenates_data_without_separator() {
    let mut builder = ResponseBuilder::new();
    assert!(matches!(feed(&mut builder, b"D abc"), Progress::Pending));
    assert!(matches!(feed(&mut builder, b"D def"), Progress::Pending));
    assert_eq!(builder.data_len(), 6);

    match feed(&mut builder, b"OK") {
        Progress::Complete(response) => {
            assert!(response.is_ok());
            assert_eq!(&response.data[..], b"abcdef");
            assert_eq!(response.text(), "abcdef");
        }
        other => panic!("Expected complete response, got {:?}", other),
    }
}

#[test]
fn test_builder_keeps_status_order() {
    let mut builder = ResponseBuilder::new();
    feed(&mut builder, b"S FIRST 1");
    feed(&mut builder, b"# ignored");
    feed(&mut builder, b"S SECOND 2");
    feed(&mut builder, b"S FIRST 3");

    match feed(&mut builder, b"OK done") {
        Progress::Complete(response) => {
            let keywords: Vec<_> = response.status.iter().map(|s| s.keyword.as_str()).collect();
            assert_eq!(keywords, vec!["FIRST", "SECOND", "FIRST"]);
            assert_eq!(response.status("FIRST").unwrap().args, "1");
            assert_eq!(response.info(), Some("done"));
            assert!(response.data.is_empty());
        }
        other => panic!("Expected complete response, got {:?}", other),
    }
}

#[test]
fn test_builder_surfaces_inquiry() {
    let mut builder = ResponseBuilder::new();
    match feed(&mut builder, b"INQUIRE CIPHERTEXT") {
        Progress::Inquire(inquiry) => assert_eq!(inquiry.keyword, "CIPHERTEXT"),
        other => panic!("Expected inquiry, got {:?}", other),
    }
}

#[test]
fn test_builder_err_outcome() {
    let mut builder = ResponseBuilder::new();
    feed(&mut builder, b"S PROGRESS x");

    let response = match feed(&mut builder, b"ERR 67108963 Operation cancelled") {
        Progress::Complete(response) => response,
        other => panic!("Expected complete response, got {:?}", other),
    };

    assert!(!response.is_ok());
    assert_eq!(response.info(), None);
    assert_eq!(response.error_code(), Some(ErrorCode(67108963)));
    assert_eq!(
        response.outcome,
        Outcome::Err {
            code: ErrorCode(67108963),
            description: "Operation cancelled".to_string(),
        }
    );

    match response.into_result() {
        Err(AgentError::Agent { code, description }) => {
            assert_eq!(code.raw(), 67108963);
            assert_eq!(description, "Operation cancelled");
        }
        other => panic!("Expected agent error, got {:?}", other),
    }
}

#[test]
fn test_builder_reusable_after_complete() {
    let mut builder = ResponseBuilder::new();
    feed(&mut builder, b"D first");
    feed(&mut builder, b"OK");

    feed(&mut builder, b"D second");
    match feed(&mut builder, b"OK") {
        Progress::Complete(response) => assert_eq!(&response.data[..], b"second"),
        other => panic!("Expected complete response, got {:?}", other),
    }
}

#[test]
fn test_response_text_falls_back_to_info() {
    let mut builder = ResponseBuilder::new();
    match feed(&mut builder, b"OK 2.4.0 ") {
        Progress::Complete(response) => assert_eq!(response.text(), "2.4.0"),
        other => panic!("Expected complete response, got {:?}", other),
    }
}

// =============================================================================
// Error Code Tests
// =============================================================================

#[test]
fn test_error_code_parts() {
    let code = ErrorCode(67108881);
    assert_eq!(code.code(), ErrorCode::NO_SECKEY);
    assert_eq!(code.source(), 4);
    assert!(code.is_no_secret_key());
    assert!(!code.is_canceled());
    assert_eq!(code.to_string(), "67108881");
}

#[test]
fn test_error_code_canceled() {
    // Pinentry source
    assert!(ErrorCode(83886179).is_canceled());
    assert_eq!(ErrorCode(83886179).source(), 5);
    assert!(ErrorCode(67108864 + 198).is_canceled());
    assert!(!ErrorCode(67108864 + 69).is_canceled());
}
