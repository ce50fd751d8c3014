use super::*;
use std::io::Cursor;

fn block_of(input: &str) -> Result<Vec<String>, GtpError> {
    read_block(&mut Cursor::new(input.as_bytes()))
}

#[test]
fn success_block_single_line() {
    let block = block_of("= A1\n\n").unwrap();
    assert_eq!(parse_block(&block, "genmove b").unwrap(), "A1");
}

#[test]
fn success_block_empty_payload() {
    let block = block_of("=\n\n").unwrap();
    assert_eq!(parse_block(&block, "clear_board").unwrap(), "");
}

#[test]
fn success_block_with_continuation_lines() {
    let block = block_of("= first\nsecond line\n\n").unwrap();
    assert_eq!(
        parse_block(&block, "showboard").unwrap(),
        "first\nsecond line"
    );
}

#[test]
fn carriage_returns_are_stripped() {
    let block = block_of("= C3\r\n\r\n").unwrap();
    assert_eq!(parse_block(&block, "genmove w").unwrap(), "C3");
}

#[test]
fn failure_block_carries_command_and_payload() {
    let block = block_of("? unknown command\n\n").unwrap();
    match parse_block(&block, "frobnicate") {
        Err(GtpError::CommandRejected { command, response }) => {
            assert_eq!(command, "frobnicate");
            assert_eq!(response, "? unknown command");
        }
        other => panic!("expected CommandRejected, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn block_without_marker_is_malformed() {
    let block = block_of("gibberish\n\n").unwrap();
    assert!(matches!(
        parse_block(&block, "boardsize 10"),
        Err(GtpError::MalformedResponse { .. })
    ));
}

#[test]
fn eof_mid_block_is_an_error() {
    assert!(matches!(block_of("= A1\n"), Err(GtpError::Eof)));
    assert!(matches!(block_of(""), Err(GtpError::Eof)));
}
