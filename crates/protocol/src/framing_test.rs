//! Tests for syslog priority framing

use super::{split_lines, FramerState, SyslogFramer};

/// Run a complete input through a fresh framer in one feed
fn frame_once(input: &[u8], strip: bool, validate: bool) -> Vec<Vec<u8>> {
    let mut framer = SyslogFramer::new(strip, validate);
    let mut messages = framer.feed(input);
    if let Some(last) = framer.finish() {
        messages.push(last);
    }
    messages
}

/// Run the same input through a framer in the given chunk sizes
fn frame_chunked(input: &[u8], chunk_size: usize, strip: bool, validate: bool) -> Vec<Vec<u8>> {
    let mut framer = SyslogFramer::new(strip, validate);
    let mut messages = Vec::new();
    for chunk in input.chunks(chunk_size) {
        messages.extend(framer.feed(chunk));
    }
    if let Some(last) = framer.finish() {
        messages.push(last);
    }
    messages
}

#[test]
fn test_two_messages_with_priority_kept() {
    let messages = frame_once(b"<34>host app: hello\n<35>host app: world\n", false, false);
    assert_eq!(
        messages,
        vec![
            b"<34>host app: hello\n".to_vec(),
            b"<35>host app: world\n".to_vec(),
        ]
    );
}

#[test]
fn test_two_messages_with_priority_stripped() {
    let messages = frame_once(b"<34>host app: hello\n<35>host app: world\n", true, false);
    assert_eq!(
        messages,
        vec![b"host app: hello\n".to_vec(), b"host app: world\n".to_vec()]
    );
}

#[test]
fn test_garbage_before_first_frame_is_discarded() {
    let messages = frame_once(b"noise noise<34>real message", true, false);
    assert_eq!(messages, vec![b"real message".to_vec()]);
}

#[test]
fn test_partial_frame_at_eof_is_a_message() {
    let mut framer = SyslogFramer::new(true, false);
    assert!(framer.feed(b"<34>unterminated body").is_empty());
    assert_eq!(framer.state(), FramerState::InMessage);
    assert_eq!(framer.finish(), Some(b"unterminated body".to_vec()));
}

#[test]
fn test_dangling_priority_yields_nothing() {
    let mut framer = SyslogFramer::new(true, false);
    assert!(framer.feed(b"<34").is_empty());
    assert_eq!(framer.state(), FramerState::InPriority);
    assert_eq!(framer.finish(), None);
}

#[test]
fn test_empty_input_yields_nothing() {
    assert!(frame_once(b"", true, false).is_empty());
    assert!(frame_once(b"no frames here at all", true, false).is_empty());
}

#[test]
fn test_chunk_boundary_invariance() {
    // Splitting the stream at arbitrary points (simulating slow delivery)
    // must not change the framed message sequence.
    let input: &[u8] = b"junk<34>alpha message one<35>beta message two<190>gamma three";
    for strip in [false, true] {
        let expected = frame_once(input, strip, false);
        assert_eq!(expected.len(), 3);
        for chunk_size in 1..=input.len() {
            assert_eq!(
                frame_chunked(input, chunk_size, strip, false),
                expected,
                "chunk_size {} changed framing (strip={})",
                chunk_size,
                strip
            );
        }
    }
}

#[test]
fn test_priority_spanning_chunk_boundary() {
    let mut framer = SyslogFramer::new(true, true);
    assert!(framer.feed(b"<1").is_empty());
    assert!(framer.feed(b"9").is_empty());
    assert!(framer.feed(b"0>payload").is_empty());
    assert_eq!(framer.finish(), Some(b"payload".to_vec()));
}

#[test]
fn test_malformed_priority_is_not_a_frame_boundary() {
    // `<x>` must not open a frame when validation is on; a well-formed
    // frame later in the same input must still be recovered.
    let messages = frame_once(b"<x>not a frame <34>real message", true, true);
    assert_eq!(messages, vec![b"real message".to_vec()]);
}

#[test]
fn test_malformed_priority_inside_message_body() {
    // A stray `<nope>` inside a message body ends the current message as a
    // candidate boundary, fails validation, and scanning recovers the next
    // genuine frame without emitting garbage.
    let messages = frame_once(b"<34>value is <nope> ok<35>next", true, true);
    assert_eq!(messages, vec![b"value is ".to_vec(), b"next".to_vec()]);
}

#[test]
fn test_empty_priority_is_malformed() {
    let messages = frame_once(b"<>garbage<34>kept", true, true);
    assert_eq!(messages, vec![b"kept".to_vec()]);
}

#[test]
fn test_signed_priority_is_malformed() {
    let messages = frame_once(b"<-1>garbage<34>kept", true, true);
    assert_eq!(messages, vec![b"kept".to_vec()]);
}

#[test]
fn test_no_validation_accepts_any_priority() {
    // The TCP path trusts `<...>` boundaries without inspecting the interior.
    let messages = frame_once(b"<x>body one<y>body two", true, false);
    assert_eq!(messages, vec![b"body one".to_vec(), b"body two".to_vec()]);
}

#[test]
fn test_finish_resets_for_reuse() {
    let mut framer = SyslogFramer::new(true, true);
    assert!(framer.feed(b"<34>first datagram").is_empty());
    assert_eq!(framer.finish(), Some(b"first datagram".to_vec()));

    // Same framer, next datagram: no state or bytes carry over.
    assert!(framer.feed(b"<35>second datagram").is_empty());
    assert_eq!(framer.finish(), Some(b"second datagram".to_vec()));
    assert_eq!(framer.finish(), None);
}

#[test]
fn test_split_lines_drops_empty_candidates() {
    let lines = split_lines(b"line one\nline two\n\nline three");
    assert_eq!(
        lines,
        vec![&b"line one"[..], &b"line two"[..], &b"line three"[..]]
    );
}

#[test]
fn test_split_lines_trims_each_line() {
    let lines = split_lines(b"  padded  \r\n\ttabbed\t\n   \n");
    assert_eq!(lines, vec![&b"padded"[..], &b"tabbed"[..]]);
}

#[test]
fn test_split_lines_empty_datagram() {
    assert!(split_lines(b"").is_empty());
    assert!(split_lines(b"\n\n\n").is_empty());
}
