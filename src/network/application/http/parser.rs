//! Resumable HTTP/1.1 response parser.
//!
//! The parser turns an arbitrarily-sliced byte stream into response events
//! without ever holding the whole response: the caller reads from the
//! transport into a work buffer, calls [`ResponseParser::parse`], and on
//! [`Progress::NeedMore`] shifts the unconsumed tail to the front of the
//! buffer, refills behind it and calls again. All parse state lives in the
//! parser between calls, so a multi-megabyte body can be processed with a
//! buffer the size of a single TLS read.

use crate::network::error::Error;

/// One recognized element of an HTTP response.
///
/// Slices borrow from the input passed to [`ResponseParser::parse`] and are
/// only valid for the duration of the sink call.
#[derive(Debug, PartialEq, Eq)]
pub enum Event<'a> {
    /// `HTTP/<major>.<minor>` from the status line.
    Version {
        /// Major version digit(s).
        major: u8,
        /// Minor version digit(s).
        minor: u8,
    },
    /// Three-digit status code.
    Status(u16),
    /// Reason phrase, excluding the trailing CRLF.
    Reason(&'a [u8]),
    /// One header line, split at the colon. An optional single space after
    /// the colon is not part of the value.
    Header {
        /// Header name as it appeared on the wire.
        name: &'a [u8],
        /// Header value, excluding the trailing CRLF.
        value: &'a [u8],
    },
    /// Total body size, fired once when the header section ends.
    BodySize(u32),
    /// A run of body bytes. `last` is true exactly once, on the delivery
    /// that exhausts the announced body size.
    Body {
        /// The bytes, in whatever chunking the input arrived.
        chunk: &'a [u8],
        /// Whether this delivery completes the body.
        last: bool,
    },
}

/// Outcome of one [`ResponseParser::parse`] call.
#[derive(Debug, PartialEq, Eq)]
pub enum Progress {
    /// The full response has been parsed.
    Complete,
    /// More input is required. The payload is the number of bytes consumed
    /// from this call's input: completed elements and delivered body bytes
    /// only, zero when nothing completed. The caller must retain the
    /// unconsumed tail and present it again, followed by fresh bytes.
    NeedMore(usize),
    /// The event sink asked to stop.
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Version,
    Status,
    Reason,
    Headers,
    Body,
    Done,
}

/// Incremental response parser; see the module docs for the resumption
/// protocol.
#[derive(Debug)]
pub struct ResponseParser {
    phase: Phase,
    /// None until the Content-Length header has been seen.
    content_remaining: Option<u32>,
}

impl ResponseParser {
    /// Creates a parser positioned before the status line.
    pub fn new() -> Self {
        Self {
            phase: Phase::Version,
            content_remaining: None,
        }
    }

    /// Consumes as much of `input` as possible, emitting one sink call per
    /// recognized element. The sink returns `true` to stop parsing.
    ///
    /// Malformed version or status digits, a header line without a colon,
    /// and a header section without `Content-Length` are unrecoverable
    /// [`Error::ProtocolError`]s; feeding more bytes cannot fix them.
    pub fn parse(
        &mut self,
        input: &[u8],
        sink: &mut impl FnMut(Event<'_>) -> bool,
    ) -> Result<Progress, Error> {
        let mut pos = 0;
        loop {
            let rest = &input[pos..];
            match self.phase {
                Phase::Version => {
                    const PREFIX: &[u8] = b"HTTP/";
                    // Reject a bad prefix as soon as the bytes disagree,
                    // without waiting for the terminating space.
                    let have = rest.len().min(PREFIX.len());
                    if rest[..have] != PREFIX[..have] {
                        return Err(Error::ProtocolError);
                    }
                    let Some(space) = find_byte(rest, b' ') else {
                        return Ok(Progress::NeedMore(pos));
                    };
                    let version = &rest[PREFIX.len()..space];
                    let Some(dot) = find_byte(version, b'.') else {
                        return Err(Error::ProtocolError);
                    };
                    let major = parse_u8(&version[..dot])?;
                    let minor = parse_u8(&version[dot + 1..])?;
                    pos += space + 1;
                    self.phase = Phase::Status;
                    if sink(Event::Version { major, minor }) {
                        return Ok(Progress::Interrupted);
                    }
                }
                Phase::Status => {
                    if rest.len() < 4 {
                        return Ok(Progress::NeedMore(pos));
                    }
                    if !rest[..3].iter().all(u8::is_ascii_digit) || rest[3] != b' ' {
                        return Err(Error::ProtocolError);
                    }
                    let code = rest[..3]
                        .iter()
                        .fold(0u16, |acc, &d| acc * 10 + u16::from(d - b'0'));
                    pos += 4;
                    self.phase = Phase::Reason;
                    if sink(Event::Status(code)) {
                        return Ok(Progress::Interrupted);
                    }
                }
                Phase::Reason => {
                    let Some(end) = find_crlf(rest) else {
                        return Ok(Progress::NeedMore(pos));
                    };
                    let reason = &rest[..end];
                    pos += end + 2;
                    self.phase = Phase::Headers;
                    if sink(Event::Reason(reason)) {
                        return Ok(Progress::Interrupted);
                    }
                }
                Phase::Headers => {
                    let Some(end) = find_crlf(rest) else {
                        return Ok(Progress::NeedMore(pos));
                    };
                    let line = &rest[..end];
                    pos += end + 2;
                    if line.is_empty() {
                        // End of headers; a response without Content-Length
                        // cannot be framed.
                        let Some(total) = self.content_remaining else {
                            return Err(Error::ProtocolError);
                        };
                        self.phase = if total == 0 { Phase::Done } else { Phase::Body };
                        if sink(Event::BodySize(total)) {
                            return Ok(Progress::Interrupted);
                        }
                        if total == 0 {
                            return Ok(Progress::Complete);
                        }
                    } else {
                        let Some(colon) = find_byte(line, b':') else {
                            return Err(Error::ProtocolError);
                        };
                        let name = &line[..colon];
                        let mut value = &line[colon + 1..];
                        if value.first() == Some(&b' ') {
                            value = &value[1..];
                        }
                        if name.eq_ignore_ascii_case(b"content-length") {
                            if self.content_remaining.is_some() {
                                return Err(Error::ProtocolError);
                            }
                            self.content_remaining = Some(parse_u32(value)?);
                        }
                        if sink(Event::Header { name, value }) {
                            return Ok(Progress::Interrupted);
                        }
                    }
                }
                Phase::Body => {
                    if rest.is_empty() {
                        return Ok(Progress::NeedMore(pos));
                    }
                    // content_remaining is always Some in this phase.
                    let remaining = self.content_remaining.unwrap_or(0) as usize;
                    let take = rest.len().min(remaining);
                    let last = take == remaining;
                    let chunk = &rest[..take];
                    pos += take;
                    self.content_remaining = Some((remaining - take) as u32);
                    if last {
                        self.phase = Phase::Done;
                    }
                    if sink(Event::Body { chunk, last }) {
                        return Ok(Progress::Interrupted);
                    }
                    if last {
                        return Ok(Progress::Complete);
                    }
                    return Ok(Progress::NeedMore(pos));
                }
                Phase::Done => return Ok(Progress::Complete),
            }
        }
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

fn find_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().position(|&b| b == needle)
}

fn find_crlf(haystack: &[u8]) -> Option<usize> {
    haystack.windows(2).position(|w| w == b"\r\n")
}

fn parse_u8(digits: &[u8]) -> Result<u8, Error> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(Error::ProtocolError);
    }
    digits.iter().try_fold(0u8, |acc, &d| {
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(d - b'0'))
            .ok_or(Error::ProtocolError)
    })
}

fn parse_u32(digits: &[u8]) -> Result<u32, Error> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(Error::ProtocolError);
    }
    digits.iter().try_fold(0u32, |acc, &d| {
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(u32::from(d - b'0')))
            .ok_or(Error::ProtocolError)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5\r\n\r\nhello";

    #[test]
    fn complete_response_in_one_call() {
        let mut parser = ResponseParser::new();
        let mut events = 0;
        let mut body: heapless::Vec<u8, 16> = heapless::Vec::new();
        let progress = parser
            .parse(RESPONSE, &mut |event| {
                match (events, event) {
                    (0, Event::Version { major: 1, minor: 1 }) => {}
                    (1, Event::Status(200)) => {}
                    (2, Event::Reason(b"OK")) => {}
                    (3, Event::Header { name, value }) => {
                        assert_eq!(name, b"Content-Type");
                        assert_eq!(value, b"text/plain");
                    }
                    (4, Event::Header { name, value }) => {
                        assert_eq!(name, b"Content-Length");
                        assert_eq!(value, b"5");
                    }
                    (5, Event::BodySize(5)) => {}
                    (6, Event::Body { chunk, last: true }) => {
                        body.extend_from_slice(chunk).unwrap();
                    }
                    (step, other) => panic!("unexpected event {other:?} at step {step}"),
                }
                events += 1;
                false
            })
            .unwrap();
        assert_eq!(progress, Progress::Complete);
        assert_eq!(events, 7);
        assert_eq!(&body[..], b"hello");
    }

    #[test]
    fn incomplete_status_line_consumes_nothing() {
        let mut parser = ResponseParser::new();
        let progress = parser.parse(b"HTTP/1.", &mut |_| false).unwrap();
        assert_eq!(progress, Progress::NeedMore(0));
    }

    #[test]
    fn resumes_after_partial_header_line() {
        let mut parser = ResponseParser::new();
        // Everything up to a half-delivered header line.
        let progress = parser
            .parse(b"HTTP/1.1 204 No Content\r\nContent-Le", &mut |_| false)
            .unwrap();
        // "HTTP/1.1 " + "204 " + reason line consumed, header tail not.
        assert_eq!(progress, Progress::NeedMore(25));
        let mut saw_size = false;
        let progress = parser
            .parse(b"Content-Length: 0\r\n\r\n", &mut |event| {
                if let Event::BodySize(n) = event {
                    assert_eq!(n, 0);
                    saw_size = true;
                }
                false
            })
            .unwrap();
        assert_eq!(progress, Progress::Complete);
        assert!(saw_size);
    }

    #[test]
    fn zero_content_length_completes_without_body_event() {
        let mut parser = ResponseParser::new();
        let mut body_events = 0;
        let progress = parser
            .parse(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n", &mut |event| {
                if matches!(event, Event::Body { .. }) {
                    body_events += 1;
                }
                false
            })
            .unwrap();
        assert_eq!(progress, Progress::Complete);
        assert_eq!(body_events, 0);
    }

    #[test]
    fn missing_content_length_is_a_parse_error() {
        let mut parser = ResponseParser::new();
        assert_eq!(
            parser.parse(b"HTTP/1.1 200 OK\r\n\r\n", &mut |_| false),
            Err(Error::ProtocolError)
        );
    }

    #[test]
    fn duplicate_content_length_is_a_parse_error() {
        let mut parser = ResponseParser::new();
        assert_eq!(
            parser.parse(
                b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nContent-Length: 2\r\n\r\nok",
                &mut |_| false
            ),
            Err(Error::ProtocolError)
        );
    }

    #[test]
    fn malformed_version_is_a_parse_error() {
        let mut parser = ResponseParser::new();
        assert_eq!(
            parser.parse(b"HTPP/1.1 200 OK\r\n", &mut |_| false),
            Err(Error::ProtocolError)
        );
    }

    #[test]
    fn malformed_status_digits_are_a_parse_error() {
        let mut parser = ResponseParser::new();
        assert_eq!(
            parser.parse(b"HTTP/1.1 20x OK\r\n", &mut |_| false),
            Err(Error::ProtocolError)
        );
    }

    #[test]
    fn content_length_is_matched_case_insensitively() {
        let mut parser = ResponseParser::new();
        let mut size = None;
        let progress = parser
            .parse(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\n\r\nok", &mut |event| {
                if let Event::BodySize(n) = event {
                    size = Some(n);
                }
                false
            })
            .unwrap();
        assert_eq!(progress, Progress::Complete);
        assert_eq!(size, Some(2));
    }

    #[test]
    fn sink_stop_interrupts_parsing() {
        let mut parser = ResponseParser::new();
        let progress = parser
            .parse(RESPONSE, &mut |event| matches!(event, Event::Status(_)))
            .unwrap();
        assert_eq!(progress, Progress::Interrupted);
    }

    #[test]
    fn body_split_across_calls_flags_last_once() {
        let mut parser = ResponseParser::new();
        let head = b"HTTP/1.1 200 OK\r\nContent-Length: 6\r\n\r\nfoo";
        let progress = parser
            .parse(head, &mut |event| {
                if let Event::Body { chunk, last } = event {
                    assert_eq!(chunk, b"foo");
                    assert!(!last);
                }
                false
            })
            .unwrap();
        assert_eq!(progress, Progress::NeedMore(head.len()));
        let progress = parser
            .parse(b"bar", &mut |event| {
                if let Event::Body { chunk, last } = event {
                    assert_eq!(chunk, b"bar");
                    assert!(last);
                }
                false
            })
            .unwrap();
        assert_eq!(progress, Progress::Complete);
    }
}
