//! HTTP orchestration for the tracking backend.
//!
//! [`HttpClient`] drives the three wire operations the backend offers:
//! the signed token request, the streamed telemetry send, and an ad-hoc
//! GET for out-of-band diagnostics. Every operation follows the same
//! shape: connect, stage the request through a [`ChunkedWriter`], flush,
//! then pump transport reads through the [`ResponseParser`] until the
//! exchange resolves. The connection is closed before the operation
//! returns, on every path.

use core::fmt::Write as _;
use heapless::String;

use crate::auth::{self, NonceSource, SignParams};
use crate::buffer::ByteBuffer;
use crate::client::Session;
use crate::network::error::Error;
use crate::network::{Close, Connect, Connection, Read, Write};

use super::parser::{Event, Progress, ResponseParser};
use super::token::TokenScanner;
use super::writer::ChunkedWriter;

/// TLS port used for all backend calls.
const HTTPS_PORT: u16 = 443;
/// Telemetry endpoint.
const SEND_PATH: &str = "/v2";
/// Telemetry endpoint variant that skips the response payload.
const SEND_PATH_ASYNC: &str = "/v2?async=true";

/// Staging area for outgoing request bytes.
const STAGING_SIZE: usize = 512;
/// Work buffer for transport reads; bounds the largest single response
/// element (status line or one header line) the client can digest.
const RECV_SIZE: usize = 512;
/// Destination for the signed `Authorization` header value.
const OAUTH_HEADER_SIZE: usize = 512;

/// Serialization of the telemetry payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Payload {
    /// `application/json`.
    #[default]
    Json,
    /// `application/x-protobuf`.
    Protobuf,
}

impl Payload {
    fn content_type(self) -> &'static str {
        match self {
            Payload::Json => "application/json",
            Payload::Protobuf => "application/x-protobuf",
        }
    }
}

/// Options for one telemetry send.
#[derive(Debug, Clone, Copy, Default)]
pub struct SendOptions {
    /// Content type of the request body.
    pub payload: Payload,
    /// When true the backend only acknowledges with a status and the
    /// response carries no payload.
    pub async_response: bool,
}

/// One request header for [`HttpClient::get`].
#[derive(Debug, Clone, Copy)]
pub struct Header<'a> {
    /// Header name.
    pub name: &'a str,
    /// Header value.
    pub value: &'a str,
}

/// Pull source for a streamed request body.
///
/// The client keeps asking for chunks until `Ok(None)`, writing each one
/// as an HTTP chunk. Returned slices only need to live until the next
/// call.
pub trait ChunkSource {
    /// The next run of body bytes, or `None` when the body is complete.
    fn next_chunk(&mut self) -> Result<Option<&[u8]>, Error>;
}

/// Receiver for a streamed response.
///
/// Per operation the handler sees exactly one `on_size`, zero or more
/// `on_data` calls, and exactly one `on_complete` carrying the mapped
/// outcome. Returning `true` from `on_size`/`on_data` stops the exchange
/// early; an early stop is treated as success.
pub trait RecvHandler {
    /// Total body size announced by the response.
    fn on_size(&mut self, size: u32) -> bool;
    /// A run of body bytes, in arrival order.
    fn on_data(&mut self, data: &[u8]) -> bool;
    /// Terminal outcome of the exchange. Always called exactly once.
    fn on_complete(&mut self, outcome: Result<(), Error>);
}

/// Protocol client over a connector.
///
/// Holds no per-request state; each operation opens a fresh connection
/// and closes it before returning.
#[derive(Debug)]
pub struct HttpClient<N: Connect> {
    connector: N,
}

impl<N: Connect> HttpClient<N> {
    /// Wraps a transport connector.
    pub fn new(connector: N) -> Self {
        Self { connector }
    }

    /// Requests a fresh access token with a signed `POST /v2/token`.
    ///
    /// On success the session holds the new token and its absolute expiry.
    /// A 401 carrying an `x-here-timestamp` header recomputes the session's
    /// clock skew and reports [`Error::TimeMismatch`] so the caller can
    /// retry once with corrected time. Any failure leaves the session
    /// without a token.
    pub fn token(
        &mut self,
        session: &mut Session<'_>,
        nonce: &mut NonceSource,
        now: u32,
    ) -> Result<(), Error> {
        let mut conn = self.connect(session.base_url.as_str(), HTTPS_PORT)?;
        let result = token_exchange(&mut conn, session, nonce, now);
        let _ = conn.close();
        result
    }

    /// Streams a telemetry body to the backend and the response back to
    /// `handler`.
    ///
    /// Requires a token in the session. Updates the session on protocol
    /// outcomes: 401/403 clear the token, a 429 with `Retry-After` records
    /// the throttle deadline.
    pub fn send<S: ChunkSource, H: RecvHandler>(
        &mut self,
        session: &mut Session<'_>,
        source: &mut S,
        handler: &mut H,
        options: &SendOptions,
        now: u32,
    ) -> Result<(), Error> {
        let result = self.send_inner(session, source, handler, options, now);
        handler.on_complete(result);
        result
    }

    fn send_inner<S: ChunkSource, H: RecvHandler>(
        &mut self,
        session: &mut Session<'_>,
        source: &mut S,
        handler: &mut H,
        options: &SendOptions,
        now: u32,
    ) -> Result<(), Error> {
        if session.access_token.is_empty() {
            return Err(Error::Unauthorized);
        }
        let mut conn = self.connect(session.base_url.as_str(), HTTPS_PORT)?;
        let result = send_exchange(&mut conn, session, source, handler, options, now);
        let _ = conn.close();
        result
    }

    /// Performs an ad-hoc GET against an arbitrary host and port.
    ///
    /// A caller-supplied `Authorization` header value is prefixed with
    /// `"Bearer "` unless it already carries that prefix.
    pub fn get<H: RecvHandler>(
        &mut self,
        host: &str,
        path: &str,
        port: u16,
        headers: &[Header<'_>],
        handler: &mut H,
    ) -> Result<(), Error> {
        let result = self.get_inner(host, path, port, headers, handler);
        handler.on_complete(result);
        result
    }

    fn get_inner<H: RecvHandler>(
        &mut self,
        host: &str,
        path: &str,
        port: u16,
        headers: &[Header<'_>],
        handler: &mut H,
    ) -> Result<(), Error> {
        if host.is_empty() || path.is_empty() {
            return Err(Error::InvalidInput);
        }
        let mut conn = self.connect(host, port)?;
        let result = get_exchange(&mut conn, host, path, headers, handler);
        let _ = conn.close();
        result
    }

    fn connect(&mut self, host: &str, port: u16) -> Result<N::Connection, Error> {
        let mut remote: String<96> = String::new();
        write!(remote, "{host}:{port}").map_err(|_| Error::InvalidInput)?;
        self.connector
            .connect(remote.as_str())
            .map_err(|_| Error::ConnectionRefused)
    }
}

fn token_exchange<C: Connection>(
    conn: &mut C,
    session: &mut Session<'_>,
    nonce: &mut NonceSource,
    now: u32,
) -> Result<(), Error> {
    let nonce_digits = nonce.next(now);
    let mut header_storage = [0u8; OAUTH_HEADER_SIZE];
    let mut oauth = ByteBuffer::new(&mut header_storage);
    auth::write_header(
        &SignParams {
            device_id: session.device_id,
            device_secret: session.device_secret,
            base_url: session.base_url.as_str(),
            nonce: nonce_digits.as_str(),
            timestamp: now.saturating_add_signed(session.skew),
        },
        &mut oauth,
    )?;

    let mut staging_storage = [0u8; STAGING_SIZE];
    let mut staging = ByteBuffer::new(&mut staging_storage);
    {
        let mut w = ChunkedWriter::new(&mut staging, conn);
        w.write_str("POST ")?;
        w.write_str(auth::TOKEN_PATH)?;
        w.write_str(" HTTP/1.1\r\n")?;
        write_header_line(&mut w, "Host", session.base_url.as_str())?;
        write_header_line(&mut w, "Connection", "close")?;
        write_header_line(&mut w, "Content-Length", "0")?;
        if !session.correlation_id.is_empty() {
            write_header_line(&mut w, "x-request-id", session.correlation_id.as_str())?;
        }
        if let Some(ua) = session.user_agent {
            write_header_line(&mut w, "User-Agent", ua)?;
        }
        w.write_str("Authorization:")?;
        w.write_bytes(oauth.as_slice())?;
        w.write_str("\r\n\r\n")?;
        w.flush()?;
    }

    let mut status: u16 = 0;
    let mut server_time: Option<u32> = None;
    let mut scan_error: Option<Error> = None;
    let mut scanner = TokenScanner::new(&mut session.access_token);
    let read_result = read_response(conn, &mut |event| match event {
        Event::Status(code) => {
            status = code;
            false
        }
        Event::Header { name, value } => {
            if name.eq_ignore_ascii_case(b"x-here-timestamp") {
                server_time = parse_decimal(value);
            }
            false
        }
        Event::Body { chunk, .. } => {
            if status == 200 {
                match scanner.feed(chunk) {
                    Ok(done) => done,
                    Err(error) => {
                        scan_error = Some(error);
                        true
                    }
                }
            } else {
                false
            }
        }
        _ => false,
    });
    let scan_done = scanner.done();
    let expires_in = scanner.expires_in();

    if let Err(error) = read_result {
        session.clear_token();
        return Err(error);
    }
    if let Some(error) = scan_error {
        session.clear_token();
        return Err(error);
    }
    match status {
        200 if scan_done => {
            session.token_expiry = now.saturating_add(expires_in);
            Ok(())
        }
        200 => {
            session.clear_token();
            Err(Error::ProtocolError)
        }
        401 => {
            session.clear_token();
            if let Some(server) = server_time {
                session.skew = clamp_skew(i64::from(server) - i64::from(now));
                Err(Error::TimeMismatch)
            } else {
                Err(Error::Unauthorized)
            }
        }
        other => {
            session.clear_token();
            match map_status(other) {
                Ok(()) => Err(Error::ProtocolError),
                Err(error) => Err(error),
            }
        }
    }
}

fn send_exchange<C: Connection, S: ChunkSource, H: RecvHandler>(
    conn: &mut C,
    session: &mut Session<'_>,
    source: &mut S,
    handler: &mut H,
    options: &SendOptions,
    now: u32,
) -> Result<(), Error> {
    let path = if options.async_response {
        SEND_PATH_ASYNC
    } else {
        SEND_PATH
    };
    let mut staging_storage = [0u8; STAGING_SIZE];
    let mut staging = ByteBuffer::new(&mut staging_storage);
    {
        let mut w = ChunkedWriter::new(&mut staging, conn);
        w.write_str("POST ")?;
        w.write_str(path)?;
        w.write_str(" HTTP/1.1\r\n")?;
        write_header_line(&mut w, "Host", session.base_url.as_str())?;
        write_header_line(&mut w, "Connection", "close")?;
        write_header_line(&mut w, "Content-Type", options.payload.content_type())?;
        write_header_line(&mut w, "Transfer-Encoding", "chunked")?;
        if !session.correlation_id.is_empty() {
            write_header_line(&mut w, "x-request-id", session.correlation_id.as_str())?;
        }
        if let Some(ua) = session.user_agent {
            write_header_line(&mut w, "User-Agent", ua)?;
        }
        w.write_str("Authorization: Bearer ")?;
        w.write_str(session.access_token.as_str())?;
        w.write_str("\r\n\r\n")?;
        while let Some(chunk) = source.next_chunk()? {
            if !chunk.is_empty() {
                w.write_chunk(chunk)?;
            }
        }
        w.write_chunk(&[])?;
        w.flush()?;
    }

    let mut status: u16 = 0;
    let mut retry_after: Option<u32> = None;
    read_response(conn, &mut |event| match event {
        Event::Status(code) => {
            status = code;
            false
        }
        Event::Header { name, value } => {
            if name.eq_ignore_ascii_case(b"retry-after") {
                retry_after = parse_decimal(value);
            }
            false
        }
        Event::BodySize(size) => handler.on_size(size),
        Event::Body { chunk, .. } => handler.on_data(chunk),
        _ => false,
    })?;

    match status {
        401 | 403 => session.clear_token(),
        429 => {
            if let Some(seconds) = retry_after {
                session.retry_after = now.saturating_add(seconds);
            }
        }
        _ => {}
    }
    map_status(status)
}

fn get_exchange<C: Connection, H: RecvHandler>(
    conn: &mut C,
    host: &str,
    path: &str,
    headers: &[Header<'_>],
    handler: &mut H,
) -> Result<(), Error> {
    let mut staging_storage = [0u8; STAGING_SIZE];
    let mut staging = ByteBuffer::new(&mut staging_storage);
    {
        let mut w = ChunkedWriter::new(&mut staging, conn);
        w.write_str("GET ")?;
        w.write_str(path)?;
        w.write_str(" HTTP/1.1\r\n")?;
        write_header_line(&mut w, "Host", host)?;
        write_header_line(&mut w, "Connection", "close")?;
        for header in headers {
            w.write_str(header.name)?;
            w.write_str(": ")?;
            if header.name.eq_ignore_ascii_case("Authorization")
                && !header.value.starts_with("Bearer ")
            {
                w.write_str("Bearer ")?;
            }
            w.write_str(header.value)?;
            w.write_str("\r\n")?;
        }
        w.write_str("\r\n")?;
        w.flush()?;
    }

    let mut status: u16 = 0;
    read_response(conn, &mut |event| match event {
        Event::Status(code) => {
            status = code;
            false
        }
        Event::BodySize(size) => handler.on_size(size),
        Event::Body { chunk, .. } => handler.on_data(chunk),
        _ => false,
    })?;
    map_status(status)
}

/// Reads transport bytes into a fixed work buffer and feeds them to the
/// parser, shifting the unconsumed tail to the front between reads.
fn read_response<R: Read>(
    transport: &mut R,
    sink: &mut impl FnMut(Event<'_>) -> bool,
) -> Result<(), Error> {
    let mut parser = ResponseParser::new();
    let mut buf = [0u8; RECV_SIZE];
    let mut len = 0usize;
    loop {
        let read = transport.read(&mut buf[len..]).map_err(|_| Error::ReadError)?;
        if read == 0 {
            return Err(Error::ConnectionClosed);
        }
        len += read;
        match parser.parse(&buf[..len], sink)? {
            Progress::Complete | Progress::Interrupted => return Ok(()),
            Progress::NeedMore(consumed) => {
                buf.copy_within(consumed..len, 0);
                len -= consumed;
                // A single element larger than the work buffer can never
                // complete.
                if len == buf.len() {
                    return Err(Error::ProtocolError);
                }
            }
        }
    }
}

fn write_header_line<W: Write>(
    w: &mut ChunkedWriter<'_, '_, W>,
    name: &str,
    value: &str,
) -> Result<(), Error> {
    w.write_str(name)?;
    w.write_str(": ")?;
    w.write_str(value)?;
    w.write_str("\r\n")
}

fn map_status(status: u16) -> Result<(), Error> {
    match status {
        200 | 204 => Ok(()),
        400 => Err(Error::BadRequest),
        401 => Err(Error::Unauthorized),
        403 => Err(Error::Forbidden),
        404 => Err(Error::NotFound),
        412 => Err(Error::DeviceUnclaimed),
        429 => Err(Error::TooManyRequests),
        _ => Err(Error::ProtocolError),
    }
}

fn parse_decimal(bytes: &[u8]) -> Option<u32> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    bytes.iter().try_fold(0u32, |acc, &d| {
        acc.checked_mul(10)?.checked_add(u32::from(d - b'0'))
    })
}

fn clamp_skew(delta: i64) -> i32 {
    delta.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
