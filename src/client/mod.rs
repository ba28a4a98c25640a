//! Tracking client facade and session state.
//!
//! [`Session`] holds everything that outlives a single request: the device
//! credentials, the cached access token and its expiry, the measured clock
//! skew and the throttle deadline. [`Client`] wraps the protocol layer and
//! decides, per call, whether (re-)authentication or throttling applies
//! before any I/O happens.
//!
//! # Usage
//!
//! ```rust,no_run
//! use libtrack::client::{Client, Session};
//! use libtrack::network::{Close, Connect, Connection, Read, Write};
//! use libtrack::platform::Platform;
//! # struct TlsConnection;
//! # impl Connection for TlsConnection {}
//! # impl Read for TlsConnection {
//! #     type Error = ();
//! #     fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Self::Error> { Ok(0) }
//! # }
//! # impl Write for TlsConnection {
//! #     type Error = ();
//! #     fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> { Ok(buf.len()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl Close for TlsConnection {
//! #     type Error = ();
//! #     fn close(self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # struct Tls;
//! # impl Connect for Tls {
//! #     type Connection = TlsConnection;
//! #     type Error = ();
//! #     fn connect(&mut self, _remote: &str) -> Result<Self::Connection, Self::Error> { Ok(TlsConnection) }
//! # }
//! # struct Board;
//! # impl Platform for Board {
//! #     fn unix_time_seconds(&self) -> u32 { 0 }
//! #     fn correlation_id(&mut self) -> heapless::String<36> { heapless::String::new() }
//! # }
//!
//! let mut session = Session::new(
//!     "1b25138b-c795-4b20-a724-59a40162d8fd",
//!     "Ohkai3eF-im5UGai4J-bIPizRburaiLohr4DQNE6cvM",
//!     "tracking.api.here.com",
//! ).unwrap();
//! let mut client = Client::new(Tls, Board);
//!
//! let telemetry = br#"[{"timestamp":1551071218596,"position":{"lat":61.49,"lng":23.77}}]"#;
//! let mut response = [0u8; 256];
//! // let n = client.send(&mut session, telemetry, &mut response)?;
//! ```

use heapless::String;

use crate::auth::NonceSource;
use crate::network::Connect;
use crate::network::application::http::client::HttpClient;
use crate::network::error::Error;
use crate::platform::{CORRELATION_ID_SIZE, Platform};

pub use crate::network::application::http::client::{
    ChunkSource, Header, Payload, RecvHandler, SendOptions,
};

/// Length of a device identifier.
pub const DEVICE_ID_SIZE: usize = 36;
/// Length of a device secret.
pub const DEVICE_SECRET_SIZE: usize = 43;
/// Maximum length of an access token.
pub const ACCESS_TOKEN_SIZE: usize = 1024;
/// Maximum length of the backend host name.
pub const BASE_URL_SIZE: usize = 64;

/// Long-lived client state, owned by the caller.
///
/// Constructed once per device process and passed by mutable reference
/// into every operation. The credential fields are borrowed so secrets can
/// stay wherever the firmware keeps them; the token, expiry, skew and
/// throttle fields are maintained by the client.
#[derive(Debug)]
pub struct Session<'a> {
    /// Device identifier, [`DEVICE_ID_SIZE`] bytes.
    pub device_id: &'a str,
    /// Device secret, [`DEVICE_SECRET_SIZE`] bytes.
    pub device_secret: &'a str,
    /// Backend host name.
    pub base_url: String<BASE_URL_SIZE>,
    /// Current access token, empty when none is held.
    pub access_token: String<ACCESS_TOKEN_SIZE>,
    /// Absolute Unix expiry of the token, 0 when none is held.
    pub token_expiry: u32,
    /// Server-minus-device clock offset in seconds.
    pub skew: i32,
    /// Absolute Unix time before which no request may be attempted,
    /// 0 when not throttled.
    pub retry_after: u32,
    /// Correlation id attached to requests; minted from the platform when
    /// the caller leaves it empty.
    pub correlation_id: String<CORRELATION_ID_SIZE>,
    /// Optional `User-Agent` value attached to requests.
    pub user_agent: Option<&'a str>,
}

impl<'a> Session<'a> {
    /// Validates the credentials and host name and builds a fresh session
    /// with no token.
    pub fn new(device_id: &'a str, device_secret: &'a str, base_url: &str) -> Result<Self, Error> {
        if device_id.len() != DEVICE_ID_SIZE
            || device_secret.len() != DEVICE_SECRET_SIZE
            || base_url.is_empty()
        {
            return Err(Error::InvalidInput);
        }
        let base_url = String::try_from(base_url).map_err(|_| Error::InvalidInput)?;
        Ok(Self {
            device_id,
            device_secret,
            base_url,
            access_token: String::new(),
            token_expiry: 0,
            skew: 0,
            retry_after: 0,
            correlation_id: String::new(),
            user_agent: None,
        })
    }

    /// Supplies a caller-owned correlation id instead of a minted one.
    pub fn set_correlation_id(&mut self, id: &str) -> Result<(), Error> {
        self.correlation_id = String::try_from(id).map_err(|_| Error::InvalidInput)?;
        Ok(())
    }

    /// Attaches a `User-Agent` value to every request.
    pub fn set_user_agent(&mut self, user_agent: &'a str) {
        self.user_agent = Some(user_agent);
    }

    /// Whether a token is held and has not expired at `now`.
    pub fn has_valid_token(&self, now: u32) -> bool {
        !self.access_token.is_empty() && self.token_expiry > now
    }

    /// Drops the token and its expiry together.
    pub fn clear_token(&mut self) {
        self.access_token.clear();
        self.token_expiry = 0;
    }
}

/// The tracking client.
///
/// Owns the protocol layer, the platform services and the nonce state.
/// Not safe for concurrent use; wrap it in external serialization if the
/// firmware shares it across threads.
#[derive(Debug)]
pub struct Client<N: Connect, P: Platform> {
    http: HttpClient<N>,
    platform: P,
    nonce: NonceSource,
}

impl<N: Connect, P: Platform> Client<N, P> {
    /// Builds a client over a transport connector and platform services.
    pub fn new(connector: N, platform: P) -> Self {
        Self {
            http: HttpClient::new(connector),
            platform,
            nonce: NonceSource::new(),
        }
    }

    /// Authenticates unconditionally, invalidating any cached token first.
    ///
    /// On a [`Error::TimeMismatch`] outcome the request is repeated exactly
    /// once with the corrected clock skew.
    pub fn auth(&mut self, session: &mut Session<'_>) -> Result<(), Error> {
        self.ensure_correlation_id(session);
        session.clear_token();
        self.authenticate(session)
    }

    /// Sends one telemetry payload and copies the response body into
    /// `response`, returning its length.
    ///
    /// Authenticates first when no valid token is held. Fails immediately
    /// with [`Error::TooManyRequests`] and performs no I/O while the
    /// throttle deadline has not passed.
    pub fn send(
        &mut self,
        session: &mut Session<'_>,
        data: &[u8],
        response: &mut [u8],
    ) -> Result<usize, Error> {
        if data.is_empty() {
            return Err(Error::InvalidInput);
        }
        self.prepare(session)?;
        let now = self.platform.unix_time_seconds();
        let mut source = SliceSource { data: Some(data) };
        let mut sink = CopySink {
            out: response,
            len: 0,
            overflow: false,
        };
        let result = self
            .http
            .send(session, &mut source, &mut sink, &SendOptions::default(), now);
        if sink.overflow {
            return Err(Error::CapacityExceeded);
        }
        result.map(|()| sink.len)
    }

    /// Streams a telemetry body from `source` and the response to
    /// `handler`.
    ///
    /// Same authentication and throttling behavior as
    /// [`send`](Self::send).
    pub fn send_stream<S: ChunkSource, H: RecvHandler>(
        &mut self,
        session: &mut Session<'_>,
        source: &mut S,
        handler: &mut H,
        options: &SendOptions,
    ) -> Result<(), Error> {
        self.prepare(session)?;
        let now = self.platform.unix_time_seconds();
        self.http.send(session, source, handler, options, now)
    }

    /// Ad-hoc GET for out-of-band diagnostics.
    ///
    /// Subject to the throttle deadline but not to authentication; callers
    /// wanting an authorized request pass their own `Authorization` header.
    pub fn get<H: RecvHandler>(
        &mut self,
        session: &mut Session<'_>,
        host: &str,
        path: &str,
        port: u16,
        headers: &[Header<'_>],
        handler: &mut H,
    ) -> Result<(), Error> {
        let now = self.platform.unix_time_seconds();
        if now < session.retry_after {
            return Err(Error::TooManyRequests);
        }
        self.http.get(host, path, port, headers, handler)
    }

    /// Throttle check and token refresh shared by the send paths.
    fn prepare(&mut self, session: &mut Session<'_>) -> Result<(), Error> {
        self.ensure_correlation_id(session);
        let now = self.platform.unix_time_seconds();
        if now < session.retry_after {
            return Err(Error::TooManyRequests);
        }
        if !session.has_valid_token(now) {
            self.authenticate(session)?;
        }
        Ok(())
    }

    fn authenticate(&mut self, session: &mut Session<'_>) -> Result<(), Error> {
        let now = self.platform.unix_time_seconds();
        match self.http.token(session, &mut self.nonce, now) {
            Err(Error::TimeMismatch) => {
                let now = self.platform.unix_time_seconds();
                self.http.token(session, &mut self.nonce, now)
            }
            result => result,
        }
    }

    fn ensure_correlation_id(&mut self, session: &mut Session<'_>) {
        if session.correlation_id.is_empty() {
            session.correlation_id = self.platform.correlation_id();
        }
    }
}

/// Single-slice body source backing [`Client::send`].
struct SliceSource<'d> {
    data: Option<&'d [u8]>,
}

impl ChunkSource for SliceSource<'_> {
    fn next_chunk(&mut self) -> Result<Option<&[u8]>, Error> {
        Ok(self.data.take())
    }
}

/// Response sink backing [`Client::send`]; copies the body into a caller
/// buffer and stops early when it cannot fit.
struct CopySink<'o> {
    out: &'o mut [u8],
    len: usize,
    overflow: bool,
}

impl RecvHandler for CopySink<'_> {
    fn on_size(&mut self, size: u32) -> bool {
        if size as usize > self.out.len() {
            self.overflow = true;
            return true;
        }
        false
    }

    fn on_data(&mut self, data: &[u8]) -> bool {
        if self.len + data.len() > self.out.len() {
            self.overflow = true;
            return true;
        }
        self.out[self.len..self.len + data.len()].copy_from_slice(data);
        self.len += data.len();
        false
    }

    fn on_complete(&mut self, _outcome: Result<(), Error>) {}
}
