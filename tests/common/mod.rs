//! Shared mock transport and platform fixtures.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use libtrack::client::{ChunkSource, RecvHandler};
use libtrack::network::error::Error;
use libtrack::network::{Close, Connect, Connection, Read, Write};
use libtrack::platform::Platform;

/// Correlation id the mock platform mints.
pub const MINTED_ID: &str = "0f3e9a44-7d2b-4a5e-9c1d-8b6a5f4e3d2c";

/// Reference credentials used across the tests.
pub const DEVICE_ID: &str = "1b25138b-c795-4b20-a724-59a40162d8fd";
pub const DEVICE_SECRET: &str = "Ohkai3eF-im5UGai4J-bIPizRburaiLohr4DQNE6cvM";
pub const BASE_URL: &str = "tracking.api.here.com";

struct NetworkState {
    responses: VecDeque<Vec<u8>>,
    requests: Vec<Rc<RefCell<Vec<u8>>>>,
    remotes: Vec<String>,
    read_chunk: usize,
    fail_reads: bool,
}

/// Connector handing out one scripted connection per `connect` call.
///
/// Each connection reads from the next queued response and records every
/// written byte. The handle is cloneable shared state, so a test can keep
/// one clone for inspection while the client owns another. Reads are
/// capped at a configurable chunk size to exercise the parser's
/// resumption protocol.
#[derive(Clone)]
pub struct ScriptedNetwork {
    state: Rc<RefCell<NetworkState>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(NetworkState {
                responses: VecDeque::new(),
                requests: Vec::new(),
                remotes: Vec::new(),
                read_chunk: 48,
                fail_reads: false,
            })),
        }
    }

    pub fn push_response(&mut self, response: Vec<u8>) {
        self.state.borrow_mut().responses.push_back(response);
    }

    pub fn set_read_chunk(&mut self, read_chunk: usize) {
        self.state.borrow_mut().read_chunk = read_chunk;
    }

    pub fn set_fail_reads(&mut self, fail_reads: bool) {
        self.state.borrow_mut().fail_reads = fail_reads;
    }

    /// Number of connections handed out so far.
    pub fn connects(&self) -> usize {
        self.state.borrow().requests.len()
    }

    /// Bytes the client wrote on the `index`-th connection.
    pub fn request(&self, index: usize) -> Vec<u8> {
        self.state.borrow().requests[index].borrow().clone()
    }

    pub fn request_str(&self, index: usize) -> String {
        String::from_utf8(self.request(index)).expect("request was not UTF-8")
    }

    /// The `"host:port"` the `index`-th connection was opened to.
    pub fn remote(&self, index: usize) -> String {
        self.state.borrow().remotes[index].clone()
    }
}

impl Connect for ScriptedNetwork {
    type Connection = MockConnection;
    type Error = Error;

    fn connect(&mut self, remote: &str) -> Result<Self::Connection, Self::Error> {
        let mut state = self.state.borrow_mut();
        let response = state
            .responses
            .pop_front()
            .ok_or(Error::ConnectionRefused)?;
        let request = Rc::new(RefCell::new(Vec::new()));
        state.requests.push(request.clone());
        state.remotes.push(remote.to_string());
        Ok(MockConnection {
            response,
            read_pos: 0,
            read_chunk: state.read_chunk,
            fail_reads: state.fail_reads,
            request,
        })
    }
}

pub struct MockConnection {
    response: Vec<u8>,
    read_pos: usize,
    read_chunk: usize,
    fail_reads: bool,
    request: Rc<RefCell<Vec<u8>>>,
}

impl Read for MockConnection {
    type Error = Error;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.fail_reads {
            return Err(Error::ReadError);
        }
        if self.read_pos >= self.response.len() {
            return Ok(0);
        }
        let n = buf
            .len()
            .min(self.read_chunk)
            .min(self.response.len() - self.read_pos);
        buf[..n].copy_from_slice(&self.response[self.read_pos..self.read_pos + n]);
        self.read_pos += n;
        Ok(n)
    }
}

impl Write for MockConnection {
    type Error = Error;

    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.request.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Close for MockConnection {
    type Error = Error;

    fn close(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for MockConnection {}

/// Fixed-clock platform.
pub struct MockPlatform {
    pub now: u32,
}

impl Platform for MockPlatform {
    fn unix_time_seconds(&self) -> u32 {
        self.now
    }

    fn correlation_id(&mut self) -> heapless::String<36> {
        heapless::String::try_from(MINTED_ID).unwrap()
    }
}

/// Response-recording receive handler.
pub struct CollectHandler {
    pub sizes: Vec<u32>,
    pub data: Vec<u8>,
    pub outcomes: Vec<Result<(), Error>>,
    /// Stop the exchange once this many body bytes have arrived.
    pub stop_after: Option<usize>,
}

impl CollectHandler {
    pub fn new() -> Self {
        Self {
            sizes: Vec::new(),
            data: Vec::new(),
            outcomes: Vec::new(),
            stop_after: None,
        }
    }
}

impl RecvHandler for CollectHandler {
    fn on_size(&mut self, size: u32) -> bool {
        self.sizes.push(size);
        false
    }

    fn on_data(&mut self, data: &[u8]) -> bool {
        self.data.extend_from_slice(data);
        self.stop_after.is_some_and(|limit| self.data.len() >= limit)
    }

    fn on_complete(&mut self, outcome: Result<(), Error>) {
        self.outcomes.push(outcome);
    }
}

/// Body source yielding a fixed list of chunks.
pub struct VecSource {
    chunks: VecDeque<Vec<u8>>,
    current: Option<Vec<u8>>,
}

impl VecSource {
    pub fn new(chunks: &[&[u8]]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_vec()).collect(),
            current: None,
        }
    }
}

impl ChunkSource for VecSource {
    fn next_chunk(&mut self) -> Result<Option<&[u8]>, Error> {
        self.current = self.chunks.pop_front();
        Ok(self.current.as_deref())
    }
}

/// Builds a `Content-Length`-framed response.
pub fn http_response(status: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut text = format!("HTTP/1.1 {status}\r\n");
    for (name, value) in headers {
        text.push_str(&format!("{name}: {value}\r\n"));
    }
    text.push_str(&format!("Content-Length: {}\r\n\r\n", body.len()));
    let mut bytes = text.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

/// A successful token response.
pub fn token_response(token: &str, expires_in: u32) -> Vec<u8> {
    http_response(
        "200 OK",
        &[("Content-Type", "application/json")],
        format!(r#"{{"accessToken":"{token}","expiresIn":{expires_in}}}"#).as_bytes(),
    )
}
