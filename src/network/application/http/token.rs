//! Per-byte scanner for the token response body.
//!
//! The auth response is JSON, but it arrives through the streaming parser
//! in arbitrary slices and the device cannot afford to buffer it whole.
//! [`TokenScanner`] walks the body one byte at a time looking for the
//! `"accessToken"` and `"expiresIn"` keys, in either order and regardless
//! of the surrounding structure, and extracts their values as they stream
//! past. Scanning is finished as soon as both values have been seen.

use heapless::String;

use crate::network::error::Error;

const ACCESS_TOKEN_KEY: &[u8] = b"accessToken";
const EXPIRES_IN_KEY: &[u8] = b"expiresIn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Matching key prospects byte by byte.
    Seek,
    /// Key matched; skipping ahead to the colon.
    TokenColon,
    /// Colon seen; skipping ahead to the opening quote.
    TokenOpenQuote,
    /// Copying the quoted token value.
    TokenValue,
    /// Key matched; skipping ahead to the colon.
    ExpiresColon,
    /// Accumulating the decimal value until its terminating non-digit.
    ExpiresValue,
}

/// Streaming extractor for the access token and its expiry delta.
///
/// Writes the token directly into a caller-supplied bounded string. If the
/// value overflows that string, the partial copy is cleared and the feed
/// fails with [`Error::CapacityExceeded`].
#[derive(Debug)]
pub struct TokenScanner<'a, const N: usize> {
    token: &'a mut String<N>,
    state: State,
    token_match: usize,
    expires_match: usize,
    expires_in: u32,
    expires_seen_digit: bool,
    have_token: bool,
    have_expires: bool,
}

impl<'a, const N: usize> TokenScanner<'a, N> {
    /// Creates a scanner that writes the token value into `token`.
    pub fn new(token: &'a mut String<N>) -> Self {
        token.clear();
        Self {
            token,
            state: State::Seek,
            token_match: 0,
            expires_match: 0,
            expires_in: 0,
            expires_seen_digit: false,
            have_token: false,
            have_expires: false,
        }
    }

    /// Whether both values have been extracted.
    pub fn done(&self) -> bool {
        self.have_token && self.have_expires
    }

    /// Expiry delta in seconds, valid once [`done`](Self::done) (or at
    /// least the `expiresIn` half of it) is true.
    pub fn expires_in(&self) -> u32 {
        self.expires_in
    }

    /// Feeds the next run of body bytes. Returns `Ok(true)` once both
    /// values have been found; the caller can stop feeding then.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<bool, Error> {
        for &byte in chunk {
            if self.step(byte)? {
                return Ok(true);
            }
        }
        Ok(self.done())
    }

    fn step(&mut self, byte: u8) -> Result<bool, Error> {
        match self.state {
            State::Seek => {
                if !self.have_token {
                    advance_match(&mut self.token_match, ACCESS_TOKEN_KEY, byte);
                    if self.token_match == ACCESS_TOKEN_KEY.len() {
                        self.token_match = 0;
                        self.expires_match = 0;
                        self.state = State::TokenColon;
                        return Ok(false);
                    }
                }
                if !self.have_expires {
                    advance_match(&mut self.expires_match, EXPIRES_IN_KEY, byte);
                    if self.expires_match == EXPIRES_IN_KEY.len() {
                        self.token_match = 0;
                        self.expires_match = 0;
                        self.state = State::ExpiresColon;
                    }
                }
            }
            State::TokenColon => {
                if byte == b':' {
                    self.state = State::TokenOpenQuote;
                }
            }
            State::TokenOpenQuote => {
                if byte == b'"' {
                    self.token.clear();
                    self.state = State::TokenValue;
                }
            }
            State::TokenValue => {
                if byte == b'"' {
                    self.have_token = true;
                    self.state = State::Seek;
                } else if self.token.push(char::from(byte)).is_err() {
                    // Token too large for the session; never keep a prefix.
                    self.token.clear();
                    return Err(Error::CapacityExceeded);
                }
            }
            State::ExpiresColon => {
                if byte == b':' {
                    self.expires_in = 0;
                    self.expires_seen_digit = false;
                    self.state = State::ExpiresValue;
                }
            }
            State::ExpiresValue => {
                if byte.is_ascii_digit() {
                    self.expires_seen_digit = true;
                    self.expires_in = self
                        .expires_in
                        .saturating_mul(10)
                        .saturating_add(u32::from(byte - b'0'));
                } else if self.expires_seen_digit {
                    // The terminating non-digit commits the value.
                    self.have_expires = true;
                    self.state = State::Seek;
                }
            }
        }
        Ok(self.done())
    }
}

/// Advances a prefix-match counter for `key` by one input byte.
fn advance_match(progress: &mut usize, key: &[u8], byte: u8) {
    if byte == key[*progress] {
        *progress += 1;
    } else if byte == key[0] {
        *progress = 1;
    } else {
        *progress = 0;
    }
}
