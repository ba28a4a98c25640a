//! OAuth1 request signing with HMAC-SHA256.
//!
//! The tracking backend authenticates devices with a single signed
//! `POST /v2/token` request. This module builds the `Authorization` header
//! value for that request: the realm, the five OAuth parameters in their
//! fixed emission order, and the signature over the canonical base string,
//! all staged in one caller-supplied [`ByteBuffer`].
//!
//! The signer is deterministic: nonce and timestamp are inputs, minted by
//! the caller from a [`NonceSource`] and the platform clock. That keeps the
//! hot path free of hidden state and makes the header byte-for-byte
//! testable.

use heapless::{String, Vec};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::buffer::{ByteBuffer, CapacityError, Radix};
use crate::crypto;
use crate::network::error::Error;

/// Number of ASCII digits in an OAuth nonce.
pub const NONCE_SIZE: usize = 10;

/// Smallest destination buffer `write_header` accepts.
///
/// A full header with a 36-character consumer key comes to roughly 330
/// bytes; 384 leaves headroom for longer host names without letting a
/// hopeless buffer through.
pub const MIN_HEADER_CAPACITY: usize = 384;

/// Path of the token endpoint; also the resource the signature covers.
pub const TOKEN_PATH: &str = "/v2/token";

const SIGNATURE_METHOD: &str = "HMAC-SHA256";
const OAUTH_VERSION: &str = "1.0";
const PARAM_COUNT: usize = 5;
const PARAM_KEYS: [&str; PARAM_COUNT] = [
    "oauth_consumer_key",
    "oauth_nonce",
    "oauth_signature_method",
    "oauth_timestamp",
    "oauth_version",
];

// Worst case: "POST&" + a fully percent-encoded URL + the encoded parameter
// list. Generous for any host name that fits a session.
const BASE_STRING_SIZE: usize = 768;

/// Inputs to one signing operation.
///
/// `timestamp` is the Unix time to embed, already adjusted for the measured
/// server clock skew. `nonce` is [`NONCE_SIZE`] ASCII digits.
#[derive(Debug)]
pub struct SignParams<'a> {
    /// Device identifier, used as the OAuth consumer key.
    pub device_id: &'a str,
    /// Device secret, used as the HMAC key (suffixed with `&`).
    pub device_secret: &'a str,
    /// Backend host name, e.g. `tracking.api.here.com`.
    pub base_url: &'a str,
    /// Request nonce.
    pub nonce: &'a str,
    /// Skew-adjusted Unix timestamp in seconds.
    pub timestamp: u32,
}

/// Mints request nonces.
///
/// Each call reseeds a small PRNG from the Unix clock. Two calls within the
/// same second must not produce the same nonce, so the source remembers the
/// last seed it used and bumps past it when the clock has not advanced.
/// This state is owned by the client, not a process-wide static, which
/// keeps it testable and confines the synchronization question to one
/// place if the client is ever shared across threads.
#[derive(Debug, Default)]
pub struct NonceSource {
    last_timestamp: u32,
}

impl NonceSource {
    /// Creates a source that has never minted a nonce.
    pub const fn new() -> Self {
        Self { last_timestamp: 0 }
    }

    /// Mints a fresh [`NONCE_SIZE`]-digit nonce for the given Unix time.
    pub fn next(&mut self, now: u32) -> String<NONCE_SIZE> {
        let seed = if now > self.last_timestamp {
            now
        } else {
            self.last_timestamp.wrapping_add(1)
        };
        self.last_timestamp = seed;

        let mut rng = SmallRng::seed_from_u64(u64::from(seed));
        let mut nonce: String<NONCE_SIZE> = String::new();
        for _ in 0..NONCE_SIZE {
            // Capacity is exactly NONCE_SIZE, the push cannot fail.
            nonce.push(char::from(b'0' + rng.gen_range(0..10u8))).unwrap();
        }
        nonce
    }
}

/// Writes the complete `Authorization` header value into `out`.
///
/// Layout: `OAuth realm="IoT",` followed by the five parameters as
/// `key="value",` and finally `oauth_signature="..."` with no trailing
/// comma. Fails with [`Error::CapacityExceeded`] before writing anything
/// when `out` has less than [`MIN_HEADER_CAPACITY`] bytes free.
pub fn write_header(params: &SignParams<'_>, out: &mut ByteBuffer<'_>) -> Result<(), Error> {
    if params.device_id.is_empty()
        || params.device_secret.is_empty()
        || params.base_url.is_empty()
        || params.nonce.is_empty()
    {
        return Err(Error::InvalidInput);
    }
    if out.free() < MIN_HEADER_CAPACITY {
        return Err(Error::CapacityExceeded);
    }

    out.append_str("OAuth realm=\"IoT\",")?;

    // Each parameter value is remembered as a (start, len) span into `out`
    // so the signature base string can be rebuilt from the header bytes
    // without copying the values anywhere else.
    let mut spans = [(0usize, 0usize); PARAM_COUNT];
    spans[0] = append_param(out, PARAM_KEYS[0], params.device_id)?;
    spans[1] = append_param(out, PARAM_KEYS[1], params.nonce)?;
    spans[2] = append_param(out, PARAM_KEYS[2], SIGNATURE_METHOD)?;
    spans[3] = {
        out.append_str(PARAM_KEYS[3])?;
        out.append_str("=\"")?;
        let start = out.len();
        out.append_uint(params.timestamp, Radix::Dec)?;
        let span = (start, out.len() - start);
        out.append_str("\",")?;
        span
    };
    spans[4] = append_param(out, PARAM_KEYS[4], OAUTH_VERSION)?;

    let signature = sign(params, out, &spans)?;
    out.append_str("oauth_signature=\"")?;
    append_percent_encoded(out, signature.as_slice())?;
    out.append_byte(b'"')?;
    Ok(())
}

/// Writes `key="percent-encoded value",` and returns the value's span.
fn append_param(
    out: &mut ByteBuffer<'_>,
    key: &str,
    value: &str,
) -> Result<(usize, usize), CapacityError> {
    out.append_str(key)?;
    out.append_str("=\"")?;
    let start = out.len();
    append_percent_encoded(out, value.as_bytes())?;
    let span = (start, out.len() - start);
    out.append_str("\",")?;
    Ok(span)
}

/// Computes the Base64 HMAC-SHA256 signature over the canonical base string.
///
/// The base string is `POST&<enc url>&<enc params>` where the parameter
/// list joins the already-emitted `key=value` pairs (read back from their
/// spans in `header`) with `&` before the whole list is percent-encoded.
fn sign(
    params: &SignParams<'_>,
    header: &ByteBuffer<'_>,
    spans: &[(usize, usize); PARAM_COUNT],
) -> Result<Vec<u8, 44>, Error> {
    let mut storage = [0u8; BASE_STRING_SIZE];
    let mut base = ByteBuffer::new(&mut storage);

    base.append_str("POST&")?;
    append_percent_encoded(&mut base, b"https://")?;
    append_percent_encoded(&mut base, params.base_url.as_bytes())?;
    append_percent_encoded(&mut base, TOKEN_PATH.as_bytes())?;
    base.append_byte(b'&')?;

    let header_bytes = header.as_slice();
    for (i, key) in PARAM_KEYS.iter().enumerate() {
        if i > 0 {
            base.append_str("%26")?;
        }
        base.append_str(key)?;
        base.append_str("%3D")?;
        let (start, len) = spans[i];
        append_percent_encoded(&mut base, &header_bytes[start..start + len])?;
    }

    // HMAC key is the device secret with an empty token secret appended.
    let mut key: Vec<u8, 64> = Vec::new();
    key.extend_from_slice(params.device_secret.as_bytes())
        .map_err(|_| Error::CapacityExceeded)?;
    key.push(b'&').map_err(|_| Error::CapacityExceeded)?;

    let mac = crypto::hmac_sha256(&key, base.as_slice())?;
    let mut encoded = [0u8; 44];
    let text = crypto::base64_encode(&mac, &mut encoded)?;

    let mut signature: Vec<u8, 44> = Vec::new();
    signature
        .extend_from_slice(text.as_bytes())
        .map_err(|_| Error::CapacityExceeded)?;
    Ok(signature)
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~')
}

/// RFC 3986 percent-encoding: unreserved bytes pass through, everything
/// else becomes uppercase `%XX`.
fn append_percent_encoded(out: &mut ByteBuffer<'_>, bytes: &[u8]) -> Result<(), CapacityError> {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    for &byte in bytes {
        if is_unreserved(byte) {
            out.append_byte(byte)?;
        } else {
            out.append_byte(b'%')?;
            out.append_byte(HEX[usize::from(byte >> 4)])?;
            out.append_byte(HEX[usize::from(byte & 0x0F)])?;
        }
    }
    Ok(())
}
