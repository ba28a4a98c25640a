//! Crypto primitives the request signer depends on.
//!
//! Thin wrappers over the RustCrypto `hmac`/`sha2` crates and `base64ct`,
//! kept behind one seam so the signer only ever sees two operations: an
//! HMAC-SHA256 over a byte string and a Base64 encoding of the raw MAC.
//! Both are `no_std` and allocation-free.

use base64ct::{Base64, Encoding};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::network::error::Error;

type HmacSha256 = Hmac<Sha256>;

/// Length of a raw HMAC-SHA256 MAC.
pub const HMAC_SHA256_SIZE: usize = 32;

/// Computes HMAC-SHA256 of `msg` under `key`.
pub fn hmac_sha256(key: &[u8], msg: &[u8]) -> Result<[u8; HMAC_SHA256_SIZE], Error> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| Error::InvalidInput)?;
    mac.update(msg);
    Ok(mac.finalize().into_bytes().into())
}

/// Base64-encodes `data` into `out`, returning the encoded text.
///
/// Fails with [`Error::CapacityExceeded`] when `out` cannot hold the
/// encoded form (4 output bytes per 3 input bytes, rounded up).
pub fn base64_encode<'a>(data: &[u8], out: &'a mut [u8]) -> Result<&'a str, Error> {
    Base64::encode(data, out).map_err(|_| Error::CapacityExceeded)
}
