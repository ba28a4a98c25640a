//! # libtrack - Rust telemetry client SDK
//!
//! A Rust SDK that lets memory-constrained IoT devices authenticate
//! against and stream telemetry to a cloud tracking backend over HTTPS.
//! The library is designed for embedded systems, supports `no_std`
//! environments, and performs every protocol operation with fixed-size,
//! caller-owned buffers over a single blocking TLS byte stream.
//!
//! ## Features
//!
//! ### Protocol Machinery
//! - **Resumable HTTP parser**: consumes responses of any size through a
//!   work buffer as small as one TLS read
//! - **Chunked request writer**: streams request bodies with
//!   chunked-transfer-encoding framing from a small staging buffer
//! - **OAuth1 signing**: HMAC-SHA256 signed token requests with clock-skew
//!   compensation
//!
//! ### Session Management
//! - Token caching with expiry tracking and automatic re-authentication
//! - One-shot retry on device/server clock mismatch
//! - `Retry-After` throttling honored before any I/O is attempted
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! libtrack = "0.1.0"
//! ```
//!
//! The firmware supplies two things: a connector to its TLS stack
//! (implementing [`network::Connect`]) and its clock/id services
//! (implementing [`platform::Platform`]). Everything else is the library's
//! job:
//!
//! ```rust,no_run
//! use libtrack::client::{Client, Session};
//! # use libtrack::network::{Close, Connect, Connection, Read, Write};
//! # use libtrack::platform::Platform;
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
//! let mut response = [0u8; 256];
//! // client.auth(&mut session)?;
//! // client.send(&mut session, b"...telemetry...", &mut response)?;
//! ```
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (ARM Cortex-M, RISC-V, etc.)
//! - Linux-based IoT devices (Raspberry Pi, etc.)
//! - Any platform supporting Rust's `core` library
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `defmt`: Enable defmt logging support for embedded debugging

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

/// Network abstraction layer providing the transport traits and the HTTP
/// protocol machinery.
pub mod network;

/// Bounded byte buffer primitive the protocol layers stage their output
/// in.
pub mod buffer;

/// OAuth1 request signing and nonce generation.
pub mod auth;

/// Crypto primitives consumed by the signer (HMAC-SHA256, Base64).
pub mod crypto;

/// Platform services the client consumes: wall clock and correlation-id
/// minting.
pub mod platform;

/// Client facade and long-lived session state.
pub mod client;
