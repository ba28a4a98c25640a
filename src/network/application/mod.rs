//! # Application Layer Network Protocols
//!
//! This module contains the application layer (OSI Layer 7) machinery the
//! tracking client is built from. Everything here works against the core
//! network traits so it can run over any transport the target platform
//! provides.
//!
//! ## Design Principles
//!
//! - **Connection Agnostic**: Work with any type implementing
//!   [`Connection`](crate::network::Connection)
//! - **No-std Compatible**: Designed for embedded systems without heap
//!   allocation
//! - **Resource Conscious**: Use fixed-size buffers and minimal memory
//! - **Error Handling**: One crate-wide error type for robust applications

/// HTTP/1.1 protocol machinery.
///
/// Contains the resumable response parser, the chunked request writer and
/// the [`HttpClient`](http::client::HttpClient) orchestrating the backend
/// operations.
pub mod http;
