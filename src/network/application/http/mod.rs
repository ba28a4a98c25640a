//! HTTP/1.1 protocol implementation for embedded systems.
//!
//! This module provides the lightweight HTTP machinery the tracking client
//! runs on: a buffered request writer with chunked-transfer-encoding
//! framing, an incremental response parser that resumes across partial
//! transport reads, and the client orchestrating both against the backend.
//! It deliberately stops short of general HTTP/1.1: one request per
//! connection, `Content-Length`-framed responses only, no redirects and no
//! proxies. What it gives up in generality it gains in memory behavior —
//! every operation runs in a few hundred bytes of fixed buffers.
//!
//! The main entry point is [`client::HttpClient`], which works with any
//! connector implementing the [`crate::network::Connect`] trait. The
//! [`parser`] and [`writer`] building blocks are public for callers that
//! need to speak to other HTTP endpoints with the same constraints.

/// HTTP client implementation and supporting types.
///
/// Contains the main [`HttpClient`](client::HttpClient) struct and the
/// callback traits for streamed request bodies and responses.
pub mod client;

/// Resumable HTTP/1.1 response parser.
pub mod parser;

/// Buffered, chunk-framing request writer.
pub mod writer;

mod token;
