//! Platform services the client consumes but does not implement.
//!
//! The protocol layers need exactly two things from the target platform: a
//! Unix wall clock and a way to mint a request correlation id. Both are
//! bundled in the [`Platform`] trait, which the firmware implements next to
//! its transport [`Connect`](crate::network::Connect) implementation.

use heapless::String;

/// Length of a correlation id in canonical UUID textual form.
pub const CORRELATION_ID_SIZE: usize = 36;

/// Wall clock and correlation-id source provided by the target platform.
pub trait Platform {
    /// Current Unix time in seconds.
    ///
    /// The value does not need to be accurate; the client measures the
    /// offset to the server clock and compensates when signing requests.
    fn unix_time_seconds(&self) -> u32;

    /// Mints a fresh correlation id, typically a UUID v4 in its 36-character
    /// textual form.
    ///
    /// Only consulted when the caller did not supply a correlation id of its
    /// own at session setup.
    fn correlation_id(&mut self) -> String<CORRELATION_ID_SIZE>;
}
