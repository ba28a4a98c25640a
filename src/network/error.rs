//! Common error types for network operations

/// A common error type for network and protocol operations.
///
/// This enum covers both transport-level failures and the outcomes the
/// tracking backend can signal through HTTP status codes. It is designed to
/// be simple and portable for `no_std` environments. Every client operation
/// resolves to exactly one of these values (or success); none of them leave
/// the session in a half-updated state.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// An argument failed eager validation; no I/O was performed.
    InvalidInput,
    /// A destination buffer was too small for the data it had to hold.
    CapacityExceeded,
    /// The device clock disagrees with the server clock. The session's skew
    /// offset has been recomputed; retrying once with it usually succeeds.
    TimeMismatch,
    /// The server rejected the request as malformed (HTTP 400).
    BadRequest,
    /// The server rejected the credentials or token (HTTP 401).
    Unauthorized,
    /// The server refused access for this device (HTTP 403).
    Forbidden,
    /// The requested resource does not exist (HTTP 404).
    NotFound,
    /// The device has not been claimed to an account yet (HTTP 412).
    DeviceUnclaimed,
    /// The server is throttling this device (HTTP 429), or the locally
    /// recorded throttle deadline has not passed yet.
    TooManyRequests,
    /// An operation was attempted on a connection that is not open.
    NotOpen,
    /// An error occurred during a write operation.
    WriteError,
    /// An error occurred during a read operation.
    ReadError,
    /// A connection attempt was refused.
    ConnectionRefused,
    /// A timeout occurred.
    Timeout,
    /// The connection was closed before the exchange completed.
    ConnectionClosed,
    /// The response could not be parsed, or violated the protocol.
    ProtocolError,
}

impl From<crate::buffer::CapacityError> for Error {
    fn from(_: crate::buffer::CapacityError) -> Self {
        Error::CapacityExceeded
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::InvalidInput => defmt::write!(f, "InvalidInput"),
            Error::CapacityExceeded => defmt::write!(f, "CapacityExceeded"),
            Error::TimeMismatch => defmt::write!(f, "TimeMismatch"),
            Error::BadRequest => defmt::write!(f, "BadRequest"),
            Error::Unauthorized => defmt::write!(f, "Unauthorized"),
            Error::Forbidden => defmt::write!(f, "Forbidden"),
            Error::NotFound => defmt::write!(f, "NotFound"),
            Error::DeviceUnclaimed => defmt::write!(f, "DeviceUnclaimed"),
            Error::TooManyRequests => defmt::write!(f, "TooManyRequests"),
            Error::NotOpen => defmt::write!(f, "NotOpen"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::ReadError => defmt::write!(f, "ReadError"),
            Error::ConnectionRefused => defmt::write!(f, "ConnectionRefused"),
            Error::Timeout => defmt::write!(f, "Timeout"),
            Error::ConnectionClosed => defmt::write!(f, "ConnectionClosed"),
            Error::ProtocolError => defmt::write!(f, "ProtocolError"),
        }
    }
}
