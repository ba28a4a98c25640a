//! Buffered request writer with chunked-transfer-encoding framing.
//!
//! [`ChunkedWriter`] stages outgoing bytes in a [`ByteBuffer`] and pushes
//! them to the transport whenever the staging area fills, so a request of
//! any size can be produced from a small fixed buffer. The same writer
//! frames streamed request bodies as HTTP chunks via
//! [`ChunkedWriter::write_chunk`].

use crate::buffer::{ByteBuffer, Radix};
use crate::network::Write;
use crate::network::error::Error;

/// Staged writer over a transport.
///
/// Bytes accumulate in the staging buffer and are flushed to the transport
/// when the buffer fills exactly to capacity, or explicitly via
/// [`flush`](ChunkedWriter::flush). A transport failure aborts the whole
/// write chain; bytes already handed to the transport are not retried.
#[derive(Debug)]
pub struct ChunkedWriter<'a, 'b, W: Write> {
    staging: &'a mut ByteBuffer<'b>,
    transport: &'a mut W,
}

impl<'a, 'b, W: Write> ChunkedWriter<'a, 'b, W> {
    /// Wraps `staging` and `transport`. The staging buffer is used as-is;
    /// any bytes already in it are flushed with the first overflow.
    pub fn new(staging: &'a mut ByteBuffer<'b>, transport: &'a mut W) -> Self {
        Self { staging, transport }
    }

    /// Appends `data`, flushing as many times as the staging buffer fills.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), Error> {
        let mut rest = data;
        while !rest.is_empty() {
            let take = self.staging.free().min(rest.len());
            // `take` never exceeds free space, so the append cannot fail.
            self.staging.append_bytes(&rest[..take])?;
            rest = &rest[take..];
            if self.staging.is_full() {
                self.flush()?;
            }
        }
        Ok(())
    }

    /// Appends the UTF-8 bytes of `s`.
    pub fn write_str(&mut self, s: &str) -> Result<(), Error> {
        self.write_bytes(s.as_bytes())
    }

    /// Appends a single ASCII character.
    pub fn write_char(&mut self, c: char) -> Result<(), Error> {
        let mut utf8 = [0u8; 4];
        self.write_bytes(c.encode_utf8(&mut utf8).as_bytes())
    }

    /// Appends the minimal textual representation of `value`.
    pub fn write_uint(&mut self, value: u32, radix: Radix) -> Result<(), Error> {
        let mut scratch = [0u8; 10];
        let mut text = ByteBuffer::new(&mut scratch);
        text.append_uint(value, radix)?;
        self.write_bytes(text.as_slice())
    }

    /// Frames `data` as one HTTP chunk: `<hex length>\r\n<data>\r\n`.
    ///
    /// An empty `data` produces the terminating zero chunk `0\r\n\r\n`,
    /// which has no data section.
    pub fn write_chunk(&mut self, data: &[u8]) -> Result<(), Error> {
        // `data.len()` fits u32 on every supported target; request chunks
        // are bounded by the caller's staging sizes anyway.
        self.write_uint(data.len() as u32, Radix::Hex)?;
        self.write_str("\r\n")?;
        if !data.is_empty() {
            self.write_bytes(data)?;
            self.write_str("\r\n")?;
        } else {
            self.write_str("\r\n")?;
        }
        Ok(())
    }

    /// Pushes any staged bytes to the transport. No-op when nothing is
    /// staged.
    pub fn flush(&mut self) -> Result<(), Error> {
        if self.staging.is_empty() {
            return Ok(());
        }
        let mut written = 0;
        let bytes = self.staging.as_slice();
        while written < bytes.len() {
            match self.transport.write(&bytes[written..]) {
                Ok(0) => return Err(Error::WriteError),
                Ok(n) => written += n,
                Err(_) => return Err(Error::WriteError),
            }
        }
        self.staging.clear();
        Ok(())
    }
}
