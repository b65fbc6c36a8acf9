use bytes::Bytes;

use crate::error::Result;

/// A duplex byte channel that delivers input one line at a time.
///
/// This is the whole surface the protocol layers depend on, so a fake
/// implementation is enough to drive them without a serial device attached.
pub trait LineTransport {
    /// Write all of `bytes` and flush them to the device.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read one line, blocking until the line terminator arrives or the read
    /// deadline passes. The terminator is not included in the result.
    fn read_line(&mut self) -> Result<Bytes>;

    /// Flush and release the underlying channel. Further calls fail with
    /// [`TransportError::Closed`](crate::TransportError::Closed).
    fn close(&mut self) -> Result<()>;
}

impl<T: LineTransport + ?Sized> LineTransport for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn read_line(&mut self) -> Result<Bytes> {
        (**self).read_line()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<T: LineTransport + ?Sized> LineTransport for &mut T {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }

    fn read_line(&mut self) -> Result<Bytes> {
        (**self).read_line()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}
