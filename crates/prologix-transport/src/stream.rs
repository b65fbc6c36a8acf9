use std::io::{self, ErrorKind, Read, Write};
use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::traits::LineTransport;

/// Byte that ends every line the bridge sends back.
pub const LINE_TERMINATOR: u8 = b'\n';

const INITIAL_BUFFER_CAPACITY: usize = 1024;
const READ_CHUNK_SIZE: usize = 256;

/// Applies a timeout to the underlying stream before it blocks.
///
/// Streams with their own read timeout (serial ports) install one so a single
/// blocking read never outlives the line deadline.
pub type StreamTimeoutHook<T> = fn(&mut T, Duration) -> io::Result<()>;

/// [`LineTransport`] over any `Read + Write` byte stream.
///
/// Handles partial reads internally: bytes that arrive after a line
/// terminator are kept for the next [`read_line`](LineTransport::read_line).
/// The wrapped stream is released by [`close`](LineTransport::close) or when
/// the transport is dropped, whichever comes first.
pub struct StreamTransport<T: Read + Write> {
    inner: Option<T>,
    buf: BytesMut,
    // Prefix of `buf` already known to hold no terminator.
    scanned: usize,
    timeout: Duration,
    timeout_hook: Option<StreamTimeoutHook<T>>,
}

impl<T: Read + Write> StreamTransport<T> {
    /// Wrap `inner`, giving each `read_line` call `timeout` to complete.
    pub fn new(inner: T, timeout: Duration) -> Self {
        Self {
            inner: Some(inner),
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            scanned: 0,
            timeout,
            timeout_hook: None,
        }
    }

    /// Call `hook` with the time left until the line deadline before every
    /// blocking read, and with the full timeout before every write.
    pub fn with_timeout_hook(mut self, hook: StreamTimeoutHook<T>) -> Self {
        self.timeout_hook = Some(hook);
        self
    }

    /// Current read deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Change the read deadline for subsequent lines.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Whether the transport still owns its stream.
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Borrow the underlying stream, if still open.
    pub fn get_ref(&self) -> Option<&T> {
        self.inner.as_ref()
    }

    /// Mutably borrow the underlying stream, if still open.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.inner.as_mut()
    }

    /// Detach the underlying stream without flushing it.
    pub fn into_inner(mut self) -> Option<T> {
        self.inner.take()
    }

    fn stream(&mut self) -> Result<&mut T> {
        self.inner.as_mut().ok_or(TransportError::Closed)
    }

    fn take_line(&mut self) -> Option<Bytes> {
        let Some(offset) = self.buf[self.scanned..]
            .iter()
            .position(|&b| b == LINE_TERMINATOR)
        else {
            self.scanned = self.buf.len();
            return None;
        };
        let pos = self.scanned + offset;
        self.scanned = 0;
        let mut line = self.buf.split_to(pos + 1);
        line.truncate(pos);
        Some(line.freeze())
    }

    fn apply_timeout(&mut self, timeout: Duration) -> Result<()> {
        let Some(hook) = self.timeout_hook else {
            return Ok(());
        };
        hook(self.stream()?, timeout).map_err(TransportError::Io)
    }
}

impl<T: Read + Write> LineTransport for StreamTransport<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.apply_timeout(self.timeout)?;
        let stream = self.stream()?;

        let mut offset = 0usize;
        while offset < bytes.len() {
            match stream.write(&bytes[offset..]) {
                Ok(0) => return Err(TransportError::Disconnected),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        flush(stream)?;
        debug!(bytes = bytes.len(), "wrote to transport");
        Ok(())
    }

    fn read_line(&mut self) -> Result<Bytes> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(line) = self.take_line() {
                debug!(bytes = line.len(), "read line from transport");
                return Ok(line);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(TransportError::Timeout(self.timeout));
            }
            self.apply_timeout(deadline - now)?;

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let stream = self.stream()?;
            let read = match stream.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) =>
                {
                    return Err(TransportError::Timeout(self.timeout));
                }
                Err(err) => return Err(TransportError::Io(err)),
            };

            if read == 0 {
                return Err(TransportError::Disconnected);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    fn close(&mut self) -> Result<()> {
        self.buf.clear();
        self.scanned = 0;
        match self.inner.take() {
            Some(mut stream) => {
                flush(&mut stream)?;
                debug!("transport closed");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<T: Read + Write> Drop for StreamTransport<T> {
    fn drop(&mut self) {
        if let Some(mut stream) = self.inner.take() {
            if let Err(err) = flush(&mut stream) {
                warn!(error = %err, "flush on drop failed");
            }
        }
    }
}

impl<T: Read + Write> std::fmt::Debug for StreamTransport<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTransport")
            .field("open", &self.inner.is_some())
            .field("buffered", &self.buf.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn flush<T: Write>(stream: &mut T) -> Result<()> {
    loop {
        match stream.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        }
    }
}
