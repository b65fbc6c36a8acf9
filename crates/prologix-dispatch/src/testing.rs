use std::collections::VecDeque;
use std::time::Duration;

use bytes::Bytes;
use prologix_transport::{LineTransport, Result, TransportError};

/// Records every write and answers reads from a queue of scripted lines.
///
/// An empty queue behaves like a silent device: `read_line` times out.
#[derive(Debug, Default)]
pub(crate) struct MockTransport {
    pub written: Vec<Vec<u8>>,
    pub responses: VecDeque<Result<Bytes>>,
    pub reads: usize,
    pub closed: bool,
}

impl MockTransport {
    pub fn with_responses(lines: &[&str]) -> Self {
        Self {
            responses: lines
                .iter()
                .map(|line| Ok(Bytes::copy_from_slice(line.as_bytes())))
                .collect(),
            ..Self::default()
        }
    }

    pub fn push_error(&mut self, err: TransportError) {
        self.responses.push_back(Err(err));
    }

    /// Everything written so far, concatenated.
    pub fn wire(&self) -> Vec<u8> {
        self.written.concat()
    }
}

impl LineTransport for MockTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.written.push(bytes.to_vec());
        Ok(())
    }

    fn read_line(&mut self) -> Result<Bytes> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.reads += 1;
        self.responses
            .pop_front()
            .unwrap_or(Err(TransportError::Timeout(Duration::from_millis(100))))
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
