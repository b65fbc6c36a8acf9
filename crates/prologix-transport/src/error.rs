use std::time::Duration;

/// Errors that can occur in transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The serial port could not be opened (bad name, permissions, device absent).
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    /// Serial ports could not be enumerated.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(serialport::Error),

    /// An I/O error occurred on an open transport.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No complete line arrived before the read deadline.
    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    /// The stream reached end-of-file before a complete line was received.
    #[error("connection closed (incomplete line)")]
    Disconnected,

    /// The transport has already been closed.
    #[error("transport closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TransportError>;
