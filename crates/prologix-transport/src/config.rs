use std::time::Duration;

/// Where a USB bridge usually enumerates on Linux.
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Default baud rate. USB-CDC bridges ignore it, UART bridges do not.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default read deadline for a single response line.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Construction-time configuration for a serial transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Endpoint identifier, e.g. `/dev/ttyUSB0` or `COM3`.
    pub port: String,
    /// Line speed in bits per second.
    pub baud_rate: u32,
    /// Deadline for reading one complete response line.
    pub timeout: Duration,
}

impl TransportConfig {
    /// Configuration for `port` with default baud rate and timeout.
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
