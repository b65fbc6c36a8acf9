//! Line-oriented transport for Prologix-style USB-GPIB bridges.
//!
//! This is the lowest layer of prologix. It knows nothing about commands or
//! escaping: it writes byte sequences and hands back one received line at a
//! time. Everything else builds on the [`LineTransport`] trait provided here.

pub mod config;
pub mod error;
pub mod serial;
pub mod stream;
pub mod traits;

pub use config::{TransportConfig, DEFAULT_BAUD_RATE, DEFAULT_PORT, DEFAULT_TIMEOUT};
pub use error::{Result, TransportError};
pub use serial::{available_ports, open, PortInfo, SerialTransport};
pub use stream::{StreamTimeoutHook, StreamTransport, LINE_TERMINATOR};
pub use traits::LineTransport;
