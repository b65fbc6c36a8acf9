//! Control GPIB instruments through Prologix-compatible USB-GPIB bridges.
//!
//! prologix speaks the `++` command dialect understood by Prologix
//! controllers and the Arduino-based AR488 over a serial port: it frames and
//! escapes commands, routes bridge-control commands, and passes instrument
//! commands (SCPI or otherwise) through untouched.
//!
//! # Crate Structure
//!
//! - [`transport`] - Line-oriented serial transport and the `LineTransport` seam
//! - [`frame`] - Command model, escaping and wire framing
//! - [`dispatch`] - Dispatcher with typed bridge operations
//!
//! ```no_run
//! use prologix::transport::TransportConfig;
//!
//! # fn main() -> Result<(), prologix::DispatchError> {
//! let mut bridge = prologix::open(&TransportConfig::new("/dev/ttyUSB0"))?;
//! bridge.set_address(22)?;
//! let idn = bridge.query("*IDN?")?;
//! println!("{idn}");
//! bridge.close()?;
//! # Ok(())
//! # }
//! ```

/// Re-export transport types.
pub mod transport {
    pub use prologix_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use prologix_frame::*;
}

/// Re-export dispatcher types.
pub mod dispatch {
    pub use prologix_dispatch::*;
}

pub use prologix_dispatch::{open, DispatchError, Dispatcher, SharedDispatcher};
