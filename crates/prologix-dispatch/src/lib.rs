//! Command dispatch for Prologix-style USB-GPIB bridges.
//!
//! This is the layer applications talk to. Open a bridge, send bridge-control
//! commands through typed methods, and pass any other instrument command
//! through unmodified (apart from escaping).

pub mod bridge;
pub mod connector;
pub mod dispatcher;
pub mod error;
pub mod shared;

#[cfg(test)]
mod testing;

pub use bridge::{AutoMode, Eos, Mode, MAX_ADDRESS, MAX_READ_TIMEOUT_MS, MIN_ADDRESS};
pub use connector::open;
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, Result};
pub use shared::SharedDispatcher;
