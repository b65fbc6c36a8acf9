//! Command model and wire framing for the Prologix GPIB bridge dialect.
//!
//! Every outbound command is rendered as text and terminated with a single
//! carriage return:
//! - bridge-control commands start with an unescaped `++keyword`
//! - everything else is passed through to the addressed instrument
//! - `\r`, `\n` and `+` inside payloads and arguments are escaped with `+`
//!
//! Responses are single lines of UTF-8 text.

pub mod codec;
pub mod command;
pub mod error;

pub use codec::{
    deserialize, encode_command, escape, escape_into, parse_frame, serialize, unescape,
    EscapedFrame, ResponseLine, COMMAND_TERMINATOR, ESCAPE,
};
pub use command::{
    classify, BridgeCommand, CommandKind, Keyword, LogicalCommand, RawCommand, BRIDGE_PREFIX,
};
pub use error::{FrameError, Result};
