use std::fmt;
use std::io;

use prologix_dispatch::DispatchError;
use prologix_frame::FrameError;
use prologix_transport::TransportError;

// Exit codes follow sysexits-style conventions where one fits.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::BrokenPipe | io::ErrorKind::UnexpectedEof => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        TransportError::Open { ref source, .. }
            if source.kind() == serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        TransportError::Open { .. } | TransportError::Enumerate(_) => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
        TransportError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        TransportError::Disconnected | TransportError::Closed => {
            CliError::new(FAILURE, format!("{context}: {err}"))
        }
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Decode { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::ReservedPrefix
        | FrameError::InvalidArgument { .. }
        | FrameError::UnknownKeyword(_) => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn dispatch_error(context: &str, err: DispatchError) -> CliError {
    match err {
        DispatchError::Transport(err) => transport_error(context, err),
        DispatchError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        DispatchError::Frame(err) => frame_error(context, err),
        DispatchError::ContractViolation(_) => CliError::new(USAGE, format!("{context}: {err}")),
        DispatchError::Poisoned => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}
