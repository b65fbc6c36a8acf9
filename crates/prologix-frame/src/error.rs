use bytes::Bytes;

/// Errors that can occur while building, framing or decoding commands.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A received line is not valid UTF-8. The raw bytes are kept for diagnostics.
    #[error("response is not valid UTF-8 ({} bytes): {source}", .bytes.len())]
    Decode {
        bytes: Bytes,
        source: std::str::Utf8Error,
    },

    /// A pass-through command starts with `+` and would be taken for a bridge command.
    #[error("instrument command must not start with '+'")]
    ReservedPrefix,

    /// A bridge command argument is empty or contains whitespace.
    #[error("invalid argument {arg:?} for ++{keyword}")]
    InvalidArgument { keyword: &'static str, arg: String },

    /// The keyword after `++` is not a known bridge command.
    #[error("unknown bridge command: ++{0}")]
    UnknownKeyword(String),

    /// An escape byte was the last byte of the escaped data.
    #[error("dangling escape character at end of data")]
    DanglingEscape,

    /// A frame does not end with the command terminator.
    #[error("frame is missing its terminator")]
    MissingTerminator,
}

pub type Result<T> = std::result::Result<T, FrameError>;
