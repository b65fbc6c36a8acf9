use std::fmt;
use std::str::FromStr;

use crate::error::{FrameError, Result};

/// Marks a command addressed to the bridge rather than the instrument.
pub const BRIDGE_PREFIX: &str = "++";

/// Bridge-control keywords: the Prologix set plus the AR488 extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Addr,
    Auto,
    Clr,
    Eoi,
    Eos,
    EotEnable,
    EotChar,
    Help,
    Ifc,
    Llo,
    Loc,
    Lon,
    Mode,
    Read,
    ReadTmoMs,
    Rst,
    Savecfg,
    Spoll,
    Srq,
    Status,
    Trg,
    Ver,
    // AR488 extensions
    Allspoll,
    Dl,
    Default,
    Macro,
    Ppoll,
    Setvstr,
    Srqauto,
    Repeat,
    Tmbus,
    Verbose,
}

impl Keyword {
    /// Every known keyword.
    pub const ALL: [Keyword; 32] = [
        Keyword::Addr,
        Keyword::Auto,
        Keyword::Clr,
        Keyword::Eoi,
        Keyword::Eos,
        Keyword::EotEnable,
        Keyword::EotChar,
        Keyword::Help,
        Keyword::Ifc,
        Keyword::Llo,
        Keyword::Loc,
        Keyword::Lon,
        Keyword::Mode,
        Keyword::Read,
        Keyword::ReadTmoMs,
        Keyword::Rst,
        Keyword::Savecfg,
        Keyword::Spoll,
        Keyword::Srq,
        Keyword::Status,
        Keyword::Trg,
        Keyword::Ver,
        Keyword::Allspoll,
        Keyword::Dl,
        Keyword::Default,
        Keyword::Macro,
        Keyword::Ppoll,
        Keyword::Setvstr,
        Keyword::Srqauto,
        Keyword::Repeat,
        Keyword::Tmbus,
        Keyword::Verbose,
    ];

    /// The keyword as it appears on the wire, without the `++` prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Addr => "addr",
            Keyword::Auto => "auto",
            Keyword::Clr => "clr",
            Keyword::Eoi => "eoi",
            Keyword::Eos => "eos",
            Keyword::EotEnable => "eot_enable",
            Keyword::EotChar => "eot_char",
            Keyword::Help => "help",
            Keyword::Ifc => "ifc",
            Keyword::Llo => "llo",
            Keyword::Loc => "loc",
            Keyword::Lon => "lon",
            Keyword::Mode => "mode",
            Keyword::Read => "read",
            Keyword::ReadTmoMs => "read_tmo_ms",
            Keyword::Rst => "rst",
            Keyword::Savecfg => "savecfg",
            Keyword::Spoll => "spoll",
            Keyword::Srq => "srq",
            Keyword::Status => "status",
            Keyword::Trg => "trg",
            Keyword::Ver => "ver",
            Keyword::Allspoll => "allspoll",
            Keyword::Dl => "dl",
            Keyword::Default => "default",
            Keyword::Macro => "macro",
            Keyword::Ppoll => "ppoll",
            Keyword::Setvstr => "setvstr",
            Keyword::Srqauto => "srqauto",
            Keyword::Repeat => "repeat",
            Keyword::Tmbus => "tmbus",
            Keyword::Verbose => "verbose",
        }
    }

    /// Look up a keyword by its wire spelling. Matching is exact.
    pub fn lookup(name: &str) -> Option<Keyword> {
        Self::ALL.iter().copied().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Keyword {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::lookup(s).ok_or_else(|| FrameError::UnknownKeyword(s.to_string()))
    }
}

/// A command for the bridge itself: `++keyword [arg ...]`.
///
/// Arguments are non-empty and contain no whitespace; they are separated by a
/// single space on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeCommand {
    keyword: Keyword,
    args: Vec<String>,
}

impl BridgeCommand {
    /// A bridge command without arguments (usually a query).
    pub fn new(keyword: Keyword) -> Self {
        Self {
            keyword,
            args: Vec::new(),
        }
    }

    /// A bridge command with a single argument.
    pub fn with_arg(keyword: Keyword, arg: impl fmt::Display) -> Result<Self> {
        Self::with_args(keyword, [arg.to_string()])
    }

    /// A bridge command with any number of arguments.
    pub fn with_args<I, S>(keyword: Keyword, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args = args
            .into_iter()
            .map(Into::into)
            .map(|arg: String| {
                if arg.is_empty() || arg.chars().any(char::is_whitespace) {
                    Err(FrameError::InvalidArgument {
                        keyword: keyword.as_str(),
                        arg,
                    })
                } else {
                    Ok(arg)
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { keyword, args })
    }

    pub fn keyword(&self) -> Keyword {
        self.keyword
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for BridgeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{BRIDGE_PREFIX}{}", self.keyword)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// An opaque instrument command, forwarded to the addressed device.
///
/// The payload never starts with `+`: the bridge would route it to itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommand(String);

impl RawCommand {
    pub fn new(payload: impl Into<String>) -> Result<Self> {
        let payload = payload.into();
        if payload.starts_with('+') {
            return Err(FrameError::ReservedPrefix);
        }
        Ok(Self(payload))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for RawCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which way a command string is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Bridge,
    Raw,
}

/// Classify command text: `++` followed by a known keyword is a bridge
/// command, anything else is passed through to the instrument.
///
/// The keyword ends at the first whitespace character or the end of the text.
pub fn classify(text: &str) -> CommandKind {
    let Some(rest) = text.strip_prefix(BRIDGE_PREFIX) else {
        return CommandKind::Raw;
    };
    let name = rest.split(char::is_whitespace).next().unwrap_or_default();
    match Keyword::lookup(name) {
        Some(_) => CommandKind::Bridge,
        None => CommandKind::Raw,
    }
}

/// One command to send: either for the bridge or for the instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalCommand {
    Bridge(BridgeCommand),
    Raw(RawCommand),
}

impl LogicalCommand {
    /// Parse command text as a user would type it, e.g. `++auto 2` or `*IDN?`.
    ///
    /// Bridge arguments are split on whitespace; a CR or LF after the keyword
    /// is rejected instead. Text starting with `+` that is not a known bridge
    /// command is rejected rather than forwarded.
    pub fn parse(text: &str) -> Result<Self> {
        match classify(text) {
            CommandKind::Bridge => {
                let rest = &text[BRIDGE_PREFIX.len()..];
                let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
                let keyword = rest[..name_end].parse::<Keyword>()?;
                let tail = &rest[name_end..];
                if tail.contains(['\r', '\n']) {
                    return Err(FrameError::InvalidArgument {
                        keyword: keyword.as_str(),
                        arg: tail.to_string(),
                    });
                }
                Ok(Self::Bridge(BridgeCommand::with_args(
                    keyword,
                    tail.split_whitespace(),
                )?))
            }
            CommandKind::Raw => Ok(Self::Raw(RawCommand::new(text)?)),
        }
    }

    /// Shorthand for a pass-through instrument command.
    pub fn raw(payload: impl Into<String>) -> Result<Self> {
        RawCommand::new(payload).map(Self::Raw)
    }

    /// Shorthand for an argument-less bridge command.
    pub fn bridge(keyword: Keyword) -> Self {
        Self::Bridge(BridgeCommand::new(keyword))
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Bridge(_) => CommandKind::Bridge,
            Self::Raw(_) => CommandKind::Raw,
        }
    }
}

impl fmt::Display for LogicalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bridge(cmd) => cmd.fmt(f),
            Self::Raw(cmd) => cmd.fmt(f),
        }
    }
}

impl FromStr for LogicalCommand {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<BridgeCommand> for LogicalCommand {
    fn from(cmd: BridgeCommand) -> Self {
        Self::Bridge(cmd)
    }
}

impl From<RawCommand> for LogicalCommand {
    fn from(cmd: RawCommand) -> Self {
        Self::Raw(cmd)
    }
}
