use std::fmt;
use std::ops::Deref;

use bytes::{BufMut, Bytes, BytesMut};

use crate::command::{BridgeCommand, Keyword, LogicalCommand, RawCommand};
use crate::error::{FrameError, Result};

/// Escape byte. Also the first byte of the bridge prefix.
pub const ESCAPE: u8 = b'+';

/// Ends every outbound command.
pub const COMMAND_TERMINATOR: u8 = b'\r';

const ARG_SEPARATOR: u8 = b' ';

/// Bytes ready to be written to the bridge: escaped, with one terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapedFrame(Bytes);

impl EscapedFrame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Wire size, terminator included.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for EscapedFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// One decoded line received from the bridge, without its terminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseLine(String);

impl ResponseLine {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for ResponseLine {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResponseLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ResponseLine {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ResponseLine {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

fn needs_escape(byte: u8) -> bool {
    matches!(byte, b'\r' | b'\n' | ESCAPE)
}

/// Append `payload` to `dst`, prefixing every `\r`, `\n` and `+` with [`ESCAPE`].
pub fn escape_into(payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(payload.len());
    for &byte in payload {
        if needs_escape(byte) {
            dst.put_u8(ESCAPE);
        }
        dst.put_u8(byte);
    }
}

/// Escape `payload` into a new buffer.
pub fn escape(payload: &[u8]) -> Bytes {
    let mut dst = BytesMut::with_capacity(payload.len());
    escape_into(payload, &mut dst);
    dst.freeze()
}

/// Reverse [`escape`]: every [`ESCAPE`] byte makes the following byte literal.
pub fn unescape(escaped: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(escaped.len());
    let mut bytes = escaped.iter().copied();
    while let Some(byte) = bytes.next() {
        if byte == ESCAPE {
            out.push(bytes.next().ok_or(FrameError::DanglingEscape)?);
        } else {
            out.push(byte);
        }
    }
    Ok(out)
}

/// Render `cmd` into `dst` in wire format.
///
/// Wire format:
/// ```text
/// bridge:  "++" keyword { " " escaped-arg } "\r"
/// raw:     escaped-payload "\r"
/// ```
/// The `++keyword` head is written as-is; only arguments and raw payloads
/// are escaped.
pub fn encode_command(cmd: &LogicalCommand, dst: &mut BytesMut) {
    match cmd {
        LogicalCommand::Bridge(bridge) => {
            dst.put_u8(ESCAPE);
            dst.put_u8(ESCAPE);
            dst.put_slice(bridge.keyword().as_str().as_bytes());
            for arg in bridge.args() {
                dst.put_u8(ARG_SEPARATOR);
                escape_into(arg.as_bytes(), dst);
            }
        }
        LogicalCommand::Raw(raw) => escape_into(raw.as_str().as_bytes(), dst),
    }
    dst.put_u8(COMMAND_TERMINATOR);
}

/// Serialize a command into a frame ready for the transport.
pub fn serialize(cmd: &LogicalCommand) -> EscapedFrame {
    let mut dst = BytesMut::new();
    encode_command(cmd, &mut dst);
    EscapedFrame(dst.freeze())
}

/// Decode one received line as UTF-8 text.
///
/// A single trailing `\r` is dropped, since bridges end replies with CR LF
/// and the transport has already consumed the LF. Nothing is un-escaped.
pub fn deserialize(raw: &[u8]) -> Result<ResponseLine> {
    let line = raw.strip_suffix(b"\r").unwrap_or(raw);
    match std::str::from_utf8(line) {
        Ok(text) => Ok(ResponseLine(text.to_string())),
        Err(source) => Err(FrameError::Decode {
            bytes: Bytes::copy_from_slice(raw),
            source,
        }),
    }
}

/// Recover the command a frame was serialized from.
///
/// This is the inverse of [`serialize`]: it strips the terminator, routes on
/// the unescaped `++` prefix and un-escapes the payload.
pub fn parse_frame(frame: &[u8]) -> Result<LogicalCommand> {
    let body = frame
        .strip_suffix(&[COMMAND_TERMINATOR])
        .ok_or(FrameError::MissingTerminator)?;

    if !body.starts_with(b"++") {
        let payload = decode_text(unescape(body)?)?;
        return Ok(LogicalCommand::Raw(RawCommand::new(payload)?));
    }

    let mut parts = body[2..].split(|&b| b == ARG_SEPARATOR);
    let name = text_of(parts.next().unwrap_or_default())?;
    let keyword = name.parse::<Keyword>()?;
    let args = parts
        .map(|arg| unescape(arg).and_then(decode_text))
        .collect::<Result<Vec<_>>>()?;
    Ok(LogicalCommand::Bridge(BridgeCommand::with_args(keyword, args)?))
}

fn text_of(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|source| FrameError::Decode {
        bytes: Bytes::copy_from_slice(bytes),
        source,
    })
}

fn decode_text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|err| {
        let source = err.utf8_error();
        FrameError::Decode {
            bytes: Bytes::from(err.into_bytes()),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> LogicalCommand {
        LogicalCommand::raw(text).unwrap()
    }

    /// Count terminators not preceded by an escape byte.
    fn unescaped_terminators(frame: &[u8]) -> usize {
        let mut count = 0;
        let mut escaped = false;
        for &byte in frame {
            if escaped {
                escaped = false;
            } else if byte == ESCAPE {
                escaped = true;
            } else if byte == COMMAND_TERMINATOR {
                count += 1;
            }
        }
        count
    }

    #[test]
    fn raw_query_frame_is_exact() {
        assert_eq!(serialize(&raw("*IDN?")).as_bytes(), b"*IDN?\r");
    }

    #[test]
    fn plus_inside_payload_is_doubled() {
        let frame = serialize(&raw("DISPLAY:TEXT \"50+50\""));
        assert_eq!(frame.as_bytes(), b"DISPLAY:TEXT \"50++50\"\r");
    }

    #[test]
    fn control_characters_are_escaped() {
        let frame = serialize(&raw("A\rB\nC"));
        assert_eq!(frame.as_bytes(), b"A+\rB+\nC\r");
    }

    #[test]
    fn empty_command_is_just_the_terminator() {
        let frame = serialize(&raw(""));
        assert_eq!(frame.as_bytes(), b"\r");
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn bridge_keyword_is_never_escaped() {
        let cmd = LogicalCommand::Bridge(BridgeCommand::with_arg(Keyword::Addr, 30).unwrap());
        assert_eq!(serialize(&cmd).as_bytes(), b"++addr 30\r");
        assert_eq!(
            serialize(&LogicalCommand::bridge(Keyword::ReadTmoMs)).as_bytes(),
            b"++read_tmo_ms\r"
        );
    }

    #[test]
    fn bridge_arguments_are_escaped() {
        let cmd =
            LogicalCommand::Bridge(BridgeCommand::with_arg(Keyword::Setvstr, "a+b").unwrap());
        assert_eq!(serialize(&cmd).as_bytes(), b"++setvstr a++b\r");
    }

    #[test]
    fn escape_is_applied_exactly_once() {
        assert_eq!(escape(b"+").as_ref(), b"++");
        assert_eq!(escape(b"++").as_ref(), b"++++");
        assert_eq!(escape(&escape(b"+")).as_ref(), b"++++");
    }

    #[test]
    fn every_frame_has_one_unescaped_terminator_at_the_end() {
        let payloads = [
            "", "x", "\r", "\n", "+", "\r\n", "a+\r", "+\n+", "\r\r\r", "ends with plus+",
            "x\r\n+\n\r+",
        ];
        for payload in payloads {
            let text = format!("P{payload}");
            let frame = serialize(&raw(&text));
            assert_eq!(frame.as_bytes().last(), Some(&COMMAND_TERMINATOR), "{text:?}");
            assert_eq!(unescaped_terminators(frame.as_bytes()), 1, "{text:?}");
        }
    }

    #[test]
    fn payloads_with_control_characters_round_trip() {
        let alphabet = ['\r', '\n', '+', 'a'];
        // Every string of length 1..=4 over the alphabet.
        for len in 1..=4u32 {
            for n in 0..alphabet.len().pow(len) {
                let mut payload = String::from("X");
                let mut rest = n;
                for _ in 0..len {
                    payload.push(alphabet[rest % alphabet.len()]);
                    rest /= alphabet.len();
                }
                let cmd = raw(&payload);
                let parsed = parse_frame(serialize(&cmd).as_bytes()).unwrap();
                assert_eq!(parsed, cmd, "{payload:?}");
            }
        }
    }

    #[test]
    fn bridge_commands_round_trip() {
        for text in ["++addr", "++addr 1", "++auto 2", "++spoll 3 4 5", "++ver"] {
            let cmd = LogicalCommand::parse(text).unwrap();
            assert_eq!(parse_frame(serialize(&cmd).as_bytes()).unwrap(), cmd);
        }
    }

    #[test]
    fn parse_frame_rejects_malformed_input() {
        assert!(matches!(
            parse_frame(b"*IDN?"),
            Err(FrameError::MissingTerminator)
        ));
        assert!(matches!(
            parse_frame(b"abc+\r"),
            Err(FrameError::DanglingEscape)
        ));
        assert!(matches!(
            parse_frame(b"++bogus 1\r"),
            Err(FrameError::UnknownKeyword(name)) if name == "bogus"
        ));
    }

    #[test]
    fn payload_starting_with_control_character_stays_raw() {
        let cmd = raw("\nFETCH?");
        let frame = serialize(&cmd);
        assert_eq!(frame.as_bytes(), b"+\nFETCH?\r");
        assert_eq!(parse_frame(frame.as_bytes()).unwrap(), cmd);
    }

    #[test]
    fn unescape_rejects_dangling_escape() {
        assert_eq!(unescape(b"50++50").unwrap(), b"50+50");
        assert!(matches!(unescape(b"x+"), Err(FrameError::DanglingEscape)));
    }

    #[test]
    fn deserialize_strips_carriage_return() {
        assert_eq!(deserialize(b"1").unwrap(), "1");
        assert_eq!(deserialize(b"AR488 GPIB controller\r").unwrap(), "AR488 GPIB controller");
        assert_eq!(deserialize(b"").unwrap(), "");
    }

    #[test]
    fn deserialize_does_not_unescape() {
        assert_eq!(deserialize(b"1++1").unwrap(), "1++1");
    }

    #[test]
    fn deserialize_keeps_bytes_of_invalid_text() {
        let err = deserialize(&[0x31, 0xFF, 0xFE]).unwrap_err();
        match err {
            FrameError::Decode { bytes, .. } => assert_eq!(bytes.as_ref(), &[0x31, 0xFF, 0xFE]),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
