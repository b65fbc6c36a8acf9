use prologix_frame::{deserialize, serialize, LogicalCommand, ResponseLine};
use prologix_transport::LineTransport;
use tracing::{debug, info};

use crate::error::Result;

/// Sends commands to a bridge over an exclusively owned transport.
///
/// Every exchange is a single write, optionally followed by reading exactly
/// one line. Methods take `&mut self`, so a dispatcher never has two
/// exchanges in flight; wrap it in a [`SharedDispatcher`](crate::SharedDispatcher)
/// to share it between threads.
///
/// The transport is released by [`close`](Self::close) or when the
/// dispatcher is dropped.
#[derive(Debug)]
pub struct Dispatcher<T: LineTransport> {
    transport: T,
}

impl<T: LineTransport> Dispatcher<T> {
    /// Take ownership of an open transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Serialize and write `cmd` without waiting for a response.
    pub fn send_only(&mut self, cmd: &LogicalCommand) -> Result<()> {
        let frame = serialize(cmd);
        debug!(command = %cmd, kind = ?cmd.kind(), bytes = frame.len(), "sending command");
        self.transport.write(frame.as_bytes())?;
        Ok(())
    }

    /// Send `cmd`, then read and decode exactly one response line.
    pub fn send_and_receive(&mut self, cmd: &LogicalCommand) -> Result<ResponseLine> {
        self.send_only(cmd)?;
        self.read_response()
    }

    /// Read and decode one line without sending anything first.
    ///
    /// Useful after commands whose reply arrives later, e.g. with the bridge
    /// in auto-read mode.
    pub fn read_response(&mut self) -> Result<ResponseLine> {
        let raw = self.transport.read_line()?;
        let line = deserialize(&raw)?;
        debug!(response = %line, "received response");
        Ok(line)
    }

    /// Parse `text` as a command and send it without waiting for a response.
    pub fn write(&mut self, text: &str) -> Result<()> {
        self.send_only(&LogicalCommand::parse(text)?)
    }

    /// Parse `text` as a command, send it and return the response line.
    pub fn query(&mut self, text: &str) -> Result<ResponseLine> {
        self.send_and_receive(&LogicalCommand::parse(text)?)
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give up the dispatcher and hand back its transport, still open.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Flush and release the transport.
    pub fn close(mut self) -> Result<()> {
        self.transport.close()?;
        info!("dispatcher closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use prologix_frame::{FrameError, Keyword};
    use prologix_transport::TransportError;

    use super::*;
    use crate::error::DispatchError;
    use crate::testing::MockTransport;

    #[test]
    fn raw_query_is_framed_and_answered() {
        let mut dispatcher = Dispatcher::new(MockTransport::with_responses(&[
            "HEWLETT-PACKARD,34401A,0,11-5-2",
        ]));

        let response = dispatcher.query("*IDN?").unwrap();

        assert_eq!(response, "HEWLETT-PACKARD,34401A,0,11-5-2");
        assert_eq!(dispatcher.transport().wire(), b"*IDN?\r");
    }

    #[test]
    fn send_only_never_reads() {
        let mut dispatcher = Dispatcher::new(MockTransport::default());
        dispatcher.write("DISP OFF").unwrap();

        assert_eq!(dispatcher.transport().wire(), b"DISP OFF\r");
        assert_eq!(dispatcher.transport().reads, 0);
    }

    #[test]
    fn payload_plus_is_escaped_on_the_wire() {
        let mut dispatcher = Dispatcher::new(MockTransport::default());
        dispatcher.write("DISPLAY:TEXT \"50+50\"").unwrap();
        assert_eq!(dispatcher.transport().wire(), b"DISPLAY:TEXT \"50++50\"\r");
    }

    #[test]
    fn bridge_query_reads_one_line() {
        let mut dispatcher = Dispatcher::new(MockTransport::with_responses(&["1\r", "extra"]));

        let response = dispatcher
            .send_and_receive(&LogicalCommand::bridge(Keyword::Addr))
            .unwrap();

        assert_eq!(response, "1");
        assert_eq!(dispatcher.transport().wire(), b"++addr\r");
        assert_eq!(dispatcher.transport().reads, 1);
        assert_eq!(dispatcher.transport().responses.len(), 1);
    }

    #[test]
    fn silent_device_times_out() {
        let mut dispatcher = Dispatcher::new(MockTransport::default());
        let err = dispatcher.query("SYST:VERS?").unwrap_err();
        assert!(matches!(err, DispatchError::Timeout(_)));
    }

    #[test]
    fn io_failure_is_not_a_timeout() {
        let mut mock = MockTransport::default();
        mock.push_error(TransportError::Io(std::io::Error::other("cable pulled")));
        let mut dispatcher = Dispatcher::new(mock);

        let err = dispatcher.query("*IDN?").unwrap_err();
        assert!(matches!(err, DispatchError::Transport(TransportError::Io(_))));
    }

    #[test]
    fn undecodable_response_keeps_raw_bytes() {
        let mut mock = MockTransport::default();
        mock.responses
            .push_back(Ok(bytes::Bytes::from_static(&[0xC3, 0x28])));
        let mut dispatcher = Dispatcher::new(mock);

        let err = dispatcher.query("*IDN?").unwrap_err();
        match err {
            DispatchError::Frame(FrameError::Decode { bytes, .. }) => {
                assert_eq!(bytes.as_ref(), &[0xC3, 0x28])
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_text_is_rejected_before_writing() {
        let mut dispatcher = Dispatcher::new(MockTransport::default());
        let err = dispatcher.write("++nonsense").unwrap_err();
        assert!(matches!(err, DispatchError::Frame(FrameError::ReservedPrefix)));
        assert!(dispatcher.transport().written.is_empty());

        let err = dispatcher.write("++addr\r5").unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Frame(FrameError::InvalidArgument { keyword: "addr", .. })
        ));
        assert!(dispatcher.transport().written.is_empty());
    }

    #[test]
    fn close_marks_transport_closed() {
        let mut mock = MockTransport::default();
        {
            let dispatcher = Dispatcher::new(&mut mock);
            dispatcher.close().unwrap();
        }
        assert!(mock.closed);
        assert!(mock.written.is_empty());
    }
}
