use std::time::Duration;

use prologix_frame::FrameError;
use prologix_transport::TransportError;

/// Errors that can occur in dispatcher operations.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Transport-level error: the port could not be opened, or I/O failed.
    #[error("transport error: {0}")]
    Transport(TransportError),

    /// No complete response line arrived within the read deadline.
    #[error("response timed out after {0:?}")]
    Timeout(Duration),

    /// A command could not be built, or a response could not be decoded.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// An argument is outside the range the bridge accepts. Nothing was sent.
    #[error("contract violation: {0}")]
    ContractViolation(String),

    /// A caller sharing this dispatcher panicked mid-exchange. Its reply may
    /// still be queued on the transport, so the dispatcher is refused.
    #[error("shared dispatcher is poisoned by a panicked caller")]
    Poisoned,
}

impl From<TransportError> for DispatchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(after) => DispatchError::Timeout(after),
            other => DispatchError::Transport(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_timeout_is_lifted() {
        let err = DispatchError::from(TransportError::Timeout(Duration::from_millis(250)));
        assert!(matches!(err, DispatchError::Timeout(d) if d == Duration::from_millis(250)));
    }

    #[test]
    fn other_transport_errors_stay_wrapped() {
        let err = DispatchError::from(TransportError::Disconnected);
        assert!(matches!(
            err,
            DispatchError::Transport(TransportError::Disconnected)
        ));
    }
}
