use prologix_transport::{SerialTransport, TransportConfig};

use crate::dispatcher::Dispatcher;
use crate::error::Result;

/// Open the serial port in `config` and wrap it in a dispatcher.
///
/// Fails with [`DispatchError::Transport`](crate::DispatchError::Transport)
/// when the port cannot be opened; nothing is retried.
pub fn open(config: &TransportConfig) -> Result<Dispatcher<SerialTransport>> {
    let transport = prologix_transport::open(config)?;
    Ok(Dispatcher::new(transport))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use prologix_transport::TransportError;

    use super::*;
    use crate::error::DispatchError;

    #[test]
    fn open_missing_port_fails_at_construction() {
        let config = TransportConfig {
            port: "/dev/prologix-dispatch-missing".to_string(),
            timeout: Duration::from_millis(50),
            ..TransportConfig::default()
        };
        let err = open(&config).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Transport(TransportError::Open { .. })
        ));
    }
}
