use std::io;
use std::time::Duration;

use serialport::{SerialPort, SerialPortType};
use tracing::{debug, info};

use crate::config::TransportConfig;
use crate::error::{Result, TransportError};
use crate::stream::StreamTransport;

/// Transport over an open serial port.
pub type SerialTransport = StreamTransport<Box<dyn SerialPort>>;

/// Open the serial port described by `config`.
///
/// Before each blocking read the port's own timeout is cut to whatever is
/// left of the line deadline, so a reply that trickles in late cannot stretch
/// a read past the configured timeout.
pub fn open(config: &TransportConfig) -> Result<SerialTransport> {
    let port = serialport::new(config.port.as_str(), config.baud_rate)
        .timeout(config.timeout)
        .open()
        .map_err(|source| TransportError::Open {
            port: config.port.clone(),
            source,
        })?;

    info!(
        port = %config.port,
        baud_rate = config.baud_rate,
        timeout = ?config.timeout,
        "opened serial port"
    );

    Ok(StreamTransport::new(port, config.timeout).with_timeout_hook(set_port_timeout))
}

fn set_port_timeout(port: &mut Box<dyn SerialPort>, timeout: Duration) -> io::Result<()> {
    port.set_timeout(timeout).map_err(io::Error::from)
}

/// A serial device that may have a bridge attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// Name to pass as [`TransportConfig::port`].
    pub name: String,
    /// `usb`, `pci`, `bluetooth` or `unknown`.
    pub kind: &'static str,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
}

impl PortInfo {
    fn from_serialport(info: serialport::SerialPortInfo) -> Self {
        let mut port = Self {
            name: info.port_name,
            kind: "unknown",
            vid: None,
            pid: None,
            manufacturer: None,
            product: None,
            serial_number: None,
        };

        match info.port_type {
            SerialPortType::UsbPort(usb) => {
                port.kind = "usb";
                port.vid = Some(usb.vid);
                port.pid = Some(usb.pid);
                port.manufacturer = usb.manufacturer;
                port.product = usb.product;
                port.serial_number = usb.serial_number;
            }
            SerialPortType::PciPort => port.kind = "pci",
            SerialPortType::BluetoothPort => port.kind = "bluetooth",
            SerialPortType::Unknown => {}
        }

        port
    }
}

/// List serial devices visible to this host.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;
    debug!(count = ports.len(), "enumerated serial ports");
    Ok(ports.into_iter().map(PortInfo::from_serialport).collect())
}
