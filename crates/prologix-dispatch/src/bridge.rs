//! Typed operations for bridge-control commands.
//!
//! Each method builds a `++keyword` command, checks its arguments against the
//! range the bridge accepts, and sends it through the dispatcher. Anything not
//! covered here can still be sent with [`Dispatcher::write`] or
//! [`Dispatcher::query`].

use std::fmt;

use prologix_frame::{BridgeCommand, Keyword, LogicalCommand, ResponseLine};
use prologix_transport::LineTransport;

use crate::dispatcher::Dispatcher;
use crate::error::{DispatchError, Result};

/// Lowest primary GPIB address accepted by `++addr`.
pub const MIN_ADDRESS: u8 = 1;
/// Highest primary GPIB address accepted by `++addr`.
pub const MAX_ADDRESS: u8 = 30;
/// Upper bound for `++read_tmo_ms`.
pub const MAX_READ_TIMEOUT_MS: u32 = 3000;

/// Read-after-write behaviour selected with `++auto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoMode {
    /// Never address the instrument to talk on its own.
    Off = 0,
    /// Read after every command sent to the instrument.
    On = 1,
    /// Read only after commands that end in `?`.
    OnQuery = 2,
    /// Keep reading continuously.
    Continuous = 3,
}

/// Role of the bridge on the bus, selected with `++mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Device = 0,
    Controller = 1,
}

/// Terminator the bridge appends to data sent to instruments (`++eos`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eos {
    CrLf = 0,
    Cr = 1,
    Lf = 2,
    None = 3,
}

macro_rules! numeric_setting {
    ($ty:ident, $what:literal, [$($variant:ident),+]) => {
        impl $ty {
            pub fn code(self) -> u8 {
                self as u8
            }
        }

        impl TryFrom<u8> for $ty {
            type Error = DispatchError;

            fn try_from(value: u8) -> Result<Self> {
                [$($ty::$variant),+]
                    .into_iter()
                    .find(|v| v.code() == value)
                    .ok_or_else(|| {
                        DispatchError::ContractViolation(format!(
                            concat!($what, " {} is not supported"),
                            value
                        ))
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.code())
            }
        }
    };
}

numeric_setting!(AutoMode, "auto mode", [Off, On, OnQuery, Continuous]);
numeric_setting!(Mode, "mode", [Device, Controller]);
numeric_setting!(Eos, "eos setting", [CrLf, Cr, Lf, None]);

fn check_address(address: u8) -> Result<u8> {
    if (MIN_ADDRESS..=MAX_ADDRESS).contains(&address) {
        Ok(address)
    } else {
        Err(DispatchError::ContractViolation(format!(
            "GPIB address {address} is outside {MIN_ADDRESS}..={MAX_ADDRESS}"
        )))
    }
}

fn with_arg(keyword: Keyword, arg: impl fmt::Display) -> Result<LogicalCommand> {
    Ok(BridgeCommand::with_arg(keyword, arg)?.into())
}

impl<T: LineTransport> Dispatcher<T> {
    /// Address the instrument at `address` (`++addr N`).
    ///
    /// In device mode this sets the bridge's own address instead.
    pub fn set_address(&mut self, address: u8) -> Result<()> {
        let address = check_address(address)?;
        self.send_only(&with_arg(Keyword::Addr, address)?)
    }

    /// Currently configured address (`++addr`).
    pub fn get_address(&mut self) -> Result<ResponseLine> {
        self.send_and_receive(&LogicalCommand::bridge(Keyword::Addr))
    }

    /// Bridge firmware version string (`++ver`).
    pub fn version(&mut self) -> Result<ResponseLine> {
        self.send_and_receive(&LogicalCommand::bridge(Keyword::Ver))
    }

    /// Select read-after-write behaviour (`++auto N`).
    pub fn set_auto(&mut self, mode: AutoMode) -> Result<()> {
        self.send_only(&with_arg(Keyword::Auto, mode)?)
    }

    /// Current auto mode as reported by the bridge (`++auto`).
    pub fn get_auto(&mut self) -> Result<ResponseLine> {
        self.send_and_receive(&LogicalCommand::bridge(Keyword::Auto))
    }

    /// Assert IFC, making the bridge controller-in-charge (`++ifc`).
    pub fn interface_clear(&mut self) -> Result<()> {
        self.send_only(&LogicalCommand::bridge(Keyword::Ifc))
    }

    /// Return the addressed instrument to front-panel control (`++loc`).
    pub fn go_to_local(&mut self) -> Result<()> {
        self.send_only(&LogicalCommand::bridge(Keyword::Loc))
    }

    /// Disable front-panel control of the addressed instrument (`++llo`).
    pub fn local_lockout(&mut self) -> Result<()> {
        self.send_only(&LogicalCommand::bridge(Keyword::Llo))
    }

    /// Send Selected Device Clear to the addressed instrument (`++clr`).
    pub fn device_clear(&mut self) -> Result<()> {
        self.send_only(&LogicalCommand::bridge(Keyword::Clr))
    }

    /// Send Group Execute Trigger to the addressed instrument (`++trg`).
    pub fn trigger(&mut self) -> Result<()> {
        self.send_only(&LogicalCommand::bridge(Keyword::Trg))
    }

    /// Reboot the bridge (`++rst`).
    pub fn reset_bridge(&mut self) -> Result<()> {
        self.send_only(&LogicalCommand::bridge(Keyword::Rst))
    }

    /// Switch between controller and device mode (`++mode N`).
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.send_only(&with_arg(Keyword::Mode, mode)?)
    }

    /// Assert EOI with the last byte sent to instruments (`++eoi 0|1`).
    pub fn set_eoi(&mut self, enabled: bool) -> Result<()> {
        self.send_only(&with_arg(Keyword::Eoi, u8::from(enabled))?)
    }

    /// Choose the terminator appended to instrument data (`++eos N`).
    pub fn set_eos(&mut self, eos: Eos) -> Result<()> {
        self.send_only(&with_arg(Keyword::Eos, eos)?)
    }

    /// Set the bridge's own GPIB read timeout (`++read_tmo_ms N`, 1..=3000).
    pub fn set_read_timeout_ms(&mut self, millis: u32) -> Result<()> {
        if !(1..=MAX_READ_TIMEOUT_MS).contains(&millis) {
            return Err(DispatchError::ContractViolation(format!(
                "read timeout {millis} ms is outside 1..={MAX_READ_TIMEOUT_MS}"
            )));
        }
        self.send_only(&with_arg(Keyword::ReadTmoMs, millis)?)
    }

    /// Read from the addressed instrument until EOI is asserted (`++read eoi`).
    pub fn read_until_eoi(&mut self) -> Result<ResponseLine> {
        self.send_and_receive(&with_arg(Keyword::Read, "eoi")?)
    }

    /// Serial-poll the addressed instrument, or the one at `address` (`++spoll [N]`).
    pub fn serial_poll(&mut self, address: Option<u8>) -> Result<ResponseLine> {
        let cmd = match address {
            Some(address) => with_arg(Keyword::Spoll, check_address(address)?)?,
            None => LogicalCommand::bridge(Keyword::Spoll),
        };
        self.send_and_receive(&cmd)
    }

    /// State of the SRQ line, `1` when asserted (`++srq`).
    pub fn service_request(&mut self) -> Result<ResponseLine> {
        self.send_and_receive(&LogicalCommand::bridge(Keyword::Srq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTransport;

    fn dispatcher(responses: &[&str]) -> Dispatcher<MockTransport> {
        Dispatcher::new(MockTransport::with_responses(responses))
    }

    #[test]
    fn set_address_accepts_range_edges() {
        let mut d = dispatcher(&[]);
        d.set_address(1).unwrap();
        assert_eq!(d.transport().wire(), b"++addr 1\r");

        let mut d = dispatcher(&[]);
        d.set_address(30).unwrap();
        assert_eq!(d.transport().wire(), b"++addr 30\r");
    }

    #[test]
    fn set_address_rejects_out_of_range_without_writing() {
        for address in [0, 31, 255] {
            let mut d = dispatcher(&[]);
            let err = d.set_address(address).unwrap_err();
            assert!(matches!(err, DispatchError::ContractViolation(_)), "{address}");
            assert!(d.transport().written.is_empty());
        }
    }

    #[test]
    fn get_address_queries_bridge() {
        let mut d = dispatcher(&["1"]);
        assert_eq!(d.get_address().unwrap(), "1");
        assert_eq!(d.transport().wire(), b"++addr\r");
    }

    #[test]
    fn version_query() {
        let mut d = dispatcher(&["AR488 GPIB controller, ver. 0.51.29, 18/03/2024\r"]);
        let version = d.version().unwrap();
        assert!(version.starts_with("AR488"));
        assert_eq!(d.transport().wire(), b"++ver\r");
    }

    #[test]
    fn auto_mode_set_and_query() {
        let mut d = dispatcher(&["2"]);
        d.set_auto(AutoMode::OnQuery).unwrap();
        assert_eq!(d.get_auto().unwrap(), "2");
        assert_eq!(d.transport().wire(), b"++auto 2\r++auto\r");
    }

    #[test]
    fn fire_and_forget_bus_commands() {
        let mut d = dispatcher(&[]);
        d.interface_clear().unwrap();
        d.go_to_local().unwrap();
        d.local_lockout().unwrap();
        d.device_clear().unwrap();
        d.trigger().unwrap();
        d.reset_bridge().unwrap();
        assert_eq!(
            d.transport().wire(),
            b"++ifc\r++loc\r++llo\r++clr\r++trg\r++rst\r"
        );
        assert_eq!(d.transport().reads, 0);
    }

    #[test]
    fn configuration_commands() {
        let mut d = dispatcher(&[]);
        d.set_mode(Mode::Controller).unwrap();
        d.set_eoi(true).unwrap();
        d.set_eos(Eos::Lf).unwrap();
        d.set_read_timeout_ms(500).unwrap();
        assert_eq!(
            d.transport().wire(),
            b"++mode 1\r++eoi 1\r++eos 2\r++read_tmo_ms 500\r"
        );
    }

    #[test]
    fn read_timeout_range_is_enforced() {
        let mut d = dispatcher(&[]);
        assert!(matches!(
            d.set_read_timeout_ms(0),
            Err(DispatchError::ContractViolation(_))
        ));
        assert!(matches!(
            d.set_read_timeout_ms(3001),
            Err(DispatchError::ContractViolation(_))
        ));
        assert!(d.transport().written.is_empty());
    }

    #[test]
    fn polling_and_reading() {
        let mut d = dispatcher(&["+1.23456E+00", "64", "16", "0"]);
        assert_eq!(d.read_until_eoi().unwrap(), "+1.23456E+00");
        assert_eq!(d.serial_poll(None).unwrap(), "64");
        assert_eq!(d.serial_poll(Some(9)).unwrap(), "16");
        assert_eq!(d.service_request().unwrap(), "0");
        assert_eq!(
            d.transport().wire(),
            b"++read eoi\r++spoll\r++spoll 9\r++srq\r"
        );
    }

    #[test]
    fn serial_poll_checks_address() {
        let mut d = dispatcher(&[]);
        assert!(matches!(
            d.serial_poll(Some(31)),
            Err(DispatchError::ContractViolation(_))
        ));
    }

    #[test]
    fn numeric_settings_convert_from_codes() {
        assert_eq!(AutoMode::try_from(3).unwrap(), AutoMode::Continuous);
        assert_eq!(Mode::try_from(0).unwrap(), Mode::Device);
        assert_eq!(Eos::try_from(1).unwrap(), Eos::Cr);
        assert!(matches!(
            AutoMode::try_from(4),
            Err(DispatchError::ContractViolation(_))
        ));
    }
}
