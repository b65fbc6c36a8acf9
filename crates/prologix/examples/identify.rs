//! Identify the instrument at a GPIB address.
//!
//! ```text
//! cargo run --example identify -- /dev/ttyUSB0 22
//! ```

use std::num::ParseIntError;

use prologix::transport::TransportConfig;

const DEFAULT_ADDRESS: u8 = 22;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let port = args.next().unwrap_or_else(|| "/dev/ttyUSB0".to_string());
    let address = parse_address(args.next().as_deref())
        .map_err(|err| format!("invalid GPIB address: {err}"))?;

    let mut bridge = prologix::open(&TransportConfig::new(port))?;
    println!("bridge: {}", bridge.version()?);

    bridge.set_address(address)?;
    println!("instrument {address}: {}", bridge.query("*IDN?")?);

    bridge.go_to_local()?;
    bridge.close()?;
    Ok(())
}

fn parse_address(arg: Option<&str>) -> Result<u8, ParseIntError> {
    arg.map_or(Ok(DEFAULT_ADDRESS), |a| a.parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_defaults_when_absent() {
        assert_eq!(parse_address(None).unwrap(), DEFAULT_ADDRESS);
        assert_eq!(parse_address(Some("9")).unwrap(), 9);
    }

    #[test]
    fn unparsable_address_is_an_error() {
        assert!(parse_address(Some("twenty")).is_err());
        assert!(parse_address(Some("300")).is_err());
    }
}
