use std::time::Duration;

use clap::{Args, Subcommand};
use prologix_dispatch::Dispatcher;
use prologix_transport::{SerialTransport, TransportConfig, DEFAULT_PORT};
use tracing::debug;

use crate::exit::{dispatch_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod bridge;
pub mod exchange;
pub mod ports;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a command without waiting for a response.
    Write(CommandArgs),
    /// Send a command and print the one-line response.
    Query(CommandArgs),
    /// Show the current GPIB address, or select a new one.
    Addr(AddrArgs),
    /// Print the bridge firmware version.
    Ver,
    /// Show the auto-read mode, or change it.
    Auto(AutoArgs),
    /// Assert IFC so the bridge becomes controller-in-charge.
    Ifc,
    /// Return the addressed instrument to front-panel control.
    Loc,
    /// List serial ports that may have a bridge attached.
    Ports,
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Write(args) => exchange::write(args, connection, format),
        Command::Query(args) => exchange::query(args, connection, format),
        Command::Addr(args) => bridge::addr(args, connection, format),
        Command::Ver => bridge::ver(connection, format),
        Command::Auto(args) => bridge::auto(args, connection, format),
        Command::Ifc => bridge::ifc(connection, format),
        Command::Loc => bridge::loc(connection, format),
        Command::Ports => ports::run(format),
        Command::Version(args) => version::run(args),
    }
}

/// Where the bridge is and how to talk to it.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Serial port the bridge is attached to.
    #[arg(long, short = 'p', env = "PROLOGIX_PORT", default_value = DEFAULT_PORT, global = true)]
    pub port: String,
    /// Baud rate.
    #[arg(long, env = "PROLOGIX_BAUD", default_value_t = prologix_transport::DEFAULT_BAUD_RATE, global = true)]
    pub baud: u32,
    /// Time to wait for a response line (e.g. 2s, 500ms).
    #[arg(long, env = "PROLOGIX_TIMEOUT", default_value = "1s", global = true)]
    pub timeout: String,
}

impl ConnectionArgs {
    pub fn transport_config(&self) -> CliResult<TransportConfig> {
        Ok(TransportConfig {
            port: self.port.clone(),
            baud_rate: self.baud,
            timeout: parse_duration(&self.timeout)?,
        })
    }
}

#[derive(Args, Debug)]
pub struct CommandArgs {
    /// Command text, e.g. '*IDN?' or '++auto 2'.
    pub command: String,
}

#[derive(Args, Debug)]
pub struct AddrArgs {
    /// New primary address (1-30).
    #[arg(value_parser = clap::value_parser!(u8).range(1..=30))]
    pub address: Option<u8>,
}

#[derive(Args, Debug)]
pub struct AutoArgs {
    /// 0 off, 1 after every command, 2 after queries, 3 continuous.
    #[arg(value_parser = clap::value_parser!(u8).range(0..=3))]
    pub mode: Option<u8>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open the bridge, run `f`, and close it again.
///
/// On failure the dispatcher is dropped, which releases the port as well.
pub fn with_bridge<R>(
    connection: &ConnectionArgs,
    context: &str,
    f: impl FnOnce(&mut Dispatcher<SerialTransport>) -> prologix_dispatch::Result<R>,
) -> CliResult<R> {
    let config = connection.transport_config()?;
    let mut bridge =
        prologix_dispatch::open(&config).map_err(|err| dispatch_error("open failed", err))?;

    let value = f(&mut bridge).map_err(|err| dispatch_error(context, err))?;

    bridge
        .close()
        .map_err(|err| dispatch_error("close failed", err))?;
    debug!(port = %config.port, "bridge released");
    Ok(value)
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    if millis {
        Ok(Duration::from_millis(value))
    } else {
        Ok(Duration::from_secs(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn connection_args_build_transport_config() {
        let args = ConnectionArgs {
            port: "/dev/ttyACM0".to_string(),
            baud: 9600,
            timeout: "250ms".to_string(),
        };
        let config = args.transport_config().unwrap();
        assert_eq!(config.port, "/dev/ttyACM0");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.timeout, Duration::from_millis(250));
    }
}
