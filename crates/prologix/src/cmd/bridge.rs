use prologix_dispatch::AutoMode;

use crate::cmd::{with_bridge, AddrArgs, AutoArgs, ConnectionArgs};
use crate::exit::{dispatch_error, CliResult, SUCCESS};
use crate::output::{print_exchange, Exchange, OutputFormat};

pub fn addr(args: AddrArgs, connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    match args.address {
        Some(address) => {
            with_bridge(connection, "addr failed", |bridge| bridge.set_address(address))?;
            report(connection, format!("++addr {address}"), None, format);
        }
        None => {
            let response = with_bridge(connection, "addr failed", |bridge| bridge.get_address())?;
            report(connection, "++addr".to_string(), Some(response.into_string()), format);
        }
    }
    Ok(SUCCESS)
}

pub fn ver(connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    let response = with_bridge(connection, "ver failed", |bridge| bridge.version())?;
    report(connection, "++ver".to_string(), Some(response.into_string()), format);
    Ok(SUCCESS)
}

pub fn auto(args: AutoArgs, connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    match args.mode {
        Some(code) => {
            let mode = AutoMode::try_from(code).map_err(|err| dispatch_error("auto failed", err))?;
            with_bridge(connection, "auto failed", |bridge| bridge.set_auto(mode))?;
            report(connection, format!("++auto {mode}"), None, format);
        }
        None => {
            let response = with_bridge(connection, "auto failed", |bridge| bridge.get_auto())?;
            report(connection, "++auto".to_string(), Some(response.into_string()), format);
        }
    }
    Ok(SUCCESS)
}

pub fn ifc(connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    with_bridge(connection, "ifc failed", |bridge| bridge.interface_clear())?;
    report(connection, "++ifc".to_string(), None, format);
    Ok(SUCCESS)
}

pub fn loc(connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    with_bridge(connection, "loc failed", |bridge| bridge.go_to_local())?;
    report(connection, "++loc".to_string(), None, format);
    Ok(SUCCESS)
}

fn report(connection: &ConnectionArgs, command: String, response: Option<String>, format: OutputFormat) {
    print_exchange(
        &Exchange {
            port: connection.port.clone(),
            command,
            kind: "bridge",
            response,
        },
        format,
    );
}
