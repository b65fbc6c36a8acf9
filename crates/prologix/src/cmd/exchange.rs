use prologix_frame::{CommandKind, LogicalCommand};

use crate::cmd::{with_bridge, CommandArgs, ConnectionArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_exchange, Exchange, OutputFormat};

pub fn write(args: CommandArgs, connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    // Reject malformed text before the port is touched.
    let cmd = parse(&args.command)?;
    with_bridge(connection, "write failed", |bridge| bridge.send_only(&cmd))?;

    print_exchange(
        &Exchange {
            port: connection.port.clone(),
            command: args.command,
            kind: kind_name(&cmd),
            response: None,
        },
        format,
    );
    Ok(SUCCESS)
}

pub fn query(args: CommandArgs, connection: &ConnectionArgs, format: OutputFormat) -> CliResult<i32> {
    let cmd = parse(&args.command)?;
    let response = with_bridge(connection, "query failed", |bridge| {
        bridge.send_and_receive(&cmd)
    })?;

    print_exchange(
        &Exchange {
            port: connection.port.clone(),
            command: args.command,
            kind: kind_name(&cmd),
            response: Some(response.into_string()),
        },
        format,
    );
    Ok(SUCCESS)
}

fn parse(text: &str) -> CliResult<LogicalCommand> {
    LogicalCommand::parse(text).map_err(|err| frame_error("invalid command", err))
}

pub fn kind_name(cmd: &LogicalCommand) -> &'static str {
    match cmd.kind() {
        CommandKind::Bridge => "bridge",
        CommandKind::Raw => "raw",
    }
}
