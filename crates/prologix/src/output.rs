use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use prologix_transport::PortInfo;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// One command sent to the bridge and, for queries, what came back.
#[derive(Debug, Serialize)]
pub struct Exchange {
    pub port: String,
    pub command: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

#[derive(Serialize)]
struct ExchangeOutput<'a> {
    #[serde(flatten)]
    exchange: &'a Exchange,
    timestamp: String,
}

pub fn print_exchange(exchange: &Exchange, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ExchangeOutput {
                exchange,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "KIND", "COMMAND", "RESPONSE"])
                .add_row(vec![
                    exchange.port.clone(),
                    exchange.kind.to_string(),
                    exchange.command.clone(),
                    exchange.response.clone().unwrap_or_else(|| "-".to_string()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match &exchange.response {
            Some(response) => println!("{} >> {response}", exchange.command),
            None => println!("{} (sent)", exchange.command),
        },
        OutputFormat::Raw => {
            if let Some(response) = &exchange.response {
                let mut out = std::io::stdout();
                let _ = writeln!(out, "{response}");
                let _ = out.flush();
            }
        }
    }
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'a str,
    vid: Option<u16>,
    pid: Option<u16>,
    manufacturer: Option<&'a str>,
    product: Option<&'a str>,
    serial_number: Option<&'a str>,
}

impl<'a> From<&'a PortInfo> for PortOutput<'a> {
    fn from(port: &'a PortInfo) -> Self {
        Self {
            name: &port.name,
            kind: port.kind,
            vid: port.vid,
            pid: port.pid,
            manufacturer: port.manufacturer.as_deref(),
            product: port.product.as_deref(),
            serial_number: port.serial_number.as_deref(),
        }
    }
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<PortOutput<'_>> = ports.iter().map(PortOutput::from).collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "TYPE", "VID:PID", "PRODUCT"]);
            for port in ports {
                table.add_row(vec![
                    port.name.clone(),
                    port.kind.to_string(),
                    usb_ids(port),
                    port.product.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for port in ports {
                println!(
                    "{} ({}, {}) {}",
                    port.name,
                    port.kind,
                    usb_ids(port),
                    port.product.as_deref().unwrap_or("")
                );
            }
        }
        OutputFormat::Raw => {
            for port in ports {
                println!("{}", port.name);
            }
        }
    }
}

fn usb_ids(port: &PortInfo) -> String {
    match (port.vid, port.pid) {
        (Some(vid), Some(pid)) => format!("{vid:04x}:{pid:04x}"),
        _ => "-".to_string(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
