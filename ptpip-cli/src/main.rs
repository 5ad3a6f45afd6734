//! PTP/IP camera client — entry point.
//!
//! ```text
//! ptpip --host 192.168.0.1 info          One-shot command
//! ptpip capture shot.jpg                 Capture with preview output
//! ptpip --server                         Interactive command server
//! ptpip --gen-config                     Write default config to stdout
//! ```
//!
//! Exit codes: 0 success, 1 no arguments, 4 client construction
//! failed, 5 dial failed.

mod commands;
mod config;
mod server;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use ptpip_core::client::Client;
use ptpip_core::vendor::Vendor;

use config::Config;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "ptpip", about = "PTP/IP camera client")]
struct Cli {
    /// Responder host or IP.
    #[arg(long)]
    host: Option<String>,

    /// Command/Data port (vendor default when omitted).
    #[arg(long)]
    port: Option<u16>,

    /// Vendor dialect: "fuji" or "generic".
    #[arg(long)]
    vendor: Option<String>,

    /// Friendly name offered to the responder.
    #[arg(long)]
    name: Option<String>,

    /// Initiator GUID (random when omitted).
    #[arg(long)]
    guid: Option<String>,

    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "ptpip.toml")]
    config: PathBuf,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Run the interactive command server after dialling.
    #[arg(short, long)]
    server: bool,

    /// Command server port override.
    #[arg(long)]
    server_port: Option<u16>,

    /// One-shot command and its arguments.
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    if std::env::args().len() < 2 {
        let _ = Cli::command().print_help();
        println!();
        return ExitCode::from(1);
    }

    let cli = Cli::parse();

    if cli.gen_config {
        match toml::to_string_pretty(&Config::default()) {
            Ok(text) => {
                println!("{text}");
                return ExitCode::SUCCESS;
            }
            Err(e) => {
                eprintln!("Error serializing default config - {e}");
                return ExitCode::from(4);
            }
        }
    }

    // Config file first, flags on top.
    let mut config = Config::load(&cli.config);
    if let Some(host) = cli.host {
        config.connection.host = host;
    }
    if let Some(port) = cli.port {
        config.connection.port = Some(port);
    }
    if let Some(vendor) = cli.vendor {
        config.connection.vendor = vendor;
    }
    if let Some(name) = cli.name {
        config.connection.friendly_name = name;
    }
    if let Some(guid) = cli.guid {
        config.connection.guid = guid;
    }
    if let Some(port) = cli.server_port {
        config.server.port = port;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Build the client.
    let vendor = match Vendor::parse(&config.connection.vendor) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Error creating PTP/IP client - {e}");
            return ExitCode::from(4);
        }
    };
    let guid = if config.connection.guid.is_empty() {
        None
    } else {
        Some(config.connection.guid.as_str())
    };
    let mut client = match Client::new(
        vendor,
        &config.connection.host,
        config.connection.port,
        &config.connection.friendly_name,
        guid,
    ) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error creating PTP/IP client - {e}");
            return ExitCode::from(4);
        }
    };

    println!(
        "Created new client with name '{}' and GUID '{}'.",
        client.initiator_friendly_name(),
        client.initiator_guid()
    );
    println!("Attempting to connect to {client}");
    if let Err(e) = client.dial().await {
        eprintln!("Error connecting to responder - {e}");
        client.close().await;
        return ExitCode::from(5);
    }

    let outcome = if cli.server {
        run_server(&mut client, &config).await
    } else if !cli.command.is_empty() {
        let line = cli.command.join(" ");
        let response = commands::dispatch(&mut client, &line).await;
        print!("{response}");
        ExitCode::SUCCESS
    } else {
        ExitCode::SUCCESS
    };

    client.close().await;
    outcome
}

async fn run_server(client: &mut Client, config: &Config) -> ExitCode {
    info!("entering server mode; Ctrl-C to stop");
    tokio::select! {
        result = server::run(client, &config.server.address, config.server.port) => {
            if let Err(e) = result {
                eprintln!("Command server failed - {e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received; shutting down");
            ExitCode::SUCCESS
        }
    }
}
