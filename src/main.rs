//! emanate-udp - send and receive CCX tag telemetry packets.

use std::net::SocketAddr;

use clap::Parser;
use colored::Colorize;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::warn;

use emanate_ccx::cli::*;
use emanate_ccx::config::{init_logging, Config, LoggingConfig};
use emanate_ccx::error::Result;
use emanate_ccx::protocol::{parse_with, ParseOptions};
use emanate_ccx::transport::{DataUpdate, Receiver, Sender};
use emanate_ccx::VERSION;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Load config if specified
    let config = if let Some(ref path) = cli.config {
        Config::load(path)?
    } else if Config::default_path().exists() {
        Config::load(Config::default_path())?
    } else {
        Config::default()
    };

    // Initialize logging
    let log_config = LoggingConfig {
        level: cli.log_level.clone(),
        color: config.logging.color && !cli.no_color,
        ..config.logging.clone()
    };
    init_logging(&log_config)?;

    // Dispatch command
    match cli.command {
        Commands::Send(args) => run_send(args, config).await,
        Commands::Receive(args) => run_receive(args, config).await,
        Commands::Config(args) => run_config(args),
    }
}

/// Build one packet and send it with its duplicates
async fn run_send(args: SendArgs, config: Config) -> Result<()> {
    let packet = args.build_packet(&config)?;
    let data = packet.encode();

    let host = args.host(&config);
    let port = args.port(&config);
    let duplicates = args.duplicates(&config);

    println!();
    println!(
        "{} {} bytes to {}:{} (seq {}, {} cop{})",
        "→".cyan(),
        data.len(),
        host,
        port,
        packet.sequence(),
        u16::from(duplicates) + 1,
        if duplicates == 0 { "y" } else { "ies" }
    );

    let sender = Sender::connect(host, port).await?;
    sender
        .transmit_burst(&data, duplicates, args.dup_interval(&config))
        .await?;

    println!("{} DONE!", "✓".green());
    println!();
    Ok(())
}

/// Listen for packets and dump each one until Ctrl+C
async fn run_receive(args: ReceiveArgs, config: Config) -> Result<()> {
    let bind = args.bind.unwrap_or(config.receiver.bind);
    let port = args.port.unwrap_or(config.receiver.port);
    let options = ParseOptions {
        strict: args.strict || config.receiver.strict,
    };

    println!(
        "{}",
        "╔══════════════════════════════════════════╗".bright_cyan()
    );
    println!(
        "{}",
        "║     EMANATE UDP RECEIVER                 ║".bright_cyan()
    );
    println!(
        "{}",
        format!("║     Version {VERSION:<29}║").bright_cyan()
    );
    println!(
        "{}",
        "╚══════════════════════════════════════════╝".bright_cyan()
    );
    println!();

    let receiver = Receiver::bind(SocketAddr::new(bind, port), config.receiver.buffer_size).await?;
    println!(
        "{} Listening on {} (Ctrl+C to stop)",
        "●".green(),
        receiver.local_addr()?
    );

    // Setup shutdown signal
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    tokio::spawn(async move {
        let _ = signal::ctrl_c().await;
        let _ = shutdown_tx.send(());
    });

    let json = args.json;
    receiver
        .run(|update| print_update(&update, options, json), shutdown_rx)
        .await?;

    println!();
    println!("{} Receiver stopped.", "●".yellow());
    Ok(())
}

fn print_update(update: &DataUpdate, options: ParseOptions, json: bool) {
    let parsed = match parse_with(&update.data, options) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(remote = %update.remote_addr, len = update.data.len(), "bad packet: {e}");
            return;
        }
    };

    if json {
        match serde_json::to_string(&parsed) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!("failed to serialize packet: {e}"),
        }
        return;
    }

    println!();
    println!("{}", "UDP PACKET RECEIVED".bright_white().bold());
    println!("{}", "===================".bright_white());
    println!();
    println!("  - Total Bytes = {}", update.data.len());
    println!("  - Remote Addr = {}", update.remote_addr);
    print!("{parsed}");
}

/// Print or write the example configuration
fn run_config(args: ConfigArgs) -> Result<()> {
    let config = Config::example();

    if let Some(ref path) = args.output {
        config.save(path)?;
        println!(
            "{} Configuration written to {}",
            "✓".green(),
            path.display()
        );
    } else {
        println!("{}", config.to_toml()?);
    }

    Ok(())
}
