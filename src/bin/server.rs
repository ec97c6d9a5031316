use anyhow::Result;
use axon::server::{init_logging, EchoListener, ServerConfig, ServerError, ServerMonitor};
use clap::Parser;
use tracing::{error, info};

fn main() {
    // Parse CLI arguments
    let config = ServerConfig::parse();

    // Initialize structured logging with config options
    init_logging(&config.log_level, config.is_json_format());

    // Validate configuration
    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(config) {
        error!(error = %e, "Server failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: ServerConfig) -> Result<()> {
    let addr = config.address();

    // Bind the TCP listener; bind failure is fatal
    let listener = match EchoListener::bind(&config) {
        Ok(listener) => listener,
        Err(ServerError::Bind { addr, source })
            if source.kind() == std::io::ErrorKind::AddrInUse =>
        {
            anyhow::bail!(
                "Failed to bind to {}: Address already in use. Try a different port or ensure no other process is using it.",
                addr
            );
        }
        Err(e) => return Err(anyhow::Error::new(e)),
    };

    info!(
        address = %addr,
        update_interval_ms = config.update_interval,
        quiet_mode = config.quiet,
        "Axon TCP echo server listening"
    );

    // Initialize server monitor with configured update interval
    let monitor = ServerMonitor::new(config.update_interval);
    let counters = monitor.counters();

    // Start background display thread only if not in quiet mode
    if !config.quiet {
        monitor.start_display();
    } else {
        info!("Running in quiet mode (terminal UI disabled)");
    }

    info!("Ready to accept connections and echo bytes...");

    // Serve connections one at a time until the process is killed
    listener.run(&counters)?;

    Ok(())
}
