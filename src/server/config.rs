//! Server configuration module
//!
//! Provides CLI argument parsing and validation for the Axon server.

use crate::server::error::{Result, ServerError};
use clap::Parser;
use tracing::debug;

#[derive(Parser, Debug, Clone)]
#[command(name = "axon-server")]
#[command(about = "Sequential TCP echo server")]
pub struct ServerConfig {
    /// Bind address
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Bind port
    #[arg(long, default_value_t = 1234)]
    pub port: u16,

    /// Monitor update interval in milliseconds
    #[arg(long, default_value_t = 100)]
    pub update_interval: u64,

    /// Disable terminal UI (useful for Docker/systemd/non-interactive environments)
    #[arg(long)]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format (text or json)
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub log_format: String,
}

impl ServerConfig {
    /// Returns the full bind address as a string (bind:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Validates the configuration values
    pub fn validate(&self) -> Result<()> {
        debug!("Validating server configuration");

        if self.port == 0 {
            return Err(ServerError::Config("port must be > 0".into()));
        }

        if self.update_interval == 0 {
            return Err(ServerError::Config("update_interval must be > 0".into()));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ServerError::Config(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        debug!("Server configuration validated successfully");
        Ok(())
    }

    /// Returns true if JSON format logging is enabled
    pub fn is_json_format(&self) -> bool {
        self.log_format.to_lowercase() == "json"
    }
}
