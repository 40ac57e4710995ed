//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser)]
#[command(name = "rest-timer")]
#[command(about = "A drift-corrected, persistent rest timer service for workout sessions")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Directory for persisted timer state; omit for in-memory state only
    #[arg(short, long)]
    pub state_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
