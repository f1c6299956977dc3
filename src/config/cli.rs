//! Command-line surface.
//!
//! Flags win over environment variables (resolved by clap), which win over
//! the optional TOML file, which wins over built-in defaults.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{self, load_config, ConfigError};
use crate::config::schema::EdgeConfig;

#[derive(Debug, Default, Parser)]
#[command(name = "edge-server")]
#[command(about = "Static assets, JSON API routes and event streams from one process", long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "EDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Bind host
    #[arg(long, env = "EDGE_HOST")]
    pub host: Option<String>,

    /// Bind port
    #[arg(short, long, env = "EDGE_PORT")]
    pub port: Option<u16>,

    /// Public directory root
    #[arg(short, long, env = "EDGE_PUBLIC_DIR")]
    pub dir: Option<PathBuf>,

    /// Log handler failure details
    #[arg(long, env = "EDGE_DEBUG")]
    pub debug: bool,
}

impl Cli {
    /// Overlay flag values onto a base configuration.
    pub fn apply(&self, mut config: EdgeConfig) -> EdgeConfig {
        if let Some(host) = &self.host {
            config.listener.host = host.clone();
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(dir) = &self.dir {
            config.static_files.root = dir.clone();
        }
        if self.debug {
            config.api.debug = true;
        }
        config
    }

    /// Build the effective, validated configuration.
    pub fn resolve(&self) -> Result<EdgeConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => load_config(path)?,
            None => EdgeConfig::default(),
        };
        loader::validate(self.apply(base))
    }
}
