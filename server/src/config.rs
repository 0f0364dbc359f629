//! Application configuration
//!
//! Validation boundaries used by the user forms live here as constants.
//! Runtime settings are layered: built-in defaults < TOML file <
//! `USER_REGISTRY_*` environment variables < CLI flags.

use clap::Parser;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ===== User Field Limits =====

/// Maximum length of a user's name, in characters
pub const MAX_NAME_LENGTH: usize = 258;

/// Maximum length of a user's email address, in characters
pub const MAX_EMAIL_LENGTH: usize = 258;

/// Maximum size of an uploaded image, in kilobytes
pub const MAX_IMAGE_KILOBYTES: usize = 2048;

/// Extensions accepted for uploaded images
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["jpeg", "png", "jpg", "gif", "svg"];

// ===== Blob Naming =====

/// Number of random alphanumeric characters in a generated image filename
pub const GENERATED_NAME_LENGTH: usize = 32;

/// Longest client-supplied extension kept on a generated filename
pub const MAX_EXTENSION_LENGTH: usize = 16;

/// Name of the disk that image blobs are written to
pub const PUBLIC_DISK: &str = "public";

// ===== Transport =====

/// Request body ceiling for multipart uploads (8 MiB).
/// Kept well above the image limit so oversized images reach validation
/// and are reported as field errors.
pub const MAX_REQUEST_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Command-line flags. Unset flags leave lower layers untouched.
#[derive(Parser, Serialize, Clone, Debug, Default)]
#[command(name = "user-registry", version, about = "User registry server")]
pub struct Cli {
    /// Port to listen on
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Bind address
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_address: Option<String>,

    /// Data directory holding the database and the public disk
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// SQLite database filename inside the data directory
    #[arg(long)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_file: Option<String>,

    /// Enable structured JSON logging
    #[arg(long)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub json_logs: bool,

    /// Path to TOML config file
    #[arg(long, default_value = "./user-registry.toml")]
    #[serde(skip)]
    pub config: String,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    #[serde(skip)]
    pub generate_config: bool,
}

/// Resolved runtime settings
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,
    pub data_dir: PathBuf,
    pub database_file: String,
    pub json_logs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            bind_address: "127.0.0.1".to_string(),
            data_dir: PathBuf::from("./data"),
            database_file: "users.db".to_string(),
            json_logs: false,
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (USER_REGISTRY_*) < CLI args
    pub fn load(cli: &Cli) -> Result<Self, figment::Error> {
        Self::figment(cli).extract()
    }

    fn figment(cli: &Cli) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&cli.config))
            .merge(Env::prefixed("USER_REGISTRY_"))
            .merge(Serialized::defaults(cli))
    }

    /// Config rooted at a specific data directory, everything else default
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    /// Root directory of the public disk
    pub fn public_disk_path(&self) -> PathBuf {
        self.data_dir.join(PUBLIC_DISK)
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# User Registry Server Configuration
# Place this file at ./user-registry.toml or specify with --config <path>
# All settings can be overridden via environment variables
# (USER_REGISTRY_PORT, etc.) or CLI flags (--port, etc.)

# Server port (default: 8000)
# port = 8000

# Bind address (default: 127.0.0.1)
# bind_address = "127.0.0.1"

# Data directory for the SQLite database and the public image disk
# data_dir = "./data"

# SQLite database filename inside data_dir
# database_file = "users.db"

# Enable structured JSON logging
# json_logs = false
"#
    .to_string()
}
