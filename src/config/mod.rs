//! Configuration management.

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::protocol::{PacketDefaults, FIXED_REGION_SIZE};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Values new packets start from.
    #[serde(default)]
    pub packet: PacketDefaults,

    /// Sender configuration.
    #[serde(default)]
    pub sender: SenderConfig,

    /// Receiver configuration.
    #[serde(default)]
    pub receiver: ReceiverConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_toml()?)
            .map_err(|e| Error::Config(format!("Failed to write config: {e}")))?;

        Ok(())
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<()> {
        if self.sender.host.trim().is_empty() {
            return Err(Error::InvalidConfig("Sender host is empty".into()));
        }

        if self.sender.port == 0 {
            return Err(Error::InvalidConfig("Sender port must be non-zero".into()));
        }

        if self.receiver.port == 0 {
            return Err(Error::InvalidConfig("Receiver port must be non-zero".into()));
        }

        if self.receiver.buffer_size < FIXED_REGION_SIZE {
            return Err(Error::InvalidConfig(format!(
                "Receive buffer of {} bytes cannot hold a {FIXED_REGION_SIZE}-byte packet header",
                self.receiver.buffer_size
            )));
        }

        Ok(())
    }

    /// Get default config path.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "emanate", "emanate-udp").map_or_else(
            || PathBuf::from("emanate-udp.toml"),
            |dirs| dirs.config_dir().join("config.toml"),
        )
    }

    /// Create example configuration.
    pub fn example() -> Self {
        Self {
            sender: SenderConfig {
                host: "192.168.1.50".into(),
                duplicates: 2,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Sender configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Destination host name or address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Destination port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Duplicate transmissions after the first one.
    #[serde(default)]
    pub duplicates: u8,

    /// Delay between duplicate transmissions.
    #[serde(default = "default_dup_interval", with = "humantime_serde")]
    pub dup_interval: Duration,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    crate::DEFAULT_PORT
}
fn default_dup_interval() -> Duration {
    Duration::from_millis(100)
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            duplicates: 0,
            dup_interval: default_dup_interval(),
        }
    }
}

/// Receiver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// Local address to listen on.
    #[serde(default = "default_bind")]
    pub bind: IpAddr,

    /// Local port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Receive buffer size; longer datagrams are cut off.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Reject packets containing unrecognized telemetry records.
    #[serde(default)]
    pub strict: bool,
}

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}
fn default_buffer_size() -> usize {
    crate::RECV_BUFFER_SIZE
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            buffer_size: default_buffer_size(),
            strict: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text or json).
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Enable colored output.
    #[serde(default = "default_color")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}
fn default_color() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            color: default_color(),
        }
    }
}

/// Initialize logging.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| Error::Config(format!("Failed to init logging: {e}")))?;
    } else {
        subscriber
            .with(fmt::layer().with_ansi(config.color).with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| Error::Config(format!("Failed to init logging: {e}")))?;
    }

    Ok(())
}
