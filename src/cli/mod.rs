//! Command-line interface for the CCX UDP test tools.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Config;
use crate::error::Result;
use crate::protocol::{BatteryInfo, Packet};
use crate::types::{MacAddr, UtilState};

/// Values used by `send --all` for options that were not given.
pub const ALL_SEQUENCE: u16 = 1;
pub const ALL_TEMPERATURE: f32 = 12.34;
pub const ALL_DOOR_OPEN_PERCENT: u8 = 22;
pub const ALL_HIGH_POWER_PERCENT: u8 = 33;

/// emanate-udp - CCX tag telemetry packet tools
#[derive(Parser, Debug)]
#[command(
    name = "emanate-udp",
    author,
    version,
    about = "Send and receive CCX tag telemetry packets over UDP",
    long_about = r#"
Builds CCX telemetry packets the way a battery-powered tag would and sends
them over UDP, or listens for such packets and dumps their contents.

QUICK START:
  Receiver:  emanate-udp receive --port 9999
  Sender:    emanate-udp send --host 127.0.0.1 --port 9999 --all
"#
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    pub log_level: String,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a CCX packet and send it
    Send(SendArgs),

    /// Listen for CCX packets and dump them
    Receive(ReceiveArgs),

    /// Show example configuration
    Config(ConfigArgs),
}

/// Send command arguments
#[derive(Args, Debug, Default)]
pub struct SendArgs {
    /// Target hostname or ip-address
    #[arg(long)]
    pub host: Option<String>,

    /// Target port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Add every telemetry option, using sample values for ones not given
    #[arg(long)]
    pub all: bool,

    /// Number of duplicate packets to send after the first
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=254))]
    pub num_dups: Option<u8>,

    /// Delay between duplicate packets in milliseconds
    #[arg(long)]
    pub dup_interval_ms: Option<u64>,

    /// Packet sequence number
    #[arg(long)]
    pub seq: Option<u16>,

    /// Utility power state
    #[arg(long)]
    pub util_state: Option<UtilStateArg>,

    /// Temperature in Celsius
    #[arg(long, allow_hyphen_values = true)]
    pub temp: Option<f32>,

    /// Battery charge remaining (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub battery_charge: Option<u8>,

    /// Battery prediction tolerance (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub battery_tolerance: Option<u8>,

    /// Days of battery charge remaining
    #[arg(long)]
    pub battery_days_remaining: Option<u16>,

    /// Battery age in days
    #[arg(long)]
    pub battery_age: Option<u32>,

    /// Add the button-pressed status
    #[arg(long)]
    pub button_pressed: bool,

    /// Percentage of time the fridge door has been open (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub door_open_percent: Option<u8>,

    /// Percentage of time spent in high-power mode (0-100)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub high_power_percent: Option<u8>,

    /// Add the temperature probe unplugged alert
    #[arg(long)]
    pub probe_unplugged: bool,

    /// Add the temperature probe invalid value alert
    #[arg(long)]
    pub probe_invalid_value: bool,

    /// Product type code in the system group
    #[arg(long)]
    pub product_type: Option<u16>,

    /// Tag mac-address
    #[arg(long)]
    pub tag_mac: Option<MacAddr>,

    /// Access point mac-address
    #[arg(long)]
    pub ap_mac: Option<MacAddr>,
}

impl SendArgs {
    /// Duplicate transmissions after the first one.
    pub fn duplicates(&self, config: &Config) -> u8 {
        self.num_dups.unwrap_or(config.sender.duplicates)
    }

    pub fn dup_interval(&self, config: &Config) -> Duration {
        self.dup_interval_ms
            .map_or(config.sender.dup_interval, Duration::from_millis)
    }

    pub fn host<'a>(&'a self, config: &'a Config) -> &'a str {
        self.host.as_deref().unwrap_or(&config.sender.host)
    }

    pub fn port(&self, config: &Config) -> u16 {
        self.port.unwrap_or(config.sender.port)
    }

    /// Assemble the packet described by the arguments.
    pub fn build_packet(&self, config: &Config) -> Result<Packet> {
        let mut packet = Packet::with_defaults(&config.packet);

        // The burst covers the first copy plus every duplicate
        packet.set_burst_length(self.duplicates(config).saturating_add(1));

        if let Some(mac) = self.tag_mac {
            packet.set_tag_mac(mac);
        }
        if let Some(mac) = self.ap_mac {
            packet.set_ap_mac(mac);
        }

        if let Some(seq) = self.seq.or(self.all.then_some(ALL_SEQUENCE)) {
            packet.set_sequence(seq);
        }

        if let Some(state) = self.util_state.or(self.all.then_some(UtilStateArg::Unplugged)) {
            packet.set_util_state(state.into())?;
        }

        let battery = &config.packet.battery;
        packet.set_battery_info(&BatteryInfo {
            charge_percent: self.battery_charge.unwrap_or(battery.charge_percent),
            tolerance_percent: self.battery_tolerance.unwrap_or(battery.tolerance_percent),
            days_remaining: self.battery_days_remaining.unwrap_or(battery.days_remaining),
            age_days: self.battery_age.unwrap_or(battery.age_days),
        });

        if let Some(temp) = self.temp.or(self.all.then_some(ALL_TEMPERATURE)) {
            packet.set_temperature(temp);
        }

        if let Some(percent) = self
            .door_open_percent
            .or(self.all.then_some(ALL_DOOR_OPEN_PERCENT))
        {
            packet.set_door_open_percent(percent)?;
        }

        if let Some(percent) = self
            .high_power_percent
            .or(self.all.then_some(ALL_HIGH_POWER_PERCENT))
        {
            packet.set_high_power_percent(percent)?;
        }

        if let Some(product_type) = self.product_type {
            packet.set_product_type(product_type);
        }

        if self.all || self.button_pressed {
            packet.set_button_pressed()?;
        }
        if self.all || self.probe_unplugged {
            packet.set_probe_unplugged()?;
        }
        if self.all || self.probe_invalid_value {
            packet.set_probe_invalid_value()?;
        }

        Ok(packet)
    }
}

/// Receive command arguments
#[derive(Args, Debug, Default)]
pub struct ReceiveArgs {
    /// Local port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Local address to listen on
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Print each packet as a JSON line instead of the text dump
    #[arg(long)]
    pub json: bool,

    /// Reject packets with unrecognized telemetry records
    #[arg(long)]
    pub strict: bool,
}

/// Config command arguments
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Output path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Utility power state
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UtilStateArg {
    /// Not plugged into mains power
    Unplugged,
    /// Plugged in, device off
    Off,
    /// Plugged in, device idle
    Idle,
    /// Plugged in, device active
    Active,
}

impl From<UtilStateArg> for UtilState {
    fn from(s: UtilStateArg) -> Self {
        match s {
            UtilStateArg::Unplugged => Self::Unplugged,
            UtilStateArg::Off => Self::Off,
            UtilStateArg::Idle => Self::Idle,
            UtilStateArg::Active => Self::Active,
        }
    }
}
