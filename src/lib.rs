//! # Emanate CCX
//!
//! Encoder, decoder and UDP test tools for the CCX tag telemetry packet.
//!
//! Tags report battery state, temperature and free-form status strings to
//! a location engine in a single UDP datagram. This crate builds those
//! packets byte-for-byte, parses them back into typed records and ships
//! them over UDP.
//!
//! ## Architecture
//!
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 CLI (emanate-udp send / receive)                │
//! ├─────────────────────────────────────────────────────────────────┤
//! │            Sender (duplicate bursts) / Receiver loop            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │        Packet builder  ─────  Parser / telemetry reader         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │         Wire helpers (wide ASCII, MAC text, big-endian)         │
//! └─────────────────────────────────────────────────────────────────┘

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]              // ASCII diagrams in docs
#![allow(clippy::unreadable_literal)]
#![allow(clippy::cast_possible_truncation)]  // Length fields are bounded before casting
#![allow(clippy::struct_excessive_bools)]    // CLI flag structs
#![allow(clippy::option_if_let_else)]
#![allow(clippy::use_self)]
#![allow(clippy::redundant_pub_crate)]
#![allow(clippy::return_self_not_must_use)]

pub mod config;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default UDP port for sender and receiver
pub const DEFAULT_PORT: u16 = 9999;

/// Default receive buffer size; larger than any packet the encoder produces
pub const RECV_BUFFER_SIZE: usize = 2048;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::protocol::{
        parse, parse_with, BatteryInfo, Packet, PacketDefaults, ParseOptions, ParsedPacket,
        TelemetryEntry,
    };
    pub use crate::transport::{Receiver, Sender, Transport, UdpTransport};
    pub use crate::types::*;
}
