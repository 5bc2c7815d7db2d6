//! CCX wire protocol.
//!
//! Defines the packet layout, telemetry entries, and the encoder/parser.
//!
//! ## Packet Format
//!
//! All multi-byte fields are big-endian, with no padding.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │ UDP Version (2) │ Tag MAC (6) │ AP MAC (6) │ Sequence (2)             │
//! ├───────────────────────────────────────────────────────────────────────┤
//! │ Version (1) │ Power (1) │ Channel (1) │ Reg. Class (1) │ Burst (1)    │
//! ├───────────────────────────────────────────────────────────────────────┤
//! │ System:  ID=0 (1) │ Len=2 (1) │ Product Type (2)                      │
//! ├───────────────────────────────────────────────────────────────────────┤
//! │ Battery: ID=2 (1) │ Len=7 (1) │ Percent (1) │ Days (2) │ Age (4)      │
//! ├───────────────────────────────────────────────────────────────────────┤
//! │ Telemetry: ID=3 (1) │ Len (1) │ Type (1) │ Payload ...  (repeated)    │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A group length counts the bytes after the length field (type + payload).

mod packet;
mod parser;
pub mod status;
mod telemetry;

pub use packet::{
    BatteryGroup, BatteryInfo, CcxHeader, FixedRegion, Packet, PacketDefaults, SystemGroup,
    TransportHeader,
};
pub use parser::{parse, parse_with, ParseOptions, ParsedPacket};
pub use telemetry::{SkippedRecord, TelemetryEntry, TelemetryReader, TelemetryRecord};

/// System group identifier.
pub const SYSTEM_GROUP_ID: u8 = 0;

/// System group length (product type).
pub const SYSTEM_GROUP_LENGTH: u8 = 2;

/// Battery group identifier.
pub const BATTERY_GROUP_ID: u8 = 2;

/// Battery group length (percent + days + age).
pub const BATTERY_GROUP_LENGTH: u8 = 7;

/// Telemetry group identifier.
pub const TELEMETRY_GROUP_ID: u8 = 3;

/// Temperature telemetry type.
pub const TEMPERATURE_TYPE: u8 = 1;

/// Temperature group length (type + f32).
pub const TEMPERATURE_GROUP_LENGTH: u8 = 5;

/// Status string telemetry type.
pub const STATUS_TYPE: u8 = 8;

/// Size of the fixed region; the telemetry region starts at this offset.
pub const FIXED_REGION_SIZE: usize =
    TransportHeader::SIZE + CcxHeader::SIZE + SystemGroup::SIZE + BatteryGroup::SIZE;

/// Encoded size of a temperature entry.
pub const TEMPERATURE_ENTRY_SIZE: usize = 7;

/// Longest status string that fits the one-byte length fields.
pub const MAX_STATUS_CHARS: usize = 126;
