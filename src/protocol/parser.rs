//! Packet parsing and textual dump.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::packet::FixedRegion;
use super::telemetry::{SkippedRecord, TelemetryEntry, TelemetryReader, TelemetryRecord};
use super::FIXED_REGION_SIZE;

/// Parser behaviour switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Fail on unrecognized groups and telemetry types instead of skipping them.
    #[serde(default)]
    pub strict: bool,
}

/// Fully decoded packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPacket {
    pub fixed: FixedRegion,
    /// Telemetry entries in wire order.
    pub telemetry: Vec<TelemetryEntry>,
    /// Records stepped over while reading the telemetry region.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRecord>,
}

/// Parse a complete packet with default options.
pub fn parse(data: &[u8]) -> Result<ParsedPacket> {
    parse_with(data, ParseOptions::default())
}

/// Parse a complete packet.
///
/// `data` must be exactly one datagram; bytes past its end would be read as
/// telemetry.
pub fn parse_with(data: &[u8], options: ParseOptions) -> Result<ParsedPacket> {
    let fixed = FixedRegion::decode(data)?;

    let mut telemetry = Vec::new();
    let mut skipped = Vec::new();
    let reader = TelemetryReader::new(&data[FIXED_REGION_SIZE..])
        .strict(options.strict)
        .with_base_offset(FIXED_REGION_SIZE);

    for record in reader {
        match record? {
            TelemetryRecord::Entry(entry) => telemetry.push(entry),
            TelemetryRecord::Skipped(skip) => skipped.push(skip),
        }
    }

    Ok(ParsedPacket {
        fixed,
        telemetry,
        skipped,
    })
}

impl ParsedPacket {
    /// Status strings in wire order.
    pub fn statuses(&self) -> impl Iterator<Item = &str> + '_ {
        self.telemetry.iter().filter_map(|e| match e {
            TelemetryEntry::Status(s) => Some(s.as_str()),
            TelemetryEntry::Temperature(_) => None,
        })
    }

    /// Temperatures in wire order.
    pub fn temperatures(&self) -> impl Iterator<Item = f32> + '_ {
        self.telemetry.iter().filter_map(|e| match e {
            TelemetryEntry::Temperature(c) => Some(*c),
            TelemetryEntry::Status(_) => None,
        })
    }
}

impl fmt::Display for FixedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  - UDP Version = {}", self.transport.version)?;
        writeln!(f, "  - Tag MAC = {}", self.transport.tag_mac)?;
        writeln!(f, "  - AP MAC = {}", self.transport.ap_mac)?;
        writeln!(f, "  - Sequence = {}", self.transport.sequence)?;
        writeln!(f, "  - Header")?;
        writeln!(f, "    - Protocol Version = {}", self.header.version)?;
        writeln!(f, "    - Transmit Power = {}", self.header.power)?;
        writeln!(f, "    - Wifi Channel = {}", self.header.channel)?;
        writeln!(f, "    - Regulatory Class = {}", self.header.regulatory_class)?;
        writeln!(f, "    - Burst Length = {}", self.header.burst)?;
        writeln!(f, "  - System Group")?;
        writeln!(f, "    - ID = {}", self.system.id)?;
        writeln!(f, "    - Length = {}", self.system.length)?;
        writeln!(f, "    - Product Type = {}", self.system.product_type)?;
        writeln!(f, "  - Battery Group")?;
        writeln!(f, "    - ID = {}", self.battery.id)?;
        writeln!(f, "    - Length = {}", self.battery.length)?;
        writeln!(f, "    - Tolerance = {} %", self.battery.tolerance_percent())?;
        writeln!(f, "    - Charge = {} %", self.battery.charge_percent())?;
        writeln!(f, "    - Days Remaining = {}", self.battery.days)?;
        writeln!(f, "    - Age = {} days", self.battery.age)
    }
}

impl fmt::Display for ParsedPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fixed)?;

        // Interleave skipped records with entries in wire order
        let mut skipped = self.skipped.iter().peekable();
        let mut offset = FIXED_REGION_SIZE;
        for entry in &self.telemetry {
            while let Some(skip) = skipped.next_if(|s| s.offset <= offset) {
                write!(f, "{skip}")?;
                offset = skip.offset + skip.len;
            }
            write!(f, "{entry}")?;
            offset += entry.encoded_len();
        }
        for skip in skipped {
            write!(f, "{skip}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ProtocolError};
    use crate::protocol::Packet;
    use crate::types::UtilState;

    fn sample_packet() -> Packet {
        let mut packet = Packet::new();
        packet.set_sequence(77);
        packet.set_util_state(UtilState::Idle).unwrap();
        packet.set_temperature(12.34);
        packet.set_door_open_percent(22).unwrap();
        packet
    }

    #[test]
    fn test_parse_round_trip() {
        let packet = sample_packet();
        let parsed = parse(&packet.encode()).unwrap();

        assert_eq!(parsed.fixed, packet.fixed_region());
        assert_eq!(parsed.telemetry.len(), 3);
        assert_eq!(
            parsed.statuses().collect::<Vec<_>>(),
            vec!["UTIL_STATE=PLUGGED_IN_IDLE", "DOOR_OPEN_PERCENT=22"]
        );
        let temps: Vec<f32> = parsed.temperatures().collect();
        assert!((temps[0] - 12.34).abs() < 1e-5);
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn test_parse_header_only() {
        let parsed = parse(&Packet::new().encode()).unwrap();
        assert!(parsed.telemetry.is_empty());
    }

    #[test]
    fn test_parse_truncated_header() {
        let encoded = sample_packet().encode();
        let err = parse(&encoded[..20]).unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn test_parse_reports_skips() {
        let mut data = sample_packet().encode().to_vec();
        data.extend_from_slice(&[0x05, 0x01, 0xFF]);

        let parsed = parse(&data).unwrap();
        assert_eq!(parsed.telemetry.len(), 3);
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].group_id, 5);
        assert_eq!(parsed.skipped[0].offset, data.len() - 3);

        let err = parse_with(&data, ParseOptions { strict: true }).unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::UnknownGroup(5))));
    }

    #[test]
    fn test_dump_text() {
        let parsed = parse(&sample_packet().encode()).unwrap();
        let text = parsed.to_string();

        assert!(text.contains("  - Tag MAC = 11:22:33:44:55:66\n"));
        assert!(text.contains("  - Sequence = 77\n"));
        assert!(text.contains("    - Transmit Power = 17\n"));
        assert!(text.contains("    - Tolerance = 10 %\n"));
        assert!(text.contains("    - Charge = 80 %\n"));
        assert!(text.contains("    - Age = 10 days\n"));
        assert!(text.contains("    - Temperature = 12.34 C\n"));
        assert!(text.contains("    - Status = 'DOOR_OPEN_PERCENT=22'\n"));

        // Entries are dumped in wire order
        let util = text.find("UTIL_STATE").unwrap();
        let temp = text.find("Temperature Group").unwrap();
        let door = text.find("DOOR_OPEN").unwrap();
        assert!(util < temp && temp < door);
    }

    #[test]
    fn test_dump_keeps_skipped_records_in_wire_order() {
        let mut packet = Packet::new();
        packet.set_button_pressed().unwrap();
        let mut data = packet.encode().to_vec();
        data.extend_from_slice(&[0x7F, 0x01, 0xAA]);
        data.extend_from_slice(&[0x03, 0x05, 0x01]);
        data.extend_from_slice(&4.5f32.to_be_bytes());
        data.extend_from_slice(&[0x03, 0x02, 0x09, 0x00]);

        let text = parse(&data).unwrap().to_string();
        let status = text.find("Status Group").unwrap();
        let vendor = text.find("Skipped Group (id 127").unwrap();
        let temp = text.find("Temperature Group").unwrap();
        let unknown_type = text.find("Skipped Telemetry (type 9").unwrap();
        assert!(status < vendor && vendor < temp && temp < unknown_type);
    }

    #[test]
    fn test_json_output() {
        let parsed = parse(&sample_packet().encode()).unwrap();
        let json = serde_json::to_value(&parsed).unwrap();

        assert_eq!(json["fixed"]["transport"]["tag_mac"], "11:22:33:44:55:66");
        assert_eq!(json["fixed"]["transport"]["sequence"], 77);
        assert_eq!(json["telemetry"][0]["type"], "status");
        assert_eq!(json["telemetry"][0]["value"], "UTIL_STATE=PLUGGED_IN_IDLE");
        assert_eq!(json["telemetry"][1]["type"], "temperature");
        assert!(json.get("skipped").is_none());

        let back: ParsedPacket = serde_json::from_value(json).unwrap();
        assert_eq!(back.fixed, parsed.fixed);
    }
}
