//! Packet structure, construction and encoding.

use byteorder::{BigEndian, ByteOrder};
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProtocolError, Result};
use crate::types::{MacAddr, SequenceNumber, UtilState};

use super::status;
use super::telemetry::{put_temperature, TelemetryEntry};
use super::{
    BATTERY_GROUP_ID, BATTERY_GROUP_LENGTH, FIXED_REGION_SIZE, SYSTEM_GROUP_ID,
    SYSTEM_GROUP_LENGTH,
};

/// Encapsulating header in front of the CCX payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportHeader {
    /// UDP protocol version.
    pub version: u16,
    /// Tag hardware address.
    pub tag_mac: MacAddr,
    /// Access point hardware address.
    pub ap_mac: MacAddr,
    /// Sequence number.
    pub sequence: SequenceNumber,
}

impl TransportHeader {
    pub const SIZE: usize = 16;

    fn write(&self, buf: &mut impl BufMut) {
        buf.put_u16(self.version);
        buf.put_slice(self.tag_mac.as_bytes());
        buf.put_slice(self.ap_mac.as_bytes());
        buf.put_u16(self.sequence.0);
    }

    fn read(buf: &[u8]) -> Self {
        let mut tag = [0u8; 6];
        tag.copy_from_slice(&buf[2..8]);
        let mut ap = [0u8; 6];
        ap.copy_from_slice(&buf[8..14]);

        Self {
            version: BigEndian::read_u16(&buf[0..2]),
            tag_mac: MacAddr(tag),
            ap_mac: MacAddr(ap),
            sequence: SequenceNumber(BigEndian::read_u16(&buf[14..16])),
        }
    }
}

/// CCX packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcxHeader {
    /// Protocol version.
    pub version: u8,
    /// Transmit power.
    pub power: u8,
    /// Wifi channel.
    pub channel: u8,
    /// Regulatory class.
    pub regulatory_class: u8,
    /// Number of identical transmissions of this sequence number.
    pub burst: u8,
}

impl CcxHeader {
    pub const SIZE: usize = 5;

    fn write(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.version);
        buf.put_u8(self.power);
        buf.put_u8(self.channel);
        buf.put_u8(self.regulatory_class);
        buf.put_u8(self.burst);
    }

    fn read(buf: &[u8]) -> Self {
        Self {
            version: buf[0],
            power: buf[1],
            channel: buf[2],
            regulatory_class: buf[3],
            burst: buf[4],
        }
    }
}

/// System group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemGroup {
    pub id: u8,
    pub length: u8,
    pub product_type: u16,
}

impl SystemGroup {
    pub const SIZE: usize = 4;

    pub fn new(product_type: u16) -> Self {
        Self {
            id: SYSTEM_GROUP_ID,
            length: SYSTEM_GROUP_LENGTH,
            product_type,
        }
    }

    fn write(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.id);
        buf.put_u8(self.length);
        buf.put_u16(self.product_type);
    }

    fn read(buf: &[u8]) -> Self {
        Self {
            id: buf[0],
            length: buf[1],
            product_type: BigEndian::read_u16(&buf[2..4]),
        }
    }
}

/// Battery group.
///
/// `percent` packs the charge in bits 3..=6 and the prediction tolerance in
/// bits 0..=2, both in units of 10 %.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryGroup {
    pub id: u8,
    pub length: u8,
    pub percent: u8,
    pub days: u16,
    pub age: u32,
}

impl BatteryGroup {
    pub const SIZE: usize = 9;

    pub fn new(info: &BatteryInfo) -> Self {
        Self {
            id: BATTERY_GROUP_ID,
            length: BATTERY_GROUP_LENGTH,
            percent: Self::pack_percent(info.charge_percent, info.tolerance_percent),
            days: info.days_remaining,
            age: info.age_days,
        }
    }

    /// Pack charge and tolerance into the percent byte.
    ///
    /// Both are floored to a multiple of 10; tolerance keeps only 3 bits, so
    /// values of 80 and above wrap.
    pub fn pack_percent(charge: u8, tolerance: u8) -> u8 {
        let tolerance = (tolerance / 10) & 0x07;
        let charge = (charge / 10) & 0x0F;
        (charge << 3) | tolerance
    }

    /// Charge remaining, in percent.
    pub fn charge_percent(&self) -> u8 {
        ((self.percent >> 3) & 0x0F) * 10
    }

    /// Prediction tolerance, in percent.
    pub fn tolerance_percent(&self) -> u8 {
        (self.percent & 0x07) * 10
    }

    fn write(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.id);
        buf.put_u8(self.length);
        buf.put_u8(self.percent);
        buf.put_u16(self.days);
        buf.put_u32(self.age);
    }

    fn read(buf: &[u8]) -> Self {
        Self {
            id: buf[0],
            length: buf[1],
            percent: buf[2],
            days: BigEndian::read_u16(&buf[3..5]),
            age: BigEndian::read_u32(&buf[5..9]),
        }
    }
}

/// Battery values used to fill the battery group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryInfo {
    pub charge_percent: u8,
    pub tolerance_percent: u8,
    pub days_remaining: u16,
    pub age_days: u32,
}

impl Default for BatteryInfo {
    fn default() -> Self {
        Self {
            charge_percent: 80,
            tolerance_percent: 10,
            days_remaining: 100,
            age_days: 10,
        }
    }
}

/// Everything before the telemetry region, as decoded from the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedRegion {
    pub transport: TransportHeader,
    pub header: CcxHeader,
    pub system: SystemGroup,
    pub battery: BatteryGroup,
}

impl FixedRegion {
    /// Encode the fixed region.
    pub fn encode(&self, buf: &mut impl BufMut) {
        self.transport.write(buf);
        self.header.write(buf);
        self.system.write(buf);
        self.battery.write(buf);
    }

    /// Decode the fixed region from the start of `buf`.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < FIXED_REGION_SIZE {
            return Err(ProtocolError::truncated("fixed region", FIXED_REGION_SIZE, buf.len()).into());
        }

        let mut offset = 0;
        let transport = TransportHeader::read(&buf[offset..]);
        offset += TransportHeader::SIZE;
        let header = CcxHeader::read(&buf[offset..]);
        offset += CcxHeader::SIZE;
        let system = SystemGroup::read(&buf[offset..]);
        offset += SystemGroup::SIZE;
        let battery = BatteryGroup::read(&buf[offset..]);

        Ok(Self {
            transport,
            header,
            system,
            battery,
        })
    }
}

/// Values a new packet starts from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacketDefaults {
    /// UDP protocol version in the encapsulating header.
    pub udp_version: u16,
    pub tag_mac: MacAddr,
    pub ap_mac: MacAddr,
    pub sequence: u16,
    /// CCX protocol version.
    pub protocol_version: u8,
    pub tx_power: u8,
    pub channel: u8,
    pub regulatory_class: u8,
    pub burst: u8,
    pub product_type: u16,
    pub battery: BatteryInfo,
}

impl Default for PacketDefaults {
    fn default() -> Self {
        Self {
            udp_version: 0,
            tag_mac: MacAddr([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]),
            ap_mac: MacAddr([0x66, 0x55, 0x44, 0x33, 0x22, 0x11]),
            sequence: 1,
            protocol_version: 0,
            tx_power: 17,
            channel: 1,
            regulatory_class: 0,
            burst: 3,
            product_type: 0,
            battery: BatteryInfo::default(),
        }
    }
}

/// CCX packet under construction.
///
/// The telemetry region is kept in its encoded form; setters append to it
/// and [`Packet::encode`] copies it verbatim.
#[derive(Debug, Clone)]
pub struct Packet {
    pub transport: TransportHeader,
    pub header: CcxHeader,
    pub system: SystemGroup,
    pub battery: BatteryGroup,
    telemetry: BytesMut,
}

impl Packet {
    /// Create a packet with the built-in defaults.
    pub fn new() -> Self {
        Self::with_defaults(&PacketDefaults::default())
    }

    /// Create a packet from explicit defaults.
    pub fn with_defaults(defaults: &PacketDefaults) -> Self {
        Self {
            transport: TransportHeader {
                version: defaults.udp_version,
                tag_mac: defaults.tag_mac,
                ap_mac: defaults.ap_mac,
                sequence: SequenceNumber(defaults.sequence),
            },
            header: CcxHeader {
                version: defaults.protocol_version,
                power: defaults.tx_power,
                channel: defaults.channel,
                regulatory_class: defaults.regulatory_class,
                burst: defaults.burst,
            },
            system: SystemGroup::new(defaults.product_type),
            battery: BatteryGroup::new(&defaults.battery),
            telemetry: BytesMut::new(),
        }
    }

    pub fn set_udp_version(&mut self, version: u16) {
        self.transport.version = version;
    }

    pub fn set_tag_mac(&mut self, mac: MacAddr) {
        self.transport.tag_mac = mac;
    }

    pub fn set_ap_mac(&mut self, mac: MacAddr) {
        self.transport.ap_mac = mac;
    }

    /// Set the tag address from its string form. Leaves it unchanged on error.
    pub fn set_tag_mac_str(&mut self, mac: &str) -> Result<()> {
        self.transport.tag_mac = mac.parse()?;
        Ok(())
    }

    /// Set the AP address from its string form. Leaves it unchanged on error.
    pub fn set_ap_mac_str(&mut self, mac: &str) -> Result<()> {
        self.transport.ap_mac = mac.parse()?;
        Ok(())
    }

    pub fn set_sequence(&mut self, sequence: u16) {
        self.transport.sequence = SequenceNumber(sequence);
    }

    pub fn sequence(&self) -> SequenceNumber {
        self.transport.sequence
    }

    /// Increment the sequence number, wrapping at 65536.
    pub fn increment_sequence(&mut self) {
        self.increment_sequence_by(1);
    }

    pub fn increment_sequence_by(&mut self, n: u16) {
        self.transport.sequence = self.transport.sequence.advance(n);
    }

    pub fn set_protocol_version(&mut self, version: u8) {
        self.header.version = version;
    }

    pub fn set_transmit_power(&mut self, power: u8) {
        self.header.power = power;
    }

    pub fn set_channel(&mut self, channel: u8) {
        self.header.channel = channel;
    }

    pub fn set_regulatory_class(&mut self, class: u8) {
        self.header.regulatory_class = class;
    }

    pub fn set_burst_length(&mut self, burst: u8) {
        self.header.burst = burst;
    }

    pub fn set_product_type(&mut self, product_type: u16) {
        self.system.product_type = product_type;
    }

    pub fn set_battery_info(&mut self, info: &BatteryInfo) {
        self.battery.percent = BatteryGroup::pack_percent(info.charge_percent, info.tolerance_percent);
        self.battery.days = info.days_remaining;
        self.battery.age = info.age_days;
    }

    /// Append a temperature entry. Any f32, including NaN, is accepted.
    pub fn set_temperature(&mut self, celsius: f32) {
        put_temperature(&mut self.telemetry, celsius);
    }

    pub fn set_door_open_percent(&mut self, percent: u8) -> Result<()> {
        self.push_status(&status::door_open_percent(percent))
    }

    pub fn set_high_power_percent(&mut self, percent: u8) -> Result<()> {
        self.push_status(&status::high_power_percent(percent))
    }

    pub fn set_button_pressed(&mut self) -> Result<()> {
        self.push_status(status::BUTTON_PRESSED)
    }

    pub fn set_probe_unplugged(&mut self) -> Result<()> {
        self.push_status(status::PROBE_UNPLUGGED)
    }

    pub fn set_probe_invalid_value(&mut self) -> Result<()> {
        self.push_status(status::PROBE_INVALID_VALUE)
    }

    pub fn set_util_state(&mut self, state: UtilState) -> Result<()> {
        self.push_status(state.status())
    }

    /// Append a status entry carrying `status`.
    pub fn push_status(&mut self, status: &str) -> Result<()> {
        self.push_entry(&TelemetryEntry::Status(status.to_string()))
    }

    /// Append an encoded telemetry entry. Nothing is written on error.
    pub fn push_entry(&mut self, entry: &TelemetryEntry) -> Result<()> {
        entry.encode(&mut self.telemetry)?;
        debug!(?entry, region_len = self.telemetry.len(), "appended telemetry entry");
        Ok(())
    }

    /// Encoded telemetry region.
    pub fn telemetry_bytes(&self) -> &[u8] {
        &self.telemetry
    }

    pub fn clear_telemetry(&mut self) {
        self.telemetry.clear();
    }

    /// Fixed-region view of this packet.
    pub fn fixed_region(&self) -> FixedRegion {
        FixedRegion {
            transport: self.transport,
            header: self.header,
            system: self.system,
            battery: self.battery,
        }
    }

    /// Total encoded size.
    pub fn encoded_len(&self) -> usize {
        FIXED_REGION_SIZE + self.telemetry.len()
    }

    /// Encode packet to bytes.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.fixed_region().encode(&mut buf);
        buf.put_slice(&self.telemetry);
        buf.freeze()
    }
}

impl Default for Packet {
    fn default() -> Self {
        Self::new()
    }
}
