//! Telemetry entries and the telemetry region reader.

use std::fmt;

use bytes::BufMut;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ProtocolError, Result};
use crate::util::{decode_f32_be, decode_wide_ascii, encode_wide_ascii};

use super::{
    MAX_STATUS_CHARS, STATUS_TYPE, TELEMETRY_GROUP_ID, TEMPERATURE_ENTRY_SIZE,
    TEMPERATURE_GROUP_LENGTH, TEMPERATURE_TYPE,
};

/// Group id + group length + telemetry type.
const RECORD_PREFIX_SIZE: usize = 3;

/// One decoded telemetry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TelemetryEntry {
    /// Temperature in Celsius.
    Temperature(f32),
    /// ASCII status string, e.g. `BUTTON=PRESSED` or `DOOR_OPEN_PERCENT=22`.
    Status(String),
}

impl TelemetryEntry {
    /// Telemetry type byte.
    pub fn telemetry_type(&self) -> u8 {
        match self {
            Self::Temperature(_) => TEMPERATURE_TYPE,
            Self::Status(_) => STATUS_TYPE,
        }
    }

    /// Value of the group length field (type + payload).
    pub fn group_length(&self) -> usize {
        match self {
            Self::Temperature(_) => TEMPERATURE_GROUP_LENGTH as usize,
            Self::Status(s) => s.len() * 2 + 2,
        }
    }

    /// Total encoded size, including group id and length.
    pub fn encoded_len(&self) -> usize {
        self.group_length() + 2
    }

    /// Split a `KEY=VALUE` status into its parts.
    pub fn key_value(&self) -> Option<(&str, &str)> {
        match self {
            Self::Status(s) => s.split_once('='),
            Self::Temperature(_) => None,
        }
    }

    /// Append the encoded entry to `buf`. Nothing is written on error.
    pub fn encode(&self, buf: &mut impl BufMut) -> Result<()> {
        match self {
            Self::Temperature(celsius) => {
                put_temperature(buf, *celsius);
                Ok(())
            }
            Self::Status(status) => {
                if status.len() > MAX_STATUS_CHARS {
                    return Err(ProtocolError::StatusTooLong {
                        len: status.len(),
                        max: MAX_STATUS_CHARS,
                    }
                    .into());
                }
                let wide = encode_wide_ascii(status)?;

                buf.put_u8(TELEMETRY_GROUP_ID);
                buf.put_u8((wide.len() + 2) as u8);
                buf.put_u8(STATUS_TYPE);
                buf.put_u8(wide.len() as u8);
                buf.put_slice(&wide);
                Ok(())
            }
        }
    }
}

impl fmt::Display for TelemetryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature(celsius) => {
                writeln!(f, "  - Temperature Group")?;
                writeln!(f, "    - Group ID = {TELEMETRY_GROUP_ID}")?;
                writeln!(f, "    - Group Length = {}", self.group_length())?;
                writeln!(f, "    - Type = {TEMPERATURE_TYPE}")?;
                writeln!(f, "    - Temperature = {celsius:.2} C")
            }
            Self::Status(status) => {
                writeln!(f, "  - Status Group")?;
                writeln!(f, "    - Group ID = {TELEMETRY_GROUP_ID}")?;
                writeln!(f, "    - Group Length = {}", self.group_length())?;
                writeln!(f, "    - Type = {STATUS_TYPE}")?;
                writeln!(f, "    - Status Length = {}", status.len() * 2)?;
                writeln!(f, "    - Status = '{status}'")
            }
        }
    }
}

/// Write a 7-byte temperature entry.
pub(crate) fn put_temperature(buf: &mut impl BufMut, celsius: f32) {
    buf.put_u8(TELEMETRY_GROUP_ID);
    buf.put_u8(TEMPERATURE_GROUP_LENGTH);
    buf.put_u8(TEMPERATURE_TYPE);
    buf.put_f32(celsius);
}

/// A record the reader stepped over without decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    /// Offset of the group id within the packet.
    pub offset: usize,
    pub group_id: u8,
    /// Telemetry type, for unknown types inside the telemetry group.
    pub telemetry_type: Option<u8>,
    /// Bytes skipped, including group id and length.
    pub len: usize,
}

impl fmt::Display for SkippedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.telemetry_type {
            Some(ty) => writeln!(
                f,
                "  - Skipped Telemetry (type {ty}, {} bytes at offset {})",
                self.len, self.offset
            ),
            None => writeln!(
                f,
                "  - Skipped Group (id {}, {} bytes at offset {})",
                self.group_id, self.len, self.offset
            ),
        }
    }
}

/// Item produced by [`TelemetryReader`].
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryRecord {
    Entry(TelemetryEntry),
    Skipped(SkippedRecord),
}

/// Streaming reader over an encoded telemetry region.
///
/// Yields one record per group until the region is exhausted. Unrecognized
/// groups and telemetry types are stepped over using their group length, or
/// reported as errors in strict mode. Iteration stops after the first error.
#[derive(Debug, Clone)]
pub struct TelemetryReader<'a> {
    data: &'a [u8],
    cursor: usize,
    base_offset: usize,
    strict: bool,
    done: bool,
}

impl<'a> TelemetryReader<'a> {
    /// Read a bare telemetry region.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            cursor: 0,
            base_offset: 0,
            strict: false,
            done: false,
        }
    }

    /// Treat unrecognized groups and types as errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Offset of `data` within the packet, used in skip reports.
    pub fn with_base_offset(mut self, offset: usize) -> Self {
        self.base_offset = offset;
        self
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    fn read_record(&mut self) -> Result<TelemetryRecord> {
        let start = self.cursor;
        let rest = &self.data[start..];
        if rest.len() < RECORD_PREFIX_SIZE {
            return Err(ProtocolError::truncated("telemetry group", RECORD_PREFIX_SIZE, rest.len()).into());
        }

        let group_id = rest[0];
        let group_len = rest[1];
        let telemetry_type = rest[2];

        if group_id != TELEMETRY_GROUP_ID {
            if self.strict {
                return Err(ProtocolError::UnknownGroup(group_id).into());
            }
            return self.skip(start, group_id, None, group_len);
        }

        let body = &rest[RECORD_PREFIX_SIZE..];
        match telemetry_type {
            TEMPERATURE_TYPE => {
                if body.len() < 4 {
                    return Err(ProtocolError::truncated("temperature telemetry", 4, body.len()).into());
                }
                if group_len != TEMPERATURE_GROUP_LENGTH {
                    return Err(ProtocolError::GroupLengthMismatch {
                        what: "temperature telemetry",
                        expected: TEMPERATURE_GROUP_LENGTH as usize,
                        got: group_len,
                    }
                    .into());
                }

                let celsius = decode_f32_be(body)?;
                self.cursor = start + TEMPERATURE_ENTRY_SIZE;
                Ok(TelemetryRecord::Entry(TelemetryEntry::Temperature(celsius)))
            }
            STATUS_TYPE => {
                if body.is_empty() {
                    return Err(ProtocolError::truncated("status telemetry", 1, 0).into());
                }

                let status_len = body[0] as usize;
                let payload = &body[1..];
                if payload.len() < status_len {
                    return Err(ProtocolError::truncated("status string", status_len, payload.len()).into());
                }
                if status_len % 2 != 0 {
                    return Err(ProtocolError::OddStatusLength(status_len).into());
                }
                if group_len as usize != status_len + 2 {
                    return Err(ProtocolError::GroupLengthMismatch {
                        what: "status telemetry",
                        expected: status_len + 2,
                        got: group_len,
                    }
                    .into());
                }

                let status = decode_wide_ascii(&payload[..status_len])?;
                self.cursor = start + RECORD_PREFIX_SIZE + 1 + status_len;
                Ok(TelemetryRecord::Entry(TelemetryEntry::Status(status)))
            }
            other => {
                if self.strict {
                    return Err(ProtocolError::UnknownTelemetryType(other).into());
                }
                self.skip(start, group_id, Some(other), group_len)
            }
        }
    }

    fn skip(
        &mut self,
        start: usize,
        group_id: u8,
        telemetry_type: Option<u8>,
        group_len: u8,
    ) -> Result<TelemetryRecord> {
        let len = 2 + group_len as usize;
        let available = self.data.len() - start;
        if len > available {
            return Err(ProtocolError::truncated("unrecognized group", len, available).into());
        }

        self.cursor = start + len;
        let record = SkippedRecord {
            offset: self.base_offset + start,
            group_id,
            telemetry_type,
            len,
        };
        warn!(
            offset = record.offset,
            group_id,
            telemetry_type = ?telemetry_type,
            len,
            "skipping unrecognized telemetry record"
        );
        Ok(TelemetryRecord::Skipped(record))
    }
}

impl Iterator for TelemetryReader<'_> {
    type Item = Result<TelemetryRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor >= self.data.len() {
            return None;
        }

        let record = self.read_record();
        match &record {
            Ok(TelemetryRecord::Entry(entry)) => debug!(?entry, "decoded telemetry entry"),
            Ok(TelemetryRecord::Skipped(_)) => {}
            Err(_) => self.done = true,
        }
        Some(record)
    }
}
