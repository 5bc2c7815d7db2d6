//! Core types used by the codec and the tools.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::util::{mac_to_bytes, mac_to_string};

/// 6-byte hardware address of a tag or access point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl FromStr for MacAddr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        mac_to_bytes(s).map(Self)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&mac_to_string(&self.0))
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

impl Serialize for MacAddr {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 16-bit packet sequence number. Arithmetic wraps at 65536.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceNumber(pub u16);

impl SequenceNumber {
    pub fn next(self) -> Self {
        self.advance(1)
    }

    pub fn advance(self, n: u16) -> Self {
        Self(self.0.wrapping_add(n))
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Utility (mains) power state reported by a power-monitoring tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UtilState {
    #[default]
    Unplugged,
    Off,
    Idle,
    Active,
}

impl UtilState {
    /// Status token sent on the wire for this state.
    pub fn status(self) -> &'static str {
        match self {
            Self::Unplugged => crate::protocol::status::UTIL_STATE_UNPLUGGED,
            Self::Off => crate::protocol::status::UTIL_STATE_PLUGGED_IN_OFF,
            Self::Idle => crate::protocol::status::UTIL_STATE_PLUGGED_IN_IDLE,
            Self::Active => crate::protocol::status::UTIL_STATE_PLUGGED_IN_ACTIVE,
        }
    }

    /// Recover the state from a decoded status string.
    pub fn from_status(status: &str) -> Option<Self> {
        [Self::Unplugged, Self::Off, Self::Idle, Self::Active]
            .into_iter()
            .find(|s| s.status() == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_addr_parse_display() {
        let mac: MacAddr = "aa:bb:cc:00:11:22".parse().unwrap();
        assert_eq!(mac.as_bytes(), &[0xAA, 0xBB, 0xCC, 0x00, 0x11, 0x22]);
        assert_eq!(mac.to_string(), "AA:BB:CC:00:11:22");
        assert!("aa:bb:cc".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_mac_addr_serde() {
        let mac = MacAddr([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
        let json = serde_json::to_string(&mac).unwrap();
        assert_eq!(json, "\"11:22:33:44:55:66\"");
        let back: MacAddr = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mac);
        assert!(serde_json::from_str::<MacAddr>("\"nope\"").is_err());
    }

    #[test]
    fn test_sequence_wraparound() {
        assert_eq!(SequenceNumber(65535).next(), SequenceNumber(0));
        assert_eq!(SequenceNumber(65530).advance(10), SequenceNumber(4));
        assert_eq!(SequenceNumber(1).next(), SequenceNumber(2));
    }

    #[test]
    fn test_util_state_tokens() {
        assert_eq!(UtilState::Unplugged.status(), "UTIL_STATE=UNPLUGGED");
        assert_eq!(UtilState::Off.status(), "UTIL_STATE=PLUGGED_IN_OFF");
        assert_eq!(UtilState::Idle.status(), "UTIL_STATE=PLUGGED_IN_IDLE");
        assert_eq!(UtilState::Active.status(), "UTIL_STATE=PLUGGED_IN_ACTIVE");
        assert_eq!(
            UtilState::from_status("UTIL_STATE=PLUGGED_IN_IDLE"),
            Some(UtilState::Idle)
        );
        assert_eq!(UtilState::from_status("BUTTON=PRESSED"), None);
    }

}
