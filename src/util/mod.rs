//! Byte and field conversion helpers shared by the codec.

use byteorder::{BigEndian, ByteOrder};

use crate::error::{ProtocolError, Result};

/// Decode the first 4 bytes as a big-endian IEEE-754 single.
pub fn decode_f32_be(bytes: &[u8]) -> Result<f32> {
    if bytes.len() < 4 {
        return Err(ProtocolError::truncated("float32", 4, bytes.len()).into());
    }
    Ok(BigEndian::read_f32(&bytes[..4]))
}

/// Encode an ASCII string as wide bytes: `0x00` then the character, per character.
pub fn encode_wide_ascii(s: &str) -> Result<Vec<u8>> {
    if !s.is_ascii() {
        return Err(ProtocolError::NonAsciiStatus(s.to_string()).into());
    }

    let mut out = Vec::with_capacity(s.len() * 2);
    for b in s.bytes() {
        out.push(0x00);
        out.push(b);
    }
    Ok(out)
}

/// Decode wide bytes back to a string, keeping the low byte of each pair.
///
/// The high byte is dropped without inspection. An odd trailing byte or a
/// low byte outside ASCII is an error.
pub fn decode_wide_ascii(bytes: &[u8]) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(ProtocolError::OddStatusLength(bytes.len()).into());
    }

    let decoded: String = bytes.chunks_exact(2).map(|pair| char::from(pair[1])).collect();
    if !decoded.is_ascii() {
        return Err(ProtocolError::NonAsciiStatus(decoded).into());
    }
    Ok(decoded)
}

/// Parse a colon-delimited mac-address string into 6 bytes.
pub fn mac_to_bytes(mac: &str) -> Result<[u8; 6]> {
    let hex_str = mac.replace(':', "");
    if hex_str.len() != 12 {
        return Err(ProtocolError::InvalidMacAddress(mac.to_string()).into());
    }

    let mut out = [0u8; 6];
    hex::decode_to_slice(&hex_str, &mut out)
        .map_err(|_| ProtocolError::InvalidMacAddress(mac.to_string()))?;
    Ok(out)
}

/// Format 6 bytes as uppercase colon-delimited hex pairs.
pub fn mac_to_string(bytes: &[u8; 6]) -> String {
    format!(
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_decode_f32_be() {
        let bytes = 12.34f32.to_be_bytes();
        let value = decode_f32_be(&bytes).unwrap();
        assert!((value - 12.34).abs() < f32::EPSILON);

        // Extra bytes after the float are ignored
        let value = decode_f32_be(&[0x3F, 0x80, 0x00, 0x00, 0xFF]).unwrap();
        assert_eq!(value, 1.0);
    }

    #[test]
    fn test_decode_f32_be_short() {
        let err = decode_f32_be(&[0x3F, 0x80, 0x00]).unwrap_err();
        assert!(err.is_truncation());
    }

    #[test]
    fn test_wide_ascii_button_pressed() {
        let encoded = encode_wide_ascii("BUTTON=PRESSED").unwrap();
        assert_eq!(encoded.len(), 28);
        assert!(encoded.iter().step_by(2).all(|&b| b == 0x00));
        assert_eq!(&encoded[..4], &[0x00, b'B', 0x00, b'U']);

        assert_eq!(decode_wide_ascii(&encoded).unwrap(), "BUTTON=PRESSED");
    }

    #[test]
    fn test_wide_ascii_empty() {
        assert!(encode_wide_ascii("").unwrap().is_empty());
        assert_eq!(decode_wide_ascii(&[]).unwrap(), "");
    }

    #[test]
    fn test_wide_ascii_rejects_non_ascii() {
        let err = encode_wide_ascii("TEMP=20°").unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::NonAsciiStatus(_))));
    }

    #[test]
    fn test_wide_ascii_odd_length() {
        let err = decode_wide_ascii(&[0x00, b'A', 0x00]).unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::OddStatusLength(3))));
    }

    #[test]
    fn test_wide_ascii_ignores_high_byte() {
        assert_eq!(decode_wide_ascii(&[0x12, b'O', 0x34, b'K']).unwrap(), "OK");
    }

    #[test]
    fn test_wide_ascii_decode_rejects_non_ascii() {
        let err = decode_wide_ascii(&[0x00, b'O', 0x00, 0xE9]).unwrap_err();
        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::NonAsciiStatus(ref s)) if s == "O\u{e9}"
        ));
        assert!(decode_wide_ascii(&[0x00, 0x7F]).is_ok());
    }

    #[test]
    fn test_mac_to_bytes() {
        assert_eq!(
            mac_to_bytes("11:22:33:44:55:66").unwrap(),
            [0x11, 0x22, 0x33, 0x44, 0x55, 0x66]
        );
        assert_eq!(
            mac_to_bytes("aa:bb:cc:dd:ee:ff").unwrap(),
            [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]
        );
        // Delimiters are stripped, not counted
        assert_eq!(
            mac_to_bytes("001122334455").unwrap(),
            [0x00, 0x11, 0x22, 0x33, 0x44, 0x55]
        );
    }

    #[test]
    fn test_mac_to_bytes_invalid() {
        for bad in ["", "11:22:33:44:55", "11:22:33:44:55:66:77", "zz:22:33:44:55:66"] {
            let err = mac_to_bytes(bad).unwrap_err();
            assert!(
                matches!(err, Error::Protocol(ProtocolError::InvalidMacAddress(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_mac_to_string() {
        assert_eq!(
            mac_to_string(&[0x0a, 0xbb, 0x00, 0x01, 0xfe, 0x66]),
            "0A:BB:00:01:FE:66"
        );
    }
}
