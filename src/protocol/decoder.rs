//! Little-endian integer decoding for characteristic payloads.
//!
//! ESS peripherals publish each sensor value as a little-endian integer.
//! The payload width is whatever the peripheral reports (sensor firmware
//! usually sends a 4-byte `int32_t`), so decoding works on any width from
//! 1 to 8 bytes and sign-extends from the payload's own top bit.

use std::fmt;

use crate::error::{Error, Result};

/// Largest payload that fits a 64-bit sample.
pub const MAX_SAMPLE_LEN: usize = 8;

/// How a payload's top bit is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Signedness {
    /// Two's-complement signed integer.
    Signed,
    /// Plain unsigned integer.
    Unsigned,
}

/// A decoded sample value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sample {
    /// Value decoded as a signed integer.
    Signed(i64),
    /// Value decoded as an unsigned integer.
    Unsigned(u64),
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signed(v) => write!(f, "{}", v),
            Self::Unsigned(v) => write!(f, "{}", v),
        }
    }
}

fn check_len(data: &[u8]) -> Result<()> {
    if data.is_empty() {
        return Err(Error::Decode {
            context: "Empty payload".to_string(),
        });
    }

    if data.len() > MAX_SAMPLE_LEN {
        return Err(Error::Decode {
            context: format!(
                "Payload too long: {} bytes (max {})",
                data.len(),
                MAX_SAMPLE_LEN
            ),
        });
    }

    Ok(())
}

/// Decode a little-endian unsigned integer.
///
/// # Errors
///
/// Returns [`Error::Decode`] for empty payloads or payloads longer than
/// [`MAX_SAMPLE_LEN`] bytes.
///
/// # Example
///
/// ```
/// use ess_sensor_ble::protocol::decode_unsigned;
///
/// assert_eq!(decode_unsigned(&[0xFF, 0xFF]).unwrap(), 65535);
/// ```
pub fn decode_unsigned(data: &[u8]) -> Result<u64> {
    check_len(data)?;

    let mut buf = [0u8; MAX_SAMPLE_LEN];
    buf[..data.len()].copy_from_slice(data);
    Ok(u64::from_le_bytes(buf))
}

/// Decode a little-endian two's-complement signed integer.
///
/// # Example
///
/// ```
/// use ess_sensor_ble::protocol::decode_signed;
///
/// assert_eq!(decode_signed(&[0xFF, 0xFF]).unwrap(), -1);
/// assert_eq!(decode_signed(&[0x0A, 0x00]).unwrap(), 10);
/// ```
pub fn decode_signed(data: &[u8]) -> Result<i64> {
    check_len(data)?;

    // Pad with the sign byte so the value extends to 64 bits.
    let negative = data[data.len() - 1] & 0x80 != 0;
    let fill = if negative { 0xFF } else { 0x00 };
    let mut buf = [fill; MAX_SAMPLE_LEN];
    buf[..data.len()].copy_from_slice(data);
    Ok(i64::from_le_bytes(buf))
}

/// Decode a payload with the given signedness.
pub fn decode(data: &[u8], signedness: Signedness) -> Result<Sample> {
    match signedness {
        Signedness::Signed => decode_signed(data).map(Sample::Signed),
        Signedness::Unsigned => decode_unsigned(data).map(Sample::Unsigned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_all_ones_two_bytes() {
        assert_eq!(decode_unsigned(&[0xFF, 0xFF]).unwrap(), 65535);
        assert_eq!(decode_signed(&[0xFF, 0xFF]).unwrap(), -1);
    }

    #[test]
    fn test_firmware_int32_payload() {
        // -5 as int32_t, little-endian
        let data = (-5i32).to_le_bytes();
        assert_eq!(decode_signed(&data).unwrap(), -5);
        assert_eq!(decode_unsigned(&data).unwrap(), 0xFFFF_FFFB);
    }

    #[test]
    fn test_single_byte() {
        assert_eq!(decode_signed(&[0x80]).unwrap(), -128);
        assert_eq!(decode_unsigned(&[0x80]).unwrap(), 128);
    }

    #[test]
    fn test_odd_width_sign_extension() {
        // 3-byte 0x800000 is the most negative 24-bit value
        assert_eq!(decode_signed(&[0x00, 0x00, 0x80]).unwrap(), -8_388_608);
        assert_eq!(decode_signed(&[0xFF, 0xFF, 0x7F]).unwrap(), 8_388_607);
    }

    #[test]
    fn test_empty_payload_is_an_error() {
        assert!(matches!(decode_signed(&[]), Err(Error::Decode { .. })));
        assert!(matches!(decode_unsigned(&[]), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_oversized_payload_is_an_error() {
        let data = [0u8; 9];
        assert!(matches!(decode(&data, Signedness::Signed), Err(Error::Decode { .. })));
    }

    #[test]
    fn test_decode_dispatch() {
        assert_eq!(
            decode(&[0xFE, 0xFF], Signedness::Signed).unwrap(),
            Sample::Signed(-2)
        );
        assert_eq!(
            decode(&[0xFE, 0xFF], Signedness::Unsigned).unwrap(),
            Sample::Unsigned(65534)
        );
    }

    #[test]
    fn test_sample_display() {
        assert_eq!(Sample::Signed(-40).to_string(), "-40");
        assert_eq!(Sample::Unsigned(1013).to_string(), "1013");
    }

    proptest! {
        #[test]
        fn prop_i16_matches_twos_complement(v in any::<i16>()) {
            let bytes = v.to_le_bytes();
            prop_assert_eq!(decode_signed(&bytes).unwrap(), v as i64);
            prop_assert_eq!(decode_unsigned(&bytes).unwrap(), v as u16 as u64);
        }

        #[test]
        fn prop_i32_matches_twos_complement(v in any::<i32>()) {
            let bytes = v.to_le_bytes();
            prop_assert_eq!(decode_signed(&bytes).unwrap(), v as i64);
            prop_assert_eq!(decode_unsigned(&bytes).unwrap(), v as u32 as u64);
        }

        #[test]
        fn prop_i64_full_width(v in any::<i64>()) {
            prop_assert_eq!(decode_signed(&v.to_le_bytes()).unwrap(), v);
        }
    }
}
