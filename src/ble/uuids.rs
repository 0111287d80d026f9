//! BLE Service and Characteristic UUIDs.
//!
//! Contains the Environmental Sensing Service UUIDs plus the handful of
//! SIG-assigned UUIDs the explorer knows how to name.

use btleplug::api::bleuuid::{uuid_from_u16, uuid_from_u32, BleUuid};
use uuid::Uuid;

use crate::error::{Error, Result};

// Environmental Sensing Service (Standard BLE)
/// Environmental Sensing Service UUID.
pub const ESS_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_181a_0000_1000_8000_00805f9b34fb);
/// Temperature characteristic UUID (Read, Notify).
pub const TEMPERATURE_UUID: Uuid = Uuid::from_u128(0x0000_2a6e_0000_1000_8000_00805f9b34fb);
/// Pressure characteristic UUID (Read, Notify).
pub const PRESSURE_UUID: Uuid = Uuid::from_u128(0x0000_2a6d_0000_1000_8000_00805f9b34fb);
/// Humidity characteristic UUID (Read, Notify).
pub const HUMIDITY_UUID: Uuid = Uuid::from_u128(0x0000_2a6f_0000_1000_8000_00805f9b34fb);
/// Illuminance characteristic UUID (Read, Notify).
pub const ILLUMINANCE_UUID: Uuid = Uuid::from_u128(0x0000_2afb_0000_1000_8000_00805f9b34fb);

// Descriptors
/// Client Characteristic Configuration descriptor UUID.
pub const CCCD_UUID: Uuid = Uuid::from_u128(0x0000_2902_0000_1000_8000_00805f9b34fb);

/// Names for well-known SIG-assigned 16-bit UUIDs.
const KNOWN_UUIDS: &[(u16, &str)] = &[
    (0x1800, "Generic Access Profile"),
    (0x1801, "Generic Attribute Profile"),
    (0x180a, "Device Information"),
    (0x180f, "Battery Service"),
    (0x181a, "Environmental Sensing"),
    (0x2a00, "Device Name"),
    (0x2a01, "Appearance"),
    (0x2a04, "Peripheral Preferred Connection Parameters"),
    (0x2a05, "Service Changed"),
    (0x2a19, "Battery Level"),
    (0x2a29, "Manufacturer Name String"),
    (0x2a6d, "Pressure"),
    (0x2a6e, "Temperature"),
    (0x2a6f, "Humidity"),
    (0x2afb, "Illuminance"),
    (0x2b29, "Client Supported Features"),
    (0x2b2a, "Database Hash"),
    (0x2900, "Characteristic Extended Properties"),
    (0x2901, "Characteristic User Description"),
    (0x2902, "Client Characteristic Configuration"),
    (0x2903, "Server Characteristic Configuration"),
    (0x2904, "Characteristic Presentation Format"),
];

/// Parse a UUID in either short (`2a6e`, `0x2a6e`) or full 128-bit form.
///
/// Short forms are expanded onto the Bluetooth base UUID, so `"2a6e"` and
/// `"00002a6e-0000-1000-8000-00805f9b34fb"` parse to the same value.
pub fn parse_uuid(text: &str) -> Result<Uuid> {
    let trimmed = text.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex.len() == 4 {
        return u16::from_str_radix(hex, 16)
            .map(uuid_from_u16)
            .map_err(|_| Error::Decode {
                context: format!("Invalid short UUID: {}", text),
            });
    }

    if hex.len() == 8 {
        return u32::from_str_radix(hex, 16)
            .map(uuid_from_u32)
            .map_err(|_| Error::Decode {
                context: format!("Invalid short UUID: {}", text),
            });
    }

    Uuid::parse_str(trimmed).map_err(|e| Error::Decode {
        context: format!("Invalid UUID {}: {}", text, e),
    })
}

/// The 16-bit form of a UUID, if it sits on the Bluetooth base UUID.
pub fn short_form(uuid: &Uuid) -> Option<u16> {
    uuid.to_ble_u16()
}

/// Human-readable name for a SIG-assigned UUID.
pub fn describe(uuid: &Uuid) -> &'static str {
    short_form(uuid)
        .and_then(|short| {
            KNOWN_UUIDS
                .iter()
                .find(|(known, _)| *known == short)
                .map(|(_, name)| *name)
        })
        .unwrap_or("Vendor specific")
}
