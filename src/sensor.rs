//! Environmental sensor descriptors and decoded readings.

use std::fmt;

use uuid::Uuid;

use crate::ble::uuids::{HUMIDITY_UUID, ILLUMINANCE_UUID, PRESSURE_UUID, TEMPERATURE_UUID};
use crate::error::Result;
use crate::protocol::{decode, Sample, Signedness};

/// One of the four ESS sensor characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SensorKind {
    /// Ambient temperature (°C).
    Temperature,
    /// Barometric pressure (hPa).
    Pressure,
    /// Relative humidity (%).
    Humidity,
    /// Illuminance (lumens).
    Illuminance,
}

impl SensorKind {
    /// All sensor kinds, in the order the tools read and print them.
    pub const ALL: [SensorKind; 4] = [
        SensorKind::Illuminance,
        SensorKind::Temperature,
        SensorKind::Pressure,
        SensorKind::Humidity,
    ];

    /// Full 128-bit characteristic UUID.
    pub fn uuid(&self) -> Uuid {
        match self {
            Self::Temperature => TEMPERATURE_UUID,
            Self::Pressure => PRESSURE_UUID,
            Self::Humidity => HUMIDITY_UUID,
            Self::Illuminance => ILLUMINANCE_UUID,
        }
    }

    /// 16-bit SIG-assigned characteristic UUID.
    pub fn short_uuid(&self) -> u16 {
        match self {
            Self::Temperature => 0x2a6e,
            Self::Pressure => 0x2a6d,
            Self::Humidity => 0x2a6f,
            Self::Illuminance => 0x2afb,
        }
    }

    /// Look up the sensor kind for a characteristic UUID.
    pub fn from_uuid(uuid: &Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.uuid() == *uuid)
    }

    /// Label printed in front of the value.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Temperature => "Temperature Level",
            Self::Pressure => "Pressure Level",
            Self::Humidity => "Humidity Level",
            Self::Illuminance => "Lux Level",
        }
    }

    /// Unit printed after the value.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Temperature => "deg C",
            Self::Pressure => "hPa",
            Self::Humidity => "%",
            Self::Illuminance => "lumens",
        }
    }

    /// How this characteristic's payload is decoded.
    ///
    /// The peripheral publishes every ESS value as an `int32_t`, so all
    /// four kinds are signed on every read path.
    pub fn signedness(&self) -> Signedness {
        Signedness::Signed
    }

    /// Decode a raw payload into a reading for this sensor.
    pub fn decode(&self, data: &[u8]) -> Result<Reading> {
        Ok(Reading {
            kind: *self,
            value: decode(data, self.signedness())?,
        })
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => write!(f, "Temperature"),
            Self::Pressure => write!(f, "Pressure"),
            Self::Humidity => write!(f, "Humidity"),
            Self::Illuminance => write!(f, "Illuminance"),
        }
    }
}

/// A decoded value from one sensor characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reading {
    /// Which sensor produced the value.
    pub kind: SensorKind,
    /// The decoded value, in the sensor's unit.
    pub value: Sample,
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}", self.kind.label(), self.value, self.kind.unit())
    }
}
