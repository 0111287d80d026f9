//! Service, characteristic and descriptor explorer.
//!
//! Walks the whole GATT table of a session and prints a metadata block for
//! every entity. Values are read where possible; a failed read is reported
//! inline and the walk carries on.

use btleplug::api::CharPropFlags;
use tracing::info;

use crate::ble::session::GattSession;
use crate::ble::uuids::describe;
use crate::error::Result;
use crate::output::Output;
use crate::protocol::decode_signed;
use crate::protocol::decoder::MAX_SAMPLE_LEN;

/// Counts of what an exploration visited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExploreSummary {
    /// Services printed.
    pub services: usize,
    /// Characteristics printed.
    pub characteristics: usize,
    /// Descriptors printed.
    pub descriptors: usize,
    /// Reads that failed.
    pub unreadable: usize,
}

/// Names of the properties set in `flags`.
pub fn property_names(flags: CharPropFlags) -> Vec<&'static str> {
    const NAMES: [(CharPropFlags, &str); 8] = [
        (CharPropFlags::BROADCAST, "broadcast"),
        (CharPropFlags::READ, "read"),
        (CharPropFlags::WRITE_WITHOUT_RESPONSE, "write-without-response"),
        (CharPropFlags::WRITE, "write"),
        (CharPropFlags::NOTIFY, "notify"),
        (CharPropFlags::INDICATE, "indicate"),
        (CharPropFlags::AUTHENTICATED_SIGNED_WRITES, "authenticated-signed-writes"),
        (CharPropFlags::EXTENDED_PROPERTIES, "extended-properties"),
    ];

    NAMES
        .iter()
        .filter(|(flag, _)| flags.contains(*flag))
        .map(|(_, name)| *name)
        .collect()
}

/// Render a raw value for display.
///
/// Values short enough to be an integer are shown as the signed
/// little-endian integer plus the raw bytes.
pub fn format_value(data: &[u8]) -> String {
    if data.is_empty() {
        return "<empty>".to_string();
    }

    if data.len() <= MAX_SAMPLE_LEN {
        if let Ok(value) = decode_signed(data) {
            return format!("{} {:02X?}", value, data);
        }
    }

    format!("{:02X?}", data)
}

fn format_read(result: Result<Vec<u8>>, summary: &mut ExploreSummary) -> String {
    match result {
        Ok(data) => format_value(&data),
        Err(e) => {
            summary.unreadable += 1;
            format!("unreadable: {}", e)
        }
    }
}

/// Print every service, characteristic and descriptor on the session.
///
/// # Errors
///
/// Only output failures end the walk; read failures are printed in place
/// of the value.
pub async fn explore<S: GattSession + ?Sized>(
    session: &S,
    output: &Output,
) -> Result<ExploreSummary> {
    let mut summary = ExploreSummary::default();

    for service in session.services() {
        output.line(format_args!("- Description: {}", describe(&service.uuid)))?;
        output.line(format_args!("- UUID: {}", service.uuid))?;
        output.line(format_args!("- Primary: {}", service.primary))?;
        summary.services += 1;

        for characteristic in &service.characteristics {
            let value = if characteristic.properties.contains(CharPropFlags::READ) {
                Some(format_read(session.read(characteristic).await, &mut summary))
            } else {
                None
            };

            output.line(format_args!("\t- Description: {}", describe(&characteristic.uuid)))?;
            output.line(format_args!("\t- UUID: {}", characteristic.uuid))?;
            output.line(format_args!(
                "\t- Properties: {}",
                property_names(characteristic.properties).join(", ")
            ))?;
            if let Some(value) = value {
                output.line(format_args!("\t- Value: {}", value))?;
            }
            summary.characteristics += 1;

            for descriptor in &characteristic.descriptors {
                let value = format_read(session.read_descriptor(descriptor).await, &mut summary);

                output.line(format_args!("\t\t- Description: {}", describe(&descriptor.uuid)))?;
                output.line(format_args!("\t\t- UUID: {}", descriptor.uuid))?;
                output.line(format_args!("\t\t- Value: {}", value))?;
                summary.descriptors += 1;
            }
        }
    }

    info!(
        "Explored {} services, {} characteristics, {} descriptors ({} unreadable)",
        summary.services, summary.characteristics, summary.descriptors, summary.unreadable
    );

    Ok(summary)
}
