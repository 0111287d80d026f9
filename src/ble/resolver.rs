//! Characteristic resolution.
//!
//! A characteristic is looked up inside its parent service first, then by
//! UUID across every discovered service. Each step reports a tagged
//! [`Resolution`] instead of failing, so the caller decides what a miss means.

use std::collections::BTreeSet;

use btleplug::api::{Characteristic, Service};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Outcome of a characteristic lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The characteristic was found.
    Found(Characteristic),
    /// The service is absent, or does not contain the characteristic.
    NotFoundViaService,
    /// No discovered service contains the characteristic.
    NotFoundDirect,
}

impl Resolution {
    /// Convert into a result, mapping both misses to
    /// [`Error::CharacteristicNotFound`].
    pub fn into_result(self, characteristic_uuid: &Uuid) -> Result<Characteristic> {
        match self {
            Self::Found(characteristic) => Ok(characteristic),
            Self::NotFoundViaService | Self::NotFoundDirect => Err(Error::CharacteristicNotFound {
                uuid: characteristic_uuid.to_string(),
            }),
        }
    }
}

/// Look up a characteristic inside one service.
pub fn resolve_in_service(
    services: &BTreeSet<Service>,
    service_uuid: &Uuid,
    characteristic_uuid: &Uuid,
) -> Resolution {
    services
        .iter()
        .find(|service| service.uuid == *service_uuid)
        .and_then(|service| {
            service
                .characteristics
                .iter()
                .find(|c| c.uuid == *characteristic_uuid)
        })
        .cloned()
        .map(Resolution::Found)
        .unwrap_or(Resolution::NotFoundViaService)
}

/// Look up a characteristic by UUID across every service.
pub fn resolve_direct(services: &BTreeSet<Service>, characteristic_uuid: &Uuid) -> Resolution {
    services
        .iter()
        .flat_map(|service| service.characteristics.iter())
        .find(|c| c.uuid == *characteristic_uuid)
        .cloned()
        .map(Resolution::Found)
        .unwrap_or(Resolution::NotFoundDirect)
}

/// Resolve through the service first, falling back to a direct lookup.
pub fn resolve(
    services: &BTreeSet<Service>,
    service_uuid: &Uuid,
    characteristic_uuid: &Uuid,
) -> Resolution {
    match resolve_in_service(services, service_uuid, characteristic_uuid) {
        Resolution::NotFoundViaService => {
            debug!(
                "Characteristic {} not in service {}, trying a direct lookup",
                characteristic_uuid, service_uuid
            );
            resolve_direct(services, characteristic_uuid)
        }
        found => found,
    }
}
