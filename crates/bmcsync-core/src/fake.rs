// In-memory endpoint used by the unit tests of the reconcilers.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use bmcsync_api::{Bios, ComputerSystem, Error as ApiError, ResetType};

use crate::endpoint::Endpoint;

/// Failure the fake returns instead of the systems list.
#[derive(Debug, Clone, Copy)]
pub enum SystemsFailure {
    Unauthorized,
    ServerError,
    NoSystemsLink,
}

pub fn system(id: &str, power_state: &str) -> ComputerSystem {
    serde_json::from_value(json!({
        "@odata.id": format!("/redfish/v1/Systems/{id}"),
        "Id": id,
        "PowerState": power_state,
        "Bios": { "@odata.id": format!("/redfish/v1/Systems/{id}/Bios") }
    }))
    .unwrap()
}

pub fn system_with_inventory(
    id: &str,
    manufacturer: &str,
    model: &str,
    serial: &str,
) -> ComputerSystem {
    serde_json::from_value(json!({
        "@odata.id": format!("/redfish/v1/Systems/{id}"),
        "Id": id,
        "PowerState": "On",
        "Manufacturer": manufacturer,
        "Model": model,
        "SerialNumber": serial
    }))
    .unwrap()
}

pub fn system_without_bios(id: &str) -> ComputerSystem {
    serde_json::from_value(json!({
        "@odata.id": format!("/redfish/v1/Systems/{id}"),
        "Id": id,
        "PowerState": "On"
    }))
    .unwrap()
}

pub fn bios(system_id: &str, attributes: Value) -> Bios {
    serde_json::from_value(json!({
        "@odata.id": format!("/redfish/v1/Systems/{system_id}/Bios"),
        "Id": "Bios",
        "Attributes": attributes,
        "@Redfish.Settings": {
            "SettingsObject": {
                "@odata.id": format!("/redfish/v1/Systems/{system_id}/Bios/Settings")
            }
        }
    }))
    .unwrap()
}

#[derive(Default)]
pub struct FakeEndpoint {
    systems: Vec<ComputerSystem>,
    bios: HashMap<String, Bios>,
    systems_failure: Option<SystemsFailure>,
    fail_refresh: bool,
    reject_resets: Option<String>,
    reject_patches: Option<String>,
    pub resets: Mutex<Vec<(String, ResetType)>>,
    pub patches: Mutex<Vec<(String, Map<String, Value>)>>,
    pub remote_calls: AtomicUsize,
}

impl FakeEndpoint {
    pub fn with_systems(systems: Vec<ComputerSystem>) -> Self {
        Self {
            systems,
            ..Self::default()
        }
    }

    pub fn with_bios(mut self, system_odata_id: &str, bios: Bios) -> Self {
        self.bios.insert(system_odata_id.to_owned(), bios);
        self
    }

    pub fn failing_systems(mut self, failure: SystemsFailure) -> Self {
        self.systems_failure = Some(failure);
        self
    }

    /// Single-system reads fail, as when a BMC drops off right after a reset.
    pub fn failing_refresh(mut self) -> Self {
        self.fail_refresh = true;
        self
    }

    pub fn rejecting_resets(mut self, message: &str) -> Self {
        self.reject_resets = Some(message.to_owned());
        self
    }

    pub fn rejecting_patches(mut self, message: &str) -> Self {
        self.reject_patches = Some(message.to_owned());
        self
    }

    pub fn reset_log(&self) -> Vec<(String, ResetType)> {
        self.resets.lock().unwrap().clone()
    }

    pub fn patch_log(&self) -> Vec<(String, Map<String, Value>)> {
        self.patches.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.remote_calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.remote_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Endpoint for FakeEndpoint {
    async fn systems(&self) -> Result<Vec<ComputerSystem>, ApiError> {
        self.record_call();
        match self.systems_failure {
            Some(SystemsFailure::Unauthorized) => Err(ApiError::Authentication {
                message: "HTTP 401 Unauthorized".into(),
            }),
            Some(SystemsFailure::ServerError) => Err(ApiError::Redfish {
                status: 503,
                message: "service unavailable".into(),
            }),
            Some(SystemsFailure::NoSystemsLink) => Err(ApiError::MissingLink {
                resource: "service root".into(),
                link: "Systems",
            }),
            None => Ok(self.systems.clone()),
        }
    }

    async fn system(&self, odata_id: &str) -> Result<ComputerSystem, ApiError> {
        self.record_call();
        if self.fail_refresh {
            return Err(ApiError::Redfish {
                status: 503,
                message: "service unavailable".into(),
            });
        }
        self.systems
            .iter()
            .find(|s| s.odata_id == odata_id)
            .cloned()
            .ok_or_else(|| ApiError::Redfish {
                status: 404,
                message: format!("{odata_id} not found"),
            })
    }

    async fn bios(&self, system: &ComputerSystem) -> Result<Bios, ApiError> {
        self.record_call();
        if system.bios.is_none() {
            return Err(ApiError::MissingLink {
                resource: system.odata_id.clone(),
                link: "Bios",
            });
        }
        self.bios
            .get(&system.odata_id)
            .cloned()
            .ok_or_else(|| ApiError::Redfish {
                status: 500,
                message: "BIOS resource unavailable".into(),
            })
    }

    async fn reset(&self, system: &ComputerSystem, reset_type: ResetType) -> Result<(), ApiError> {
        self.record_call();
        if let Some(message) = &self.reject_resets {
            return Err(ApiError::Redfish {
                status: 409,
                message: message.clone(),
            });
        }
        self.resets
            .lock()
            .unwrap()
            .push((system.odata_id.clone(), reset_type));
        Ok(())
    }

    async fn patch_bios_settings(
        &self,
        bios: &Bios,
        attributes: &Map<String, Value>,
    ) -> Result<(), ApiError> {
        self.record_call();
        if let Some(message) = &self.reject_patches {
            return Err(ApiError::Redfish {
                status: 400,
                message: message.clone(),
            });
        }
        self.patches
            .lock()
            .unwrap()
            .push((bios.settings_target().to_owned(), attributes.clone()));
        Ok(())
    }
}
