//! Endpoint Client boundary.
//!
//! The reconcilers only need four remote operations. They reach them
//! through [`Endpoint`] so the same logic runs against a live
//! [`RedfishClient`] or an in-memory double.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use bmcsync_api::{Bios, ComputerSystem, Error as ApiError, RedfishClient, ResetType};

use crate::config::EndpointConfig;
use crate::error::CoreError;

/// Remote operations the core consumes.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// All computer systems, in the order the endpoint reports them.
    async fn systems(&self) -> Result<Vec<ComputerSystem>, ApiError>;

    /// Re-read one computer system.
    async fn system(&self, odata_id: &str) -> Result<ComputerSystem, ApiError>;

    /// The BIOS resource linked from `system`.
    async fn bios(&self, system: &ComputerSystem) -> Result<Bios, ApiError>;

    /// Issue `#ComputerSystem.Reset`.
    async fn reset(&self, system: &ComputerSystem, reset_type: ResetType) -> Result<(), ApiError>;

    /// Stage BIOS attribute changes.
    async fn patch_bios_settings(
        &self,
        bios: &Bios,
        attributes: &Map<String, Value>,
    ) -> Result<(), ApiError>;
}

#[async_trait]
impl Endpoint for RedfishClient {
    async fn systems(&self) -> Result<Vec<ComputerSystem>, ApiError> {
        RedfishClient::systems(self).await
    }

    async fn system(&self, odata_id: &str) -> Result<ComputerSystem, ApiError> {
        RedfishClient::system(self, odata_id).await
    }

    async fn bios(&self, system: &ComputerSystem) -> Result<Bios, ApiError> {
        RedfishClient::bios(self, system).await
    }

    async fn reset(&self, system: &ComputerSystem, reset_type: ResetType) -> Result<(), ApiError> {
        RedfishClient::reset(self, system, reset_type).await
    }

    async fn patch_bios_settings(
        &self,
        bios: &Bios,
        attributes: &Map<String, Value>,
    ) -> Result<(), ApiError> {
        RedfishClient::patch_bios_settings(self, bios, attributes).await
    }
}

/// Build a client for `config` and verify the service root answers.
///
/// Fails with [`CoreError::Config`] for an unparseable address and
/// [`CoreError::Connection`] for TLS setup failures, unreachable hosts and
/// rejected credentials.
pub async fn connect(config: &EndpointConfig) -> Result<RedfishClient, CoreError> {
    let base_url = RedfishClient::parse_address(&config.address).map_err(|e| CoreError::Config {
        message: format!("invalid address '{}': {e}", config.address),
    })?;

    let client = RedfishClient::new(base_url, config.credentials.clone(), &config.transport())
        .map_err(|e| CoreError::connection(&config.address, &e))?;

    let root = client
        .service_root()
        .await
        .map_err(|e| CoreError::connection(&config.address, &e))?;
    debug!(
        address = %config.address,
        version = root.redfish_version.as_deref().unwrap_or("unknown"),
        "connected to service root"
    );

    Ok(client)
}
