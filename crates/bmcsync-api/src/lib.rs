// bmcsync-api: Async Redfish client for BMC power and BIOS management

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::Credentials;
pub use client::{RedfishClient, SERVICE_ROOT};
pub use error::Error;
pub use models::{
    Bios, Collection, ComputerSystem, ODataId, PowerState, ResetAction, ResetType, ServiceRoot,
    SettingsAnnotation, SystemActions,
};
pub use transport::{TlsMode, TransportConfig};
