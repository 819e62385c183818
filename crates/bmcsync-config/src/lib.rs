//! Declarative layer for bmcsync.
//!
//! TOML profiles and credential resolution (`profile`), resource manifests
//! (`manifest`), and the persisted outputs of past runs (`state`). Nothing
//! here talks to a BMC; everything ends up as `bmcsync_core::EndpointConfig`
//! values or plain data for the CLI to hand to the core.

pub mod manifest;
pub mod profile;
pub mod state;

use std::path::PathBuf;

use thiserror::Error;

pub use manifest::{BiosResource, EndpointSpec, Manifest, PowerResource};
pub use profile::{
    Config, Defaults, Profile, config_path, load_config, load_config_from, load_config_or_default,
    profile_to_endpoint_config, resolve_credentials, save_config,
};
pub use state::{ResourceKind, ResourceState, State, default_state_path};

/// Environment prefix for every bmcsync variable.
pub const ENV_PREFIX: &str = "BMCSYNC_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("corrupt state file {}: {source}", path.display())]
    State {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}
