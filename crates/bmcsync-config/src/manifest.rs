//! Resource manifests.
//!
//! A manifest declares the power and BIOS resources `bmcsync apply`
//! reconciles:
//!
//! ```toml
//! [[power]]
//! name = "node1"
//! desired_power_state = "On"
//! [power.endpoint]
//! address = "10.0.0.5"
//! user = "root"
//! password_env = "NODE1_PASSWORD"
//! ssl_insecure = true
//!
//! [[bios]]
//! name = "node1"
//! [bios.endpoint]
//! address = "10.0.0.5"
//! [bios.attributes]
//! BootMode = "Bios"
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use bmcsync_core::{EndpointConfig, TlsVerification};

use crate::state::ResourceKind;
use crate::{ConfigError, ENV_PREFIX};

/// Connection block shared by every resource type.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointSpec {
    pub address: String,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Environment variable holding the password.
    pub password_env: Option<String>,
    #[serde(default)]
    pub ssl_insecure: bool,
    /// Computer system `Id` to manage on multi-system chassis.
    pub system: Option<String>,
}

impl EndpointSpec {
    /// Translate into the runtime form the core consumes.
    ///
    /// Password lookup: `password_env`, then the declared `password`, then
    /// `BMCSYNC_PASSWORD`. A password declared for this endpoint always
    /// beats the process-wide variable. A user without any password sends
    /// an empty one, which is what BMCs with blank passwords expect.
    pub fn to_endpoint_config(&self, timeout: Duration) -> EndpointConfig {
        let mut config = EndpointConfig::new(self.address.trim())
            .with_tls(TlsVerification::from_insecure(self.ssl_insecure))
            .with_timeout(timeout);

        if let Some(ref user) = self.user {
            let password = self
                .password_env
                .as_deref()
                .and_then(|name| std::env::var(name).ok())
                .or_else(|| self.password.clone())
                .or_else(|| std::env::var(format!("{ENV_PREFIX}PASSWORD")).ok())
                .unwrap_or_default();
            config = config.with_credentials(user.clone(), SecretString::from(password));
        }
        if let Some(ref system) = self.system {
            config = config.with_system(system.clone());
        }
        config
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PowerResource {
    pub name: String,
    /// Reset action to issue. Checked when the resource is reconciled, so a
    /// missing value fails that resource only.
    pub desired_power_state: Option<String>,
    pub endpoint: EndpointSpec,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BiosResource {
    pub name: String,
    /// Push overrides that differ from the endpoint. When false the resource
    /// is only read and merged.
    #[serde(default)]
    pub apply: bool,
    pub endpoint: EndpointSpec,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub power: Vec<PowerResource>,
    #[serde(default)]
    pub bios: Vec<BiosResource>,
}

impl Manifest {
    /// Read, parse and validate a manifest file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let manifest: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Names are unique per resource type and every endpoint has an address.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let power = self.power.iter().map(|r| (&r.name, &r.endpoint));
        let bios = self.bios.iter().map(|r| (&r.name, &r.endpoint));
        check_resources(ResourceKind::Power, power)?;
        check_resources(ResourceKind::Bios, bios)
    }

    /// State keys of every declared resource.
    pub fn keys(&self) -> BTreeSet<String> {
        let power = self.power.iter().map(|r| ResourceKind::Power.key(&r.name));
        let bios = self.bios.iter().map(|r| ResourceKind::Bios.key(&r.name));
        power.chain(bios).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty() && self.bios.is_empty()
    }
}

fn check_resources<'a>(
    kind: ResourceKind,
    resources: impl Iterator<Item = (&'a String, &'a EndpointSpec)>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (name, endpoint) in resources {
        if name.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: format!("{kind}.name"),
                reason: "must not be empty".into(),
            });
        }
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::Validation {
                field: format!("{kind}.name"),
                reason: format!("duplicate resource '{name}'"),
            });
        }
        if endpoint.address.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: format!("{kind}.{name}.endpoint.address"),
                reason: "must not be empty".into(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
        [[power]]
        name = "node1"
        desired_power_state = "ForceRestart"
        [power.endpoint]
        address = "10.0.0.5"
        user = "root"
        password = "calvin"
        ssl_insecure = true

        [[bios]]
        name = "node1"
        apply = true
        [bios.endpoint]
        address = "10.0.0.5"
        [bios.attributes]
        BootMode = "Bios"
    "#;

    #[test]
    fn parses_both_resource_types() {
        let manifest: Manifest = toml::from_str(SAMPLE).unwrap();
        manifest.validate().unwrap();

        assert_eq!(manifest.power.len(), 1);
        assert_eq!(
            manifest.power[0].desired_power_state.as_deref(),
            Some("ForceRestart")
        );
        assert!(manifest.power[0].endpoint.ssl_insecure);
        assert!(manifest.bios[0].apply);
        assert_eq!(manifest.bios[0].attributes["BootMode"], "Bios");
        assert_eq!(
            manifest.keys().into_iter().collect::<Vec<_>>(),
            vec!["bios.node1".to_owned(), "power.node1".to_owned()]
        );
    }

    #[test]
    fn missing_directive_parses() {
        let manifest: Manifest = toml::from_str(
            r#"
            [[power]]
            name = "node1"
            [power.endpoint]
            address = "10.0.0.5"
            "#,
        )
        .unwrap();
        assert!(manifest.power[0].desired_power_state.is_none());
        manifest.validate().unwrap();
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let manifest: Manifest = toml::from_str(
            r#"
            [[power]]
            name = "node1"
            endpoint = { address = "10.0.0.5" }
            [[power]]
            name = "node1"
            endpoint = { address = "10.0.0.6" }
            "#,
        )
        .unwrap();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate resource 'node1'"), "{err}");
    }

    #[test]
    fn same_name_across_types_is_fine() {
        let manifest: Manifest = toml::from_str(SAMPLE).unwrap();
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn empty_address_is_rejected() {
        let manifest: Manifest = toml::from_str(
            r#"
            [[bios]]
            name = "node1"
            endpoint = { address = " " }
            "#,
        )
        .unwrap();
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("bios.node1.endpoint.address"), "{err}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<Manifest, _> = toml::from_str(
            r#"
            [[power]]
            name = "node1"
            desired_state = "On"
            endpoint = { address = "10.0.0.5" }
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn endpoint_spec_maps_to_config() {
        let spec = EndpointSpec {
            address: " 10.0.0.5 ".into(),
            user: Some("root".into()),
            password: Some("calvin".into()),
            ssl_insecure: true,
            system: Some("1".into()),
            ..EndpointSpec::default()
        };
        let config = spec.to_endpoint_config(Duration::from_secs(5));

        assert_eq!(config.address, "10.0.0.5");
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.credentials.unwrap().username, "root");
        assert_eq!(config.system.as_deref(), Some("1"));
    }

    #[test]
    fn endpoint_without_user_is_anonymous() {
        let spec = EndpointSpec {
            address: "10.0.0.5".into(),
            ..EndpointSpec::default()
        };
        let config = spec.to_endpoint_config(Duration::from_secs(30));
        assert!(config.credentials.is_none());
        assert_eq!(config.tls, TlsVerification::SystemDefaults);
    }

    fn password_for(spec: &EndpointSpec) -> String {
        spec.to_endpoint_config(Duration::from_secs(5))
            .credentials
            .unwrap()
            .password
            .expose_secret()
            .to_owned()
    }

    #[test]
    fn declared_password_beats_global_env() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("BMCSYNC_PASSWORD", "global-secret");
            let spec = EndpointSpec {
                address: "10.0.0.5".into(),
                user: Some("root".into()),
                password: Some("calvin".into()),
                ..EndpointSpec::default()
            };
            assert_eq!(password_for(&spec), "calvin");
            Ok(())
        });
    }

    #[test]
    fn password_env_beats_declared_password() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("NODE1_PASSWORD", "from-env");
            let spec = EndpointSpec {
                address: "10.0.0.5".into(),
                user: Some("root".into()),
                password: Some("calvin".into()),
                password_env: Some("NODE1_PASSWORD".into()),
                ..EndpointSpec::default()
            };
            assert_eq!(password_for(&spec), "from-env");
            Ok(())
        });
    }

    #[test]
    fn global_env_fills_in_when_nothing_declared() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("BMCSYNC_PASSWORD", "global-secret");
            let spec = EndpointSpec {
                address: "10.0.0.5".into(),
                user: Some("root".into()),
                ..EndpointSpec::default()
            };
            assert_eq!(password_for(&spec), "global-secret");
            Ok(())
        });
    }
}
