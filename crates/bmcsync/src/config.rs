//! CLI configuration: thin wrapper around `bmcsync_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides (--address,
//! --user, --password, ...) on top of the selected profile.

use secrecy::SecretString;

use bmcsync_core::EndpointConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use bmcsync_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

/// Profile name reported when everything comes from flags.
const FLAGS_PROFILE: &str = "(command line)";

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names, sorted, for help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
    names.sort_unstable();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Build the `EndpointConfig` for single-endpoint commands.
///
/// An explicitly requested profile must exist. Otherwise the default
/// profile is used when present, and flags alone when it is not.
pub fn resolve_endpoint(global: &GlobalOpts) -> Result<EndpointConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, global, &cfg.defaults);
    }
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        });
    }

    if global.address.is_none() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }
    resolve_profile(&Profile::default(), FLAGS_PROFILE, global, &cfg.defaults)
}

/// Translate a `Profile` + global flags into an `EndpointConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
    defaults: &Defaults,
) -> Result<EndpointConfig, CliError> {
    let mut merged = profile.clone();
    if let Some(ref address) = global.address {
        merged.address.clone_from(address);
    }
    if let Some(ref user) = global.user {
        merged.username = Some(user.clone());
    }
    if global.password.is_some() {
        merged.password.clone_from(&global.password);
        merged.password_env = None;
    }
    if global.insecure {
        merged.insecure = Some(true);
    }
    if global.timeout.is_some() {
        merged.timeout = global.timeout;
    }
    if global.system.is_some() {
        merged.system.clone_from(&global.system);
    }

    let mut config = bmcsync_config::profile_to_endpoint_config(&merged, profile_name, defaults)?;

    // An explicit --password beats every env-based lookup.
    if let (Some(password), Some(credentials)) = (&global.password, config.credentials.as_mut()) {
        credentials.password = SecretString::from(password.clone());
    }
    Ok(config)
}
