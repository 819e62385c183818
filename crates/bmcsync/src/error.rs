//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use bmcsync_config::ConfigError;
use bmcsync_core::{CoreError, ResolutionFailure};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to BMC at {address}")]
    #[diagnostic(
        code(bmcsync::connection_failed),
        help(
            "{reason}\n\
             Check that the BMC is reachable and its Redfish service is enabled.\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { address: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("BMC at {address} rejected the credentials")]
    #[diagnostic(
        code(bmcsync::auth_failed),
        help("Check --user / --password, or the profile's username and password_env.")
    )]
    AuthFailed { address: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(bmcsync::no_credentials),
        help(
            "Set password_env in the profile, export BMCSYNC_PASSWORD,\n\
             or pass --password."
        )
    )]
    NoCredentials { profile: String },

    // ── Resolution ───────────────────────────────────────────────────
    #[error("No computer system found on {address}: {reason}")]
    #[diagnostic(
        code(bmcsync::no_system),
        help("List /redfish/v1/Systems on the BMC and pass the member Id with --system.")
    )]
    SystemNotFound { address: String, reason: String },

    // ── Remote operations ────────────────────────────────────────────
    #[error("BMC rejected {action}: {detail}")]
    #[diagnostic(code(bmcsync::rejected))]
    Rejected { action: String, detail: String },

    #[error("Could not read {resource}: {detail}")]
    #[diagnostic(code(bmcsync::fetch_failed))]
    FetchFailed { resource: String, detail: String },

    #[error("{failed} of {total} resources failed to reconcile")]
    #[diagnostic(
        code(bmcsync::partial_failure),
        help("Failed resources kept their previous state entries. Re-run with -v for details.")
    )]
    PartialFailure { failed: usize, total: usize },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(bmcsync::validation))]
    Validation { field: String, reason: String },

    #[error("Invalid power directive '{value}'")]
    #[diagnostic(code(bmcsync::invalid_directive), help("Expected one of: {expected}"))]
    InvalidDirective { value: String, expected: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(bmcsync::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No BMC address given")]
    #[diagnostic(
        code(bmcsync::no_config),
        help(
            "Pass --address (-a), or add a profile to the config file.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(bmcsync::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Disruptive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(bmcsync::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    #[diagnostic(code(bmcsync::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::SystemNotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Validation { .. }
            | Self::InvalidDirective { .. }
            | Self::NoConfig { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Connection {
                address,
                credentials_rejected: true,
                ..
            } => CliError::AuthFailed { address },

            CoreError::Connection {
                address, reason, ..
            } => CliError::ConnectionFailed { address, reason },

            CoreError::Resolution {
                address,
                reason: reason @ (ResolutionFailure::NoSystems | ResolutionFailure::NotFound(_)),
            } => CliError::SystemNotFound {
                address,
                reason: reason.to_string(),
            },

            CoreError::Resolution { address, reason } => CliError::ConnectionFailed {
                address,
                reason: reason.to_string(),
            },

            CoreError::InvalidDirective { value, expected } => {
                CliError::InvalidDirective { value, expected }
            }

            CoreError::Config { message } => CliError::Validation {
                field: "endpoint".into(),
                reason: message,
            },

            CoreError::ActionRejected { action, detail } => CliError::Rejected { action, detail },

            CoreError::Fetch { resource, detail } => CliError::FetchFailed { resource, detail },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_rejection_maps_to_auth_exit_code() {
        let err = CliError::from(CoreError::Connection {
            address: "10.0.0.5".into(),
            reason: "Authentication failed: HTTP 401".into(),
            credentials_rejected: true,
        });
        assert!(matches!(err, CliError::AuthFailed { .. }));
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn unreachable_collection_is_a_connection_failure() {
        let err = CliError::from(CoreError::Resolution {
            address: "10.0.0.5".into(),
            reason: ResolutionFailure::Unreachable("HTTP 503".into()),
        });
        assert_eq!(err.exit_code(), exit_code::CONNECTION);
    }

    #[test]
    fn empty_endpoint_is_not_found() {
        let err = CliError::from(CoreError::Resolution {
            address: "10.0.0.5".into(),
            reason: ResolutionFailure::NoSystems,
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
    }

    #[test]
    fn rejected_action_keeps_detail() {
        let err = CliError::from(CoreError::ActionRejected {
            action: "ForceOff".into(),
            detail: "Server is already powered OFF.".into(),
        });
        assert_eq!(err.exit_code(), exit_code::REJECTED);
        assert_eq!(
            err.to_string(),
            "BMC rejected ForceOff: Server is already powered OFF."
        );
    }
}
