// ── Core error types ──
//
// Every variant aborts the reconciliation call that produced it. The same
// transport failure means different things depending on the step it came
// from (connecting, resolving, acting, fetching), so api errors are mapped
// through the `CoreError::*` constructors below rather than a blanket
// `From` impl.

use thiserror::Error;

use bmcsync_api::Error as ApiError;

/// Why the System Resolver could not produce a computer system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionFailure {
    /// The systems collection could not be read.
    #[error("systems collection unreachable: {0}")]
    Unreachable(String),

    /// The endpoint answered but exposes no computer system.
    #[error("endpoint exposes no computer system")]
    NoSystems,

    /// A system selector was configured and nothing matched it.
    #[error("no computer system with id '{0}'")]
    NotFound(String),
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to endpoint {address}: {reason}")]
    Connection {
        address: String,
        reason: String,
        /// The endpoint answered but refused the credentials.
        credentials_rejected: bool,
    },

    // ── Resolution errors ────────────────────────────────────────────
    #[error("Cannot resolve computer system on {address}: {reason}")]
    Resolution {
        address: String,
        #[source]
        reason: ResolutionFailure,
    },

    // ── Caller input errors ──────────────────────────────────────────
    #[error("Invalid power directive '{value}': expected one of {expected}")]
    InvalidDirective { value: String, expected: String },

    #[error("Invalid endpoint configuration: {message}")]
    Config { message: String },

    // ── Remote operation errors ──────────────────────────────────────
    #[error("Endpoint rejected {action}: {detail}")]
    ActionRejected { action: String, detail: String },

    #[error("Cannot fetch {resource}: {detail}")]
    Fetch { resource: String, detail: String },
}

impl CoreError {
    pub(crate) fn connection(address: &str, err: &ApiError) -> Self {
        Self::Connection {
            address: address.to_owned(),
            reason: err.to_string(),
            credentials_rejected: err.is_auth_failure(),
        }
    }

    /// Map a failure while listing systems. Credential rejection is still a
    /// connection problem; anything else means the collection was unreadable.
    pub(crate) fn resolution(address: &str, err: &ApiError) -> Self {
        match err {
            ApiError::Authentication { .. } => Self::connection(address, err),
            ApiError::MissingLink { .. } => Self::Resolution {
                address: address.to_owned(),
                reason: ResolutionFailure::NoSystems,
            },
            _ => Self::Resolution {
                address: address.to_owned(),
                reason: ResolutionFailure::Unreachable(err.to_string()),
            },
        }
    }

    pub(crate) fn rejected(action: impl Into<String>, err: &ApiError) -> Self {
        let detail = match err {
            ApiError::Redfish { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self::ActionRejected {
            action: action.into(),
            detail,
        }
    }

    pub(crate) fn fetch(resource: impl Into<String>, err: &ApiError) -> Self {
        Self::Fetch {
            resource: resource.into(),
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_while_resolving_is_a_connection_error() {
        let err = ApiError::Authentication {
            message: "HTTP 401 Unauthorized".into(),
        };
        let core = CoreError::resolution("10.0.0.5", &err);
        assert!(matches!(
            core,
            CoreError::Connection { ref address, credentials_rejected: true, .. } if address == "10.0.0.5"
        ));
    }

    #[test]
    fn missing_systems_link_means_no_systems() {
        let err = ApiError::MissingLink {
            resource: "service root".into(),
            link: "Systems",
        };
        let core = CoreError::resolution("10.0.0.5", &err);
        assert!(matches!(
            core,
            CoreError::Resolution {
                reason: ResolutionFailure::NoSystems,
                ..
            }
        ));
    }

    #[test]
    fn rejected_action_keeps_endpoint_detail() {
        let err = ApiError::Redfish {
            status: 409,
            message: "Server is already powered OFF.".into(),
        };
        let core = CoreError::rejected("ForceOff", &err);
        assert_eq!(
            core.to_string(),
            "Endpoint rejected ForceOff: Server is already powered OFF."
        );
    }

}
