use thiserror::Error;

/// Top-level error type for the `bmcsync-api` crate.
///
/// `bmcsync-core` maps these into reconciliation failures depending on
/// which step of a call produced them.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Credentials rejected (HTTP 401 / 403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Redfish ─────────────────────────────────────────────────────
    /// Non-success response, with the detail parsed from the Redfish
    /// error envelope when the BMC sent one.
    #[error("Redfish error (HTTP {status}): {message}")]
    Redfish { status: u16, message: String },

    /// A resource did not carry a link the caller needed.
    #[error("{resource} has no {link} link")]
    MissingLink {
        resource: String,
        link: &'static str,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the BMC rejected the credentials.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}
