// ── Runtime endpoint configuration ──
//
// Describes *how* to reach one BMC. Carries credentials and connection
// tuning but never touches disk: the CLI or any other caller builds an
// `EndpointConfig` and passes it into every reconciliation call.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use bmcsync_api::transport::{TlsMode, TransportConfig};
use bmcsync_api::Credentials;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed BMC certs).
    DangerAcceptInvalid,
}

impl TlsVerification {
    /// Map the declarative `ssl_insecure` flag.
    pub fn from_insecure(insecure: bool) -> Self {
        if insecure {
            Self::DangerAcceptInvalid
        } else {
            Self::SystemDefaults
        }
    }
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Connection parameters for a single endpoint.
///
/// Immutable for the duration of a reconciliation call.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// BMC address as declared (`10.0.0.5`, `bmc01:8443`, `https://...`).
    /// Also the prefix of every resource identity on this endpoint.
    pub address: String,
    /// Basic-auth credentials, if the BMC requires them.
    pub credentials: Option<Credentials>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Pick a computer system by `Id` instead of the first one listed.
    pub system: Option<String>,
}

impl EndpointConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            credentials: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            system: None,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: SecretString) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    pub fn with_tls(mut self, tls: TlsVerification) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig::new(TlsMode::from(&self.tls), self.timeout)
    }
}
