// Redfish HTTP client
//
// Wraps `reqwest::Client` with service-root navigation, basic auth on every
// request and translation of the Redfish error envelope. Resource links are
// followed exactly as the BMC reports them (`@odata.id`), never guessed,
// except for the reset action target which has a conventional fallback.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, trace};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::models::{
    Bios, Collection, ComputerSystem, ODataId, RedfishErrorBody, ResetType, ServiceRoot,
};
use crate::transport::TransportConfig;

/// Path of the Redfish service root on every conforming BMC.
pub const SERVICE_ROOT: &str = "/redfish/v1/";

/// Client handle for one BMC.
///
/// Cheap to clone (the inner `reqwest::Client` is reference counted) and
/// holds no per-call state, so concurrent calls need no locking.
#[derive(Debug, Clone)]
pub struct RedfishClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Option<Credentials>,
}

impl RedfishClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the BMC root, e.g. `https://10.0.0.5`.
    pub fn new(
        base_url: Url,
        credentials: Option<Credentials>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, credentials))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: Url,
        credentials: Option<Credentials>,
    ) -> Self {
        Self {
            http,
            base_url,
            credentials,
        }
    }

    /// Turn an endpoint address into a base URL.
    ///
    /// Bare hosts (`10.0.0.5`, `bmc01:8443`) get `https://`; addresses that
    /// already carry a scheme are used as given.
    pub fn parse_address(address: &str) -> Result<Url, Error> {
        let address = address.trim();
        if address.contains("://") {
            Ok(Url::parse(address)?)
        } else {
            Ok(Url::parse(&format!("https://{address}"))?)
        }
    }

    /// The BMC base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Resources ────────────────────────────────────────────────────

    /// Fetch the service root.
    ///
    /// `GET /redfish/v1/`
    pub async fn service_root(&self) -> Result<ServiceRoot, Error> {
        self.get(SERVICE_ROOT).await
    }

    /// List member links of the systems collection, in the order the BMC
    /// reports them.
    pub async fn system_members(&self) -> Result<Vec<ODataId>, Error> {
        let root = self.service_root().await?;
        let link = root.systems.ok_or_else(|| Error::MissingLink {
            resource: "service root".into(),
            link: "Systems",
        })?;
        let collection: Collection = self.get(link.as_str()).await?;
        debug!(
            collection = %link.as_str(),
            members = collection.members.len(),
            "listed computer systems"
        );
        Ok(collection.members)
    }

    /// Fetch every computer system, preserving collection order.
    pub async fn systems(&self) -> Result<Vec<ComputerSystem>, Error> {
        let members = self.system_members().await?;
        let mut systems = Vec::with_capacity(members.len());
        for member in &members {
            systems.push(self.system(member.as_str()).await?);
        }
        Ok(systems)
    }

    /// Fetch a single computer system by its `@odata.id`.
    pub async fn system(&self, odata_id: &str) -> Result<ComputerSystem, Error> {
        self.get(odata_id).await
    }

    /// Fetch the BIOS resource linked from a system.
    pub async fn bios(&self, system: &ComputerSystem) -> Result<Bios, Error> {
        let link = system.bios.as_ref().ok_or_else(|| Error::MissingLink {
            resource: system.odata_id.clone(),
            link: "Bios",
        })?;
        self.get(link.as_str()).await
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Issue `#ComputerSystem.Reset` with the given reset type.
    ///
    /// `POST {target}` with `{"ResetType": "..."}`
    pub async fn reset(&self, system: &ComputerSystem, reset_type: ResetType) -> Result<(), Error> {
        let target = system.reset_target();
        info!(system = %system.odata_id, action = %reset_type, "issuing reset action");
        self.post(&target, &json!({ "ResetType": reset_type })).await
    }

    /// PATCH BIOS attributes to the settings resource.
    ///
    /// `PATCH {settings}` with `{"Attributes": {...}}`
    pub async fn patch_bios_settings(
        &self,
        bios: &Bios,
        attributes: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), Error> {
        let target = bios.settings_target();
        info!(settings = %target, count = attributes.len(), "patching BIOS attributes");
        self.patch(target, &json!({ "Attributes": attributes }))
            .await
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn resource_url(&self, path: &str) -> Result<Url, Error> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }
        Ok(self.base_url.join(path)?)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some(credentials) => credentials.apply(builder),
            None => builder,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.resource_url(path)?;
        debug!("GET {}", url);

        let resp = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(Error::Transport)?;
        let resp = check_status(resp).await?;
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(bytes = body.len(), "response body received");

        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    async fn post(&self, path: &str, body: &(impl Serialize + Sync)) -> Result<(), Error> {
        let url = self.resource_url(path)?;
        debug!("POST {}", url);

        let resp = self
            .authorize(self.http.post(url).json(body))
            .send()
            .await
            .map_err(Error::Transport)?;
        check_status(resp).await.map(|_| ())
    }

    async fn patch(&self, path: &str, body: &(impl Serialize + Sync)) -> Result<(), Error> {
        let url = self.resource_url(path)?;
        debug!("PATCH {}", url);

        let resp = self
            .authorize(self.http.patch(url).json(body))
            .send()
            .await
            .map_err(Error::Transport)?;
        check_status(resp).await.map(|_| ())
    }
}

/// Pass successful responses through; turn everything else into an `Error`
/// carrying the most specific message the BMC gave.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<RedfishErrorBody>(&body)
        .ok()
        .and_then(|b| b.error.detail());

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            message: detail.unwrap_or_else(|| format!("HTTP {status}")),
        });
    }

    Err(Error::Redfish {
        status: status.as_u16(),
        message: detail.unwrap_or_else(|| {
            let preview: String = body.chars().take(200).collect();
            if preview.is_empty() {
                status.to_string()
            } else {
                preview
            }
        }),
    })
}
