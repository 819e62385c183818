// Redfish resource models
//
// Only the fields the reconciler reads are modelled explicitly. Vendors
// disagree on which optional properties they populate, so nearly everything
// is `#[serde(default)]` and unknown fields are either flattened into `extra`
// or dropped.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

// ── Links ────────────────────────────────────────────────────────────

/// A `{"@odata.id": "/redfish/v1/..."}` link object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ODataId {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
}

impl ODataId {
    pub fn new(odata_id: impl Into<String>) -> Self {
        Self {
            odata_id: odata_id.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.odata_id
    }
}

// ── Service root ─────────────────────────────────────────────────────

/// `GET /redfish/v1/`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRoot {
    #[serde(rename = "@odata.id", default)]
    pub odata_id: String,
    #[serde(default)]
    pub redfish_version: Option<String>,
    #[serde(default)]
    pub systems: Option<ODataId>,
}

/// Generic resource collection.
#[derive(Debug, Clone, Deserialize)]
pub struct Collection {
    #[serde(rename = "Members", default)]
    pub members: Vec<ODataId>,
}

// ── Computer system ──────────────────────────────────────────────────

/// Observed power state of a computer system.
///
/// The four values the DMTF schema defines are named; anything else a BMC
/// reports is carried through verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PowerState {
    On,
    Off,
    PoweringOn,
    PoweringOff,
    Other(String),
}

impl PowerState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::On => "On",
            Self::Off => "Off",
            Self::PoweringOn => "PoweringOn",
            Self::PoweringOff => "PoweringOff",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for PowerState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "On" => Self::On,
            "Off" => Self::Off,
            "PoweringOn" => Self::PoweringOn,
            "PoweringOff" => Self::PoweringOff,
            _ => Self::Other(s),
        }
    }
}

impl From<PowerState> for String {
    fn from(state: PowerState) -> Self {
        match state {
            PowerState::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `ResetType` values accepted by `#ComputerSystem.Reset`.
///
/// Serialized verbatim; parsing is case-sensitive because BMCs compare the
/// string exactly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, EnumIter,
    IntoStaticStr, strum::Display,
)]
pub enum ResetType {
    On,
    ForceOn,
    ForceOff,
    ForceRestart,
    GracefulRestart,
    GracefulShutdown,
    PushPowerButton,
    PowerCycle,
    Nmi,
}

impl ResetType {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Whether the action can take a running host down.
    pub fn is_disruptive(self) -> bool {
        !matches!(self, Self::On | Self::ForceOn)
    }
}

/// The `Actions` block of a computer system.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SystemActions {
    #[serde(rename = "#ComputerSystem.Reset", default)]
    pub reset: Option<ResetAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetAction {
    pub target: String,
}

/// `GET /redfish/v1/Systems/{id}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComputerSystem {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    /// Null on some BMCs while the host is transitioning.
    #[serde(default)]
    pub power_state: Option<PowerState>,
    #[serde(default)]
    pub bios: Option<ODataId>,
    #[serde(default)]
    pub actions: SystemActions,
}

impl ComputerSystem {
    /// Target URI for `#ComputerSystem.Reset`.
    ///
    /// Uses the advertised action target, falling back to the conventional
    /// `{system}/Actions/ComputerSystem.Reset` path.
    pub fn reset_target(&self) -> String {
        match &self.actions.reset {
            Some(action) if !action.target.is_empty() => action.target.clone(),
            _ => format!(
                "{}/Actions/ComputerSystem.Reset",
                self.odata_id.trim_end_matches('/')
            ),
        }
    }
}

// ── BIOS ─────────────────────────────────────────────────────────────

/// `@Redfish.Settings` annotation pointing at the pending-settings resource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SettingsAnnotation {
    #[serde(default)]
    pub settings_object: Option<ODataId>,
}

/// `GET /redfish/v1/Systems/{id}/Bios`
///
/// Attribute values are heterogeneous (string, bool, integer, float, and
/// occasionally null), so they stay as raw JSON here.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Bios {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub attribute_registry: Option<String>,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    #[serde(rename = "@Redfish.Settings", default)]
    pub settings: Option<SettingsAnnotation>,
}

impl Bios {
    /// Where attribute changes are PATCHed.
    ///
    /// BMCs that stage BIOS changes advertise a settings object (commonly
    /// `.../Bios/Settings`); the rest accept PATCH on the BIOS resource.
    pub fn settings_target(&self) -> &str {
        self.settings
            .as_ref()
            .and_then(|s| s.settings_object.as_ref())
            .map_or(self.odata_id.as_str(), ODataId::as_str)
    }
}

// ── Error envelope ───────────────────────────────────────────────────

/// Redfish error body: `{"error": {"code", "message", "@Message.ExtendedInfo"}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct RedfishErrorBody {
    pub error: RedfishErrorInner,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RedfishErrorInner {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "@Message.ExtendedInfo", default)]
    pub extended_info: Vec<ExtendedInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct ExtendedInfo {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
}

impl RedfishErrorInner {
    /// Most specific human-readable message available.
    pub fn detail(&self) -> Option<String> {
        let extended: Vec<&str> = self
            .extended_info
            .iter()
            .filter_map(|info| info.message.as_deref().or(info.message_id.as_deref()))
            .collect();
        if !extended.is_empty() {
            return Some(extended.join("; "));
        }
        self.message.clone().or_else(|| self.code.clone())
    }
}
