// ── BIOS Attribute Synchronizer ──
//
// Remote attribute catalogs are heterogeneous (strings, booleans, numbers,
// the odd null). The declarative layer only holds string maps, so every
// value goes through `normalize_value` on the way in. The mapping is total:
//
//   bool          -> "true" / "false"
//   integer       -> decimal digits
//   float         -> shortest representation that round-trips
//   string        -> verbatim
//   null          -> ""
//   array, object -> compact JSON text
//
// Overrides are authoritative for the keys they name; every other key keeps
// the freshly fetched remote value (the shadow baseline).

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Number, Value};
use tracing::{debug, info};

use bmcsync_api::{Bios, ComputerSystem};

use crate::endpoint::Endpoint;
use crate::error::CoreError;

/// Normalized attribute map, ordered by name.
pub type Attributes = BTreeMap<String, String>;

/// Canonical string form of a remote attribute value.
pub fn normalize_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

pub fn normalize_attributes(raw: &Map<String, Value>) -> Attributes {
    raw.iter()
        .map(|(key, value)| (key.clone(), normalize_value(value)))
        .collect()
}

/// `M[k] = O[k]` if `k` is overridden, else `B[k]`.
pub fn merge(baseline: &Attributes, overrides: &Attributes) -> Attributes {
    let mut merged = baseline.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// One overridden attribute whose remote value differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeChange {
    pub key: String,
    /// `None` when the endpoint does not report the attribute at all.
    pub current: Option<String>,
    pub desired: String,
}

/// Overrides that disagree with the remote baseline, ordered by key.
pub fn diff(baseline: &Attributes, overrides: &Attributes) -> Vec<AttributeChange> {
    overrides
        .iter()
        .filter(|(key, desired)| baseline.get(*key) != Some(*desired))
        .map(|(key, desired)| AttributeChange {
            key: key.clone(),
            current: baseline.get(key).cloned(),
            desired: desired.clone(),
        })
        .collect()
}

/// Turn a string override back into the JSON type the endpoint reported
/// for that attribute. Values that do not parse as that type, and
/// attributes the endpoint does not report, are sent as strings and left
/// for the endpoint to accept or reject.
pub fn coerce_override(remote: Option<&Value>, desired: &str) -> Value {
    match remote {
        Some(Value::Bool(_)) => match desired {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(desired.to_owned()),
        },
        Some(Value::Number(n)) if n.is_f64() => desired
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map_or_else(|| Value::String(desired.to_owned()), Value::Number),
        Some(Value::Number(_)) => desired
            .parse::<i64>()
            .map(Value::from)
            .or_else(|_| desired.parse::<u64>().map(Value::from))
            .unwrap_or_else(|_| Value::String(desired.to_owned())),
        _ => Value::String(desired.to_owned()),
    }
}

/// Normalized view of a BIOS resource, fetched in full on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BiosSnapshot {
    pub odata_id: String,
    pub id: String,
    pub attributes: Attributes,
}

impl From<&Bios> for BiosSnapshot {
    fn from(bios: &Bios) -> Self {
        Self {
            odata_id: bios.odata_id.clone(),
            id: bios.id.clone(),
            attributes: normalize_attributes(&bios.attributes),
        }
    }
}

/// Outcome of pushing overrides to the endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct BiosPush {
    /// Remote state the changes were computed against.
    pub baseline: BiosSnapshot,
    /// What was sent; empty when the endpoint already agreed.
    pub changes: Vec<AttributeChange>,
}

pub struct BiosSynchronizer<'a, E: Endpoint + ?Sized> {
    endpoint: &'a E,
}

impl<'a, E: Endpoint + ?Sized> BiosSynchronizer<'a, E> {
    pub fn new(endpoint: &'a E) -> Self {
        Self { endpoint }
    }

    async fn fetch(&self, system: &ComputerSystem) -> Result<Bios, CoreError> {
        let bios = self
            .endpoint
            .bios(system)
            .await
            .map_err(|e| CoreError::fetch(format!("BIOS of {}", system.odata_id), &e))?;
        debug!(
            bios = %bios.odata_id,
            attributes = bios.attributes.len(),
            "fetched BIOS attributes"
        );
        Ok(bios)
    }

    /// Fetch and normalize the BIOS attributes of `system`. Read-only.
    pub async fn read(&self, system: &ComputerSystem) -> Result<BiosSnapshot, CoreError> {
        let bios = self.fetch(system).await?;
        Ok(BiosSnapshot::from(&bios))
    }

    /// Stage the overrides that disagree with the endpoint.
    ///
    /// Nothing is sent when every override already matches. Changes land in
    /// the pending settings and take effect on the next boot; no reset is
    /// issued here.
    pub async fn apply(
        &self,
        system: &ComputerSystem,
        overrides: &Attributes,
    ) -> Result<BiosPush, CoreError> {
        let bios = self.fetch(system).await?;
        let baseline = BiosSnapshot::from(&bios);
        let changes = diff(&baseline.attributes, overrides);

        if changes.is_empty() {
            debug!(bios = %bios.odata_id, "BIOS attributes already match");
            return Ok(BiosPush { baseline, changes });
        }

        let payload: Map<String, Value> = changes
            .iter()
            .map(|c| {
                let value = coerce_override(bios.attributes.get(&c.key), &c.desired);
                (c.key.clone(), value)
            })
            .collect();

        info!(
            bios = %bios.odata_id,
            changes = changes.len(),
            "staging BIOS attribute changes"
        );
        self.endpoint
            .patch_bios_settings(&bios, &payload)
            .await
            .map_err(|e| CoreError::rejected("BIOS settings update", &e))?;

        Ok(BiosPush { baseline, changes })
    }
}
