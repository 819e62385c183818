// ── Resource identity ──
//
// The external identity of a managed resource is the endpoint address
// followed by the resource's native locator, concatenated verbatim. It is
// recomputed after every successful read and never cached: a BMC that
// recreates a resource under a new `@odata.id`, or a config that points the
// same name at another address, both surface as a changed identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable external identity of a managed resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceIdentity(String);

impl ResourceIdentity {
    /// Derive the identity for `locator` on the endpoint at `address`.
    pub fn assign(address: &str, locator: &str) -> Self {
        let mut id = String::with_capacity(address.len() + locator.len());
        id.push_str(address);
        id.push_str(locator);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ResourceIdentity> for String {
    fn from(id: ResourceIdentity) -> Self {
        id.0
    }
}
