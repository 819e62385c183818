// ── Power Reconciler ──
//
// A power directive is an action to request, not a state to compare
// against. `apply` sends the reset unconditionally every time it is called
// and `read` never sends anything. Reading right after an action may still
// report the pre-transition state; callers see convergence on a later read.

use std::str::FromStr;

use strum::IntoEnumIterator;
use tracing::{debug, info};

use bmcsync_api::{ComputerSystem, PowerState, ResetType};

use crate::endpoint::Endpoint;
use crate::error::CoreError;

/// Desired power directive: one of the `#ComputerSystem.Reset` action names.
pub type PowerDirective = ResetType;

/// Parse a declared directive. Matching is exact and case-sensitive;
/// surrounding whitespace is not stripped.
pub fn parse_directive(value: &str) -> Result<PowerDirective, CoreError> {
    PowerDirective::from_str(value).map_err(|_| invalid_directive(value))
}

fn invalid_directive(value: &str) -> CoreError {
    let expected: Vec<&'static str> = PowerDirective::iter().map(PowerDirective::as_str).collect();
    CoreError::InvalidDirective {
        value: value.to_owned(),
        expected: expected.join(", "),
    }
}

/// Reads and drives the power state of a resolved system.
pub struct PowerReconciler<'a, E: Endpoint + ?Sized> {
    endpoint: &'a E,
}

impl<'a, E: Endpoint + ?Sized> PowerReconciler<'a, E> {
    pub fn new(endpoint: &'a E) -> Self {
        Self { endpoint }
    }

    /// Validate `directive` and issue exactly one reset action for it.
    ///
    /// An empty or unknown directive fails before anything is sent.
    pub async fn reconcile(
        &self,
        system: &ComputerSystem,
        directive: &str,
    ) -> Result<PowerDirective, CoreError> {
        let directive = parse_directive(directive)?;
        self.apply(system, directive).await?;
        Ok(directive)
    }

    /// Issue `directive` against `system`. Never skipped, never retried.
    pub async fn apply(
        &self,
        system: &ComputerSystem,
        directive: PowerDirective,
    ) -> Result<(), CoreError> {
        info!(
            system = %system.odata_id,
            action = directive.as_str(),
            current = %read(system),
            "issuing power action"
        );
        self.endpoint
            .reset(system, directive)
            .await
            .map_err(|e| CoreError::rejected(directive.as_str(), &e))
    }

    /// Re-fetch `system` so a read reflects whatever the BMC reports now.
    pub async fn refresh(&self, system: &ComputerSystem) -> Result<ComputerSystem, CoreError> {
        let fresh = self
            .endpoint
            .system(&system.odata_id)
            .await
            .map_err(|e| CoreError::fetch(system.odata_id.clone(), &e))?;
        debug!(system = %fresh.odata_id, power_state = %read(&fresh), "refreshed system");
        Ok(fresh)
    }
}

/// Observed power state. BMCs that omit it mid-transition report `Unknown`.
pub fn read(system: &ComputerSystem) -> PowerState {
    system
        .power_state
        .clone()
        .unwrap_or_else(|| PowerState::Other("Unknown".into()))
}
