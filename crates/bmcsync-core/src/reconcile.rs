// ── Reconciliation entry points ──
//
// One `Reconciler` per endpoint. Each call runs resolve, then the
// power or BIOS step, then identity assignment, strictly in that order and
// aborting on the first failure. Nothing is shared between reconcilers, so
// calls for different endpoints can run concurrently without coordination.

use serde::Serialize;
use tracing::{debug, warn};

use bmcsync_api::{ComputerSystem, PowerState, RedfishClient};

use crate::bios::{AttributeChange, Attributes, BiosSynchronizer, diff, merge};
use crate::config::EndpointConfig;
use crate::endpoint::{Endpoint, connect};
use crate::error::CoreError;
use crate::identity::ResourceIdentity;
use crate::power::{self, PowerDirective, PowerReconciler, parse_directive};
use crate::resolver::resolve_system;

/// Result of a power call.
#[derive(Debug, Clone, Serialize)]
pub struct PowerOutcome {
    pub identity: ResourceIdentity,
    /// `@odata.id` of the resolved system.
    pub system: String,
    /// The action issued, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<PowerDirective>,
    /// Observed state. After an action this may still be the pre-transition
    /// value.
    pub power_state: PowerState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
}

/// Result of a BIOS call.
#[derive(Debug, Clone, Serialize)]
pub struct BiosOutcome {
    pub identity: ResourceIdentity,
    pub odata_id: String,
    pub id: String,
    /// Remote baseline with the overrides laid over it.
    pub attributes: Attributes,
    /// Overrides that differ from the remote baseline. On apply these are
    /// the attributes that were sent.
    pub changes: Vec<AttributeChange>,
}

/// Runs reconciliation calls against one endpoint.
pub struct Reconciler<E = RedfishClient> {
    endpoint: E,
    config: EndpointConfig,
}

impl Reconciler<RedfishClient> {
    /// Connect to the endpoint described by `config`.
    pub async fn connect(config: EndpointConfig) -> Result<Self, CoreError> {
        let client = connect(&config).await?;
        Ok(Self::new(client, config))
    }
}

impl<E: Endpoint> Reconciler<E> {
    pub fn new(endpoint: E, config: EndpointConfig) -> Self {
        Self { endpoint, config }
    }

    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub async fn resolve(&self) -> Result<ComputerSystem, CoreError> {
        resolve_system(
            &self.endpoint,
            &self.config.address,
            self.config.system.as_deref(),
        )
        .await
    }

    fn identity(&self, locator: &str) -> ResourceIdentity {
        ResourceIdentity::assign(&self.config.address, locator)
    }

    fn power_outcome(
        &self,
        system: ComputerSystem,
        action: Option<PowerDirective>,
    ) -> PowerOutcome {
        PowerOutcome {
            identity: self.identity(&system.odata_id),
            power_state: power::read(&system),
            system: system.odata_id,
            action,
            manufacturer: system.manufacturer,
            model: system.model,
            serial_number: system.serial_number,
        }
    }

    /// Create/update for a power resource: issue `directive` and read back.
    ///
    /// The directive is validated before the endpoint is contacted, so a
    /// missing or unknown value never reaches the BMC.
    pub async fn apply_power(&self, directive: Option<&str>) -> Result<PowerOutcome, CoreError> {
        let directive = parse_directive(directive.unwrap_or_default())?;
        let system = self.resolve().await?;

        let power = PowerReconciler::new(&self.endpoint);
        power.apply(&system, directive).await?;
        let system = power.refresh(&system).await.inspect_err(|e| {
            warn!(
                address = %self.config.address,
                system = %system.odata_id,
                action = directive.as_str(),
                error = %e,
                "power action was issued but the system could not be re-read"
            );
        })?;

        Ok(self.power_outcome(system, Some(directive)))
    }

    /// Read for a power resource. Never issues an action.
    pub async fn read_power(&self) -> Result<PowerOutcome, CoreError> {
        let system = self.resolve().await?;
        Ok(self.power_outcome(system, None))
    }

    /// Read for a BIOS resource: fetch, normalize, lay `overrides` on top.
    pub async fn read_bios(&self, overrides: &Attributes) -> Result<BiosOutcome, CoreError> {
        let system = self.resolve().await?;
        let snapshot = BiosSynchronizer::new(&self.endpoint).read(&system).await?;

        let changes = diff(&snapshot.attributes, overrides);
        debug!(
            address = %self.config.address,
            pending = changes.len(),
            "compared BIOS overrides"
        );
        Ok(BiosOutcome {
            identity: self.identity(&snapshot.odata_id),
            attributes: merge(&snapshot.attributes, overrides),
            odata_id: snapshot.odata_id,
            id: snapshot.id,
            changes,
        })
    }

    /// Create/update for a BIOS resource: stage the overrides that differ.
    pub async fn apply_bios(&self, overrides: &Attributes) -> Result<BiosOutcome, CoreError> {
        let system = self.resolve().await?;
        let push = BiosSynchronizer::new(&self.endpoint)
            .apply(&system, overrides)
            .await?;
        let baseline = push.baseline;

        Ok(BiosOutcome {
            identity: self.identity(&baseline.odata_id),
            attributes: merge(&baseline.attributes, overrides),
            odata_id: baseline.odata_id,
            id: baseline.id,
            changes: push.changes,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::error::ResolutionFailure;
    use crate::fake::{FakeEndpoint, bios, system, system_with_inventory};

    fn reconciler(address: &str, endpoint: FakeEndpoint) -> Reconciler<FakeEndpoint> {
        Reconciler::new(endpoint, EndpointConfig::new(address))
    }

    fn overrides(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    // ── Scenario A: restart, no synchronous convergence ─────────────

    #[tokio::test]
    async fn force_restart_issues_one_action() {
        let r = reconciler(
            "10.0.0.5",
            FakeEndpoint::with_systems(vec![system("1", "On")]),
        );

        let outcome = r.apply_power(Some("ForceRestart")).await.unwrap();

        assert_eq!(
            r.endpoint().reset_log(),
            vec![("/redfish/v1/Systems/1".to_owned(), PowerDirective::ForceRestart)]
        );
        assert_eq!(outcome.action, Some(PowerDirective::ForceRestart));
        assert_eq!(outcome.identity.as_str(), "10.0.0.5/redfish/v1/Systems/1");
    }

    #[tokio::test]
    async fn missing_directive_never_contacts_endpoint() {
        let r = reconciler(
            "10.0.0.5",
            FakeEndpoint::with_systems(vec![system("1", "On")]),
        );

        for directive in [None, Some("")] {
            let err = r.apply_power(directive).await.unwrap_err();
            assert!(matches!(err, CoreError::InvalidDirective { .. }));
        }
        assert_eq!(r.endpoint().calls(), 0);
    }

    #[tokio::test]
    async fn read_power_reports_state_without_acting() {
        let r = reconciler(
            "10.0.0.5",
            FakeEndpoint::with_systems(vec![system("1", "PoweringOn")]),
        );

        let outcome = r.read_power().await.unwrap();

        assert_eq!(outcome.power_state, PowerState::PoweringOn);
        assert_eq!(outcome.action, None);
        assert!(r.endpoint().reset_log().is_empty());
    }

    #[tokio::test]
    async fn failed_read_back_still_reports_the_issued_action() {
        let r = reconciler(
            "10.0.0.5",
            FakeEndpoint::with_systems(vec![system("1", "On")]).failing_refresh(),
        );

        let err = r.apply_power(Some("ForceOff")).await.unwrap_err();

        assert!(matches!(
            err,
            CoreError::Fetch { ref resource, .. } if resource == "/redfish/v1/Systems/1"
        ));
        assert_eq!(
            r.endpoint().reset_log(),
            vec![("/redfish/v1/Systems/1".to_owned(), PowerDirective::ForceOff)]
        );
    }

    #[tokio::test]
    async fn power_outcome_carries_system_inventory() {
        let r = reconciler(
            "10.0.0.5",
            FakeEndpoint::with_systems(vec![system_with_inventory(
                "1",
                "Dell Inc.",
                "PowerEdge R650",
                "7XK2QD3",
            )]),
        );

        let outcome = r.read_power().await.unwrap();

        assert_eq!(outcome.manufacturer.as_deref(), Some("Dell Inc."));
        assert_eq!(outcome.model.as_deref(), Some("PowerEdge R650"));
        assert_eq!(outcome.serial_number.as_deref(), Some("7XK2QD3"));

        let bare = reconciler("10.0.0.5", FakeEndpoint::with_systems(vec![system("1", "On")]))
            .read_power()
            .await
            .unwrap();
        let json = serde_json::to_value(&bare).unwrap();
        assert!(json.get("model").is_none());
        assert!(json.get("serial_number").is_none());
    }

    // ── Scenario B: shadow baseline + override ──────────────────────

    #[tokio::test]
    async fn bios_read_merges_overrides_over_baseline() {
        let target = system("1", "On");
        let endpoint = FakeEndpoint::with_systems(vec![target.clone()]).with_bios(
            &target.odata_id,
            bios("1", json!({ "BootMode": "Uefi", "NumCores": 8 })),
        );
        let r = reconciler("10.0.0.5", endpoint);

        let outcome = r
            .read_bios(&overrides(&[("BootMode", "Bios")]))
            .await
            .unwrap();

        assert_eq!(
            outcome.attributes,
            overrides(&[("BootMode", "Bios"), ("NumCores", "8")])
        );
        assert_eq!(outcome.odata_id, "/redfish/v1/Systems/1/Bios");
        assert_eq!(outcome.id, "Bios");
        assert_eq!(
            outcome.identity.as_str(),
            "10.0.0.5/redfish/v1/Systems/1/Bios"
        );
        assert_eq!(outcome.changes.len(), 1);
        assert!(r.endpoint().patch_log().is_empty());
    }

    #[tokio::test]
    async fn bios_apply_stages_changes() {
        let target = system("1", "On");
        let endpoint = FakeEndpoint::with_systems(vec![target.clone()]).with_bios(
            &target.odata_id,
            bios("1", json!({ "BootMode": "Uefi", "NumCores": 8 })),
        );
        let r = reconciler("10.0.0.5", endpoint);

        let outcome = r
            .apply_bios(&overrides(&[("BootMode", "Bios")]))
            .await
            .unwrap();

        assert_eq!(outcome.changes[0].key, "BootMode");
        assert_eq!(r.endpoint().patch_log().len(), 1);
        assert!(r.endpoint().reset_log().is_empty());
    }

    // ── Scenario C: no systems ──────────────────────────────────────

    #[tokio::test]
    async fn empty_endpoint_stops_at_resolution() {
        let r = reconciler("10.0.0.5", FakeEndpoint::with_systems(vec![]));

        let power = r.apply_power(Some("On")).await.unwrap_err();
        let bios = r.read_bios(&Attributes::new()).await.unwrap_err();

        for err in [power, bios] {
            assert!(matches!(
                err,
                CoreError::Resolution {
                    reason: ResolutionFailure::NoSystems,
                    ..
                }
            ));
        }
        // Only the two systems listings; nothing downstream ran.
        assert_eq!(r.endpoint().calls(), 2);
    }

    // ── Scenario D: independent endpoints in parallel ───────────────

    #[tokio::test]
    async fn concurrent_calls_on_distinct_endpoints_do_not_interfere() {
        let a = reconciler(
            "10.0.0.5",
            FakeEndpoint::with_systems(vec![system("1", "Off")]),
        );
        let b_target = system("System.Embedded.1", "On");
        let b = reconciler(
            "10.0.0.6",
            FakeEndpoint::with_systems(vec![b_target.clone()])
                .with_bios(&b_target.odata_id, bios("System.Embedded.1", json!({ "BootMode": "Uefi" }))),
        );

        let desired = overrides(&[("BootMode", "Bios")]);
        let (power, bios_read) = tokio::join!(a.apply_power(Some("On")), b.read_bios(&desired));
        let power = power.unwrap();
        let bios_read = bios_read.unwrap();

        assert_eq!(power.identity.as_str(), "10.0.0.5/redfish/v1/Systems/1");
        assert_eq!(
            bios_read.identity.as_str(),
            "10.0.0.6/redfish/v1/Systems/System.Embedded.1/Bios"
        );
        assert_eq!(a.endpoint().reset_log().len(), 1);
        assert!(a.endpoint().patch_log().is_empty());
        assert!(b.endpoint().reset_log().is_empty());
        assert!(b.endpoint().patch_log().is_empty());
    }

    // ── Selector ────────────────────────────────────────────────────

    #[tokio::test]
    async fn configured_system_selector_is_honoured() {
        let endpoint = FakeEndpoint::with_systems(vec![system("1", "On"), system("2", "Off")]);
        let r = Reconciler::new(endpoint, EndpointConfig::new("bmc01").with_system("2"));

        let outcome = r.read_power().await.unwrap();

        assert_eq!(outcome.system, "/redfish/v1/Systems/2");
        assert_eq!(outcome.power_state, PowerState::Off);
    }
}
