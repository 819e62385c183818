//! Manifest reconciliation (`bmcsync apply -f manifest.toml`).
//!
//! Every declared resource is reconciled independently and concurrently.
//! Successful resources replace their state entry, failed ones keep the
//! previous entry, and resources no longer declared are forgotten without
//! any remote action.
//!
//! A power directive is issued when the resource is new, when its declared
//! directive changed, or when it now resolves to a different identity.
//! Otherwise the run only reads the power state, so re-applying an
//! unchanged manifest never reboots a host a second time.

use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use tabled::Tabled;
use tracing::{info, warn};

use bmcsync_config::{
    BiosResource, Manifest, PowerResource, ResourceKind, ResourceState, State,
    default_state_path,
};
use bmcsync_core::{CoreError, Reconciler, parse_directive};

use crate::cli::{ApplyArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Results ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    /// Action issued or BIOS changes staged.
    Applied,
    /// Read only; nothing needed or requested.
    Read,
    /// Dry run with pending work.
    Pending,
    Failed,
}

impl Status {
    fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Read => "read",
            Self::Pending => "pending",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Serialize)]
struct ResourceResult {
    key: String,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outputs: Option<serde_json::Value>,
    summary: String,
}

impl ResourceResult {
    fn failed(key: String, err: &CoreError) -> Self {
        Self {
            key,
            status: Status::Failed,
            identity: None,
            outputs: None,
            summary: err.to_string(),
        }
    }
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Resource")]
    key: String,
    #[tabled(rename = "Status")]
    status: &'static str,
    #[tabled(rename = "Identity")]
    identity: String,
    #[tabled(rename = "Detail")]
    summary: String,
}

impl From<&ResourceResult> for ResultRow {
    fn from(r: &ResourceResult) -> Self {
        Self {
            key: r.key.clone(),
            status: r.status.as_str(),
            identity: r.identity.clone().unwrap_or_else(|| "-".into()),
            summary: r.summary.clone(),
        }
    }
}

// ── Per-resource reconciliation ─────────────────────────────────────

/// Whether the declared directive still has to be sent.
fn directive_pending(previous: Option<&ResourceState>, declared: &str, identity: &str) -> bool {
    previous.is_none_or(|p| {
        p.id != identity
            || p.outputs.get("desired_power_state").and_then(|v| v.as_str()) != Some(declared)
    })
}

async fn reconcile_power(
    resource: &PowerResource,
    previous: Option<&ResourceState>,
    timeout: Duration,
    dry_run: bool,
) -> Result<ResourceResult, CoreError> {
    let key = ResourceKind::Power.key(&resource.name);
    let declared = resource.desired_power_state.as_deref().unwrap_or_default();
    // Validated up front so a bad manifest entry never reaches the BMC.
    let directive = parse_directive(declared)?;

    let reconciler = Reconciler::connect(resource.endpoint.to_endpoint_config(timeout)).await?;
    let observed = reconciler.read_power().await?;
    let pending = directive_pending(previous, declared, observed.identity.as_str());

    let (outcome, status, summary) = match (pending, dry_run) {
        (false, _) => {
            let summary = format!("{directive} already issued, reports {}", observed.power_state);
            (observed, Status::Read, summary)
        }
        (true, true) => {
            let summary = format!("would issue {directive} (now {})", observed.power_state);
            (observed, Status::Pending, summary)
        }
        (true, false) => {
            let outcome = reconciler.apply_power(Some(declared)).await?;
            let summary = format!("{directive} issued, reports {}", outcome.power_state);
            (outcome, Status::Applied, summary)
        }
    };

    Ok(ResourceResult {
        key,
        status,
        identity: Some(outcome.identity.to_string()),
        outputs: Some(json!({
            "power_state": outcome.power_state,
            "desired_power_state": declared,
        })),
        summary,
    })
}

async fn reconcile_bios(
    resource: &BiosResource,
    timeout: Duration,
    dry_run: bool,
) -> Result<ResourceResult, CoreError> {
    let key = ResourceKind::Bios.key(&resource.name);
    let reconciler = Reconciler::connect(resource.endpoint.to_endpoint_config(timeout)).await?;

    let push = resource.apply && !dry_run;
    let outcome = if push {
        reconciler.apply_bios(&resource.attributes).await?
    } else {
        reconciler.read_bios(&resource.attributes).await?
    };

    let pending = outcome.changes.len();
    let (status, summary) = match (push, pending) {
        (_, 0) => (Status::Read, format!("{} attributes in sync", outcome.attributes.len())),
        (true, n) => (Status::Applied, format!("{n} change(s) staged for next boot")),
        (false, n) if resource.apply => (Status::Pending, format!("would stage {n} change(s)")),
        (false, n) => (Status::Read, format!("{n} override(s) differ (apply = false)")),
    };

    Ok(ResourceResult {
        key,
        status,
        identity: Some(outcome.identity.to_string()),
        outputs: Some(json!({
            "odata_id": outcome.odata_id,
            "id": outcome.id,
            "attributes": outcome.attributes,
        })),
        summary,
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ApplyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let manifest = Manifest::load(&args.file)?;
    if manifest.is_empty() {
        warn!(file = %args.file.display(), "manifest declares no resources");
    }
    let state_path = args.state.unwrap_or_else(default_state_path);
    let mut state = State::load(&state_path)?;

    let defaults = config::load_config_or_default().defaults;
    let timeout = Duration::from_secs(global.timeout.unwrap_or(defaults.timeout));
    let dry_run = args.dry_run;

    let previous = &state;
    let power = manifest.power.iter().map(|r| async move {
        let key = ResourceKind::Power.key(&r.name);
        reconcile_power(r, previous.get(&key), timeout, dry_run)
            .await
            .unwrap_or_else(|e| ResourceResult::failed(key, &e))
    });
    let bios = manifest.bios.iter().map(|r| async move {
        let key = ResourceKind::Bios.key(&r.name);
        reconcile_bios(r, timeout, dry_run)
            .await
            .unwrap_or_else(|e| ResourceResult::failed(key, &e))
    });
    let (power, bios) = tokio::join!(join_all(power), join_all(bios));
    let results: Vec<ResourceResult> = power.into_iter().chain(bios).collect();

    let failed = results
        .iter()
        .filter(|r| r.status == Status::Failed)
        .inspect(|r| warn!(resource = %r.key, error = %r.summary, "reconciliation failed"))
        .count();

    if dry_run {
        info!("dry run, state file left untouched");
    } else {
        for result in &results {
            if let (Some(id), Some(outputs)) = (&result.identity, &result.outputs) {
                if let Some(previous) = state.get(&result.key).filter(|p| p.id != *id) {
                    info!(resource = %result.key, old = %previous.id, new = %id, "identity changed");
                }
                state.record(result.key.clone(), id.clone(), outputs.clone());
            }
        }
        for key in state.prune(&manifest.keys()) {
            info!(resource = %key, "no longer declared, forgotten");
        }
        state.save(&state_path)?;
    }

    let out = output::render_list(&global.output, &results, |r| ResultRow::from(r), |r| {
        format!("{}\t{}", r.key, r.status.as_str())
    })?;
    output::print_output(&out, global.quiet);

    if failed > 0 {
        return Err(CliError::PartialFailure {
            failed,
            total: results.len(),
        });
    }
    Ok(())
}
