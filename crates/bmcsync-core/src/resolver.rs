// ── System Resolver ──
//
// Picks the one computer system a reconciliation call operates on. Without
// a selector the first member in collection order wins; that is the
// contract, not an accident, and multi-system chassis need `system = "<Id>"`
// to pick anything else.

use tracing::{debug, warn};

use bmcsync_api::ComputerSystem;

use crate::endpoint::Endpoint;
use crate::error::{CoreError, ResolutionFailure};

/// Resolve the computer system for a call.
///
/// `selector` matches a member's `Id` exactly. Read-only.
pub async fn resolve_system<E>(
    endpoint: &E,
    address: &str,
    selector: Option<&str>,
) -> Result<ComputerSystem, CoreError>
where
    E: Endpoint + ?Sized,
{
    let systems = endpoint
        .systems()
        .await
        .map_err(|e| CoreError::resolution(address, &e))?;

    let failure = |reason| CoreError::Resolution {
        address: address.to_owned(),
        reason,
    };

    if let Some(wanted) = selector {
        return systems
            .into_iter()
            .find(|s| s.id == wanted)
            .inspect(|s| debug!(address, system = %s.odata_id, "resolved system by id"))
            .ok_or_else(|| failure(ResolutionFailure::NotFound(wanted.to_owned())));
    }

    let count = systems.len();
    let system = systems
        .into_iter()
        .next()
        .ok_or_else(|| failure(ResolutionFailure::NoSystems))?;

    if count > 1 {
        warn!(
            address,
            count,
            system = %system.odata_id,
            "endpoint exposes several systems, using the first"
        );
    } else {
        debug!(address, system = %system.odata_id, "resolved system");
    }
    Ok(system)
}
