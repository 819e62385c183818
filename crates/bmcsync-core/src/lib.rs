// bmcsync-core: reconciles declared power and BIOS state against live BMCs.
//
// The System Resolver, Power Reconciler, BIOS Attribute Synchronizer and
// Resource Identity Assigner are plain functions and small structs over the
// `Endpoint` trait. `Reconciler` chains them into the per-call flows the
// CLI and the declarative layer use.

pub mod bios;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod identity;
pub mod power;
pub mod reconcile;
pub mod resolver;

#[cfg(test)]
mod fake;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bios::{AttributeChange, Attributes, BiosSnapshot, BiosSynchronizer};
pub use config::{EndpointConfig, TlsVerification};
pub use endpoint::{Endpoint, connect};
pub use error::{CoreError, ResolutionFailure};
pub use identity::ResourceIdentity;
pub use power::{PowerDirective, PowerReconciler, parse_directive};
pub use reconcile::{BiosOutcome, PowerOutcome, Reconciler};
pub use resolver::resolve_system;

pub use bmcsync_api::{ComputerSystem, PowerState};
