//! Shared helpers for command handlers.

use std::io::IsTerminal;

use bmcsync_core::{Attributes, EndpointConfig, Reconciler};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

/// Resolve the endpoint from profile + flags and connect to it.
pub async fn connect(global: &GlobalOpts) -> Result<Reconciler, CliError> {
    let endpoint = config::resolve_endpoint(global)?;
    connect_to(endpoint).await
}

pub async fn connect_to(endpoint: EndpointConfig) -> Result<Reconciler, CliError> {
    tracing::debug!(address = %endpoint.address, "connecting");
    Ok(Reconciler::connect(endpoint).await?)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to ask on, refuses instead of guessing.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Parse repeated `KEY=VALUE` arguments into an override map.
///
/// The value may be empty or contain `=`; the key may not be empty. A key
/// given twice is an error rather than silently taking the last value.
pub fn parse_assignments(pairs: &[String]) -> Result<Attributes, CliError> {
    let mut attributes = Attributes::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(CliError::Validation {
                field: "--set".into(),
                reason: format!("expected KEY=VALUE, got '{pair}'"),
            });
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(CliError::Validation {
                field: "--set".into(),
                reason: format!("missing attribute name in '{pair}'"),
            });
        }
        if attributes.insert(key.to_owned(), value.to_owned()).is_some() {
            return Err(CliError::Validation {
                field: "--set".into(),
                reason: format!("attribute '{key}' given more than once"),
            });
        }
    }
    Ok(attributes)
}
