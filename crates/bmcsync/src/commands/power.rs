//! Power command handlers.

use bmcsync_core::{PowerOutcome, parse_directive};

use crate::cli::{GlobalOpts, PowerArgs, PowerCommand};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

fn detail(outcome: &PowerOutcome, color: bool) -> String {
    let mut lines = vec![
        format!("Identity:    {}", outcome.identity),
        format!("System:      {}", outcome.system),
    ];
    let hardware: Vec<&str> = [&outcome.manufacturer, &outcome.model]
        .into_iter()
        .filter_map(Option::as_deref)
        .collect();
    if !hardware.is_empty() {
        lines.push(format!("Hardware:    {}", hardware.join(" ")));
    }
    if let Some(ref serial) = outcome.serial_number {
        lines.push(format!("Serial:      {serial}"));
    }
    lines.push(format!(
        "Power state: {}",
        output::paint_power_state(&outcome.power_state, color)
    ));
    if let Some(action) = outcome.action {
        lines.push(format!("Action:      {action} (issued)"));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: PowerArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    let outcome = match args.command {
        PowerCommand::Status => util::connect(global).await?.read_power().await?,

        PowerCommand::Apply { directive } => {
            // Reject bad input before resolving config or touching the network.
            let directive = parse_directive(&directive)?;
            let endpoint = config::resolve_endpoint(global)?;

            if directive.is_disruptive() {
                let prompt = format!("Issue {directive} on {}?", endpoint.address);
                if !util::confirm(&prompt, directive.as_str(), global.yes)? {
                    if !global.quiet {
                        eprintln!("Aborted.");
                    }
                    return Ok(());
                }
            }

            let reconciler = util::connect_to(endpoint).await?;
            let outcome = reconciler.apply_power(Some(directive.as_str())).await?;
            if !global.quiet {
                eprintln!("{directive} accepted; power state may take a moment to change.");
            }
            outcome
        }
    };

    let out = output::render_single(
        &global.output,
        &outcome,
        |o| detail(o, color),
        |o| o.power_state.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
