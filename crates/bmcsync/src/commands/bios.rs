//! BIOS command handlers.

use tabled::Tabled;

use bmcsync_core::{AttributeChange, BiosOutcome};

use crate::cli::{BiosArgs, BiosCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Attribute")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Override")]
    marker: &'static str,
}

#[derive(Tabled)]
struct ChangeRow {
    #[tabled(rename = "Attribute")]
    key: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Desired")]
    desired: String,
}

impl From<&AttributeChange> for ChangeRow {
    fn from(c: &AttributeChange) -> Self {
        Self {
            key: c.key.clone(),
            current: c.current.clone().unwrap_or_else(|| "(not reported)".into()),
            desired: c.desired.clone(),
        }
    }
}

fn attributes_table(outcome: &BiosOutcome) -> String {
    let rows: Vec<AttributeRow> = outcome
        .attributes
        .iter()
        .map(|(name, value)| AttributeRow {
            name: name.clone(),
            value: value.clone(),
            marker: if outcome.changes.iter().any(|c| &c.key == name) {
                "*"
            } else {
                ""
            },
        })
        .collect();

    format!(
        "Identity: {}\nResource: {} ({})\n{}",
        outcome.identity,
        outcome.odata_id,
        outcome.id,
        output::render_table(&rows)
    )
}

fn render_changes(global: &GlobalOpts, changes: &[AttributeChange]) -> Result<String, CliError> {
    output::render_list(&global.output, changes, |c| ChangeRow::from(c), |c| {
        format!("{}={}", c.key, c.desired)
    })
}

/// Empty tables are suppressed; structured formats still print `[]`.
fn nothing_to_show(global: &GlobalOpts, outcome: &BiosOutcome) -> bool {
    outcome.changes.is_empty() && matches!(global.output, OutputFormat::Table)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: BiosArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        BiosCommand::Show { set } => {
            let overrides = util::parse_assignments(&set)?;
            let outcome = util::connect(global).await?.read_bios(&overrides).await?;

            let out = output::render_single(&global.output, &outcome, attributes_table, |o| {
                o.attributes
                    .iter()
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
            output::print_output(&out, global.quiet);
        }

        BiosCommand::Diff { set } => {
            let overrides = util::parse_assignments(&set)?;
            let outcome = util::connect(global).await?.read_bios(&overrides).await?;

            if outcome.changes.is_empty() && !global.quiet {
                eprintln!("BIOS attributes already match.");
            }
            let out = render_changes(global, &outcome.changes)?;
            output::print_output(&out, global.quiet || nothing_to_show(global, &outcome));
        }

        BiosCommand::Apply { set } => {
            let overrides = util::parse_assignments(&set)?;
            let outcome = util::connect(global).await?.apply_bios(&overrides).await?;

            if !global.quiet {
                if outcome.changes.is_empty() {
                    eprintln!("BIOS attributes already match; nothing staged.");
                } else {
                    eprintln!(
                        "Staged {} attribute change(s); they take effect on the next boot.",
                        outcome.changes.len()
                    );
                }
            }
            let out = render_changes(global, &outcome.changes)?;
            output::print_output(&out, global.quiet || nothing_to_show(global, &outcome));
        }
    }
    Ok(())
}
