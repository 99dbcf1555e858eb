//! Auth command implementation.
//!
//! Reports which credential source would be used, never the token itself.

use anyhow::Result;
use console::style;

use qbridge_hal::SourceOutcome;

use super::common::{GlobalOpts, load_config, resolver};

/// Execute the auth status subcommand.
pub fn execute_status(global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let resolution = resolver(&config, global.token.as_deref()).resolve_detailed();

    println!("{} Credential sources:\n", style("→").cyan().bold());
    for attempt in &resolution.attempts {
        let (mark, label) = match attempt.outcome {
            SourceOutcome::Found => (style("●").green(), "found"),
            SourceOutcome::Missing => (style("○").dim(), "missing"),
            SourceOutcome::Placeholder => (style("○").yellow(), "placeholder value"),
        };
        println!("  {mark} {} ({label})", attempt.source);
    }

    let provenance = resolution.credential.provenance();
    println!();
    if resolution.credential.is_usable() {
        println!(
            "{} Using credential from {}",
            style("✓").green().bold(),
            style(provenance).yellow()
        );
    } else {
        println!(
            "{} No credential ({}); runs will use the local simulator",
            style("○").dim(),
            style(provenance).dim()
        );
    }
    Ok(())
}
