//! Backends command implementation.

use anyhow::Result;
use console::style;

use qbridge_hal::BackendStatus;

use super::common::{GlobalOpts, build_pipeline, cancel_on_ctrl_c, load_config};

/// Execute the backends command.
pub async fn execute(global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let pipeline = build_pipeline(config, global.token.as_deref())?;
    let connection = pipeline.open_session(&cancel_on_ctrl_c()).await?;

    println!("{} Available backends:\n", style("qbridge").cyan().bold());

    let profile = pipeline.simulator().profile();
    println!(
        "  {} {} (local)",
        style("●").green(),
        style(&profile.name).bold()
    );
    println!("    Qubits: {}", profile.max_qubits);
    println!("    Gates: universal");
    println!();

    let Some(session) = &connection.session else {
        println!(
            "  {} remote provider: {}",
            style("○").dim(),
            style(&connection.outcome).dim()
        );
        println!("    Credential: {}", connection.provenance);
        return Ok(());
    };

    println!(
        "  Provider: {} (credential: {})\n",
        style(session.provider()).yellow(),
        connection.provenance
    );
    if session.backends().is_empty() {
        println!("  No remote backends listed.");
    }
    for backend in session.backends() {
        let dot = match backend.status {
            BackendStatus::Online => style("●").green(),
            BackendStatus::Offline => style("○").red(),
            BackendStatus::Unknown => style("○").yellow(),
        };
        println!(
            "  {} {}{}",
            dot,
            style(&backend.name).bold(),
            if backend.simulator { " (simulator)" } else { "" }
        );
        println!("    Qubits: {}", backend.num_qubits);
        println!("    Status: {}", backend.status);
        if let Some(max_shots) = backend.max_shots {
            println!("    Max shots: {max_shots}");
        }
        if let Some(queue) = backend.queue_length {
            println!("    Queue: {queue}");
        }
        println!("    Gates: {}", backend.basis_gates.names().join(", "));
        println!();
    }
    Ok(())
}
