//! Compile command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;

use qbridge_compile::compile;
use qbridge_hal::{BasisGates, LocalSimulatorProfile, Target};
use qbridge_qasm3::emit;

use super::common::{GlobalOpts, build_pipeline, cancel_on_ctrl_c, load_config, resolve_jobs};

/// Offline profiles for the common basis families.
pub fn offline_target(name: &str) -> Option<Target> {
    let profile = |name: &str, max_qubits: u32, basis: BasisGates| LocalSimulatorProfile {
        name: name.to_string(),
        max_qubits,
        basis,
    };
    match name.to_lowercase().as_str() {
        "sim" | "simulator" | "local" => Some(Target::local()),
        "ibm" => Some(profile("ibm", 127, BasisGates::ibm()).into()),
        "heron" => Some(profile("heron", 156, BasisGates::heron()).into()),
        "eagle" => Some(profile("eagle", 127, BasisGates::eagle()).into()),
        _ => None,
    }
}

/// Execute the compile command.
///
/// `target` is an offline profile name or a backend listed by the provider.
pub async fn execute(
    global: &GlobalOpts,
    circuit: &str,
    target: &str,
    output: Option<&PathBuf>,
) -> Result<()> {
    let config = load_config(global)?;
    let job = resolve_jobs(&[circuit.to_string()], &config.validation)?
        .into_iter()
        .next()
        .context("No circuit given")?;

    // The session stays alive while its descriptor is in use.
    let (target, _session) = match offline_target(target) {
        Some(target) => (target, None),
        None => {
            let pipeline = build_pipeline(config, global.token.as_deref())?;
            let connection = pipeline.open_session(&cancel_on_ctrl_c()).await?;
            let session = connection.session.with_context(|| {
                format!(
                    "Unknown target '{target}' and no remote session ({}). Offline targets: sim, ibm, heron, eagle",
                    connection.outcome
                )
            })?;
            let desc = session
                .backend(target)
                .with_context(|| format!("Backend '{target}' not listed by {}", session.provider()))?
                .clone();
            (Target::Remote(desc), Some(session))
        }
    };

    eprintln!(
        "{} Compiling {} for {}",
        style("→").cyan().bold(),
        style(job.name()).green(),
        style(target.id()).yellow()
    );
    eprintln!(
        "  Input: {} qubits, {} gates, depth {}",
        job.circuit.num_qubits(),
        job.circuit.num_gates(),
        job.circuit.depth()
    );

    let program = compile(&job.circuit, &target)?;
    let compiled = program.circuit();
    eprintln!(
        "  Output: {} gates, depth {}",
        compiled.num_gates(),
        compiled.depth()
    );

    let qasm = emit(compiled);
    match output {
        Some(path) => {
            std::fs::write(path, &qasm)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Written to {}",
                style("✓").green().bold(),
                style(path.display()).green()
            );
        }
        None => print!("{qasm}"),
    }
    Ok(())
}
