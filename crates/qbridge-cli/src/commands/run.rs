//! Run command implementation.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use qbridge_pipeline::{ExecutionPath, SessionSummary};

use super::common::{
    GlobalOpts, build_pipeline, cancel_on_ctrl_c, load_config, print_results, resolve_jobs,
    write_json,
};

/// Options for `qbridge run`.
#[derive(Debug, Clone, Default)]
pub struct RunOpts {
    pub circuits: Vec<String>,
    pub shots: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub local_only: bool,
    pub seed: Option<u64>,
    pub report: Option<PathBuf>,
}

/// Execute the run command.
///
/// Fails when no circuit produced a result or a validation failed. When a
/// summary exists the report is written before the failure is returned.
pub async fn execute(global: &GlobalOpts, opts: &RunOpts) -> Result<()> {
    let mut config = load_config(global)?;
    if let Some(shots) = opts.shots {
        config.shots = shots;
    }
    if let Some(timeout_ms) = opts.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if opts.seed.is_some() {
        config.seed = opts.seed;
    }
    config.local_only |= opts.local_only;

    let jobs = resolve_jobs(&opts.circuits, &config.validation)?;
    println!(
        "{} Running {} ({} shots)",
        style("→").cyan().bold(),
        style(opts.circuits.join(", ")).green(),
        config.shots
    );

    let pipeline = build_pipeline(config, global.token.as_deref())?;
    let cancel = cancel_on_ctrl_c();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Executing...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = pipeline.run(&jobs, &cancel).await;
    spinner.finish_and_clear();
    if let Some((hits, misses)) = pipeline.cache_stats() {
        debug!(hits, misses, "compile cache");
    }
    let summary = outcome?;

    print_summary(&summary);

    if let Some(path) = &opts.report {
        write_json(path, &summary)?;
        println!("\n  Report written to {}", style(path.display()).green());
    }

    if !summary.succeeded() {
        anyhow::bail!("One or more circuits failed validation");
    }
    Ok(())
}

fn print_summary(summary: &SessionSummary) {
    println!(
        "  Credential: {}, remote: {}",
        style(summary.credential).yellow(),
        if summary.remote_connected {
            style(summary.provider.as_deref().unwrap_or("connected")).green()
        } else {
            style(summary.connect_outcome.as_str()).dim()
        }
    );

    for run in &summary.runs {
        let path = match run.path {
            Some(ExecutionPath::Remote) => style("remote").green(),
            Some(ExecutionPath::Local) => style("local").cyan(),
            Some(ExecutionPath::LocalFallback) => style("local (fallback)").yellow(),
            None => style("no result").red(),
        };
        println!("\n{} {} via {}", style("●").bold(), style(&run.circuit).bold(), path);

        for attempt in &run.failed_attempts {
            println!(
                "  {} {} failed at {}: {}",
                style("✗").red(),
                attempt.target,
                attempt.stage,
                style(&attempt.error).dim()
            );
        }
        if let Some(result) = &run.result {
            print_results(result);
        }
        if let Some(verdict) = &run.verdict {
            let mark = if verdict.passed {
                style("✓").green().bold()
            } else {
                style("✗").red().bold()
            };
            println!("  {mark} {verdict}");
        }
    }
}
