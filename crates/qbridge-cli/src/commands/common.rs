//! Shared helpers for CLI commands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use tracing::{info, warn};

use qbridge_adapter_ibm::{DEFAULT_ENDPOINT, IbmTransport};
use qbridge_hal::{CancelToken, CredentialResolver, ExecutionResult, Provenance, StaticSource};
use qbridge_pipeline::{CircuitJob, Pipeline, PipelineConfig, ValidationConfig};

/// Settings shared by every command that may talk to the provider.
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    /// YAML configuration file.
    pub config: Option<std::path::PathBuf>,
    /// Provider endpoint override.
    pub endpoint: Option<String>,
    /// Explicit access token; takes precedence over every other source.
    pub token: Option<String>,
    /// IBM Cloud instance CRN override.
    pub service_crn: Option<String>,
}

/// Load the configuration file (or defaults) and apply global overrides.
pub fn load_config(opts: &GlobalOpts) -> Result<PipelineConfig> {
    let mut config = match &opts.config {
        Some(path) => PipelineConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(endpoint) = &opts.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(crn) = &opts.service_crn {
        config.service_crn = Some(crn.clone());
    }
    Ok(config)
}

/// The resolver for `config`, with an explicit token taking precedence.
pub fn resolver(config: &PipelineConfig, token: Option<&str>) -> CredentialResolver {
    match token {
        Some(token) => CredentialResolver::new()
            .with_source(StaticSource::new(Some(token.to_string()), Provenance::Env))
            .with_sentinels(config.credential.sentinels.iter().cloned()),
        None => config.credential.resolver(),
    }
}

/// The IBM Quantum transport for `config`.
///
/// A Service-CRN selects the IBM Cloud API with IAM key exchange; otherwise
/// the token is sent directly to the legacy endpoint.
pub fn build_transport(config: &PipelineConfig) -> Result<IbmTransport> {
    match &config.service_crn {
        Some(crn) => IbmTransport::cloud(config.endpoint.as_deref(), crn)
            .context("Failed to create IBM Cloud client (check the Service-CRN)"),
        None => {
            let endpoint = config.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
            IbmTransport::with_endpoint(endpoint)
                .with_context(|| format!("Failed to create HTTP client for {endpoint}"))
        }
    }
}

/// A pipeline wired to the IBM Quantum transport.
pub fn build_pipeline(config: PipelineConfig, token: Option<&str>) -> Result<Pipeline> {
    let transport = build_transport(&config)?;
    let resolver = resolver(&config, token);
    Ok(Pipeline::new(config)
        .with_transport(Arc::new(transport))
        .with_resolver(resolver)
        .with_compile_cache())
}

/// Look up built-in circuits by name.
pub fn resolve_jobs(names: &[String], limits: &ValidationConfig) -> Result<Vec<CircuitJob>> {
    names
        .iter()
        .map(|name| {
            CircuitJob::builtin(name, limits).ok_or_else(|| {
                anyhow::anyhow!("Unknown circuit: '{name}'. Available: bell, ghz<N> (N >= 2)")
            })
        })
        .collect()
}

/// A token that trips on Ctrl+C.
pub fn cancel_on_ctrl_c() -> CancelToken {
    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received SIGINT");
                trigger.cancel();
            }
            Err(e) => warn!(error = %e, "failed to install Ctrl+C handler"),
        }
    });
    cancel
}

/// Write `value` as pretty JSON.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Print a measurement histogram.
pub fn print_results(result: &ExecutionResult) {
    println!(
        "  {} {} shots on {} in {} ms",
        style("✓").green().bold(),
        result.shots,
        style(&result.produced_by).yellow(),
        result.duration.as_millis()
    );

    let sorted = result.counts.sorted();
    let total = result.counts.total_shots().max(1) as f64;

    for (bitstring, count) in sorted.iter().take(16) {
        let prob = *count as f64 / total * 100.0;
        let bar: String = "█".repeat((prob / 2.0).round() as usize);
        println!(
            "    {}: {:>6} ({:>5.2}%) {}",
            style(bitstring).cyan(),
            count,
            prob,
            style(bar).green()
        );
    }

    if sorted.len() > 16 {
        println!("    ... and {} more outcomes", sorted.len() - 16);
    }
}
