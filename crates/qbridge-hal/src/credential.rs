//! Credential resolution.
//!
//! A [`CredentialResolver`] folds over an ordered list of
//! [`CredentialSource`]s and stops at the first one that yields a usable
//! value. A value is usable when it is non-empty after trimming and is not
//! one of the resolver's "unset" sentinels (placeholder strings left in
//! template config files).
//!
//! Finding nothing is not an error: the resolver returns a [`Credential`]
//! with [`Provenance::None`], which callers treat as local-only mode.
//!
//! ```ignore
//! use qbridge_hal::credential::{ConfigFileSource, CredentialResolver, EnvSource};
//!
//! let credential = CredentialResolver::new()
//!     .with_source(EnvSource::new("IBM_QUANTUM_TOKEN"))
//!     .with_source(ConfigFileSource::new(".env", "IBM_QUANTUM_TOKEN"))
//!     .resolve();
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Environment variable holding the provider token.
pub const TOKEN_ENV_VAR: &str = "IBM_QUANTUM_TOKEN";

/// Default key/value file consulted after the environment.
pub const DEFAULT_CONFIG_FILE: &str = ".env";

/// Placeholder values that mean "not configured".
pub const DEFAULT_SENTINELS: &[&str] = &["your_ibm_quantum_token_here", "your_token_here", "changeme"];

/// Where a credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// A process environment variable.
    Env,
    /// A local key/value configuration file.
    ConfigFile,
    /// No source produced a usable value.
    None,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Env => write!(f, "env"),
            Provenance::ConfigFile => write!(f, "config-file"),
            Provenance::None => write!(f, "none"),
        }
    }
}

/// An access token plus the source it was read from.
///
/// Immutable once resolved. The token never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    provenance: Provenance,
}

impl Credential {
    /// Create a credential from a resolved token.
    pub fn new(token: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            token: token.into(),
            provenance,
        }
    }

    /// The "nothing found" credential.
    pub fn none() -> Self {
        Self {
            token: String::new(),
            provenance: Provenance::None,
        }
    }

    /// Where this credential came from.
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// The token, unless this is the `none` credential.
    pub fn token(&self) -> Option<&str> {
        match self.provenance {
            Provenance::None => None,
            _ => Some(&self.token),
        }
    }

    /// Check whether this credential may be handed to the directory client.
    pub fn is_usable(&self) -> bool {
        self.token().is_some()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("provenance", &self.provenance)
            .finish()
    }
}

/// One place a token may be read from.
pub trait CredentialSource: Send + Sync {
    /// Short description used in resolution reports, e.g. `env:IBM_QUANTUM_TOKEN`.
    fn describe(&self) -> String;

    /// Provenance recorded when this source wins.
    fn provenance(&self) -> Provenance;

    /// The raw value, if the source has one. Must not fail.
    fn fetch(&self) -> Option<String>;
}

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Reads a token from a process environment variable.
#[derive(Clone)]
pub struct EnvSource {
    var: String,
    lookup: EnvLookup,
}

impl EnvSource {
    /// Read from the real process environment.
    pub fn new(var: impl Into<String>) -> Self {
        Self::with_lookup(var, Arc::new(|name: &str| std::env::var(name).ok()))
    }

    /// Read through a custom lookup function instead of the process environment.
    pub fn with_lookup(var: impl Into<String>, lookup: EnvLookup) -> Self {
        Self {
            var: var.into(),
            lookup,
        }
    }
}

impl CredentialSource for EnvSource {
    fn describe(&self) -> String {
        format!("env:{}", self.var)
    }

    fn provenance(&self) -> Provenance {
        Provenance::Env
    }

    fn fetch(&self) -> Option<String> {
        (self.lookup)(&self.var)
    }
}

/// Reads a token from a `KEY=value` file.
///
/// Lines are scanned in order; blank lines, `#` comments and lines without
/// `=` are ignored. The first line whose key matches wins, and one pair of
/// matching surrounding quotes is stripped from its value. A missing or
/// unreadable file is a miss, not an error.
#[derive(Debug, Clone)]
pub struct ConfigFileSource {
    path: PathBuf,
    key: String,
}

impl ConfigFileSource {
    /// Create a source for `key` in the file at `path`.
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    /// The file consulted.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lookup(&self, contents: &str) -> Option<String> {
        contents.lines().find_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let (key, value) = line.split_once('=')?;
            (key.trim() == self.key).then(|| strip_quotes(value.trim()).to_string())
        })
    }
}

impl CredentialSource for ConfigFileSource {
    fn describe(&self) -> String {
        format!("file:{}#{}", self.path.display(), self.key)
    }

    fn provenance(&self) -> Provenance {
        Provenance::ConfigFile
    }

    fn fetch(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => self.lookup(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "config file not present");
                None
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "config file unreadable");
                None
            }
        }
    }
}

fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// A token supplied directly, e.g. from a command-line flag.
#[derive(Clone)]
pub struct StaticSource {
    token: Option<String>,
    provenance: Provenance,
}

impl StaticSource {
    /// Wrap a token that should be reported with the given provenance.
    pub fn new(token: Option<String>, provenance: Provenance) -> Self {
        Self { token, provenance }
    }
}

impl CredentialSource for StaticSource {
    fn describe(&self) -> String {
        format!("static:{}", self.provenance)
    }

    fn provenance(&self) -> Provenance {
        self.provenance
    }

    fn fetch(&self) -> Option<String> {
        self.token.clone()
    }
}

/// What happened when a source was consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceOutcome {
    /// The source produced the winning value.
    Found,
    /// The source had no value, or an empty one.
    Missing,
    /// The source held an "unset" sentinel.
    Placeholder,
}

/// One consulted source in a [`Resolution`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAttempt {
    /// The source's description.
    pub source: String,
    /// What it yielded.
    pub outcome: SourceOutcome,
}

/// The resolved credential plus a trace of consulted sources.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The resolved credential.
    pub credential: Credential,
    /// Sources consulted, in order, up to and including the winner.
    pub attempts: Vec<SourceAttempt>,
}

/// Ordered fold over credential sources.
pub struct CredentialResolver {
    sources: Vec<Box<dyn CredentialSource>>,
    sentinels: Vec<String>,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialResolver {
    /// Create a resolver with no sources and the default sentinels.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            sentinels: DEFAULT_SENTINELS.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// The standard chain: environment variable, then the config file.
    pub fn standard(env_var: &str, config_file: impl Into<PathBuf>, key: &str) -> Self {
        Self::new()
            .with_source(EnvSource::new(env_var))
            .with_source(ConfigFileSource::new(config_file, key))
    }

    /// Append a source; earlier sources take precedence.
    #[must_use]
    pub fn with_source(mut self, source: impl CredentialSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Replace the sentinel list.
    #[must_use]
    pub fn with_sentinels(mut self, sentinels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.sentinels = sentinels.into_iter().map(Into::into).collect();
        self
    }

    /// Number of configured sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check whether the resolver has no sources.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Resolve a credential.
    pub fn resolve(&self) -> Credential {
        self.resolve_detailed().credential
    }

    /// Resolve a credential and report every source consulted.
    pub fn resolve_detailed(&self) -> Resolution {
        let mut attempts = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let value = source.fetch().map(|v| v.trim().to_string());
            let outcome = match value.as_deref() {
                None | Some("") => SourceOutcome::Missing,
                Some(v) if self.sentinels.iter().any(|s| s == v) => SourceOutcome::Placeholder,
                Some(_) => SourceOutcome::Found,
            };
            attempts.push(SourceAttempt {
                source: source.describe(),
                outcome,
            });

            if let (SourceOutcome::Found, Some(token)) = (outcome, value) {
                debug!(source = %source.describe(), "credential resolved");
                return Resolution {
                    credential: Credential::new(token, source.provenance()),
                    attempts,
                };
            }
        }

        debug!("no credential found, local-only mode");
        Resolution {
            credential: Credential::none(),
            attempts,
        }
    }
}
