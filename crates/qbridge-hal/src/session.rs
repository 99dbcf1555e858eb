//! Backend Directory Client: connect to a provider and list its backends.
//!
//! ```text
//!   Credential ──→ connect() ──→ handshake ──→ describe each device ──→ Session
//!      │                           │
//!      └─ provenance none          └─ transport/auth failure
//!         → NoCredential              → Unreachable
//! ```
//!
//! The whole handshake runs under one timeout and can be cancelled. A session
//! is read-only after construction and cheap to clone, so concurrent requests
//! can share it.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::backend::BackendDescriptor;
use crate::cancel::CancelToken;
use crate::credential::Credential;
use crate::error::{ConnectError, ConnectResult};
use crate::target::BasisGates;
use crate::transport::{Handshake, RemoteBackendInfo, Transport};

pub(crate) struct SessionInner {
    id: Uuid,
    provider: String,
    credential: Credential,
    transport: Arc<dyn Transport>,
    backends: Vec<BackendDescriptor>,
}

/// An authenticated connection to a remote provider.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    pub(crate) fn from_inner(inner: Arc<SessionInner>) -> Self {
        Self { inner }
    }

    /// Unique identifier of this session.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Provider name reported by the handshake.
    pub fn provider(&self) -> &str {
        &self.inner.provider
    }

    /// Backends discovered at connect time, in provider order.
    pub fn backends(&self) -> &[BackendDescriptor] {
        &self.inner.backends
    }

    /// Look up a backend by name.
    pub fn backend(&self, name: &str) -> Option<&BackendDescriptor> {
        self.inner.backends.iter().find(|b| b.name == name)
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.inner.transport
    }

    pub(crate) fn token(&self) -> &str {
        // connect() only builds sessions from usable credentials.
        self.inner.credential.token().unwrap_or_default()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.inner.id)
            .field("provider", &self.inner.provider)
            .field("credential", &self.inner.credential)
            .field("backends", &self.inner.backends.len())
            .finish()
    }
}

/// Backends listed by the session, in provider order. May be empty.
pub fn list_backends(session: &Session) -> &[BackendDescriptor] {
    session.backends()
}

/// Open a session against the provider behind `transport`.
///
/// A credential with provenance `none` fails fast with
/// [`ConnectError::NoCredential`] before the transport is touched.
#[instrument(skip_all, fields(provenance = %credential.provenance()))]
pub async fn connect(
    credential: &Credential,
    transport: Arc<dyn Transport>,
    timeout: Duration,
    cancel: &CancelToken,
) -> ConnectResult<Session> {
    let Some(token) = credential.token() else {
        debug!("no credential, skipping handshake");
        return Err(ConnectError::NoCredential);
    };
    if cancel.is_cancelled() {
        return Err(ConnectError::Cancelled);
    }

    let (handshake, infos) = tokio::select! {
        res = tokio::time::timeout(timeout, discover(transport.as_ref(), token)) => match res {
            Ok(discovered) => discovered?,
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "handshake timed out");
                return Err(ConnectError::Timeout { timeout_ms: timeout.as_millis() as u64 });
            }
        },
        () = cancel.cancelled() => return Err(ConnectError::Cancelled),
    };

    let id = Uuid::new_v4();
    let inner = Arc::new_cyclic(|owner| SessionInner {
        id,
        provider: handshake.provider,
        credential: credential.clone(),
        transport,
        backends: infos
            .into_iter()
            .map(|info| BackendDescriptor {
                name: info.name,
                num_qubits: info.num_qubits,
                status: info.status,
                basis_gates: BasisGates::from_names(info.basis_gates),
                simulator: info.simulator,
                max_shots: info.max_shots,
                queue_length: info.queue_length,
                session_id: id,
                owner: owner.clone(),
            })
            .collect(),
    });

    info!(
        session = %id,
        provider = %inner.provider,
        backends = inner.backends.len(),
        "connected"
    );
    Ok(Session { inner })
}

async fn discover(
    transport: &dyn Transport,
    token: &str,
) -> ConnectResult<(Handshake, Vec<RemoteBackendInfo>)> {
    let handshake = transport
        .handshake(token)
        .await
        .map_err(|e| ConnectError::Unreachable(e.to_string()))?;

    debug!(devices = handshake.devices.len(), "handshake complete");

    let described = join_all(
        handshake
            .devices
            .iter()
            .map(|name| transport.describe_backend(token, name)),
    )
    .await;

    let mut infos: Vec<RemoteBackendInfo> = Vec::with_capacity(described.len());
    for (name, result) in handshake.devices.iter().zip(described) {
        match result {
            Ok(info) if info.num_qubits == 0 => {
                warn!(backend = %name, "skipping backend reporting zero qubits");
            }
            Ok(info) if infos.iter().any(|known| known.name == info.name) => {
                warn!(backend = %name, "skipping duplicate backend name");
            }
            Ok(info) => infos.push(info),
            Err(e) => {
                warn!(backend = %name, error = %e, "skipping backend that could not be described");
            }
        }
    }

    Ok((handshake, infos))
}
