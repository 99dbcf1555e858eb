//! IBM Quantum transport for qbridge.
//!
//! [`IbmTransport`] implements [`qbridge_hal::Transport`] against the IBM
//! Quantum Platform REST API: the handshake lists devices, discovery reads
//! each device's configuration and status, and jobs are submitted to the
//! Sampler V2 primitive as OpenQASM 3.
//!
//! A bare access token talks to the legacy endpoint. With an IBM Cloud
//! Service-CRN, [`IbmTransport::cloud`] treats the token as an API key,
//! exchanges it through IAM and sends the CRN with every request.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use qbridge_adapter_ibm::IbmTransport;
//! use qbridge_hal::{CancelToken, CredentialResolver, connect};
//!
//! let credential = CredentialResolver::standard("IBM_QUANTUM_TOKEN", ".env", "IBM_QUANTUM_TOKEN").resolve();
//! let transport = Arc::new(IbmTransport::new()?);
//! let session = connect(&credential, transport, Duration::from_secs(10), &CancelToken::new()).await?;
//! for backend in session.backends() {
//!     println!("{} ({} qubits)", backend.name, backend.num_qubits);
//! }
//! ```

pub mod api;
pub mod error;
mod transport;

pub use api::{CLOUD_ENDPOINT, DEFAULT_ENDPOINT, IbmClient, LEGACY_ENDPOINT};
pub use error::{IbmError, IbmResult};
pub use transport::{IbmTransport, PROVIDER};
