//! IBM Quantum Platform REST client.
//!
//! Covers the calls the directory client and remote executor need:
//! - Listing devices and fetching per-device configuration and status
//! - Submitting Sampler V2 jobs with OpenQASM 3 circuits
//! - Polling job status, fetching results and cancelling
//!
//! Two authentication modes are supported. Against the legacy endpoint
//! (`api.quantum-computing.ibm.com`) the access token is sent directly as
//! the bearer. Against the IBM Cloud API (`quantum.cloud.ibm.com/api`) the
//! token is an IBM Cloud API key: it is exchanged for an IAM bearer token
//! and every request carries the instance's `Service-CRN`.
//!
//! The client holds no credentials of its own; every call takes the token.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IbmError, IbmResult};

/// Legacy IBM Quantum API endpoint, authenticated with a bare token.
pub const LEGACY_ENDPOINT: &str = "https://api.quantum-computing.ibm.com";

/// IBM Quantum Cloud API endpoint, authenticated via IAM and Service-CRN.
pub const CLOUD_ENDPOINT: &str = "https://quantum.cloud.ibm.com/api";

/// Endpoint used for a bare access token.
pub const DEFAULT_ENDPOINT: &str = LEGACY_ENDPOINT;

/// IBM Cloud IAM token endpoint.
pub const IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// IBM API version header value.
const IBM_API_VERSION: &str = "2025-05-01";

/// User-Agent sent with requests (Cloudflare blocks the default reqwest UA).
const USER_AGENT: &str = concat!("qbridge/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// IAM bearers are refreshed this long before they expire.
const IAM_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Assumed IAM bearer lifetime when the response omits `expires_in`.
const IAM_DEFAULT_LIFETIME: Duration = Duration::from_secs(3600);

/// IBM Quantum API client.
pub struct IbmClient {
    client: Client,
    endpoint: String,
    cloud: Option<CloudAuth>,
}

/// Cloud API authentication: the instance CRN and the cached IAM bearer.
struct CloudAuth {
    service_crn: header::HeaderValue,
    iam_url: String,
    bearer: Mutex<Option<IamBearer>>,
}

/// An IAM bearer and the API key it was exchanged for.
struct IamBearer {
    api_key: String,
    access_token: String,
    expires_at: Instant,
}

impl fmt::Debug for IbmClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IbmClient")
            .field("endpoint", &self.endpoint)
            .field("cloud_api", &self.cloud.is_some())
            .finish_non_exhaustive()
    }
}

/// IAM token response from `iam.cloud.ibm.com`.
#[derive(Debug, Deserialize)]
struct IamTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl IbmClient {
    /// Client for `endpoint` that sends the access token directly as the
    /// bearer (no trailing slash needed).
    pub fn new(endpoint: impl Into<String>) -> IbmResult<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::HeaderName::from_static("ibm-api-version"),
            header::HeaderValue::from_static(IBM_API_VERSION),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            cloud: None,
        })
    }

    /// Client for the IBM Cloud API at `endpoint`.
    ///
    /// The access token passed to each call is treated as an IBM Cloud API
    /// key and exchanged for an IAM bearer; `service_crn` is sent with
    /// every request.
    pub fn cloud(endpoint: impl Into<String>, service_crn: &str) -> IbmResult<Self> {
        let service_crn = header::HeaderValue::from_str(service_crn.trim())
            .map_err(|_| IbmError::InvalidServiceCrn)?;
        if service_crn.is_empty() {
            return Err(IbmError::InvalidServiceCrn);
        }
        let mut client = Self::new(endpoint)?;
        client.cloud = Some(CloudAuth {
            service_crn,
            iam_url: IAM_TOKEN_URL.to_string(),
            bearer: Mutex::new(None),
        });
        Ok(client)
    }

    /// Use a different IAM token URL (cloud mode only).
    pub fn with_iam_url(mut self, url: impl Into<String>) -> Self {
        if let Some(cloud) = &mut self.cloud {
            cloud.iam_url = url.into();
        }
        self
    }

    /// The API base URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether requests go through the IAM exchange and carry a Service-CRN.
    pub fn is_cloud_api(&self) -> bool {
        self.cloud.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    /// The bearer to send for `token`.
    async fn bearer(&self, token: &str) -> IbmResult<String> {
        let Some(cloud) = &self.cloud else {
            return Ok(token.to_string());
        };

        {
            let cached = cloud.bearer.lock().unwrap_or_else(PoisonError::into_inner);
            let fresh = cached.as_ref().filter(|b| {
                b.api_key == token && b.expires_at > Instant::now() + IAM_EXPIRY_MARGIN
            });
            if let Some(bearer) = fresh {
                return Ok(bearer.access_token.clone());
            }
        }

        let response = self.iam_request(&cloud.iam_url, token).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "no body".to_string());
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    IbmError::Unauthorized(api_message(&body))
                }
                _ => IbmError::IamTokenExchange(format!("IAM returned {status}: {body}")),
            });
        }
        let iam: IamTokenResponse = response
            .json()
            .await
            .map_err(|e| IbmError::IamTokenExchange(format!("failed to parse IAM response: {e}")))?;
        debug!("exchanged API key for IAM bearer");

        let lifetime = iam
            .expires_in
            .map_or(IAM_DEFAULT_LIFETIME, Duration::from_secs);
        let access_token = iam.access_token;
        cloud.store(token, &access_token, Instant::now() + lifetime);
        Ok(access_token)
    }

    /// The IAM API-key exchange request.
    fn iam_request(&self, iam_url: &str, api_key: &str) -> RequestBuilder {
        self.client.post(iam_url).form(&[
            ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
            ("apikey", api_key),
        ])
    }

    /// Attach the bearer and, in cloud mode, the Service-CRN.
    fn authorize(&self, request: RequestBuilder, bearer: &str) -> IbmResult<RequestBuilder> {
        let auth = header::HeaderValue::from_str(&format!("Bearer {bearer}"))
            .map_err(|_| IbmError::InvalidToken)?;
        let request = request.header(header::AUTHORIZATION, auth);
        Ok(match &self.cloud {
            Some(cloud) => request.header(
                header::HeaderName::from_static("service-crn"),
                cloud.service_crn.clone(),
            ),
            None => request,
        })
    }

    /// Authenticate and send.
    async fn send(&self, request: RequestBuilder, token: &str) -> IbmResult<Response> {
        // Header-unsafe tokens fail before any exchange.
        header::HeaderValue::from_str(token).map_err(|_| IbmError::InvalidToken)?;
        let bearer = self.bearer(token).await?;
        Ok(self.authorize(request, &bearer)?.send().await?)
    }

    /// List device names visible to the token.
    pub async fn list_devices(&self, token: &str) -> IbmResult<Vec<String>> {
        let response = self.send(self.client.get(self.url("/v1/backends")), token).await?;
        let devices: DevicesResponse = check(response, "backends").await?.json().await?;
        Ok(devices.devices.into_iter().map(DeviceEntry::into_name).collect())
    }

    /// Fetch a backend's static configuration.
    pub async fn backend_configuration(
        &self,
        token: &str,
        name: &str,
    ) -> IbmResult<BackendConfigResponse> {
        let url = self.url(&format!("/v1/backends/{name}/configuration"));
        let response = self.send(self.client.get(url), token).await?;
        Ok(check(response, name).await?.json().await?)
    }

    /// Fetch a backend's operational status.
    pub async fn backend_status(&self, token: &str, name: &str) -> IbmResult<BackendStatusResponse> {
        let url = self.url(&format!("/v1/backends/{name}/status"));
        let response = self.send(self.client.get(url), token).await?;
        Ok(check(response, name).await?.json().await?)
    }

    /// Submit one OpenQASM 3 circuit to the Sampler V2 primitive.
    pub async fn submit_sampler_job(
        &self,
        token: &str,
        backend: &str,
        qasm: String,
        shots: u32,
    ) -> IbmResult<SubmitResponse> {
        let body = SamplerJobRequest::new(backend, qasm, shots);
        let response = self
            .send(self.client.post(self.url("/v1/jobs")).json(&body), token)
            .await?;
        Ok(check(response, backend).await?.json().await?)
    }

    /// Get job status.
    pub async fn get_job_status(&self, token: &str, job_id: &str) -> IbmResult<JobStatusResponse> {
        let url = self.url(&format!("/v1/jobs/{job_id}"));
        let response = self.send(self.client.get(url), token).await?;
        Ok(check(response, job_id).await?.json().await?)
    }

    /// Get job results.
    pub async fn get_job_results(&self, token: &str, job_id: &str) -> IbmResult<JobResultResponse> {
        let url = self.url(&format!("/v1/jobs/{job_id}/results"));
        let response = self.send(self.client.get(url), token).await?;
        Ok(check(response, job_id).await?.json().await?)
    }

    /// Cancel a job.
    pub async fn cancel_job(&self, token: &str, job_id: &str) -> IbmResult<()> {
        let url = self.url(&format!("/v1/jobs/{job_id}/cancel"));
        let response = self.send(self.client.post(url), token).await?;
        check(response, job_id).await?;
        Ok(())
    }
}

/// Map non-success statuses to errors; `what` names the addressed resource.
async fn check(response: Response, what: &str) -> IbmResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "no body".to_string());
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => IbmError::Unauthorized(body),
        StatusCode::NOT_FOUND => IbmError::NotFound(what.to_string()),
        _ => IbmError::ApiError {
            status: status.as_u16(),
            message: api_message(&body),
        },
    })
}

/// Pull the message out of an error body, or use the body verbatim.
fn api_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .and_then(|e| e.message.or_else(|| e.errors.into_iter().find_map(|d| d.message)))
        .unwrap_or_else(|| body.to_string())
}

impl CloudAuth {
    fn store(&self, api_key: &str, access_token: &str, expires_at: Instant) {
        *self.bearer.lock().unwrap_or_else(PoisonError::into_inner) = Some(IamBearer {
            api_key: api_key.to_string(),
            access_token: access_token.to_string(),
            expires_at,
        });
    }
}

// ============================================================================
// Request types
// ============================================================================

/// Sampler job request.
#[derive(Debug, Serialize)]
struct SamplerJobRequest {
    program_id: &'static str,
    backend: String,
    params: SamplerParams,
}

/// Sampler V2 parameters.
#[derive(Debug, Serialize)]
struct SamplerParams {
    version: u8,
    /// PUBs: (circuit, parameter values, shots).
    pubs: Vec<(String, serde_json::Map<String, serde_json::Value>, u32)>,
    options: SamplerOptions,
}

#[derive(Debug, Serialize)]
struct SamplerOptions {
    /// Basis translation is already done; level 1 lets IBM handle routing.
    optimization_level: u8,
}

impl SamplerJobRequest {
    fn new(backend: &str, qasm: String, shots: u32) -> Self {
        Self {
            program_id: "sampler",
            backend: backend.to_string(),
            params: SamplerParams {
                version: 2,
                pubs: vec![(qasm, serde_json::Map::new(), shots)],
                options: SamplerOptions {
                    optimization_level: 1,
                },
            },
        }
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Device list response (`{"devices": [...]}`, `{"backends": [...]}` on legacy).
#[derive(Debug, Deserialize)]
struct DevicesResponse {
    #[serde(alias = "backends")]
    devices: Vec<DeviceEntry>,
}

/// A device is listed either by bare name or as an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DeviceEntry {
    Name(String),
    Object { name: String },
}

impl DeviceEntry {
    fn into_name(self) -> String {
        match self {
            DeviceEntry::Name(name) | DeviceEntry::Object { name } => name,
        }
    }
}

/// Backend configuration from `/backends/{name}/configuration`.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfigResponse {
    /// Backend name.
    pub backend_name: String,
    /// Number of qubits.
    pub n_qubits: u32,
    /// Native gate names.
    #[serde(default)]
    pub basis_gates: Vec<String>,
    /// Whether this is a simulator.
    #[serde(default)]
    pub simulator: bool,
    /// Shot limit.
    #[serde(default)]
    pub max_shots: Option<u32>,
}

/// Backend status from `/backends/{name}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendStatusResponse {
    /// Whether the backend is operational.
    pub state: bool,
    /// Status string (e.g., "active").
    #[serde(default)]
    pub status: String,
    /// Pending jobs.
    #[serde(default)]
    pub length_queue: u64,
}

/// Job submission response.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Job ID.
    pub id: String,
}

/// Job status response.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    /// Job ID.
    pub id: String,
    /// Job status; casing varies between API versions.
    pub status: String,
    /// State object carrying the failure reason.
    #[serde(default)]
    pub state: Option<JobState>,
}

/// Job state with reason.
#[derive(Debug, Clone, Deserialize)]
pub struct JobState {
    /// Reason for failure or cancellation.
    #[serde(default)]
    pub reason: Option<String>,
}

impl JobStatusResponse {
    /// Failure reason, if the API gave one.
    pub fn reason(&self) -> Option<&str> {
        self.state.as_ref().and_then(|s| s.reason.as_deref())
    }
}

/// Job result response.
#[derive(Debug, Deserialize)]
pub struct JobResultResponse {
    /// One entry per submitted circuit.
    pub results: Vec<SamplerResult>,
}

/// Sampler result for one circuit.
#[derive(Debug, Deserialize)]
pub struct SamplerResult {
    /// Per-register shot samples (Sampler V2).
    #[serde(default)]
    pub data: Option<HashMap<String, ClassicalRegisterData>>,
    /// Pre-aggregated counts keyed by hex or binary outcome.
    #[serde(default)]
    pub counts: Option<HashMap<String, u64>>,
}

/// Classical register data from V2 Sampler results.
#[derive(Debug, Deserialize)]
pub struct ClassicalRegisterData {
    /// One hex outcome per shot (e.g., `["0x0", "0x3", ...]`).
    pub samples: Vec<String>,
    /// Register width, when reported.
    #[serde(default)]
    pub num_bits: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_request_serialization() {
        let request = SamplerJobRequest::new("ibm_torino", "OPENQASM 3.0;".into(), 1000);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["program_id"], "sampler");
        assert_eq!(json["backend"], "ibm_torino");
        assert_eq!(json["params"]["version"], 2);
        assert_eq!(json["params"]["pubs"][0][0], "OPENQASM 3.0;");
        assert_eq!(json["params"]["pubs"][0][1], serde_json::json!({}));
        assert_eq!(json["params"]["pubs"][0][2], 1000);
    }

    #[test]
    fn test_devices_response_both_shapes() {
        let objects = r#"{"devices": [
            {"name": "ibm_fez", "status": {"name": "online"}},
            {"name": "ibm_torino", "status": {"name": "online"}}
        ]}"#;
        let resp: DevicesResponse = serde_json::from_str(objects).unwrap();
        let names: Vec<String> = resp.devices.into_iter().map(DeviceEntry::into_name).collect();
        assert_eq!(names, vec!["ibm_fez", "ibm_torino"]);

        let bare = r#"{"devices": ["ibm_brisbane"]}"#;
        let resp: DevicesResponse = serde_json::from_str(bare).unwrap();
        assert_eq!(resp.devices.into_iter().next().unwrap().into_name(), "ibm_brisbane");
    }

    #[test]
    fn test_backend_config_response_deserialization() {
        let json = r#"{
            "backend_name": "ibm_torino",
            "n_qubits": 133,
            "basis_gates": ["cz", "id", "rx", "rz", "rzz", "sx", "x"],
            "coupling_map": [[0, 1], [1, 0], [1, 2]],
            "simulator": false
        }"#;
        let config: BackendConfigResponse = serde_json::from_str(json).unwrap();
        assert_eq!(config.backend_name, "ibm_torino");
        assert_eq!(config.n_qubits, 133);
        assert_eq!(config.basis_gates.len(), 7);
        assert!(!config.simulator);
        assert!(config.max_shots.is_none());
    }

    #[test]
    fn test_backend_status_response_deserialization() {
        let json = r#"{"state": true, "status": "active", "message": "ready", "length_queue": 4}"#;
        let status: BackendStatusResponse = serde_json::from_str(json).unwrap();
        assert!(status.state);
        assert_eq!(status.status, "active");
        assert_eq!(status.length_queue, 4);
    }

    #[test]
    fn test_job_status_reason() {
        let json = r#"{"id": "j1", "status": "Failed", "state": {"status": "Failed", "reason": "circuit too deep", "reason_code": 1513}}"#;
        let status: JobStatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(status.reason(), Some("circuit too deep"));

        let json = r#"{"id": "j2", "status": "Queued"}"#;
        let status: JobStatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(status.reason(), None);
    }

    #[test]
    fn test_api_message_extraction() {
        assert_eq!(api_message(r#"{"message": "bad backend"}"#), "bad backend");
        assert_eq!(
            api_message(r#"{"errors": [{"message": "quota exceeded", "code": 3211}]}"#),
            "quota exceeded"
        );
        assert_eq!(api_message("<html>502</html>"), "<html>502</html>");
    }

    #[test]
    fn test_endpoint_trimmed() {
        let client = IbmClient::new("https://example.com/api/").unwrap();
        assert_eq!(client.endpoint(), "https://example.com/api");
        let debug = format!("{client:?}");
        assert!(debug.contains("example.com"));
    }

    const CRN: &str = "crn:v1:bluemix:public:quantum-computing:us-east:a/abc:def::";

    fn header_str<'a>(request: &'a reqwest::Request, name: &str) -> Option<&'a str> {
        request.headers().get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_legacy_mode_sends_token_as_bearer() {
        let client = IbmClient::new(LEGACY_ENDPOINT).unwrap();
        assert!(!client.is_cloud_api());
        let request = client
            .authorize(client.client.get(client.url("/v1/backends")), "raw-token")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(header_str(&request, "authorization"), Some("Bearer raw-token"));
        assert_eq!(header_str(&request, "service-crn"), None);
        assert_eq!(
            request.url().as_str(),
            "https://api.quantum-computing.ibm.com/v1/backends"
        );
    }

    #[tokio::test]
    async fn test_cloud_mode_sends_iam_bearer_and_service_crn() {
        let client = IbmClient::cloud(CLOUD_ENDPOINT, CRN).unwrap();
        assert!(client.is_cloud_api());
        let cloud = client.cloud.as_ref().unwrap();
        cloud.store("api-key", "iam-bearer", Instant::now() + Duration::from_secs(3600));

        let bearer = client.bearer("api-key").await.unwrap();
        assert_eq!(bearer, "iam-bearer");

        let request = client
            .authorize(client.client.get(client.url("/v1/backends")), &bearer)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(header_str(&request, "authorization"), Some("Bearer iam-bearer"));
        assert_eq!(header_str(&request, "service-crn"), Some(CRN));
        assert_eq!(
            request.url().as_str(),
            "https://quantum.cloud.ibm.com/api/v1/backends"
        );
    }

    #[test]
    fn test_iam_request_is_form_encoded() {
        let client = IbmClient::cloud(CLOUD_ENDPOINT, CRN).unwrap();
        let request = client.iam_request(IAM_TOKEN_URL, "my key").build().unwrap();
        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(request.url().as_str(), IAM_TOKEN_URL);
        assert_eq!(
            header_str(&request, "content-type"),
            Some("application/x-www-form-urlencoded")
        );
        let body = std::str::from_utf8(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert!(body.contains("grant_type=urn%3Aibm%3Aparams%3Aoauth%3Agrant-type%3Aapikey"));
        assert!(body.contains("apikey=my+key"));
    }

    #[tokio::test]
    async fn test_expired_or_foreign_bearer_is_not_reused() {
        let client = IbmClient::cloud("http://127.0.0.1:1", CRN)
            .unwrap()
            .with_iam_url("http://127.0.0.1:1/identity/token");
        let cloud = client.cloud.as_ref().unwrap();

        cloud.store("api-key", "stale", Instant::now());
        assert!(matches!(
            client.bearer("api-key").await,
            Err(IbmError::HttpError(_))
        ));

        cloud.store("other-key", "fresh", Instant::now() + Duration::from_secs(3600));
        assert!(client.bearer("api-key").await.is_err());
    }

    #[test]
    fn test_cloud_rejects_unusable_service_crn() {
        assert!(matches!(
            IbmClient::cloud(CLOUD_ENDPOINT, "bad\ncrn"),
            Err(IbmError::InvalidServiceCrn)
        ));
        assert!(matches!(
            IbmClient::cloud(CLOUD_ENDPOINT, "  "),
            Err(IbmError::InvalidServiceCrn)
        ));
    }

    #[test]
    fn test_legacy_backends_shape() {
        let legacy = r#"{"backends": [{"name": "ibm_kyoto", "status": {"operational": true}}]}"#;
        let resp: DevicesResponse = serde_json::from_str(legacy).unwrap();
        assert_eq!(resp.devices.into_iter().next().unwrap().into_name(), "ibm_kyoto");
    }

    #[tokio::test]
    async fn test_invalid_token_rejected_before_sending() {
        let client = IbmClient::new("http://127.0.0.1:1").unwrap();
        let err = client.list_devices("bad\ntoken").await.unwrap_err();
        assert!(matches!(err, IbmError::InvalidToken));
    }
}
