//! Error types for the IBM Quantum transport.

use qbridge_hal::TransportError;
use thiserror::Error;

/// Result type for IBM operations.
pub type IbmResult<T> = Result<T, IbmError>;

/// Errors that can occur when talking to IBM Quantum.
#[derive(Debug, Error)]
pub enum IbmError {
    /// The token cannot be sent as an HTTP header.
    #[error("Invalid IBM Quantum API token")]
    InvalidToken,

    /// The Service-CRN cannot be sent as an HTTP header.
    #[error("Invalid IBM Cloud Service-CRN")]
    InvalidServiceCrn,

    /// The IAM API-key exchange failed.
    #[error("IAM token exchange failed: {0}")]
    IamTokenExchange(String),

    /// The API rejected the token (401/403).
    #[error("IBM Quantum rejected the token: {0}")]
    Unauthorized(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error status.
    #[error("IBM Quantum API error ({status}): {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// Backend or job not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A result payload had an unexpected shape.
    #[error("Cannot decode result: {0}")]
    Decode(String),
}

impl From<IbmError> for TransportError {
    fn from(e: IbmError) -> Self {
        match e {
            IbmError::InvalidToken => TransportError::Auth(e.to_string()),
            IbmError::Unauthorized(msg) => TransportError::Auth(msg),
            IbmError::InvalidServiceCrn => TransportError::Auth(e.to_string()),
            IbmError::IamTokenExchange(msg) => TransportError::Auth(msg),
            IbmError::HttpError(err) if err.is_decode() => TransportError::Decode(err.to_string()),
            IbmError::HttpError(err) => TransportError::Network(err.to_string()),
            IbmError::ApiError { status, message } => TransportError::Api { status, message },
            IbmError::NotFound(what) => TransportError::NotFound(what),
            IbmError::JsonError(err) => TransportError::Decode(err.to_string()),
            IbmError::Decode(msg) => TransportError::Decode(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = IbmError::ApiError {
            status: 500,
            message: "Something went wrong".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains("Something went wrong"));
    }

    #[test]
    fn test_not_found_display() {
        let err = IbmError::NotFound("job abc123".into());
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn test_token_errors_to_auth() {
        let t: TransportError = IbmError::InvalidToken.into();
        assert!(matches!(t, TransportError::Auth(_)));

        let t: TransportError = IbmError::Unauthorized("expired".into()).into();
        assert_eq!(t, TransportError::Auth("expired".into()));

        let t: TransportError = IbmError::IamTokenExchange("IAM returned 500".into()).into();
        assert_eq!(t, TransportError::Auth("IAM returned 500".into()));
    }

    #[test]
    fn test_api_error_keeps_status() {
        let t: TransportError = IbmError::ApiError {
            status: 429,
            message: "slow down".into(),
        }
        .into();
        assert_eq!(
            t,
            TransportError::Api {
                status: 429,
                message: "slow down".into()
            }
        );
    }

    #[test]
    fn test_decode_errors_to_decode() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let t: TransportError = IbmError::JsonError(json_err).into();
        assert!(matches!(t, TransportError::Decode(_)));

        let t: TransportError = IbmError::Decode("bad sample".into()).into();
        assert!(matches!(t, TransportError::Decode(_)));
    }

    #[test]
    fn test_not_found_to_transport() {
        let t: TransportError = IbmError::NotFound("ibm_kyoto".into()).into();
        assert_eq!(t, TransportError::NotFound("ibm_kyoto".into()));
    }
}
