use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

use crate::transport::TransportError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Errors that can occur when talking to the discovery registry.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("api base url is required")]
    MissingBaseUrl,
    #[error("invalid api base url: {0:?}")]
    InvalidBaseUrl(String),
    #[error("build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("invalid {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },
    #[error("marshal request body: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("decode response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("invalid response: missing {0}")]
    MissingResponseField(&'static str),
    #[error("resolver mismatch: expected ens name {expected:?}, got {actual:?}")]
    ResolverMismatch { expected: String, actual: String },
    #[error("resolver mismatch: expected ens node {expected:?}, got {actual:?}")]
    EnsNodeMismatch { expected: String, actual: String },
    #[error("payment verify mismatch: expected ens name {expected:?}, got {actual:?}")]
    VerificationMismatch { expected: String, actual: String },
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Coarse classification of a [`DiscoveryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Client construction failed; nothing was sent.
    Configuration,
    /// Caller input was rejected before any request was issued.
    Validation,
    /// The request body could not be serialized.
    Encoding,
    /// The HTTP exchange itself failed.
    Transport,
    /// The server answered, but not with what the contract promises.
    Protocol,
    /// The server reported a non-2xx status.
    Api,
}

impl DiscoveryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiscoveryError::MissingBaseUrl
            | DiscoveryError::InvalidBaseUrl(_)
            | DiscoveryError::HttpClient(_) => ErrorKind::Configuration,
            DiscoveryError::MissingField { .. } | DiscoveryError::InvalidField { .. } => {
                ErrorKind::Validation
            }
            DiscoveryError::Encode(_) => ErrorKind::Encoding,
            DiscoveryError::Transport(_) => ErrorKind::Transport,
            DiscoveryError::Decode(_)
            | DiscoveryError::MissingResponseField(_)
            | DiscoveryError::ResolverMismatch { .. }
            | DiscoveryError::EnsNodeMismatch { .. }
            | DiscoveryError::VerificationMismatch { .. } => ErrorKind::Protocol,
            DiscoveryError::Api(_) => ErrorKind::Api,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// The structured server error, if this is one.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            DiscoveryError::Api(err) => Some(err),
            _ => None,
        }
    }

    pub(crate) fn missing(field: &'static str) -> Self {
        DiscoveryError::MissingField { field }
    }

    pub(crate) fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        DiscoveryError::InvalidField {
            field,
            value: value.into(),
        }
    }
}

/// A non-2xx answer from the registry.
///
/// Every field except `status` is optional on the wire; the server schema is
/// lenient and so is the decoder.
#[derive(Debug, Clone, Default, PartialEq, Error)]
pub struct ApiError {
    pub status: u16,
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Map<String, Value>,
    /// Trimmed response body, kept for diagnostics.
    pub raw_body: Option<String>,
}

impl ApiError {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present = |value: &Option<String>| value.clone().filter(|s| !s.is_empty());
        write!(f, "request failed ({})", self.status)?;
        match (present(&self.code), present(&self.message), present(&self.raw_body)) {
            (Some(code), Some(message), _) => write!(f, ": {code} - {message}"),
            (_, Some(message), _) => write!(f, ": {message}"),
            (_, None, Some(raw)) => write!(f, ": {raw}"),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<Map<String, Value>>,
}

/// Map a non-2xx status and its raw body into an [`ApiError`].
pub(crate) fn decode_api_error(status: u16, raw: &[u8]) -> ApiError {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return ApiError::new(status);
    }

    let raw_body = Some(trimmed.to_owned());
    match serde_json::from_slice::<ApiErrorEnvelope>(raw) {
        Ok(ApiErrorEnvelope { error: Some(body) }) => ApiError {
            status,
            code: body.code,
            message: body.message,
            details: body.details.unwrap_or_default(),
            raw_body,
        },
        _ => ApiError {
            raw_body,
            ..ApiError::new(status)
        },
    }
}
