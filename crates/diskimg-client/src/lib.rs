//! Client for the cloud provider's disk image API.
//!
//! This crate provides the [`Transport`] seam with a blocking HTTP
//! implementation, endpoint configuration with optional authentication, the
//! catalog filtering policy, and [`DiskImageClient`], which lists, looks up,
//! resolves, creates, and deletes disk images.

pub mod checksum;
pub mod client;
pub mod config;
pub mod filter;
pub mod http;
pub mod resolve;

pub use client::DiskImageClient;
pub use config::ClientConfig;
pub use filter::{CatalogFilter, RESERVED_FAMILIES};
pub use resolve::{find_by_name, most_recent, resolve};

/// Sent as `User-Agent` on every HTTP request.
pub const USER_AGENT: &str = concat!("diskimg/", env!("CARGO_PKG_VERSION"));

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("unable to find {search}, zero matches")]
    ZeroMatches { search: String },
    #[error("unable to find {search} because there were multiple matches")]
    MultipleMatches { search: String },
    #[error("{what} image not found")]
    NotFound { what: String },
    #[error("config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// True for the lookup failures produced by resolution and selection,
    /// as opposed to transport or decode problems.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            ClientError::ZeroMatches { .. }
                | ClientError::MultipleMatches { .. }
                | ClientError::NotFound { .. }
        )
    }
}

/// A failure below the entity layer, classified from the HTTP exchange.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Connection(String),
    #[error("HTTP {status} for {path}: {reason}")]
    Status {
        status: u16,
        code: Option<String>,
        reason: String,
        path: String,
    },
}

/// Error body the API returns alongside 4xx/5xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

impl TransportError {
    /// Classify an HTTP error response. The provider's `{"code", "reason"}`
    /// body is used when present, otherwise the raw body text.
    pub fn from_response(status: u16, path: &str, body: &[u8]) -> Self {
        let parsed: Option<ApiErrorBody> = serde_json::from_slice(body).ok();
        let (code, reason) = match parsed {
            Some(ApiErrorBody { code, reason }) => {
                let reason = reason
                    .or_else(|| code.clone())
                    .unwrap_or_else(|| format!("status {status}"));
                (code, reason)
            }
            None => {
                let text = String::from_utf8_lossy(body).trim().to_owned();
                let reason = if text.is_empty() {
                    format!("status {status}")
                } else {
                    text
                };
                (None, reason)
            }
        };
        TransportError::Status {
            status,
            code,
            reason,
            path: path.to_owned(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Connection(_) => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            TransportError::Status { code, .. } => code.as_deref(),
            TransportError::Connection(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Raw request/response exchange with the API.
///
/// Paths are relative to the configured endpoint, e.g. `/v2/disk_images`.
/// Implementations return the response body on 2xx and a classified
/// [`TransportError`] otherwise.
pub trait Transport: Send + Sync {
    fn get(&self, path: &str) -> Result<Vec<u8>, TransportError>;

    /// Send `body` as `application/json`.
    fn post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, TransportError>;

    fn delete(&self, path: &str) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        (**self).get(path)
    }

    fn post(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).post(path, body)
    }

    fn delete(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        (**self).delete(path)
    }
}
