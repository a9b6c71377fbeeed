//! Transport seam between the controller and the network.

use async_trait::async_trait;
use serde_json::Value;

/// HTTP method for an API request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One request against the remote API.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A settled 2xx response: parsed payload plus pagination/count metadata.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub payload: Value,
    /// Raw `Link` header, when the endpoint paginates.
    pub link_header: Option<String>,
    /// Total result count from `X-Total-Count`, when the endpoint reports it.
    pub total: Option<u64>,
}

impl ApiResponse {
    /// Response with a payload and no metadata, as fakes usually need.
    pub fn ok(payload: Value) -> Self {
        Self {
            status: 200,
            payload,
            link_header: None,
            total: None,
        }
    }
}

/// Why a request failed.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The request never reached the server or the connection dropped.
    #[error("request failed: {0}")]
    Network(String),
    /// The server answered with a non-2xx status.
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },
    /// The response body was not the JSON we expected.
    #[error("malformed response: {0}")]
    Parse(String),
}

impl ApiError {
    /// HTTP status for server errors, `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Request-executing collaborator injected into the controller.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}
