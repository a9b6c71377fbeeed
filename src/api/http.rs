//! reqwest-backed transport for the remote JSON API

use super::transport::{ApiError, ApiRequest, ApiResponse, Method, Transport};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and masks potentially sensitive patterns
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..MAX_LOG_BODY_LENGTH],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Pull a human-readable message out of a structured error body.
/// The API wraps errors as `{"detail": "..."}`; fall back to the raw body.
fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(detail) = value.get("detail").and_then(|v| v.as_str()) {
            return detail.to_string();
        }
    }
    sanitize_for_log(body)
}

/// HTTP transport for the hosted application's JSON API
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpTransport {
    /// Create a transport rooted at `base_url`, with an optional bearer token.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("remoteview/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        // A trailing slash keeps Url::join from eating the last path segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).context("Invalid base URL")?;

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    fn build_url(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        // Request paths are API-absolute ("/projects/..."); join them under
        // the configured base, which may itself carry a path prefix.
        let relative = request.path.trim_start_matches('/');
        let mut url = self
            .base_url
            .join(relative)
            .map_err(|e| ApiError::Network(format!("invalid request path: {}", e)))?;

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .query
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str())),
            );
        }

        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.build_url(&request)?;
        tracing::debug!("{} {}", request.method, url);

        let mut builder = match request.method {
            Method::Get => self.client.get(url.clone()),
            Method::Post => self.client.post(url.clone()),
            Method::Put => self.client.put(url.clone()),
            Method::Delete => self.client.delete(url.clone()),
        };

        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        let link_header = response
            .headers()
            .get("link")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let total = response
            .headers()
            .get("x-total-count")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        // Handle empty response (204, DELETE acknowledgements)
        let payload = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body).map_err(|e| ApiError::Parse(e.to_string()))?
        };

        Ok(ApiResponse {
            status: status.as_u16(),
            payload,
            link_header,
            total,
        })
    }
}

/// Format an API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_api_error(error: &ApiError) -> String {
    match error {
        ApiError::Server { status: 401, .. } => {
            "Authentication failed. Check your API token.".to_string()
        }
        ApiError::Server { status: 403, .. } => {
            "Permission denied. Check your account's access.".to_string()
        }
        ApiError::Server { status: 404, .. } => "Resource not found.".to_string(),
        ApiError::Server { status: 429, .. } => {
            "Rate limit exceeded. Please try again later.".to_string()
        }
        ApiError::Server { status, .. } if *status >= 500 => {
            "Service temporarily unavailable. Please try again.".to_string()
        }
        ApiError::Server { status, message } => {
            let sanitized: String = message
                .chars()
                .filter(|c| c.is_ascii_graphic() || *c == ' ')
                .take(80)
                .collect();
            format!("Request failed ({}): {}", status, sanitized)
        }
        ApiError::Network(_) => {
            "Request failed. Check your network connection and try again.".to_string()
        }
        ApiError::Parse(_) => "Received a malformed response from the server.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_keeps_path_prefix() {
        let transport = HttpTransport::new("https://example.com/api/0", None).unwrap();
        let url = transport
            .build_url(&ApiRequest::get("/projects/acme/web/"))
            .unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/0/projects/acme/web/");
    }

    #[test]
    fn query_pairs_are_appended() {
        let transport = HttpTransport::new("https://example.com", None).unwrap();
        let url = transport
            .build_url(
                &ApiRequest::get("/projects/acme/web/files/")
                    .with_query(vec![("query".into(), "foo bar".into())]),
            )
            .unwrap();
        assert_eq!(url.query(), Some("query=foo+bar"));
    }

    #[test]
    fn error_message_prefers_detail_field() {
        assert_eq!(
            error_message(r#"{"detail": "The requested resource does not exist"}"#),
            "The requested resource does not exist"
        );
        assert_eq!(error_message("plain text"), "plain text");
    }

    #[test]
    fn format_api_error_is_generic_for_network_failures() {
        let msg = format_api_error(&ApiError::Network("tcp connect error".into()));
        assert!(!msg.contains("tcp"));
    }
}
