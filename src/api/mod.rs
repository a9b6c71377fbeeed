//! HTTP API boundary
//!
//! The controller never reaches a global HTTP client; it talks to an
//! injected [`Transport`]. Production code wires in [`HttpTransport`];
//! tests substitute a scripted fake or a transport pointed at a mock server.
//!
//! - [`transport`] - request/response types, error taxonomy, the trait itself
//! - [`http`] - reqwest-backed transport with bearer auth and metadata capture

mod http;
mod transport;

pub use http::{format_api_error, HttpTransport};
pub use transport::{ApiError, ApiRequest, ApiResponse, Method, Transport};
