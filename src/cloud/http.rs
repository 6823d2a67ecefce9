//! HTTP utilities for the cloud REST APIs

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Response};
use serde_json::Value;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Header carrying the auth token on every request
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Header carrying the negotiated microversion
pub const API_VERSION_HEADER: &str = "OpenStack-API-Version";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... [truncated, {} bytes total]",
            &body[..end],
            body.len()
        )
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Pull a human readable message out of the error bodies the services return.
///
/// Services answer with either `{"error": {"message": ..}}`,
/// `{"<kind>": {"message": ..}}` or `{"message": ..}`.
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let obj = value.as_object()?;

    if let Some(message) = obj.get("message").and_then(|v| v.as_str()) {
        return Some(message.to_string());
    }

    obj.values()
        .filter_map(|v| v.get("message"))
        .find_map(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Header naming the token being validated
pub const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Request headers for one call: token plus optional microversion
#[derive(Debug, Clone, Default)]
pub struct RequestOptions<'a> {
    pub token: Option<&'a str>,
    /// Token to inspect on identity token calls
    pub subject_token: Option<&'a str>,
    /// `(service_type, api_version)` pair sent as the microversion header
    pub api_version: Option<(&'a str, &'a str)>,
}

/// HTTP client wrapper for cloud API calls
#[derive(Clone)]
pub struct EclHttpClient {
    client: Client,
}

impl EclHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("ecl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Make a GET request
    pub async fn get(&self, url: &str, opts: &RequestOptions<'_>) -> Result<Value> {
        self.request(Method::GET, url, opts, None).await
    }

    /// Make a POST request
    pub async fn post(
        &self,
        url: &str,
        opts: &RequestOptions<'_>,
        body: Option<&Value>,
    ) -> Result<Value> {
        self.request(Method::POST, url, opts, body).await
    }

    /// Make a PUT request
    pub async fn put(
        &self,
        url: &str,
        opts: &RequestOptions<'_>,
        body: Option<&Value>,
    ) -> Result<Value> {
        self.request(Method::PUT, url, opts, body).await
    }

    /// Make a PATCH request
    pub async fn patch(
        &self,
        url: &str,
        opts: &RequestOptions<'_>,
        body: Option<&Value>,
    ) -> Result<Value> {
        self.request(Method::PATCH, url, opts, body).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str, opts: &RequestOptions<'_>) -> Result<Value> {
        self.request(Method::DELETE, url, opts, None).await
    }

    /// Send a request and hand back the raw response after status checking.
    ///
    /// Used by authentication, which needs the response headers.
    pub async fn send_raw(
        &self,
        method: Method,
        url: &str,
        opts: &RequestOptions<'_>,
        body: Option<&Value>,
    ) -> Result<(HeaderMap, Value)> {
        let response = self.send(method, url, opts, body).await?;
        let headers = response.headers().clone();
        let value = Self::read_body(response).await?;
        Ok((headers, value))
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        opts: &RequestOptions<'_>,
        body: Option<&Value>,
    ) -> Result<Value> {
        let response = self.send(method, url, opts, body).await?;
        Self::read_body(response).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        opts: &RequestOptions<'_>,
        body: Option<&Value>,
    ) -> Result<Response> {
        tracing::debug!("{} {}", method, url);

        let mut request = self.client.request(method, url);

        if let Some(token) = opts.token {
            request = request.header(AUTH_TOKEN_HEADER, token);
        }
        if let Some(subject) = opts.subject_token {
            request = request.header(SUBJECT_TOKEN_HEADER, subject);
        }
        if let Some((service_type, api_version)) = opts.api_version {
            request = request.header(
                API_VERSION_HEADER,
                format!("{} {}", service_type, api_version),
            );
        }
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
        tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));

        let message = extract_error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(message));
        }

        Err(Error::Http {
            status: status.as_u16(),
            message,
        })
    }

    async fn read_body(response: Response) -> Result<Value> {
        let body = response.text().await?;

        // Handle empty response (204, 202 without body)
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&body)?)
    }
}
