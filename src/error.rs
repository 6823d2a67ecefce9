//! Error types for the SDK

use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// SDK error types
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A caller-supplied value was rejected
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No catalog endpoint matched the service filter
    #[error("No endpoint found for service '{service_type}' (interface: {interface}, region: {region})")]
    EndpointNotFound {
        service_type: String,
        interface: String,
        region: String,
    },

    /// The API answered 404
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// HTTP non-2xx status other than 404
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Transport error (network, connection, TLS, etc)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be read or written
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication could not produce a usable token
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The resource does not allow the requested operation
    #[error("Method '{method}' is not supported by resource '{resource}'")]
    MethodNotSupported { resource: String, method: String },

    /// A polled resource entered one of its failure statuses
    #[error("Resource {id} entered failure status '{status}'")]
    ResourceFailure { id: String, status: String },

    /// Polling gave up before the resource reached the expected status
    #[error("Timed out after {seconds}s waiting for {id} to reach '{status}'")]
    Timeout {
        id: String,
        status: String,
        seconds: u64,
    },
}

impl Error {
    /// HTTP status code carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::NotFound(_) => Some(404),
            Error::Http { status, .. } => Some(*status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when the error means the resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// Format an SDK error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
pub fn format_error(error: &Error) -> String {
    match error.status() {
        Some(401) => return "Authentication failed. Check your credentials.".to_string(),
        Some(403) => return "Permission denied. Check your role assignments.".to_string(),
        Some(404) => return "Resource not found.".to_string(),
        Some(409) => {
            return "Resource conflict. The resource may already exist or be in use.".to_string()
        }
        Some(413) | Some(429) => {
            return "Rate limit or quota exceeded. Please try again later.".to_string()
        }
        Some(400) => return "Invalid request. Check your parameters.".to_string(),
        Some(500) | Some(502) | Some(503) => {
            return "Cloud service temporarily unavailable. Please try again.".to_string()
        }
        _ => {}
    }

    let error_str = error.to_string();
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
