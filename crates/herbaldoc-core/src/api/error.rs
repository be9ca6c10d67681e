use serde_json::Value;
use thiserror::Error;

/// Fallback when nothing better is known about a failure
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred. Please try again.";

pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";

pub const TIMEOUT_ERROR_MESSAGE: &str = "Request timeout. Please try again.";

/// Maximum length for error response bodies in log output
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Coarse classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Network,
    Timeout,
    Auth,
    Server,
    Client,
    Unknown,
}

/// A failed request, classified into a user-facing message.
///
/// `Display` yields the message that should be shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Missing or malformed input, detected locally or reported by the server (422).
    #[error("{message}")]
    Validation { status: Option<u16>, message: String },

    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    Timeout(String),

    /// 401/403, or no stored session when one is required.
    #[error("{message}")]
    Auth { status: Option<u16>, message: String },

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("{message}")]
    Client { status: u16, message: String },

    #[error("{0}")]
    Unknown(String),
}

/// The raw facts about a failed call, before classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFailure {
    /// Present when the server answered with an error status
    pub response: Option<FailedResponse>,
    /// The request left the client but no response came back
    pub request_sent: bool,
    pub timed_out: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedResponse {
    pub status: u16,
    pub body: Option<Value>,
}

impl RequestFailure {
    /// Describe a transport-level reqwest failure.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        let timed_out = err.is_timeout();
        Self {
            response: err.status().map(|status| FailedResponse {
                status: status.as_u16(),
                body: None,
            }),
            request_sent: !timed_out && (err.is_connect() || err.is_request()),
            timed_out,
            message: Some(err.to_string()),
        }
    }
}

/// Human-readable message for an HTTP error status.
pub fn status_message(status: u16) -> String {
    match status {
        400 => "Bad request. Please check your input.".to_string(),
        401 => "Unauthorized. Please check your credentials.".to_string(),
        403 => "Access forbidden. You don't have permission.".to_string(),
        404 => "Resource not found.".to_string(),
        409 => "Conflict. Resource already exists.".to_string(),
        422 => "Validation error. Please check your data.".to_string(),
        429 => "Too many requests. Please try again later.".to_string(),
        500 => "Internal server error. Please try again later.".to_string(),
        502 => "Bad gateway. Server is temporarily unavailable.".to_string(),
        503 => "Service unavailable. Please try again later.".to_string(),
        504 => "Gateway timeout. Please try again.".to_string(),
        _ => format!("Server error ({})", status),
    }
}

/// Flatten a server-side validation payload into a single line.
pub fn format_validation_errors(errors: &Value) -> String {
    match errors {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(", "),
        Value::Object(map) => map
            .values()
            .filter(|v| is_truthy(v))
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        _ => "Validation error occurred.".to_string(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Non-empty string field from an error body
fn body_field<'a>(body: Option<&'a Value>, field: &str) -> Option<&'a str> {
    body?
        .get(field)?
        .as_str()
        .filter(|s| !s.is_empty())
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let cut: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
            format!("{}... (truncated, {} total bytes)", cut, body.len())
        }
    }

    /// Classify an error response from its status and raw body.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        tracing::debug!(
            status = status.as_u16(),
            body = %Self::truncate_body(body),
            "Request failed"
        );
        Self::classify(&RequestFailure {
            response: Some(FailedResponse {
                status: status.as_u16(),
                body: serde_json::from_str(body).ok(),
            }),
            ..Default::default()
        })
    }

    /// Classify a failed call.
    ///
    /// The message is chosen in order: the server's `message` field, its
    /// `error` field, the status mapping; then for calls that never got a
    /// response, network failure before timeout; finally the failure's own
    /// message or a generic fallback.
    pub fn classify(failure: &RequestFailure) -> Self {
        if let Some(ref response) = failure.response {
            let body = response.body.as_ref();
            let message = body_field(body, "message")
                .or_else(|| body_field(body, "error"))
                .map(str::to_string)
                .unwrap_or_else(|| status_message(response.status));
            return Self::with_status(response.status, message);
        }

        if failure.request_sent {
            return ApiError::Network(NETWORK_ERROR_MESSAGE.to_string());
        }

        if failure.timed_out {
            return ApiError::Timeout(TIMEOUT_ERROR_MESSAGE.to_string());
        }

        ApiError::Unknown(
            failure
                .message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
        )
    }

    fn with_status(status: u16, message: String) -> Self {
        match status {
            401 | 403 => ApiError::Auth {
                status: Some(status),
                message,
            },
            422 => ApiError::Validation {
                status: Some(status),
                message,
            },
            400..=499 => ApiError::Client { status, message },
            500..=599 => ApiError::Server { status, message },
            _ => ApiError::Unknown(message),
        }
    }

    /// A client-side validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            status: None,
            message: message.into(),
        }
    }

    /// No usable session for a call that needs one.
    pub fn not_authenticated(message: impl Into<String>) -> Self {
        ApiError::Auth {
            status: None,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation { .. } => ErrorKind::Validation,
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::Timeout(_) => ErrorKind::Timeout,
            ApiError::Auth { .. } => ErrorKind::Auth,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Client { .. } => ErrorKind::Client,
            ApiError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// HTTP status of the response, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation { status, .. } | ApiError::Auth { status, .. } => *status,
            ApiError::Server { status, .. } | ApiError::Client { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The user-facing message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Validation { message, .. }
            | ApiError::Auth { message, .. }
            | ApiError::Server { message, .. }
            | ApiError::Client { message, .. } => message,
            ApiError::Network(message) | ApiError::Timeout(message) | ApiError::Unknown(message) => {
                message
            }
        }
    }

    pub fn is_network_error(&self) -> bool {
        self.kind() == ErrorKind::Network
    }

    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }

    /// 401 or 403 from the server
    pub fn is_auth_error(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// The server rejected the session; it has been cleared.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_server_error(&self) -> bool {
        self.status().map(|s| s >= 500).unwrap_or(false)
    }

    pub fn is_client_error(&self) -> bool {
        self.status().map(|s| (400..500).contains(&s)).unwrap_or(false)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ApiError::Unknown(format!("Invalid response from server: {}", err));
        }
        Self::classify(&RequestFailure::from_reqwest(&err))
    }
}
