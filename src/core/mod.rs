pub mod middleware;

use reqwest::StatusCode;
use serde::Deserialize;

/// Classification of a failed operation, driving the degradation policy:
/// permission problems fall back to local state, auth failures are re-raised,
/// everything else degrades to an empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The remote denied access. Recoverable: callers fall back to the
    /// mirror or an empty result instead of surfacing the error.
    PermissionDenied,
    /// Sign-in or registration failed. Always surfaced to the caller.
    Auth,
    /// The AI response did not parse as the requested structured output.
    Parse,
    /// The local mirror held unreadable content; treated as empty.
    StorageCorrupt,
    /// Any other remote failure.
    Other,
}

/// A value together with its provenance: `fallback` is true when the value
/// came from the mirror or a deterministic generator rather than the remote
/// service, so callers and tests can tell degraded data from the real thing.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    pub fallback: bool,
}

impl<T> Fetched<T> {
    pub fn remote(value: T) -> Self {
        Self {
            value,
            fallback: false,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            fallback: true,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

#[derive(Debug, Deserialize)]
pub struct GoogleErrorResponse {
    pub error: GoogleErrorDetails,
}

#[derive(Debug, Deserialize)]
pub struct GoogleErrorDetails {
    pub code: u16,
    pub message: String,
    pub status: Option<String>,
}

/// Classifies a non-success HTTP response body. Google APIs report denied
/// access either as a 401/403 status or as a `PERMISSION_DENIED` status
/// string in the error payload.
pub fn classify(status: StatusCode, body: &str) -> ErrorKind {
    if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
        return ErrorKind::PermissionDenied;
    }
    if let Ok(parsed) = serde_json::from_str::<GoogleErrorResponse>(body) {
        if parsed.error.status.as_deref() == Some("PERMISSION_DENIED") {
            return ErrorKind::PermissionDenied;
        }
    }
    ErrorKind::Other
}
