//! Upload error taxonomy and remote error-body extraction.

use thiserror::Error;

/// Why an upload attempt failed. All variants normalize to a display string
/// attached to the failing job record.
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    /// Network/transport failure before a usable response.
    #[error("{0}")]
    Transport(String),
    /// Server responded with an error.
    #[error("{message}")]
    Remote { status: u32, message: String },
    /// No specific cause could be extracted.
    #[error("upload failed")]
    Unknown,
}

impl From<curl::Error> for UploadError {
    fn from(e: curl::Error) -> Self {
        UploadError::Transport(e.to_string())
    }
}

impl From<curl::FormError> for UploadError {
    fn from(e: curl::FormError) -> Self {
        UploadError::Transport(e.to_string())
    }
}

/// Extracts the most specific cause from an error response, with the
/// fallback chain: structured `error` field, then `message` field, then the
/// HTTP status, then the generic failure.
pub(crate) fn classify_response(status: u32, body: &[u8]) -> UploadError {
    if let Ok(v) = serde_json::from_slice::<serde_json::Value>(body) {
        for field in ["error", "message"] {
            if let Some(msg) = v.get(field).and_then(|m| m.as_str()) {
                if !msg.is_empty() {
                    return UploadError::Remote {
                        status,
                        message: msg.to_string(),
                    };
                }
            }
        }
    }
    if status > 0 {
        return UploadError::Remote {
            status,
            message: format!("server returned HTTP {}", status),
        };
    }
    UploadError::Unknown
}
