use thiserror::Error;

/// Unified error type for the entire exchange-dashboard-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Backend / Network ───────────────────────────────────────────
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({endpoint}): {message}")]
    Api { endpoint: String, message: String },

    #[error("Endpoint not available: {0}")]
    UnavailableEndpoint(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    // ── Payloads ────────────────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Preference storage ──────────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Invalid preferences file: {0}")]
    InvalidFileFormat(String),

    #[error("Unsupported preferences version: {0}")]
    UnsupportedVersion(u16),
}

impl CoreError {
    /// Request failures a tolerant fetch swallows into an absent result.
    #[must_use]
    pub fn is_tolerable(&self) -> bool {
        matches!(
            self,
            CoreError::Network(_)
                | CoreError::Api { .. }
                | CoreError::UnavailableEndpoint(_)
                | CoreError::Auth(_)
                | CoreError::Validation(_)
                | CoreError::Deserialization(_)
        )
    }

    /// Map a non-2xx JSON response onto the error taxonomy.
    /// `message` is the body's `error` field, or the status text when absent.
    pub fn from_status(status: u16, endpoint: &str, message: String) -> Self {
        match status {
            401 | 403 => CoreError::Auth(message),
            400 | 422 => CoreError::Validation(message),
            _ => CoreError::Api {
                endpoint: endpoint.to_string(),
                message,
            },
        }
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest messages embed the full URL; the query carries user_id.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
