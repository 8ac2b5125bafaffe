use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("API returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Build a [`Self::Status`] from a non-2xx response body.
    ///
    /// The detail is pulled from a JSON object's `detail`, `error`, or
    /// `message` field when the body is JSON, falling back to the raw text.
    #[must_use]
    pub fn status(status: u16, body: &str) -> Self {
        let detail = extract_detail(body).unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "no error detail".to_string()
            } else {
                trimmed.to_string()
            }
        });
        Self::Status { status, detail }
    }

    /// HTTP status code, if this is a status error.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    for key in ["detail", "error", "message"] {
        if let Some(detail) = value.get(key).and_then(|v| v.as_str()) {
            return Some(detail.to_string());
        }
    }
    None
}

pub type Result<T> = std::result::Result<T, ApiError>;
