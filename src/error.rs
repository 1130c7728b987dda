use std::time::Duration;

/// Errors surfaced by the menu analysis flow.
#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    #[error("Invalid image encoding: {0}")]
    InvalidImageEncoding(String),

    #[error("Missing form field: {0}")]
    MissingField(&'static str),

    #[error("Vision service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Vision service did not answer within {}s", .0.as_secs())]
    UpstreamTimeout(Duration),

    /// Carries the identifier that was looked up.
    #[error("Analysis not found")]
    AnalysisNotFound(String),

    #[error("No drinks found in this menu")]
    NoDrinksAvailable(String),

    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),
}

impl From<anyhow::Error> for MenuError {
    fn from(err: anyhow::Error) -> Self {
        MenuError::Storage(err)
    }
}

impl MenuError {
    pub fn status_code(&self) -> u16 {
        match self {
            MenuError::InvalidImageEncoding(_) => 400,
            MenuError::MissingField(_) => 422,
            MenuError::AnalysisNotFound(_) | MenuError::NoDrinksAvailable(_) => 404,
            MenuError::UpstreamUnavailable(_) => 502,
            MenuError::UpstreamTimeout(_) => 504,
            MenuError::Storage(_) => 500,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            MenuError::InvalidImageEncoding(_) => "INVALID_IMAGE_ENCODING",
            MenuError::MissingField(_) => "MISSING_FIELD",
            MenuError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            MenuError::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            MenuError::AnalysisNotFound(_) => "ANALYSIS_NOT_FOUND",
            MenuError::NoDrinksAvailable(_) => "NO_DRINKS_AVAILABLE",
            MenuError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Human readable message for the response body.
    pub fn detail(&self) -> String {
        match self {
            MenuError::UpstreamUnavailable(_) | MenuError::UpstreamTimeout(_) => {
                format!("Error analyzing menu: {}", self)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(feature = "http-server")]
impl axum::response::IntoResponse for MenuError {
    fn into_response(self) -> axum::response::Response {
        let status = axum::http::StatusCode::from_u16(self.status_code())
            .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            log::error!("❌ {} ({}): {:#}", self.code(), status, self);
        } else {
            log::info!("⚠️ {} ({}): {}", self.code(), status, self);
        }

        let body = serde_json::json!({
            "detail": self.detail(),
            "code": self.code(),
        });

        (status, axum::Json(body)).into_response()
    }
}
