//! Error types for wkrec-se
//!
//! Stage errors are classified here, at the service boundary. Upstream
//! outages and store outages both map to 503 but keep distinct codes so the
//! two can be told apart in logs and by callers.

use crate::rank::RankError;
use crate::upstream::UpstreamError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Nothing to recommend, or the seed did not resolve (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Wiki API failed or returned an unexpected shape (503)
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Ranking store still failing after retries (503)
    #[error("Ranking store unavailable: {0}")]
    StoreUnavailable(String),

    /// Task not offered for this domain or language (501)
    #[error("Not enabled: {0}")]
    NotEnabled(String),

    /// Candidate set contained a malformed entity id (500)
    #[error("Bad candidate set: {0}")]
    BadCandidateSet(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::UpstreamUnavailable(_) | ApiError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::NotEnabled(_) => StatusCode::NOT_IMPLEMENTED,
            ApiError::BadCandidateSet(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            ApiError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            ApiError::NotEnabled(_) => "NOT_ENABLED",
            ApiError::BadCandidateSet(_) => "BAD_CANDIDATE_SET",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

// Client-facing text for stage failures; the underlying error is only logged.
const UPSTREAM_UNAVAILABLE_MESSAGE: &str = "Upstream temporarily unavailable, try again later";
const STORE_UNAVAILABLE_MESSAGE: &str = "Ranking store temporarily unavailable, try again later";
const BAD_CANDIDATE_SET_MESSAGE: &str = "Internal error while ranking candidates";

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        warn!(error = %err, transient = err.is_transient(), "Upstream request failed");
        ApiError::UpstreamUnavailable(UPSTREAM_UNAVAILABLE_MESSAGE.to_string())
    }
}

impl From<RankError> for ApiError {
    fn from(err: RankError) -> Self {
        match err {
            RankError::BadCandidateSet(msg) => {
                error!(error = %msg, "Malformed entity id reached the ranking join");
                ApiError::BadCandidateSet(BAD_CANDIDATE_SET_MESSAGE.to_string())
            }
            err @ RankError::StoreUnavailable { .. } => {
                warn!(error = %err, "Ranking store unavailable");
                ApiError::StoreUnavailable(STORE_UNAVAILABLE_MESSAGE.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let message = match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::UpstreamUnavailable(msg)
            | ApiError::StoreUnavailable(msg)
            | ApiError::NotEnabled(msg)
            | ApiError::BadCandidateSet(msg)
            | ApiError::Internal(msg) => msg,
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::NotFound(String::new()).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::BadRequest(String::new()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotEnabled(String::new()).status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(
            ApiError::BadCandidateSet(String::new()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_outages_share_status_but_not_code() {
        let upstream = ApiError::from(UpstreamError::Timeout("uz.wikipedia.org".into()));
        let store = ApiError::from(RankError::StoreUnavailable { attempts: 3, message: "pool timed out".into() });

        assert_eq!(upstream.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(store.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_ne!(upstream.code(), store.code());
    }

    #[test]
    fn test_malformed_upstream_is_unavailable_not_not_found() {
        let err = ApiError::from(UpstreamError::Malformed("missing field".into()));
        assert_eq!(err.code(), "UPSTREAM_UNAVAILABLE");
    }

    #[test]
    fn test_stage_error_detail_not_exposed() {
        let upstream = ApiError::from(UpstreamError::Api {
            code: "internal_api_error_DBQueryError".into(),
            info: "SELECT page_id FROM page".into(),
        });
        let store = ApiError::from(RankError::StoreUnavailable {
            attempts: 3,
            message: "error returned from database: unable to open database file".into(),
        });
        let bad_ids = ApiError::from(RankError::BadCandidateSet("Qxyz".into()));

        assert!(matches!(upstream, ApiError::UpstreamUnavailable(ref m) if m == UPSTREAM_UNAVAILABLE_MESSAGE));
        assert!(matches!(store, ApiError::StoreUnavailable(ref m) if m == STORE_UNAVAILABLE_MESSAGE));
        assert!(!bad_ids.to_string().contains("Qxyz"));
    }
}
