//! Upstream wiki API access
//!
//! The content wikis and the structured-data wiki share one read-only
//! action API transport. The pipeline only ever talks to them through the
//! [`WikiApi`] trait, so tests substitute a canned implementation.

mod http;
pub mod types;

pub use http::HttpWikiApi;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Upstream client errors
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// Connection refused, reset or DNS failure
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the configured timeout
    #[error("Upstream timed out: {0}")]
    Timeout(String),

    /// Non-success HTTP status
    #[error("HTTP {0}: {1}")]
    Status(u16, String),

    /// Well-formed response carrying an API `error` object
    #[error("API error {code}: {info}")]
    Api { code: String, info: String },

    /// Response did not have the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl UpstreamError {
    /// Whether re-issuing the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            UpstreamError::Network(_) | UpstreamError::Timeout(_) => true,
            UpstreamError::Status(code, _) => *code == 429 || *code >= 500,
            UpstreamError::Api { code, .. } => code == "maxlag" || code == "ratelimited",
            UpstreamError::Malformed(_) => false,
        }
    }
}

pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;

/// Parameter bag for one action API request
///
/// Ordered so that requests are deterministic (and comparable in tests).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiParams(BTreeMap<String, String>);

impl ApiParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for `action=query`
    pub fn query() -> Self {
        Self::new().with("action", "query")
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Read-only access to a wiki action API
#[async_trait]
pub trait WikiApi: Send + Sync {
    /// Issue one request against `domain` and return the raw JSON body
    async fn get(&self, domain: &str, params: &ApiParams) -> UpstreamResult<Value>;
}

/// Issue a request and decode the body into `T`
///
/// A body carrying an `error` object becomes [`UpstreamError::Api`]; any
/// other shape mismatch becomes [`UpstreamError::Malformed`].
pub async fn get_as<T: DeserializeOwned>(
    api: &dyn WikiApi,
    domain: &str,
    params: &ApiParams,
) -> UpstreamResult<T> {
    let body = api.get(domain, params).await?;

    if let Some(error) = body.get("error") {
        let code = error
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        let info = error
            .get("info")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        tracing::warn!(domain = %domain, code = %code, info = %info, "Upstream API returned an error");
        return Err(UpstreamError::Api { code, info });
    }

    serde_json::from_value(body).map_err(|e| {
        tracing::warn!(domain = %domain, error = %e, "Unexpected upstream response shape");
        UpstreamError::Malformed(e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Fixed(Value);

    #[async_trait]
    impl WikiApi for Fixed {
        async fn get(&self, _domain: &str, _params: &ApiParams) -> UpstreamResult<Value> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(UpstreamError::Timeout("x".into()).is_transient());
        assert!(UpstreamError::Network("x".into()).is_transient());
        assert!(UpstreamError::Status(503, String::new()).is_transient());
        assert!(UpstreamError::Status(429, String::new()).is_transient());
        assert!(!UpstreamError::Status(404, String::new()).is_transient());
        assert!(!UpstreamError::Malformed("x".into()).is_transient());
        assert!(!UpstreamError::Api { code: "badvalue".into(), info: String::new() }.is_transient());
    }

    #[test]
    fn test_params_are_ordered() {
        let params = ApiParams::query().with("prop", "pageprops").with("titles", "Palov");
        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["action", "prop", "titles"]);
        assert_eq!(params.get("titles"), Some("Palov"));
    }

    #[tokio::test]
    async fn test_get_as_maps_api_error() {
        let api = Fixed(json!({ "error": { "code": "badvalue", "info": "Unrecognized value" } }));
        let result: UpstreamResult<Value> = get_as(&api, "uz.wikipedia.org", &ApiParams::query()).await;
        match result {
            Err(UpstreamError::Api { code, .. }) => assert_eq!(code, "badvalue"),
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_as_maps_shape_mismatch() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Needs {
            required: u32,
        }

        let api = Fixed(json!({ "other": true }));
        let result: UpstreamResult<Needs> = get_as(&api, "uz.wikipedia.org", &ApiParams::query()).await;
        assert!(matches!(result, Err(UpstreamError::Malformed(_))));
    }
}
