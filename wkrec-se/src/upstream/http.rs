//! reqwest-backed action API client
//!
//! Rate-limited with governor, bounded by a per-request timeout, and
//! retrying transient failures with the shared fixed-delay policy.

use super::{ApiParams, UpstreamError, UpstreamResult, WikiApi};
use crate::retry::{retry, RetryPolicy};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use wkrec_common::config::UpstreamConfig;

/// Action API client shared by every request
pub struct HttpWikiApi {
    http_client: reqwest::Client,
    rate_limiter: DefaultDirectRateLimiter,
    scheme: String,
    api_path: String,
    retry_policy: RetryPolicy,
}

impl HttpWikiApi {
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        Ok(Self {
            http_client,
            rate_limiter,
            scheme: config.scheme.clone(),
            api_path: config.api_path.clone(),
            retry_policy: RetryPolicy::new(
                config.retries,
                Duration::from_millis(config.retry_delay_ms),
            ),
        })
    }

    fn endpoint(&self, domain: &str) -> String {
        format!("{}://{}{}", self.scheme, domain, self.api_path)
    }

    async fn get_once(&self, domain: &str, params: &ApiParams) -> UpstreamResult<Value> {
        self.rate_limiter.until_ready().await;

        let url = self.endpoint(domain);
        let mut query: Vec<(&str, &str)> = params.iter().collect();
        query.push(("format", "json"));
        query.push(("formatversion", "2"));

        tracing::debug!(
            url = %url,
            action = params.get("action").unwrap_or_default(),
            "Querying upstream API"
        );

        let response = self
            .http_client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout(format!("{}: {}", domain, e))
                } else {
                    UpstreamError::Network(format!("{}: {}", domain, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status(status.as_u16(), error_text));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| UpstreamError::Malformed(format!("{}: {}", domain, e)))
    }
}

#[async_trait]
impl WikiApi for HttpWikiApi {
    async fn get(&self, domain: &str, params: &ApiParams) -> UpstreamResult<Value> {
        retry("upstream request", self.retry_policy, UpstreamError::is_transient, || {
            self.get_once(domain, params)
        })
        .await
    }
}
