//! Request parameter validation
//!
//! Everything here runs before the first upstream call.

use crate::error::{ApiError, ApiResult};
use serde::Deserialize;

pub const DEFAULT_COUNT: usize = 24;
pub const MIN_COUNT: usize = 1;
pub const MAX_COUNT: usize = 500;

/// `?count=` query; kept as text so bad values get a JSON 400
#[derive(Debug, Default, Deserialize)]
pub struct CountQuery {
    pub count: Option<String>,
}

impl CountQuery {
    pub fn resolve(&self) -> ApiResult<usize> {
        parse_count(self.count.as_deref())
    }
}

/// Absent means [`DEFAULT_COUNT`]; anything outside 1..=500 is rejected
pub fn parse_count(raw: Option<&str>) -> ApiResult<usize> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_COUNT);
    };

    match raw.trim().parse::<usize>() {
        Ok(count) if (MIN_COUNT..=MAX_COUNT).contains(&count) => Ok(count),
        _ => Err(ApiError::BadRequest(format!(
            "count parameter was invalid: {:?} (expected {}..={})",
            raw, MIN_COUNT, MAX_COUNT
        ))),
    }
}

/// Language codes are letter groups joined by single hyphens (`zh-min-nan`)
pub fn is_valid_language_code(code: &str) -> bool {
    !code.is_empty()
        && code
            .split('-')
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_alphabetic()))
}

pub fn validate_language(param: &str, code: &str) -> ApiResult<()> {
    if is_valid_language_code(code) {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("{} parameter was invalid: {:?}", param, code)))
    }
}

/// Reject domains missing from a per-endpoint allow-list
pub fn check_allowed_domain(allowed: &[String], domain: &str) -> ApiResult<()> {
    if allowed.iter().any(|d| d == domain) {
        Ok(())
    } else {
        Err(ApiError::NotEnabled(format!("This endpoint is not enabled for {}", domain)))
    }
}
