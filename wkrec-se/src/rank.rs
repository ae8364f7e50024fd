//! Rank/score join against the ranking store
//!
//! Surviving article candidates are looked up in `article_recommendation`
//! for the target language; the store returns them already ordered by
//! normalized rank and bounded to [`RANKED_RESULT_LIMIT`].

use crate::retry::{retry, RetryPolicy};
use async_trait::async_trait;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, error};
use wkrec_common::entity_id::{display_form, strip_prefix};

/// Maximum rows returned by one ranking query
pub const RANKED_RESULT_LIMIT: u32 = 10;

/// One ranking row as stored
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRow {
    pub wikidata_id: i64,
    pub normalized_rank: f64,
}

/// Read-only access to the ranking table
#[async_trait]
pub trait RankingStore: Send + Sync {
    /// Rows for `ids` ranked for `target`, best first, at most `limit`
    async fn ranked(&self, ids: &[i64], target: &str, limit: u32) -> Result<Vec<RankingRow>, sqlx::Error>;
}

/// sqlx-backed ranking store
pub struct SqliteRankingStore {
    pool: SqlitePool,
}

impl SqliteRankingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RankingStore for SqliteRankingStore {
    async fn ranked(&self, ids: &[i64], target: &str, limit: u32) -> Result<Vec<RankingRow>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT r.wikidata_id, r.normalized_rank
            FROM article_recommendation r
            JOIN language l ON r.target_id = l.id
            WHERE r.wikidata_id IN ({})
              AND l.code = ?
            ORDER BY r.normalized_rank DESC
            LIMIT ?
            "#,
            placeholders
        );

        let mut query = sqlx::query_as::<_, (i64, f64)>(&sql);
        for id in ids {
            query = query.bind(*id);
        }
        let rows = query.bind(target).bind(limit as i64).fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|(wikidata_id, normalized_rank)| RankingRow { wikidata_id, normalized_rank })
            .collect())
    }
}

/// Rank/score join errors
#[derive(Debug, Error)]
pub enum RankError {
    /// Candidate id that does not parse as an item id
    #[error("Bad candidate set: {0}")]
    BadCandidateSet(String),

    /// Store still failing after every retry
    #[error("Ranking store unavailable after {attempts} attempts: {message}")]
    StoreUnavailable { attempts: u32, message: String },
}

/// Ranked article in display form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedArticle {
    pub wikidata_id: String,
    pub normalized_rank: f64,
}

/// Join candidate ids against the store for `target`
///
/// Ids are parsed and deduplicated once; every retry re-issues the identical
/// query. Any malformed id aborts the whole batch.
pub async fn rank_candidates(
    store: &dyn RankingStore,
    ids: &[String],
    target: &str,
    policy: RetryPolicy,
) -> Result<Vec<RankedArticle>, RankError> {
    let mut seen = HashSet::new();
    let mut numeric = Vec::with_capacity(ids.len());
    for id in ids {
        let n = strip_prefix(id).map_err(|e| RankError::BadCandidateSet(e.to_string()))?;
        if seen.insert(n) {
            numeric.push(n);
        }
    }

    if numeric.is_empty() {
        return Ok(Vec::new());
    }

    debug!(candidates = numeric.len(), target = %target, "Joining candidates against ranking store");

    let rows = retry("ranking query", policy, |_: &sqlx::Error| true, || {
        store.ranked(&numeric, target, RANKED_RESULT_LIMIT)
    })
    .await
    .map_err(|e| {
        error!(target = %target, error = %e, "Ranking store unavailable");
        RankError::StoreUnavailable {
            attempts: policy.max_attempts(),
            message: e.to_string(),
        }
    })?;

    Ok(rows
        .into_iter()
        .map(|row| RankedArticle {
            wikidata_id: display_form(row.wikidata_id),
            normalized_rank: row.normalized_rank,
        })
        .collect())
}
