//! Ranking store import
//!
//! Loads translation-recommendation predictions into the ranking tables.
//! Two inputs: a language list (one code per line) and per-pair score files
//! (`wikidata_id<TAB>normalized_rank`, one header line).

use sqlx::SqlitePool;
use tracing::{info, warn};
use wkrec_common::db::language_id;
use wkrec_common::entity_id::strip_prefix;
use wkrec_common::{Error, Result};

/// Language codes, first column, blank lines skipped
pub fn parse_languages(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.split('\t').next())
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
        .collect()
}

/// Score rows after the header line
///
/// Ids may be given with or without the item prefix.
pub fn parse_scores(text: &str) -> Result<Vec<(i64, f64)>> {
    let mut rows = Vec::new();

    for (index, line) in text.lines().enumerate().skip(1) {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split('\t');
        let (Some(id), Some(rank)) = (fields.next(), fields.next()) else {
            return Err(Error::InvalidInput(format!("line {}: expected two tab-separated fields", index + 1)));
        };

        let id = strip_prefix(id.trim())
            .map_err(|e| Error::InvalidInput(format!("line {}: {}", index + 1, e)))?;
        let rank: f64 = rank
            .trim()
            .parse()
            .map_err(|_| Error::InvalidInput(format!("line {}: invalid rank {:?}", index + 1, rank)))?;
        rows.push((id, rank));
    }

    Ok(rows)
}

/// Insert language codes; existing codes are kept
pub async fn load_languages(pool: &SqlitePool, codes: &[String]) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for code in codes {
        let result = sqlx::query("INSERT OR IGNORE INTO language (code) VALUES (?)")
            .bind(code)
            .execute(&mut *tx)
            .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    info!(inserted, total = codes.len(), "Languages loaded");
    Ok(inserted)
}

/// Insert score rows for one language pair
///
/// Both languages must already be loaded.
pub async fn load_scores(pool: &SqlitePool, source: &str, target: &str, rows: &[(i64, f64)]) -> Result<u64> {
    let source_id = language_id(pool, source)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No such language: {}", source)))?;
    let target_id = language_id(pool, target)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No such language: {}", target)))?;

    if rows.is_empty() {
        warn!(source = %source, target = %target, "No score rows to load");
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    for (wikidata_id, rank) in rows {
        sqlx::query(
            "INSERT INTO article_recommendation (wikidata_id, normalized_rank, source_id, target_id) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(wikidata_id)
        .bind(rank)
        .bind(source_id)
        .bind(target_id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!(source = %source, target = %target, rows = rows.len(), "Scores loaded");
    Ok(rows.len() as u64)
}
