//! Article creation endpoints
//!
//! GET /{domain}/v1/article/creation/translation/{source}[/{seed}]
//! GET /{domain}/v1/article/creation/morelike/{seed}

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::params::{validate_language, CountQuery};
use crate::error::{ApiError, ApiResult};
use crate::rank::RankedArticle;
use crate::recommend::{split_domain, ArticleSuggestions};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TranslationPath {
    pub domain: String,
    pub source: String,
    #[serde(default)]
    pub seed: Option<String>,
}

/// Articles existing in `source` but missing on the wiki at `domain`
pub async fn translation(
    State(state): State<AppState>,
    Path(path): Path<TranslationPath>,
    Query(query): Query<CountQuery>,
) -> ApiResult<Json<ArticleSuggestions>> {
    let count = query.resolve()?;
    validate_language("source", &path.source)?;
    let (target, project) = split_domain(&path.domain)
        .ok_or_else(|| ApiError::BadRequest(format!("Unsupported domain: {}", path.domain)))?;
    validate_language("target", target)?;

    tracing::debug!(domain = %path.domain, source = %path.source, seed = ?path.seed, count, "Article translation request");

    let suggestions = state
        .recommender
        .article_translation(&path.source, target, project, path.seed.as_deref(), count)
        .await?;
    Ok(Json(suggestions))
}

/// Articles similar to `seed` missing on the wiki at `domain`
pub async fn morelike(
    State(state): State<AppState>,
    Path((domain, seed)): Path<(String, String)>,
) -> ApiResult<Json<Vec<RankedArticle>>> {
    let (target, _) =
        split_domain(&domain).ok_or_else(|| ApiError::BadRequest(format!("Unsupported domain: {}", domain)))?;
    validate_language("target", target)?;

    tracing::debug!(domain = %domain, seed = %seed, "Morelike request");
    Ok(Json(state.recommender.article_morelike(&domain, &seed).await?))
}

pub fn article_routes() -> Router<AppState> {
    Router::new()
        .route("/:domain/v1/article/creation/translation/:source", get(translation))
        .route("/:domain/v1/article/creation/translation/:source/:seed", get(translation))
        .route("/:domain/v1/article/creation/morelike/:seed", get(morelike))
}
