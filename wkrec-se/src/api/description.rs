//! Description suggestion endpoints
//!
//! GET /{domain}/v1/description/addition/{target}
//! GET /{domain}/v1/description/translation/from/{source}/to/{target}

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use super::params::{check_allowed_domain, validate_language, CountQuery};
use crate::error::ApiResult;
use crate::recommend::DescriptionSuggestion;
use crate::AppState;

pub async fn addition(
    State(state): State<AppState>,
    Path((domain, target)): Path<(String, String)>,
    Query(query): Query<CountQuery>,
) -> ApiResult<Json<Vec<DescriptionSuggestion>>> {
    let count = query.resolve()?;
    validate_language("target", &target)?;
    check_allowed_domain(&state.config.description_allowed_domains, &domain)?;

    Ok(Json(state.recommender.description_addition(&domain, &target, count).await?))
}

pub async fn translation(
    State(state): State<AppState>,
    Path((domain, source, target)): Path<(String, String, String)>,
    Query(query): Query<CountQuery>,
) -> ApiResult<Json<Vec<DescriptionSuggestion>>> {
    let count = query.resolve()?;
    validate_language("source", &source)?;
    validate_language("target", &target)?;
    check_allowed_domain(&state.config.description_allowed_domains, &domain)?;

    Ok(Json(
        state
            .recommender
            .description_translation(&domain, &source, &target, count)
            .await?,
    ))
}

pub fn description_routes() -> Router<AppState> {
    Router::new()
        .route("/:domain/v1/description/addition/:target", get(addition))
        .route("/:domain/v1/description/translation/from/:source/to/:target", get(translation))
}
