//! Recommendation services
//!
//! One orchestrator per endpoint family, each composing the same stages:
//! language normalization, candidate sourcing, validity filtering and
//! ranking. Stage errors are classified into [`ApiError`](crate::ApiError)
//! here, before they reach a handler.

mod article;
mod caption;
mod description;

pub use article::{ArticleSuggestion, ArticleSuggestions};
pub use caption::{CaptionSuggestion, StructuredCaptions};
pub use description::DescriptionSuggestion;

use crate::entity::EntityResolver;
use crate::language::LanguageVariants;
use crate::rank::RankingStore;
use crate::retry::RetryPolicy;
use crate::sourcing::RANDOM_BATCH_SIZE;
use crate::upstream::WikiApi;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use wkrec_common::config::TomlConfig;

/// Tunables the orchestrators read on every request
#[derive(Debug, Clone)]
pub struct RecommenderSettings {
    /// Target language -> model source languages
    pub translation_models: BTreeMap<String, Vec<String>>,
    pub mostviewed_limit: u32,
    pub morelike_limit: u32,
    pub random_batch_size: u32,
    /// Suffix of content wiki domains (`{lang}.{project}`)
    pub content_project: String,
    pub store_retry: RetryPolicy,
}

impl RecommenderSettings {
    pub fn from_config(config: &TomlConfig) -> Self {
        Self {
            translation_models: config.article.translation_models.clone(),
            mostviewed_limit: config.article.mostviewed_limit,
            morelike_limit: config.article.morelike_limit,
            random_batch_size: RANDOM_BATCH_SIZE,
            content_project: config.upstream.content_project.clone(),
            store_retry: RetryPolicy::new(
                config.store.retries,
                Duration::from_millis(config.store.retry_delay_ms),
            ),
        }
    }
}

/// Shared, request-independent pipeline state
pub struct Recommender {
    api: Arc<dyn WikiApi>,
    resolver: EntityResolver,
    variants: LanguageVariants,
    store: Arc<dyn RankingStore>,
    settings: RecommenderSettings,
}

impl Recommender {
    pub fn new(api: Arc<dyn WikiApi>, store: Arc<dyn RankingStore>, config: &TomlConfig) -> Self {
        let resolver = EntityResolver::new(
            api.clone(),
            config.upstream.structured_data_domain.clone(),
            config.upstream.entity_batch_limit,
        );
        let variants = LanguageVariants::new(api.clone(), config.upstream.meta_domain.clone());

        Self {
            api,
            resolver,
            variants,
            store,
            settings: RecommenderSettings::from_config(config),
        }
    }

    pub fn variants(&self) -> &LanguageVariants {
        &self.variants
    }

    fn content_domain(&self, wiki_language: &str) -> String {
        format!("{}.{}", wiki_language, self.settings.content_project)
    }
}

/// Split `uz.wikipedia.org` into (`uz`, `wikipedia.org`)
pub fn split_domain(domain: &str) -> Option<(&str, &str)> {
    let (language, project) = domain.split_once('.')?;
    if language.is_empty() || project.is_empty() {
        return None;
    }
    Some((language, project))
}
