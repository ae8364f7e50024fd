//! Article creation recommendations (translation and morelike)

use super::{split_domain, Recommender};
use crate::error::{ApiError, ApiResult};
use crate::filter::{retain_valid, LanguagePair, Task};
use crate::rank::{rank_candidates, RankedArticle};
use crate::sourcing::{similar_entity_ids, source_articles, CandidateStrategy};
use serde::Serialize;
use tracing::{debug, info};

/// Article present on the source wiki and missing on the target wiki
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleSuggestion {
    pub wikidata_id: String,
    pub title: String,
    /// Number of wikis carrying the article
    pub sitelink_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleSuggestions {
    pub count: usize,
    pub items: Vec<ArticleSuggestion>,
}

impl Recommender {
    /// Articles to translate from `source` into `target`
    ///
    /// Candidates come from the most-viewed list of the source wiki, or from
    /// a similarity search around `seed`. Results are ordered by sitelink
    /// count, most widespread first, and bounded by `count`.
    pub async fn article_translation(
        &self,
        source: &str,
        target: &str,
        project: &str,
        seed: Option<&str>,
        count: usize,
    ) -> ApiResult<ArticleSuggestions> {
        let (source_wiki, target_wiki) =
            tokio::join!(self.variants.normalize(source), self.variants.normalize(target));

        let strategy = CandidateStrategy::from_seed(seed);
        let limit = match strategy {
            CandidateStrategy::Popularity => self.settings.mostviewed_limit,
            CandidateStrategy::SeedSimilarity(_) => self.settings.morelike_limit,
        };
        let domain = format!("{}.{}", source_wiki, project);

        let candidates = source_articles(self.api.as_ref(), &domain, &source_wiki, &strategy, limit)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("No article on {} matches the seed", domain)))?;

        let langs = LanguagePair::new(target, target_wiki).with_source(source, source_wiki);
        let validated = retain_valid(
            &self.resolver,
            self.resolver.structured_data_domain(),
            Task::ArticleCreation,
            &langs,
            candidates,
        )
        .await?;

        let mut items: Vec<ArticleSuggestion> = validated
            .into_iter()
            .map(|v| ArticleSuggestion {
                wikidata_id: v.candidate.entity_id,
                title: v.candidate.title,
                sitelink_count: v.candidate.score,
            })
            .collect();
        items.sort_by(|a, b| b.sitelink_count.cmp(&a.sitelink_count));
        items.truncate(count);

        if items.is_empty() {
            return Err(ApiError::NotFound(format!(
                "No articles missing on {} found for {}",
                target, source
            )));
        }

        info!(source = %source, target = %target, seeded = seed.is_some(), items = items.len(), "Article translation recommendations");
        Ok(ArticleSuggestions { count: items.len(), items })
    }

    /// Articles similar to `seed` missing on the wiki at `domain`, ranked by
    /// the translation model
    pub async fn article_morelike(&self, domain: &str, seed: &str) -> ApiResult<Vec<RankedArticle>> {
        let (language, project) = split_domain(domain)
            .ok_or_else(|| ApiError::BadRequest(format!("Unsupported domain: {}", domain)))?;

        let sources = match self.settings.translation_models.get(language) {
            Some(sources) if !sources.is_empty() => sources,
            _ => {
                let enabled: Vec<&str> = self.settings.translation_models.keys().map(String::as_str).collect();
                let enabled = if enabled.is_empty() { "none".to_string() } else { enabled.join(", ") };
                return Err(ApiError::NotEnabled(format!(
                    "'morelike' article recommendations are not enabled on this wiki. Currently enabled on: {}.",
                    enabled
                )));
            }
        };

        let seed_id = self
            .resolver
            .resolve_entity_id(domain, seed)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Seed {:?} has no structured-data item", seed)))?;

        let similar = similar_entity_ids(
            self.api.as_ref(),
            &self.resolver,
            project,
            &seed_id,
            sources,
            self.settings.morelike_limit,
        )
        .await?;
        if similar.is_empty() {
            return Err(ApiError::NotFound("Cannot retrieve similar articles to seed".to_string()));
        }

        let target_wiki = self.variants.normalize(language).await;
        let langs = LanguagePair::new(language, target_wiki);
        let missing: Vec<String> = retain_valid(
            &self.resolver,
            self.resolver.structured_data_domain(),
            Task::ArticleCreation,
            &langs,
            similar,
        )
        .await?
        .into_iter()
        .map(|v| v.candidate)
        .collect();
        debug!(seed = %seed_id, missing = missing.len(), "Similar articles missing on target");

        let ranked = rank_candidates(self.store.as_ref(), &missing, language, self.settings.store_retry).await?;
        if ranked.is_empty() {
            return Err(ApiError::NotFound(format!(
                "No ranked recommendations for {} similar to {:?}",
                language, seed
            )));
        }

        info!(domain = %domain, seed = %seed_id, items = ranked.len(), "Morelike recommendations");
        Ok(ranked)
    }
}
