//! Short description suggestions

use super::Recommender;
use crate::error::{ApiError, ApiResult};
use crate::filter::{retain_valid, LanguagePair, Task};
use crate::sourcing::random_articles_missing_description;
use crate::upstream::types::Entity;
use serde::Serialize;
use tracing::info;

/// Article whose item lacks a description in the target language
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptionSuggestion {
    pub pageid: u64,
    pub title: String,
    pub wikibase_item: Entity,
}

impl Recommender {
    /// Articles on the `target` wiki whose item has no `target` description
    ///
    /// `domain` is the structured-data wiki holding the descriptions.
    pub async fn description_addition(
        &self,
        domain: &str,
        target: &str,
        count: usize,
    ) -> ApiResult<Vec<DescriptionSuggestion>> {
        self.descriptions(Task::DescriptionAddition, domain, target, None, count).await
    }

    /// Articles whose item is described in `source` but not in `target`
    pub async fn description_translation(
        &self,
        domain: &str,
        source: &str,
        target: &str,
        count: usize,
    ) -> ApiResult<Vec<DescriptionSuggestion>> {
        self.descriptions(Task::DescriptionTranslation, domain, target, Some(source), count).await
    }

    async fn descriptions(
        &self,
        task: Task,
        domain: &str,
        target: &str,
        source: Option<&str>,
        count: usize,
    ) -> ApiResult<Vec<DescriptionSuggestion>> {
        let (target_wiki, source_wiki) =
            tokio::join!(self.variants.normalize(target), self.variants.normalize_opt(source));

        let content_domain = self.content_domain(&target_wiki);
        let candidates = random_articles_missing_description(
            self.api.as_ref(),
            &content_domain,
            &target_wiki,
            self.settings.random_batch_size,
        )
        .await?;

        let mut langs = LanguagePair::new(target, target_wiki);
        if let (Some(source), Some(source_wiki)) = (source, source_wiki) {
            langs = langs.with_source(source, source_wiki);
        }
        let mut validated = retain_valid(&self.resolver, domain, task, &langs, candidates).await?;

        validated.sort_by(|a, b| b.candidate.score.cmp(&a.candidate.score));
        let suggestions: Vec<DescriptionSuggestion> = validated
            .into_iter()
            .take(count)
            .map(|v| DescriptionSuggestion {
                pageid: v.candidate.page_id,
                title: v.candidate.title,
                wikibase_item: v.entity,
            })
            .collect();

        if suggestions.is_empty() {
            return Err(ApiError::NotFound(format!(
                "No articles on {} need a {} description",
                content_domain, target
            )));
        }

        info!(task = ?task, target = %target, items = suggestions.len(), "Description suggestions");
        Ok(suggestions)
    }
}
