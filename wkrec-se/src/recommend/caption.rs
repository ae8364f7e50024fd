//! Image caption suggestions

use super::Recommender;
use crate::error::{ApiError, ApiResult};
use crate::filter::{retain_valid, LanguagePair, Task};
use crate::sourcing::random_images;
use crate::upstream::types::GlobalUsage;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredCaptions {
    /// language -> caption
    pub captions: BTreeMap<String, String>,
}

/// Image lacking a caption in the target language
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptionSuggestion {
    pub pageid: u64,
    pub ns: i64,
    pub title: String,
    pub mime: String,
    pub structured: StructuredCaptions,
    /// Keyed by the requested target language
    pub globalusage: BTreeMap<String, Vec<GlobalUsage>>,
}

impl Recommender {
    /// Images on `domain` without a `target` caption
    pub async fn caption_addition(&self, domain: &str, target: &str, count: usize) -> ApiResult<Vec<CaptionSuggestion>> {
        self.captions(Task::CaptionAddition, domain, target, None, count).await
    }

    /// Images on `domain` captioned in `source` but not in `target`
    pub async fn caption_translation(
        &self,
        domain: &str,
        source: &str,
        target: &str,
        count: usize,
    ) -> ApiResult<Vec<CaptionSuggestion>> {
        self.captions(Task::CaptionTranslation, domain, target, Some(source), count).await
    }

    async fn captions(
        &self,
        task: Task,
        domain: &str,
        target: &str,
        source: Option<&str>,
        count: usize,
    ) -> ApiResult<Vec<CaptionSuggestion>> {
        let (target_wiki, source_wiki) =
            tokio::join!(self.variants.normalize(target), self.variants.normalize_opt(source));

        let candidates = random_images(self.api.as_ref(), domain, &target_wiki, self.settings.random_batch_size).await?;

        let mut langs = LanguagePair::new(target, target_wiki);
        if let (Some(source), Some(source_wiki)) = (source, source_wiki) {
            langs = langs.with_source(source, source_wiki);
        }
        let validated = retain_valid(&self.resolver, domain, task, &langs, candidates).await?;

        let mut suggestions: Vec<(u64, CaptionSuggestion)> = validated
            .into_iter()
            .map(|v| {
                let captions = v
                    .entity
                    .labels
                    .iter()
                    .map(|(language, caption)| (language.clone(), caption.value.clone()))
                    .collect();
                let image = v.candidate;
                let suggestion = CaptionSuggestion {
                    pageid: image.candidate.page_id,
                    ns: image.ns,
                    title: image.candidate.title,
                    mime: image.mime,
                    structured: StructuredCaptions { captions },
                    globalusage: BTreeMap::from([(target.to_string(), image.global_usage)]),
                };
                (image.candidate.score, suggestion)
            })
            .collect();

        suggestions.sort_by(|a, b| b.0.cmp(&a.0));
        let suggestions: Vec<CaptionSuggestion> = suggestions.into_iter().take(count).map(|(_, s)| s).collect();

        if suggestions.is_empty() {
            return Err(ApiError::NotFound(format!("No images on {} need a {} caption", domain, target)));
        }

        info!(task = ?task, domain = %domain, target = %target, items = suggestions.len(), "Caption suggestions");
        Ok(suggestions)
    }
}
