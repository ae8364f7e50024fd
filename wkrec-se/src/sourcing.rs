//! Candidate sourcing
//!
//! Produces the initial, language-pair independent candidate set for a task.
//! Article candidates come either from the most-viewed list of the source
//! wiki or from a similarity search around a seed title; caption and
//! description candidates come from random batches. Every path emits the
//! same [`Candidate`] shape.
//!
//! Exclusions that do not depend on the target language (namespace, title
//! separators, list pages, disambiguation pages, missing structured-data
//! linkage) are applied here, before any language-pair filtering.

use crate::entity::EntityResolver;
use crate::language::wiki_db_name;
use crate::upstream::types::{FilePage, GlobalUsage, Page, QueryResponse};
use crate::upstream::{get_as, ApiParams, UpstreamResult, WikiApi};
use futures::future::try_join_all;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;
use wkrec_common::entity_id::media_entity_id;

/// Main (article) namespace
pub const NS_MAIN: i64 = 0;
/// File namespace
pub const NS_FILE: i64 = 6;

/// Page size of random candidate batches
pub const RANDOM_BATCH_SIZE: u32 = 50;

/// Days of page views summed into a description candidate's score
pub const PAGEVIEW_DAYS: u32 = 15;

/// One candidate page, alive for a single request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub entity_id: String,
    pub title: String,
    /// Wiki language the page lives on
    pub language: String,
    pub page_id: u64,
    /// Popularity or similarity signal; larger is better
    pub score: u64,
}

/// File candidate for caption tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCandidate {
    pub candidate: Candidate,
    pub ns: i64,
    pub mime: String,
    /// Usages on the target wiki
    pub global_usage: Vec<GlobalUsage>,
}

/// How article candidates are discovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateStrategy {
    /// Most-viewed articles of the source wiki
    Popularity,
    /// Articles similar to a caller-supplied seed title
    SeedSimilarity(String),
}

impl CandidateStrategy {
    /// Blank seeds count as absent
    pub fn from_seed(seed: Option<&str>) -> Self {
        match seed.map(str::trim) {
            Some(seed) if !seed.is_empty() => CandidateStrategy::SeedSimilarity(seed.to_string()),
            _ => CandidateStrategy::Popularity,
        }
    }
}

/// Whether a content page may be recommended as an article at all
pub fn is_article_candidate(page: &Page) -> bool {
    page.ns == NS_MAIN
        && !page.missing
        && page.wikibase_item().is_some()
        && !page.title.contains(':')
        && !is_list_title(&page.title)
        && !page.is_disambiguation()
}

fn is_list_title(title: &str) -> bool {
    title.starts_with("List of ") || title.starts_with("Lists of ")
}

/// Convert pages to candidates, dropping excluded pages and duplicate ids
///
/// Score is the number of wikis carrying the article (`langlinkscount + 1`).
pub fn pages_to_candidates(pages: Vec<Page>, language: &str) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    pages
        .into_iter()
        .filter(is_article_candidate)
        .filter_map(|page| {
            let entity_id = page.wikibase_item()?.to_string();
            if !seen.insert(entity_id.clone()) {
                return None;
            }
            Some(Candidate {
                entity_id,
                score: page.langlinkscount.map(|n| n + 1).unwrap_or(1),
                title: page.title,
                language: language.to_string(),
                page_id: page.pageid,
            })
        })
        .collect()
}

fn article_params() -> ApiParams {
    ApiParams::query()
        .with("prop", "pageprops|langlinkscount")
        .with("ppprop", "wikibase_item|disambiguation")
}

async fn article_candidates(
    api: &dyn WikiApi,
    domain: &str,
    language: &str,
    params: &ApiParams,
) -> UpstreamResult<Vec<Candidate>> {
    let response: QueryResponse = get_as(api, domain, params).await?;
    let pages = response.into_pages();
    let total = pages.len();
    let candidates = pages_to_candidates(pages, language);
    debug!(domain = %domain, pages = total, candidates = candidates.len(), "Article candidates sourced");
    Ok(candidates)
}

/// Popularity strategy: most-viewed articles on `domain`
pub async fn popular_articles(
    api: &dyn WikiApi,
    domain: &str,
    language: &str,
    limit: u32,
) -> UpstreamResult<Vec<Candidate>> {
    let params = article_params()
        .with("generator", "mostviewed")
        .with("gpvimlimit", limit.to_string());
    article_candidates(api, domain, language, &params).await
}

/// Seed stage 1: best-match title for a free-form seed
pub async fn resolve_seed_title(api: &dyn WikiApi, domain: &str, seed: &str) -> UpstreamResult<Option<String>> {
    let params = ApiParams::query()
        .with("generator", "search")
        .with("gsrsearch", seed)
        .with("gsrnamespace", NS_MAIN.to_string())
        .with("gsrlimit", "1");
    let response: QueryResponse = get_as(api, domain, &params).await?;

    let title = response
        .into_pages()
        .into_iter()
        .min_by_key(|page| page.index.unwrap_or(u64::MAX))
        .map(|page| page.title);

    debug!(domain = %domain, seed = %seed, canonical = ?title, "Seed resolved");
    Ok(title)
}

/// Seed stage 2: articles similar to a canonical title
pub async fn similar_articles(
    api: &dyn WikiApi,
    domain: &str,
    language: &str,
    title: &str,
    limit: u32,
) -> UpstreamResult<Vec<Candidate>> {
    let params = article_params()
        .with("generator", "search")
        .with("gsrsearch", format!("morelike:{}", title))
        .with("gsrnamespace", NS_MAIN.to_string())
        .with("gsrlimit", limit.to_string());
    article_candidates(api, domain, language, &params).await
}

/// The seed page itself, if it passes the article exclusions
pub async fn article_by_title(
    api: &dyn WikiApi,
    domain: &str,
    language: &str,
    title: &str,
) -> UpstreamResult<Option<Candidate>> {
    let params = article_params().with("redirects", "1").with("titles", title);
    Ok(article_candidates(api, domain, language, &params).await?.into_iter().next())
}

/// Seed stage 3: put the seed in front of the similar set
///
/// Similarity search never returns the page it was seeded with, but the seed
/// is always a valid candidate for its own entity.
pub fn merge_seed(seed: Option<Candidate>, similar: Vec<Candidate>) -> Vec<Candidate> {
    let Some(seed) = seed else {
        return similar;
    };

    let mut merged = Vec::with_capacity(similar.len() + 1);
    let seed_id = seed.entity_id.clone();
    merged.push(seed);
    merged.extend(similar.into_iter().filter(|c| c.entity_id != seed_id));
    merged
}

/// Run the article strategy end to end
///
/// Returns `None` when a seed was given but no page matches it.
pub async fn source_articles(
    api: &dyn WikiApi,
    domain: &str,
    language: &str,
    strategy: &CandidateStrategy,
    limit: u32,
) -> UpstreamResult<Option<Vec<Candidate>>> {
    match strategy {
        CandidateStrategy::Popularity => Ok(Some(popular_articles(api, domain, language, limit).await?)),
        CandidateStrategy::SeedSimilarity(seed) => {
            let Some(canonical) = resolve_seed_title(api, domain, seed).await? else {
                return Ok(None);
            };
            let (similar, seed_page) = tokio::try_join!(
                similar_articles(api, domain, language, &canonical, limit),
                article_by_title(api, domain, language, &canonical),
            )?;
            Ok(Some(merge_seed(seed_page, similar)))
        }
    }
}

/// Entity ids of articles similar to `seed_id` across `languages`
///
/// Looks up the seed's article in each language, runs one similarity search
/// per language concurrently and returns the distinct ids in first-seen
/// order, excluding the seed itself.
pub async fn similar_entity_ids(
    api: &dyn WikiApi,
    resolver: &EntityResolver,
    project_domain: &str,
    seed_id: &str,
    languages: &[String],
    limit: u32,
) -> UpstreamResult<Vec<String>> {
    let titles = resolver.article_titles(seed_id, languages).await?;

    let searches = titles.iter().map(|(language, title)| {
        let domain = format!("{}.{}", language, project_domain);
        async move { similar_articles(api, &domain, language, title, limit).await }
    });
    let results = try_join_all(searches).await?;

    let mut seen = HashSet::new();
    seen.insert(seed_id.to_string());
    Ok(results
        .into_iter()
        .flatten()
        .map(|candidate| candidate.entity_id)
        .filter(|id| seen.insert(id.clone()))
        .collect())
}

/// Whether a file page is an image (caption tasks)
pub fn is_image(page: &FilePage) -> bool {
    page.ns == NS_FILE && page.mime().map(|m| m.starts_with("image")).unwrap_or(false)
}

/// Convert file pages to media candidates, dropping non-images
pub fn files_to_candidates(pages: Vec<FilePage>, language: &str) -> Vec<MediaCandidate> {
    pages
        .into_iter()
        .filter(is_image)
        .map(|page| {
            let mime = page.mime().unwrap_or_default().to_string();
            MediaCandidate {
                candidate: Candidate {
                    entity_id: media_entity_id(page.pageid),
                    title: page.title,
                    language: language.to_string(),
                    page_id: page.pageid,
                    score: page.globalusage.len() as u64,
                },
                ns: page.ns,
                mime,
                global_usage: page.globalusage,
            }
        })
        .collect()
}

/// Random images on `domain` together with their usage on the target wiki
pub async fn random_images(
    api: &dyn WikiApi,
    domain: &str,
    target_wiki: &str,
    limit: u32,
) -> UpstreamResult<Vec<MediaCandidate>> {
    let params = ApiParams::query()
        .with("generator", "random")
        .with("grnnamespace", NS_FILE.to_string())
        .with("grnlimit", limit.to_string())
        .with("redirects", "1")
        .with("prop", "imageinfo|globalusage")
        .with("iiprop", "timestamp|user|url|mime")
        .with("iiurlwidth", "320")
        .with("iilocalonly", "1")
        .with("gunamespace", NS_MAIN.to_string())
        .with("guprop", "pageid")
        .with("gusite", wiki_db_name(target_wiki));

    let response: QueryResponse<FilePage> = get_as(api, domain, &params).await?;
    let pages = response.into_pages();
    let total = pages.len();
    let candidates = files_to_candidates(pages, target_wiki);
    debug!(domain = %domain, pages = total, images = candidates.len(), "Image candidates sourced");
    Ok(candidates)
}

/// Whether an article lacks a local short description and may get one
pub fn is_description_candidate(page: &Page) -> bool {
    page.ns == NS_MAIN
        && !page.missing
        && page.wikibase_item().is_some()
        && !page.is_disambiguation()
        && page.description.as_deref().map(str::is_empty).unwrap_or(true)
}

/// Random articles on `domain` without a short description
///
/// Score is the page view total over the last [`PAGEVIEW_DAYS`] days.
pub async fn random_articles_missing_description(
    api: &dyn WikiApi,
    domain: &str,
    language: &str,
    limit: u32,
) -> UpstreamResult<Vec<Candidate>> {
    let params = ApiParams::query()
        .with("generator", "random")
        .with("grnnamespace", NS_MAIN.to_string())
        .with("grnlimit", limit.to_string())
        .with("redirects", "1")
        .with("prop", "pageprops|description|pageviews")
        .with("ppprop", "wikibase_item|disambiguation")
        .with("pvipdays", PAGEVIEW_DAYS.to_string());

    let response: QueryResponse = get_as(api, domain, &params).await?;
    let candidates: Vec<Candidate> = response
        .into_pages()
        .into_iter()
        .filter(is_description_candidate)
        .filter_map(|page| {
            Some(Candidate {
                entity_id: page.wikibase_item()?.to_string(),
                score: page.total_pageviews(),
                title: page.title,
                language: language.to_string(),
                page_id: page.pageid,
            })
        })
        .collect();

    debug!(domain = %domain, candidates = candidates.len(), "Description candidates sourced");
    Ok(candidates)
}
