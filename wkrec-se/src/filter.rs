//! Task-specific validity filtering
//!
//! Every suggested-edit task shares one skeleton: fetch the structured-data
//! facts for all candidates, optionally look up protection, then keep the
//! candidates the task predicate accepts. Predicates only ever reject more
//! when a fact is added (a label, a sitelink, a description, protection),
//! which lets the protection lookup run on the first-pass survivors only.

use crate::entity::{EntityRequest, EntityResolver};
use crate::language::wiki_db_name;
use crate::sourcing::{Candidate, MediaCandidate};
use crate::upstream::types::Entity;
use crate::upstream::UpstreamResult;
use std::collections::HashSet;
use tracing::debug;

/// Suggested-edit task kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    ArticleCreation,
    CaptionAddition,
    CaptionTranslation,
    DescriptionAddition,
    DescriptionTranslation,
}

/// Requested language codes and the wiki codes they normalize to
///
/// Labels and descriptions are keyed by the requested code; sitelinks are
/// keyed by the wiki.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub target: String,
    pub target_wiki: String,
    pub source: Option<String>,
    pub source_wiki: Option<String>,
}

impl LanguagePair {
    pub fn new(target: impl Into<String>, target_wiki: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            target_wiki: target_wiki.into(),
            source: None,
            source_wiki: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>, source_wiki: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self.source_wiki = Some(source_wiki.into());
        self
    }

    fn languages(&self) -> Vec<String> {
        std::iter::once(self.target.clone()).chain(self.source.clone()).collect()
    }

    fn sites(&self) -> Vec<String> {
        std::iter::once(&self.target_wiki)
            .chain(self.source_wiki.as_ref())
            .map(|wiki| wiki_db_name(wiki))
            .collect()
    }
}

/// What the predicate sees for one candidate
#[derive(Debug, Clone, Copy)]
pub struct EntityFacts<'a> {
    pub entity: &'a Entity,
    pub protected: bool,
    pub disambiguation: bool,
}

impl EntityFacts<'_> {
    fn has_sitelink(&self, wiki: &str) -> bool {
        self.entity.sitelink(&wiki_db_name(wiki)).is_some()
    }

    fn has_label(&self, language: &str) -> bool {
        self.entity.label(language).is_some()
    }

    fn has_description(&self, language: &str) -> bool {
        self.entity.description(language).is_some()
    }
}

impl Task {
    /// Single predicate dispatch for every task
    pub fn accepts(&self, langs: &LanguagePair, facts: &EntityFacts<'_>) -> bool {
        match self {
            Task::ArticleCreation => !facts.has_sitelink(&langs.target_wiki) && !facts.disambiguation,
            Task::CaptionAddition => !facts.has_label(&langs.target),
            Task::CaptionTranslation => match &langs.source {
                Some(source) => facts.has_label(source) && !facts.has_label(&langs.target),
                None => false,
            },
            Task::DescriptionAddition => {
                facts.has_sitelink(&langs.target_wiki)
                    && !facts.has_description(&langs.target)
                    && !facts.protected
            }
            Task::DescriptionTranslation => match (&langs.source, &langs.source_wiki) {
                (Some(source), Some(source_wiki)) => {
                    facts.has_sitelink(source_wiki)
                        && facts.has_sitelink(&langs.target_wiki)
                        && facts.has_description(source)
                        && !facts.has_description(&langs.target)
                        && !facts.protected
                }
                _ => false,
            },
        }
    }

    pub fn checks_protection(&self) -> bool {
        matches!(self, Task::DescriptionAddition | Task::DescriptionTranslation)
    }

    /// Media entities without any captions are reported as missing
    pub fn is_media(&self) -> bool {
        matches!(self, Task::CaptionAddition | Task::CaptionTranslation)
    }

    /// Facts to fetch for this task
    pub fn entity_request(&self, langs: &LanguagePair) -> EntityRequest {
        match self {
            Task::ArticleCreation => EntityRequest {
                props: vec!["sitelinks"],
                languages: Vec::new(),
                sites: langs.sites(),
            },
            Task::CaptionAddition | Task::CaptionTranslation => EntityRequest {
                props: vec!["labels"],
                languages: langs.languages(),
                sites: Vec::new(),
            },
            Task::DescriptionAddition | Task::DescriptionTranslation => EntityRequest {
                props: vec!["labels", "descriptions", "sitelinks"],
                languages: langs.languages(),
                sites: langs.sites(),
            },
        }
    }
}

/// Anything that carries an entity id through the filter
pub trait FilterSubject {
    fn entity_id(&self) -> &str;

    fn is_disambiguation(&self) -> bool {
        false
    }
}

impl FilterSubject for Candidate {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }
}

impl FilterSubject for MediaCandidate {
    fn entity_id(&self) -> &str {
        &self.candidate.entity_id
    }
}

impl FilterSubject for String {
    fn entity_id(&self) -> &str {
        self
    }
}

/// Candidate that passed the filter, with the facts it was judged on
#[derive(Debug, Clone)]
pub struct Validated<C> {
    pub candidate: C,
    pub entity: Entity,
}

/// Keep the candidates `task` accepts, preserving input order
///
/// Duplicate entity ids keep their first occurrence. Entities are fetched
/// from `entity_domain` in resolver-sized chunks. When the task checks
/// protection, the lookup covers only candidates that pass as unprotected;
/// a candidate without exactly one protection record is dropped.
pub async fn retain_valid<C: FilterSubject>(
    resolver: &EntityResolver,
    entity_domain: &str,
    task: Task,
    langs: &LanguagePair,
    candidates: Vec<C>,
) -> UpstreamResult<Vec<Validated<C>>> {
    let mut seen = HashSet::new();
    let candidates: Vec<C> = candidates
        .into_iter()
        .filter(|c| seen.insert(c.entity_id().to_string()))
        .collect();
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<String> = candidates.iter().map(|c| c.entity_id().to_string()).collect();
    let mut entities = resolver
        .fetch_entities(entity_domain, &ids, &task.entity_request(langs))
        .await?;

    let total = candidates.len();
    let survivors: Vec<Validated<C>> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let entity = match entities.remove(candidate.entity_id()) {
                Some(entity) => entity,
                None if task.is_media() => Entity {
                    id: candidate.entity_id().to_string(),
                    ..Entity::default()
                },
                None => {
                    debug!(id = %candidate.entity_id(), "Entity not found, dropping candidate");
                    return None;
                }
            };
            let facts = EntityFacts {
                entity: &entity,
                protected: false,
                disambiguation: candidate.is_disambiguation(),
            };
            task.accepts(langs, &facts)
                .then_some(Validated { candidate, entity })
        })
        .collect();

    debug!(task = ?task, candidates = total, survivors = survivors.len(), "Validity filter first pass");

    if !task.checks_protection() || survivors.is_empty() {
        return Ok(survivors);
    }

    let ids: Vec<String> = survivors.iter().map(|v| v.candidate.entity_id().to_string()).collect();
    let protection = resolver.fetch_entity_protection(&ids).await?;

    let unprotected: Vec<Validated<C>> = survivors
        .into_iter()
        .filter(|validated| {
            let Some(&protected) = protection.get(validated.candidate.entity_id()) else {
                return false;
            };
            let facts = EntityFacts {
                entity: &validated.entity,
                protected,
                disambiguation: validated.candidate.is_disambiguation(),
            };
            task.accepts(langs, &facts)
        })
        .collect();

    debug!(task = ?task, survivors = unprotected.len(), "Protection filter applied");
    Ok(unprotected)
}
