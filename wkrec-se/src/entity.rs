//! Entity resolution
//!
//! Maps page titles to structured-data identifiers and identifiers back to
//! per-language sitelinks, labels and descriptions. Identifier lists longer
//! than the upstream per-request limit are split into chunks that are issued
//! concurrently and merged.

use crate::language::wiki_db_name;
use crate::upstream::types::{EntitiesResponse, Entity, ProtectionPage, QueryResponse};
use crate::upstream::{get_as, ApiParams, UpstreamResult, WikiApi};
use futures::future::try_join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default upstream limit on ids per entity or protection request
pub const ENTITY_BATCH_LIMIT: usize = 50;

/// What to fetch for a set of entities
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityRequest {
    /// `wbgetentities` props, e.g. `labels|descriptions|sitelinks`
    pub props: Vec<&'static str>,
    /// Label/description languages (empty = upstream default, all)
    pub languages: Vec<String>,
    /// Sitelink sites (empty = all)
    pub sites: Vec<String>,
}

impl EntityRequest {
    fn params(&self, ids: &[String]) -> ApiParams {
        let mut params = ApiParams::new()
            .with("action", "wbgetentities")
            .with("props", self.props.join("|"))
            .with("ids", ids.join("|"));
        if !self.languages.is_empty() {
            params = params.with("languages", self.languages.join("|"));
        }
        if !self.sites.is_empty() {
            params = params.with("sitefilter", self.sites.join("|"));
        }
        params
    }
}

/// Sitelinks plus label/description maps for one entity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitelinksAndLabels {
    /// wiki language -> article title
    pub sitelinks: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    pub descriptions: BTreeMap<String, String>,
}

/// Title <-> entity id resolution against the structured-data wiki
pub struct EntityResolver {
    api: Arc<dyn WikiApi>,
    structured_data_domain: String,
    batch_limit: usize,
}

impl EntityResolver {
    pub fn new(api: Arc<dyn WikiApi>, structured_data_domain: impl Into<String>, batch_limit: usize) -> Self {
        Self {
            api,
            structured_data_domain: structured_data_domain.into(),
            batch_limit: batch_limit.max(1),
        }
    }

    pub fn structured_data_domain(&self) -> &str {
        &self.structured_data_domain
    }

    /// Entity id linked to `title` on `domain`
    ///
    /// A missing page or a page without structured-data linkage is `None`,
    /// not an error.
    pub async fn resolve_entity_id(&self, domain: &str, title: &str) -> UpstreamResult<Option<String>> {
        debug!(domain = %domain, title = %title, "Resolving entity id");

        let params = ApiParams::query()
            .with("prop", "pageprops")
            .with("ppprop", "wikibase_item")
            .with("redirects", "1")
            .with("titles", title);
        let response: QueryResponse = get_as(self.api.as_ref(), domain, &params).await?;

        let id = response
            .into_pages()
            .into_iter()
            .find(|page| !page.missing)
            .and_then(|page| page.wikibase_item().map(str::to_string));

        match &id {
            Some(id) => debug!(title = %title, id = %id, "Entity id resolved"),
            None => debug!(domain = %domain, title = %title, "No entity linked to title"),
        }
        Ok(id)
    }

    /// Fetch entities in chunks of at most `batch_limit` ids
    ///
    /// Callers pass distinct ids. Issues exactly `ceil(ids.len() / batch_limit)`
    /// requests, concurrently. Ids the upstream reports as missing are left
    /// out of the result.
    pub async fn fetch_entities(
        &self,
        domain: &str,
        ids: &[String],
        request: &EntityRequest,
    ) -> UpstreamResult<HashMap<String, Entity>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        debug!(
            domain = %domain,
            ids = ids.len(),
            batches = ids.len().div_ceil(self.batch_limit),
            "Fetching entities"
        );

        let batches = ids.chunks(self.batch_limit).map(|chunk| {
            let params = request.params(chunk);
            async move { get_as::<EntitiesResponse>(self.api.as_ref(), domain, &params).await }
        });
        let responses = try_join_all(batches).await?;

        Ok(responses
            .into_iter()
            .flat_map(|response| response.entities)
            .filter(|(_, entity)| !entity.is_missing())
            .collect())
    }

    /// Sitelinks, labels and descriptions of one entity in `languages`
    pub async fn fetch_sitelinks_and_labels(
        &self,
        id: &str,
        languages: &[String],
    ) -> UpstreamResult<SitelinksAndLabels> {
        let request = EntityRequest {
            props: vec!["labels", "descriptions", "sitelinks"],
            languages: languages.to_vec(),
            sites: languages.iter().map(|l| wiki_db_name(l)).collect(),
        };
        let entities = self
            .fetch_entities(&self.structured_data_domain, &[id.to_string()], &request)
            .await?;

        let Some(entity) = entities.get(id) else {
            return Ok(SitelinksAndLabels::default());
        };

        let mut result = SitelinksAndLabels::default();
        for language in languages {
            if let Some(title) = entity.sitelink(&wiki_db_name(language)) {
                result.sitelinks.insert(language.clone(), title.to_string());
            }
            if let Some(label) = entity.label(language) {
                result.labels.insert(language.clone(), label.to_string());
            }
            if let Some(description) = entity.description(language) {
                result.descriptions.insert(language.clone(), description.to_string());
            }
        }
        Ok(result)
    }

    /// Article titles of entity `id` on the wikis of `languages`
    pub async fn article_titles(&self, id: &str, languages: &[String]) -> UpstreamResult<BTreeMap<String, String>> {
        let titles = self.fetch_sitelinks_and_labels(id, languages).await?.sitelinks;
        if titles.is_empty() {
            debug!(id = %id, ?languages, "Entity has no articles in requested languages");
        }
        Ok(titles)
    }

    /// Edit-protection status of entities on the structured-data wiki
    ///
    /// Entity pages are titled by their id, so each returned page is joined
    /// back to an id by title equality. An id matched by zero or by several
    /// pages is logged and left out; callers treat absence as "drop".
    pub async fn fetch_entity_protection(&self, ids: &[String]) -> UpstreamResult<HashMap<String, bool>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let domain = self.structured_data_domain.as_str();
        let batches = ids.chunks(self.batch_limit).map(|chunk| {
            let params = ApiParams::query()
                .with("prop", "info")
                .with("inprop", "protection")
                .with("titles", chunk.join("|"));
            async move { get_as::<QueryResponse<ProtectionPage>>(self.api.as_ref(), domain, &params).await }
        });
        let pages: Vec<ProtectionPage> = try_join_all(batches)
            .await?
            .into_iter()
            .flat_map(QueryResponse::into_pages)
            .collect();

        Ok(join_protection(ids, &pages))
    }
}

/// Join protection pages to ids on `title == id`
pub fn join_protection(ids: &[String], pages: &[ProtectionPage]) -> HashMap<String, bool> {
    let mut joined = HashMap::with_capacity(ids.len());

    for id in ids {
        let matches: Vec<&ProtectionPage> = pages.iter().filter(|page| &page.title == id).collect();
        match matches.as_slice() {
            [page] => {
                let protected = page.protection.iter().any(|p| p.kind == "edit");
                joined.insert(id.clone(), protected);
            }
            [] => warn!(id = %id, "No protection record for entity, dropping"),
            many => warn!(id = %id, matches = many.len(), "Ambiguous protection records for entity, dropping"),
        }
    }

    joined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::types::Protection;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Serves one fixed `wbgetentities` body and records requests
    struct EntitiesApi {
        body: Value,
        calls: Mutex<Vec<ApiParams>>,
    }

    impl EntitiesApi {
        fn new(body: Value) -> Arc<Self> {
            Arc::new(Self { body, calls: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl WikiApi for EntitiesApi {
        async fn get(&self, _domain: &str, params: &ApiParams) -> UpstreamResult<Value> {
            self.calls.lock().unwrap().push(params.clone());
            Ok(self.body.clone())
        }
    }

    fn languages(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|c| c.to_string()).collect()
    }

    fn page(title: &str, edit_protected: bool) -> ProtectionPage {
        ProtectionPage {
            title: title.to_string(),
            protection: if edit_protected {
                vec![Protection { kind: "edit".to_string(), level: "sysop".to_string() }]
            } else {
                vec![Protection { kind: "move".to_string(), level: "sysop".to_string() }]
            },
        }
    }

    #[test]
    fn test_join_protection_exact_matches() {
        let ids = vec!["Q1".to_string(), "Q2".to_string()];
        let joined = join_protection(&ids, &[page("Q2", true), page("Q1", false)]);
        assert_eq!(joined.get("Q1"), Some(&false));
        assert_eq!(joined.get("Q2"), Some(&true));
    }

    #[test]
    fn test_join_protection_drops_missing_and_ambiguous() {
        let ids = vec!["Q1".to_string(), "Q2".to_string(), "Q3".to_string()];
        let joined = join_protection(&ids, &[page("Q1", false), page("Q2", false), page("Q2", true)]);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined.get("Q1"), Some(&false));
        assert!(!joined.contains_key("Q2"));
        assert!(!joined.contains_key("Q3"));
    }

    #[test]
    fn test_entity_request_params() {
        let request = EntityRequest {
            props: vec!["labels", "sitelinks"],
            languages: vec!["uz".to_string(), "en".to_string()],
            sites: vec!["uzwiki".to_string()],
        };
        let params = request.params(&["Q1".to_string(), "Q2".to_string()]);
        assert_eq!(params.get("action"), Some("wbgetentities"));
        assert_eq!(params.get("props"), Some("labels|sitelinks"));
        assert_eq!(params.get("ids"), Some("Q1|Q2"));
        assert_eq!(params.get("languages"), Some("uz|en"));
        assert_eq!(params.get("sitefilter"), Some("uzwiki"));
    }

    #[tokio::test]
    async fn test_sitelinks_and_labels_keyed_by_language() {
        let api = EntitiesApi::new(json!({
            "entities": {
                "Q7075": {
                    "id": "Q7075",
                    "labels": {
                        "uz": { "language": "uz", "value": "Palov" },
                        "en": { "language": "en", "value": "Pilaf" }
                    },
                    "descriptions": {
                        "en": { "language": "en", "value": "rice dish" }
                    },
                    "sitelinks": {
                        "uzwiki": { "site": "uzwiki", "title": "Palov" },
                        "enwiki": { "site": "enwiki", "title": "Pilaf" }
                    }
                }
            }
        }));
        let resolver = EntityResolver::new(api.clone(), "www.wikidata.org", 50);

        let result = resolver
            .fetch_sitelinks_and_labels("Q7075", &languages(&["uz", "en", "de"]))
            .await
            .unwrap();

        let calls = api.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].get("ids"), Some("Q7075"));
        assert_eq!(calls[0].get("languages"), Some("uz|en|de"));
        assert_eq!(calls[0].get("sitefilter"), Some("uzwiki|enwiki|dewiki"));

        assert_eq!(result.sitelinks.get("uz").map(String::as_str), Some("Palov"));
        assert_eq!(result.sitelinks.get("en").map(String::as_str), Some("Pilaf"));
        assert!(!result.sitelinks.contains_key("de"));
        assert!(!result.sitelinks.contains_key("uzwiki"));
        assert_eq!(result.labels.get("en").map(String::as_str), Some("Pilaf"));
        assert_eq!(result.descriptions.get("en").map(String::as_str), Some("rice dish"));
        assert!(!result.descriptions.contains_key("uz"));
    }

    #[tokio::test]
    async fn test_sitelinks_and_labels_missing_entity_is_empty() {
        let api = EntitiesApi::new(json!({
            "entities": { "Q404": { "id": "Q404", "missing": "" } }
        }));
        let resolver = EntityResolver::new(api, "www.wikidata.org", 50);

        let result = resolver
            .fetch_sitelinks_and_labels("Q404", &languages(&["uz"]))
            .await
            .unwrap();
        assert_eq!(result, SitelinksAndLabels::default());

        let titles = resolver.article_titles("Q404", &languages(&["uz"])).await.unwrap();
        assert!(titles.is_empty());
    }
}
