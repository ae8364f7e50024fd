//! Test helper utilities
//!
//! Canned upstream and ranking-store doubles plus fixture builders shared by
//! the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use wkrec_common::config::TomlConfig;
use wkrec_se::rank::{RankingRow, RankingStore};
use wkrec_se::recommend::Recommender;
use wkrec_se::upstream::{ApiParams, UpstreamResult, WikiApi};
use wkrec_se::AppState;

type Responder = Box<dyn Fn(&str, &ApiParams) -> UpstreamResult<Value> + Send + Sync>;

/// Upstream double answering from a closure and recording every call
pub struct MockWikiApi {
    responder: Responder,
    calls: Mutex<Vec<(String, ApiParams)>>,
}

impl MockWikiApi {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&str, &ApiParams) -> UpstreamResult<Value> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Calls whose `key` parameter equals `value`
    pub fn calls_with(&self, key: &str, value: &str) -> Vec<(String, ApiParams)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, params)| params.get(key) == Some(value))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl WikiApi for MockWikiApi {
    async fn get(&self, domain: &str, params: &ApiParams) -> UpstreamResult<Value> {
        self.calls.lock().unwrap().push((domain.to_string(), params.clone()));
        (self.responder)(domain, params)
    }
}

/// Ranking store double; fails the first `failures` calls
pub struct MockStore {
    failures: u32,
    rows: Vec<RankingRow>,
    calls: AtomicU32,
}

impl MockStore {
    pub fn new(rows: Vec<RankingRow>) -> Arc<Self> {
        Self::failing(0, rows)
    }

    pub fn failing(failures: u32, rows: Vec<RankingRow>) -> Arc<Self> {
        Arc::new(Self {
            failures,
            rows,
            calls: AtomicU32::new(0),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RankingStore for MockStore {
    async fn ranked(&self, ids: &[i64], _target: &str, limit: u32) -> Result<Vec<RankingRow>, sqlx::Error> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.failures {
            return Err(sqlx::Error::PoolTimedOut);
        }

        let mut rows: Vec<RankingRow> = self
            .rows
            .iter()
            .filter(|row| ids.contains(&row.wikidata_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.normalized_rank.total_cmp(&a.normalized_rank));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

/// Config with allow-lists, a `uz <- en` model and a fast store retry
pub fn test_config() -> TomlConfig {
    let mut config = TomlConfig::default();
    config.caption_allowed_domains = vec!["commons.wikimedia.org".to_string()];
    config.description_allowed_domains = vec!["www.wikidata.org".to_string()];
    config
        .article
        .translation_models
        .insert("uz".to_string(), vec!["en".to_string()]);
    config.store.retries = 2;
    config.store.retry_delay_ms = 1;
    config
}

pub fn test_app(api: Arc<MockWikiApi>, store: Arc<MockStore>, config: TomlConfig) -> Router {
    let recommender = Recommender::new(api, store, &config);
    wkrec_se::build_router(AppState::new(recommender, config))
}

pub fn is_siteinfo(params: &ApiParams) -> bool {
    params.get("meta") == Some("siteinfo")
}

pub fn is_entities(params: &ApiParams) -> bool {
    params.get("action") == Some("wbgetentities")
}

pub fn is_protection(params: &ApiParams) -> bool {
    params.get("inprop") == Some("protection")
}

/// Variant table with a single Chinese variant group
pub fn siteinfo_body() -> Value {
    json!({
        "query": {
            "languagevariants": {
                "zh": { "zh": {}, "zh-hans": {}, "zh-hant": {} }
            }
        }
    })
}

/// Entities for every requested id, each linked to `sites`
pub fn entities_body(params: &ApiParams, sites: &[&str]) -> Value {
    let mut entities = Map::new();
    for id in params.get("ids").unwrap_or_default().split('|').filter(|id| !id.is_empty()) {
        let sitelinks: Map<String, Value> = sites
            .iter()
            .map(|site| {
                (
                    site.to_string(),
                    json!({ "site": site, "title": format!("Title {}", id) }),
                )
            })
            .collect();
        entities.insert(id.to_string(), json!({ "id": id, "sitelinks": sitelinks }));
    }
    json!({ "entities": entities })
}

/// Protection pages for every requested title; `protected` ids are edit-protected
pub fn protection_body(params: &ApiParams, protected: &[&str]) -> Value {
    let pages: Vec<Value> = params
        .get("titles")
        .unwrap_or_default()
        .split('|')
        .map(|title| {
            let protection = if protected.contains(&title) {
                json!([{ "type": "edit", "level": "sysop" }])
            } else {
                json!([])
            };
            json!({ "ns": 0, "title": title, "protection": protection })
        })
        .collect();
    json!({ "query": { "pages": pages } })
}

fn content_page(pageid: u64, ns: i64, title: &str, item: Option<&str>, disambiguation: bool) -> Value {
    let mut pageprops = Map::new();
    if let Some(item) = item {
        pageprops.insert("wikibase_item".to_string(), json!(item));
    }
    if disambiguation {
        pageprops.insert("disambiguation".to_string(), json!(""));
    }

    let mut page = json!({ "pageid": pageid, "ns": ns, "title": title, "langlinkscount": pageid % 7 });
    if !pageprops.is_empty() {
        page["pageprops"] = Value::Object(pageprops);
    }
    page
}

/// Items of the three recommendable pages in [`uz_mostviewed_body`]
pub const UZ_VALID_ITEMS: [(&str, &str); 3] = [("Q7075", "Palov"), ("Q269", "Toshkent"), ("Q5753", "Samarqand")];

/// 50 most-viewed uz pages of which exactly three are recommendable
pub fn uz_mostviewed_body() -> Value {
    let mut pages = Vec::new();
    let mut pageid = 1;
    let mut next = || {
        pageid += 1;
        pageid
    };

    for (item, title) in UZ_VALID_ITEMS {
        pages.push(content_page(next(), 0, title, Some(item), false));
    }
    for i in 0..10 {
        pages.push(content_page(next(), 0, &format!("Maqola {}", i), None, false));
    }
    for i in 0..10 {
        pages.push(content_page(next(), 0, &format!("Vikipediya:Sahifa {}", i), Some(&format!("Q{}", 1000 + i)), false));
    }
    for i in 0..10 {
        pages.push(content_page(next(), 0, &format!("List of things {}", i), Some(&format!("Q{}", 2000 + i)), false));
    }
    for i in 0..10 {
        pages.push(content_page(next(), 0, &format!("Ma'no {}", i), Some(&format!("Q{}", 3000 + i)), true));
    }
    for i in 0..7 {
        pages.push(content_page(next(), 4, &format!("Loyiha {}", i), Some(&format!("Q{}", 4000 + i)), false));
    }
    assert_eq!(pages.len(), 50);

    json!({ "batchcomplete": true, "query": { "pages": pages } })
}
