//! Typed views of the upstream responses the pipeline reads
//!
//! All requests use `formatversion=2`, so page collections are arrays and
//! boolean flags are real booleans. Only the fields the pipeline needs are
//! modelled; everything else is ignored.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// `action=query` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse<P = Page> {
    /// Absent when a generator produced no pages
    pub query: Option<QueryBody<P>>,
}

impl<P> QueryResponse<P> {
    pub fn into_pages(self) -> Vec<P> {
        self.query.map(|q| q.pages).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryBody<P> {
    #[serde(default = "Vec::new")]
    pub pages: Vec<P>,
}

/// Content page as returned with `prop=pageprops|langlinkscount|description|pageviews`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub pageid: u64,
    #[serde(default)]
    pub ns: i64,
    pub title: String,
    /// Search generator rank, when present
    pub index: Option<u64>,
    #[serde(default)]
    pub missing: bool,
    pub pageprops: Option<PageProps>,
    pub langlinkscount: Option<u64>,
    /// Local short description
    pub description: Option<String>,
    /// Daily views, `null` for days without data
    #[serde(default)]
    pub pageviews: BTreeMap<String, Option<u64>>,
}

impl Page {
    pub fn wikibase_item(&self) -> Option<&str> {
        self.pageprops.as_ref()?.wikibase_item.as_deref()
    }

    pub fn is_disambiguation(&self) -> bool {
        self.pageprops
            .as_ref()
            .map(|p| p.disambiguation.is_some())
            .unwrap_or(false)
    }

    pub fn total_pageviews(&self) -> u64 {
        self.pageviews.values().flatten().sum()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageProps {
    pub wikibase_item: Option<String>,
    /// Present (with an empty value) on disambiguation pages
    pub disambiguation: Option<Value>,
}

/// File page as returned with `prop=imageinfo|globalusage`
#[derive(Debug, Clone, Deserialize)]
pub struct FilePage {
    pub pageid: u64,
    pub ns: i64,
    pub title: String,
    #[serde(default)]
    pub imageinfo: Vec<ImageInfo>,
    #[serde(default)]
    pub globalusage: Vec<GlobalUsage>,
}

impl FilePage {
    pub fn mime(&self) -> Option<&str> {
        self.imageinfo.first()?.mime.as_deref()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageInfo {
    pub mime: Option<String>,
}

/// One usage of a file on another wiki
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalUsage {
    pub title: String,
    pub wiki: String,
    /// Reported as a string by some API versions
    #[serde(deserialize_with = "u64_from_string_or_number")]
    pub pageid: u64,
}

fn u64_from_string_or_number<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Page with protection info (`prop=info&inprop=protection`)
#[derive(Debug, Clone, Deserialize)]
pub struct ProtectionPage {
    pub title: String,
    #[serde(default)]
    pub protection: Vec<Protection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Protection {
    #[serde(rename = "type")]
    pub kind: String,
    pub level: String,
}

/// `action=wbgetentities` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntitiesResponse {
    #[serde(default)]
    pub entities: BTreeMap<String, Entity>,
}

/// Structured-data entity (item or media-info)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub id: String,
    /// Present on ids that do not exist
    #[serde(default, skip_serializing)]
    pub missing: Option<Value>,
    #[serde(default, deserialize_with = "map_or_empty_list")]
    pub labels: BTreeMap<String, LanguageValue>,
    #[serde(default, deserialize_with = "map_or_empty_list")]
    pub descriptions: BTreeMap<String, LanguageValue>,
    #[serde(default, deserialize_with = "map_or_empty_list")]
    pub sitelinks: BTreeMap<String, Sitelink>,
}

impl Entity {
    pub fn is_missing(&self) -> bool {
        self.missing.is_some()
    }

    pub fn label(&self, language: &str) -> Option<&str> {
        self.labels.get(language).map(|v| v.value.as_str())
    }

    pub fn description(&self, language: &str) -> Option<&str> {
        self.descriptions.get(language).map(|v| v.value.as_str())
    }

    pub fn sitelink(&self, site: &str) -> Option<&str> {
        self.sitelinks.get(site).map(|s| s.title.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageValue {
    #[serde(default)]
    pub language: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sitelink {
    #[serde(default)]
    pub site: String,
    pub title: String,
}

/// Empty maps are serialized by the structured-data API as `[]`
fn map_or_empty_list<'de, D, V>(deserializer: D) -> Result<BTreeMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<V> {
        Map(BTreeMap<String, V>),
        List(Vec<Value>),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Map(map) => Ok(map),
        Raw::List(list) if list.is_empty() => Ok(BTreeMap::new()),
        Raw::List(_) => Err(serde::de::Error::custom("expected an object or an empty list")),
    }
}

/// `meta=siteinfo&siprop=languagevariants` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteInfoResponse {
    pub query: Option<SiteInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SiteInfo {
    /// Base language -> variant code -> variant details
    #[serde(default)]
    pub languagevariants: BTreeMap<String, BTreeMap<String, Value>>,
}
