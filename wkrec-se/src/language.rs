//! Language-variant normalization
//!
//! Callers may pass regional or script variant codes (`zh-hans`, `sr-el`)
//! where a wiki subdomain is needed. The variant table is identical on every
//! wiki, so it is fetched once per process and never invalidated.

use crate::upstream::types::SiteInfoResponse;
use crate::upstream::{get_as, ApiParams, UpstreamResult, WikiApi};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

/// Legacy codes rewritten before the table lookup
const LEGACY_ALIASES: &[(&str, &str)] = &[("be-x-old", "be-tarask")];

/// Variant code -> wiki language code
pub type VariantTable = HashMap<String, String>;

/// Lazily populated variant table shared by all requests
///
/// First-time population is not serialized: concurrent callers may each fetch
/// the table, and whichever `set` lands first wins.
pub struct LanguageVariants {
    api: Arc<dyn WikiApi>,
    meta_domain: String,
    table: OnceLock<VariantTable>,
}

impl LanguageVariants {
    pub fn new(api: Arc<dyn WikiApi>, meta_domain: impl Into<String>) -> Self {
        Self {
            api,
            meta_domain: meta_domain.into(),
            table: OnceLock::new(),
        }
    }

    pub fn is_populated(&self) -> bool {
        self.table.get().is_some()
    }

    /// Map a caller-supplied code to the wiki language code
    ///
    /// Unknown codes pass through unchanged. If the variant table cannot be
    /// fetched the code passes through and the fetch is retried next call.
    pub async fn normalize(&self, code: &str) -> String {
        let code = apply_legacy_alias(code);

        if let Some(table) = self.table.get() {
            return lookup(table, code);
        }

        match self.fetch_table().await {
            Ok(table) => {
                info!(variants = table.len(), "Language variant table loaded");
                let _ = self.table.set(table);
            }
            Err(e) => {
                warn!(error = %e, "Language variant table unavailable, passing code through");
            }
        }

        self.table
            .get()
            .map(|table| lookup(table, code))
            .unwrap_or_else(|| code.to_string())
    }

    /// Normalize an optional code (absent stays absent)
    pub async fn normalize_opt(&self, code: Option<&str>) -> Option<String> {
        match code {
            Some(code) => Some(self.normalize(code).await),
            None => None,
        }
    }

    async fn fetch_table(&self) -> UpstreamResult<VariantTable> {
        debug!(domain = %self.meta_domain, "Fetching language variants");
        let params = ApiParams::query()
            .with("meta", "siteinfo")
            .with("siprop", "languagevariants");
        let response: SiteInfoResponse = get_as(self.api.as_ref(), &self.meta_domain, &params).await?;
        Ok(build_variant_table(response))
    }
}

/// Invert `base -> variants` into `variant -> base`
///
/// Variants that are themselves base languages are skipped so that a
/// normalized code never normalizes again to something else.
pub fn build_variant_table(response: SiteInfoResponse) -> VariantTable {
    let variants = response.query.map(|q| q.languagevariants).unwrap_or_default();

    let mut table = VariantTable::new();
    for (base, base_variants) in &variants {
        for variant in base_variants.keys() {
            if variant != base && !variants.contains_key(variant) {
                table.insert(variant.clone(), base.clone());
            }
        }
    }
    table
}

fn apply_legacy_alias(code: &str) -> &str {
    LEGACY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == code)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(code)
}

fn lookup(table: &VariantTable, code: &str) -> String {
    table.get(code).cloned().unwrap_or_else(|| code.to_string())
}

/// Database name of a wiki (`enwiki`, `zh_min_nanwiki`)
///
/// Sitelink keys in structured data use this form.
pub fn wiki_db_name(wiki_language: &str) -> String {
    if wiki_language == "be-tarask" {
        return "be_x_oldwiki".to_string();
    }
    format!("{}wiki", wiki_language.replace('-', "_"))
}
